use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A join request or invitation. For both kinds `requester_id` is the user who
/// becomes a member on acceptance and `owner_id` is the team owner.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RequestRow {
    pub request_id: Uuid,
    pub team_id: Uuid,
    pub requester_id: Uuid,
    pub owner_id: Uuid,
    pub kind: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RequestRow {
    pub fn kind(&self) -> Result<RequestKind, UnknownValue> {
        self.kind.parse()
    }

    pub fn status(&self) -> Result<RequestStatus, UnknownValue> {
        self.status.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    /// Initiated by the user who wants to join.
    Join,
    /// Initiated by the team owner.
    Invite,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Join => "join",
            RequestKind::Invite => "invite",
        }
    }

    /// The user entitled to accept or reject a request of this kind.
    pub fn responder(&self, request: &RequestRow) -> Uuid {
        match self {
            RequestKind::Join => request.owner_id,
            RequestKind::Invite => request.requester_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestAction {
    Accept,
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("request is already {0}")]
pub struct TerminalState(pub RequestStatus);

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }

    /// `pending → accepted | rejected`. Terminal states accept no further action.
    pub fn apply(self, action: RequestAction) -> Result<RequestStatus, TerminalState> {
        if self.is_terminal() {
            return Err(TerminalState(self));
        }
        Ok(match action {
            RequestAction::Accept => RequestStatus::Accepted,
            RequestAction::Reject => RequestStatus::Rejected,
        })
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value '{0}'")]
pub struct UnknownValue(pub String);

impl FromStr for RequestStatus {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "accepted" => Ok(RequestStatus::Accepted),
            "rejected" => Ok(RequestStatus::Rejected),
            other => Err(UnknownValue(other.to_string())),
        }
    }
}

impl FromStr for RequestKind {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "join" => Ok(RequestKind::Join),
            "invite" => Ok(RequestKind::Invite),
            other => Err(UnknownValue(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_request(kind: RequestKind) -> RequestRow {
        RequestRow {
            request_id: Uuid::new_v4(),
            team_id: Uuid::new_v4(),
            requester_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            kind: kind.as_str().to_string(),
            status: "pending".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_pending_transitions() {
        assert_eq!(
            RequestStatus::Pending.apply(RequestAction::Accept),
            Ok(RequestStatus::Accepted)
        );
        assert_eq!(
            RequestStatus::Pending.apply(RequestAction::Reject),
            Ok(RequestStatus::Rejected)
        );
    }

    #[test]
    fn test_terminal_states_reject_every_action() {
        for terminal in [RequestStatus::Accepted, RequestStatus::Rejected] {
            assert!(terminal.is_terminal());
            for action in [RequestAction::Accept, RequestAction::Reject] {
                assert_eq!(terminal.apply(action), Err(TerminalState(terminal)));
            }
        }
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            RequestStatus::Pending,
            RequestStatus::Accepted,
            RequestStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<RequestStatus>(), Ok(status));
        }
        assert!("approved".parse::<RequestStatus>().is_err());
    }

    #[test]
    fn test_responder_depends_on_kind() {
        let join = make_request(RequestKind::Join);
        assert_eq!(RequestKind::Join.responder(&join), join.owner_id);

        let invite = make_request(RequestKind::Invite);
        assert_eq!(RequestKind::Invite.responder(&invite), invite.requester_id);
    }

    #[test]
    fn test_row_accessors_parse_columns() {
        let row = make_request(RequestKind::Invite);
        assert_eq!(row.kind(), Ok(RequestKind::Invite));
        assert_eq!(row.status(), Ok(RequestStatus::Pending));
    }
}
