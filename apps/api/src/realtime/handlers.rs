use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

use crate::auth::extractor::CurrentUser;
use crate::errors::AppError;
use crate::realtime::{ChangeEvent, ChangeFilter, ChangeKind, FeedItem, Subscription};
use crate::requests::repository::{pending_invitations, pending_join_requests, PendingRequestView};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct NotificationSnapshot {
    pub join_requests: Vec<PendingRequestView>,
    pub invitations: Vec<PendingRequestView>,
}

struct StreamState {
    db: PgPool,
    user_id: Uuid,
    subscription: Subscription,
    sent_initial: bool,
}

/// GET /api/v1/notifications/stream
///
/// Sends a `snapshot` event right away and a fresh one after every new pending
/// request that involves the caller, or after the subscription falls behind.
pub async fn handle_notification_stream(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("Notification stream opened by {}", user.email);

    let subscription = state.feed.subscribe(
        ChangeFilter::table("requests")
            .kind(ChangeKind::Insert)
            .column_eq("status", "pending"),
    );
    let initial = StreamState {
        db: state.db.clone(),
        user_id: user.user_id,
        subscription,
        sent_initial: false,
    };

    let stream = futures::stream::unfold(initial, |mut st| async move {
        if st.sent_initial {
            loop {
                let item = st.subscription.next().await?;
                if should_refresh(&item, st.user_id) {
                    break;
                }
            }
        }
        st.sent_initial = true;

        let event = snapshot_event(&st.db, st.user_id).await;
        Some((Ok::<_, Infallible>(event), st))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

pub async fn load_snapshot(pool: &PgPool, user_id: Uuid) -> Result<NotificationSnapshot, AppError> {
    Ok(NotificationSnapshot {
        join_requests: pending_join_requests(pool, user_id).await?,
        invitations: pending_invitations(pool, user_id).await?,
    })
}

async fn snapshot_event(pool: &PgPool, user_id: Uuid) -> Event {
    let snapshot = match load_snapshot(pool, user_id).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            error!("Failed to load notifications for {user_id}: {e}");
            return Event::default()
                .event("error")
                .data("Failed to load notifications");
        }
    };
    match serde_json::to_string(&snapshot) {
        Ok(json) => Event::default().event("snapshot").data(json),
        Err(e) => {
            error!("Failed to serialize notifications: {e}");
            Event::default()
                .event("error")
                .data("Failed to load notifications")
        }
    }
}

fn should_refresh(item: &FeedItem, user_id: Uuid) -> bool {
    match item {
        FeedItem::Change(change) => involves_user(change, user_id),
        // Missed events may have involved the caller.
        FeedItem::Missed(_) => true,
    }
}

/// The caller answers join requests as owner and invitations as requester,
/// so either column naming them makes the change relevant.
fn involves_user(change: &ChangeEvent, user_id: Uuid) -> bool {
    let id = user_id.to_string();
    ["owner_id", "requester_id"]
        .iter()
        .any(|column| change.field(column).and_then(|v| v.as_str()) == Some(id.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_involves_owner_or_requester() {
        let owner = Uuid::new_v4();
        let requester = Uuid::new_v4();
        let change = ChangeEvent {
            table: "requests".to_string(),
            kind: ChangeKind::Insert,
            record: json!({
                "owner_id": owner.to_string(),
                "requester_id": requester.to_string(),
                "status": "pending",
            }),
        };

        assert!(involves_user(&change, owner));
        assert!(involves_user(&change, requester));
        assert!(!involves_user(&change, Uuid::new_v4()));
    }

    #[test]
    fn test_missed_events_trigger_refresh() {
        let stranger = ChangeEvent {
            table: "requests".to_string(),
            kind: ChangeKind::Insert,
            record: json!({
                "owner_id": Uuid::new_v4().to_string(),
                "requester_id": Uuid::new_v4().to_string(),
            }),
        };
        let user_id = Uuid::new_v4();

        assert!(!should_refresh(&FeedItem::Change(stranger), user_id));
        assert!(should_refresh(&FeedItem::Missed(3), user_id));
    }
}
