use std::time::Duration;

use sqlx::postgres::PgListener;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::realtime::{ChangeEvent, ChangeFeed};

/// Channel the `requests` insert trigger notifies on.
pub const REQUESTS_CHANNEL: &str = "requests_changes";

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Forwards notifications from `REQUESTS_CHANNEL` into `feed` until the process exits.
pub fn spawn_pg_listener(pool: PgPool, feed: ChangeFeed) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut backoff = INITIAL_BACKOFF;
        loop {
            match listen(&pool, &feed, &mut backoff).await {
                Ok(()) => return,
                Err(e) => {
                    warn!("Change listener failed: {e}; reconnecting in {backoff:?}");
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
            }
        }
    })
}

async fn listen(
    pool: &PgPool,
    feed: &ChangeFeed,
    backoff: &mut Duration,
) -> Result<(), sqlx::Error> {
    let mut listener = PgListener::connect_with(pool).await?;
    listener.listen(REQUESTS_CHANNEL).await?;
    info!("Listening for changes on '{REQUESTS_CHANNEL}'");
    *backoff = INITIAL_BACKOFF;

    loop {
        let notification = listener.recv().await?;
        match decode(notification.payload()) {
            Some(event) => {
                let delivered = feed.publish(event);
                debug!("Change on '{REQUESTS_CHANNEL}' delivered to {delivered} subscribers");
            }
            None => error!(
                "Dropping undecodable notification on '{REQUESTS_CHANNEL}': {}",
                notification.payload()
            ),
        }
    }
}

fn decode(payload: &str) -> Option<ChangeEvent> {
    serde_json::from_str(payload).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::ChangeKind;

    #[test]
    fn test_decode_insert_payload() {
        let payload = r#"{"table":"requests","type":"INSERT","record":{"request_id":"00000000-0000-0000-0000-000000000001","status":"pending"}}"#;
        let event = decode(payload).unwrap();
        assert_eq!(event.table, "requests");
        assert_eq!(event.kind, ChangeKind::Insert);
        assert_eq!(event.field("status").and_then(|v| v.as_str()), Some("pending"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode("not json").is_none());
        assert!(decode(r#"{"table":"requests"}"#).is_none());
    }
}
