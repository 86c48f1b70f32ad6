//! In-process change feed fed by Postgres `NOTIFY`.
//!
//! `listener` pumps database notifications into a [`ChangeFeed`]; handlers
//! subscribe with a [`ChangeFilter`] and only see matching events.

pub mod handlers;
pub mod listener;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::warn;

const FEED_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One row change, as published by the database triggers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: String,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub record: Value,
}

impl ChangeEvent {
    pub fn field(&self, column: &str) -> Option<&Value> {
        self.record.get(column)
    }
}

/// Selects events by table, optionally by kind and by column equality.
#[derive(Debug, Clone)]
pub struct ChangeFilter {
    table: String,
    kind: Option<ChangeKind>,
    equals: Vec<(String, Value)>,
}

impl ChangeFilter {
    pub fn table(table: impl Into<String>) -> Self {
        ChangeFilter {
            table: table.into(),
            kind: None,
            equals: Vec::new(),
        }
    }

    pub fn kind(mut self, kind: ChangeKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Requires `record[column] == value`.
    pub fn column_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.equals.push((column.into(), value.into()));
        self
    }

    pub fn matches(&self, event: &ChangeEvent) -> bool {
        event.table == self.table
            && self.kind.map_or(true, |kind| kind == event.kind)
            && self
                .equals
                .iter()
                .all(|(column, value)| event.field(column) == Some(value))
    }
}

#[derive(Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::with_capacity(FEED_CAPACITY)
    }

    /// Events buffered per subscriber before a slow one starts missing them.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        ChangeFeed { sender }
    }

    /// Returns the number of subscribers that received the event.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        // No subscribers is not an error.
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self, filter: ChangeFilter) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
            filter,
        }
    }
}

/// What a subscriber sees next.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedItem {
    Change(ChangeEvent),
    /// The subscriber fell behind and this many events were dropped unseen,
    /// matching or not.
    Missed(u64),
}

pub struct Subscription {
    receiver: broadcast::Receiver<ChangeEvent>,
    filter: ChangeFilter,
}

impl Subscription {
    /// Next matching event or missed-events notice, `None` once the feed is gone.
    pub async fn next(&mut self) -> Option<FeedItem> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(FeedItem::Change(event)),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Change subscription lagged, skipped {skipped} events");
                    return Some(FeedItem::Missed(skipped));
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
