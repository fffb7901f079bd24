//! Row-change fan-out. Every store write publishes here after it commits;
//! connected views subscribe filtered by table, change type and optionally
//! one column. Within a single subscription events arrive in publish order;
//! nothing is promised across subscriptions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Profiles,
    Posts,
    Participations,
    Messages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Op {
    Insert,
    Delete,
}

/// One committed row change, with the row as it was stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: Table,
    pub op: Op,
    pub row: Value,
}

/// Equality predicate on a single column of the serialized row.
#[derive(Debug, Clone)]
pub struct EqFilter {
    column: &'static str,
    value: Value,
}

impl EqFilter {
    pub fn new(column: &'static str, value: impl Into<Value>) -> Self {
        Self {
            column,
            value: value.into(),
        }
    }

    fn matches(&self, row: &Value) -> bool {
        row.get(self.column) == Some(&self.value)
    }
}

#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        Self {
            tx: broadcast::channel(capacity).0,
        }
    }

    /// Publish a committed change. Having no listeners is not an error.
    pub fn publish<R: Serialize>(&self, table: Table, op: Op, row: &R) {
        let row = match serde_json::to_value(row) {
            Ok(row) => row,
            Err(err) => {
                log::warn!("dropping change event for {table:?}: {err}");
                return;
            }
        };
        let _ = self.tx.send(ChangeEvent { table, op, row });
    }

    pub fn subscribe(&self, table: Table, ops: &[Op], filter: Option<EqFilter>) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
            table,
            ops: ops.to_vec(),
            filter,
        }
    }
}

/// A filtered view of the change feed. Dropping it unsubscribes; views must
/// drop theirs when navigating away so events never reach stale state.
pub struct Subscription {
    rx: broadcast::Receiver<ChangeEvent>,
    table: Table,
    ops: Vec<Op>,
    filter: Option<EqFilter>,
}

impl Subscription {
    /// Next matching event, or `None` once the hub is gone. Lagged gaps are
    /// logged and skipped.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("change feed subscriber lagged, skipped {skipped} events");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    fn matches(&self, event: &ChangeEvent) -> bool {
        event.table == self.table
            && self.ops.contains(&event.op)
            && self
                .filter
                .as_ref()
                .map_or(true, |filter| filter.matches(&event.row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn delivers_matching_events_in_order() {
        let feed = ChangeFeed::new(8);
        let mut sub = feed.subscribe(Table::Messages, &[Op::Insert], None);
        feed.publish(Table::Messages, Op::Insert, &json!({"id": 1}));
        feed.publish(Table::Messages, Op::Insert, &json!({"id": 2}));
        assert_eq!(sub.next().await.unwrap().row["id"], 1);
        assert_eq!(sub.next().await.unwrap().row["id"], 2);
    }

    #[tokio::test]
    async fn skips_other_tables_ops_and_columns() {
        let feed = ChangeFeed::new(8);
        let mut sub = feed.subscribe(
            Table::Messages,
            &[Op::Insert],
            Some(EqFilter::new("post_id", 7)),
        );
        feed.publish(Table::Posts, Op::Insert, &json!({"post_id": 7}));
        feed.publish(Table::Messages, Op::Delete, &json!({"post_id": 7}));
        feed.publish(Table::Messages, Op::Insert, &json!({"post_id": 8}));
        feed.publish(Table::Messages, Op::Insert, &json!({"post_id": 7, "id": 42}));
        assert_eq!(sub.next().await.unwrap().row["id"], 42);
    }

    #[tokio::test]
    async fn ends_when_the_hub_is_dropped() {
        let feed = ChangeFeed::new(8);
        let mut sub = feed.subscribe(Table::Posts, &[Op::Insert], None);
        drop(feed);
        assert!(sub.next().await.is_none());
    }
}
