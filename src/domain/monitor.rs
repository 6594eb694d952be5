//! Live transaction monitor.
//!
//! Keeps the latest known state of every order seen on the change feed since the monitor was
//! attached. Orders are keyed by id, so a second event for the same order replaces the first
//! instead of being listed twice. There is no backfill: orders that never change after the
//! monitor starts are never shown.

use crate::domain::order::{Order, OrderEvent, OrderEventKind, OrderId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast::{error::RecvError, Receiver};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

/// An order as the monitor currently knows it.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MonitoredOrder {
    pub order: Order,
    /// Number of events applied for this order (1 on first sight).
    pub revision: u64,
    pub last_event: OrderEventKind,
    pub received_at: DateTime<Utc>,
    #[serde(skip)]
    sequence: u64,
}

#[derive(Default)]
struct MonitorState {
    orders: HashMap<OrderId, MonitoredOrder>,
    next_sequence: u64,
}

/// Shared, cheaply cloneable handle to the monitor's map. The only writer is the subscription
/// task (or `apply` in tests); HTTP handlers take snapshots.
#[derive(Clone, Default)]
pub struct TransactionMonitor {
    state: Arc<RwLock<MonitorState>>,
}

impl TransactionMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one change-feed event, replacing any previous record for the same order.
    pub async fn apply(&self, event: OrderEvent) {
        let mut state = self.state.write().await;
        state.next_sequence += 1;
        let sequence = state.next_sequence;

        let OrderEvent { kind, order } = event;
        let revision = state
            .orders
            .get(&order.id)
            .map(|existing| existing.revision + 1)
            .unwrap_or(1);

        debug!(order_id = %order.id, ?kind, revision, "monitor applied order event");
        state.orders.insert(
            order.id.clone(),
            MonitoredOrder {
                order,
                revision,
                last_event: kind,
                received_at: Utc::now(),
                sequence,
            },
        );
    }

    /// All known orders, most recently changed first.
    pub async fn snapshot(&self) -> Vec<MonitoredOrder> {
        let state = self.state.read().await;
        let mut orders: Vec<MonitoredOrder> = state.orders.values().cloned().collect();
        orders.sort_by(|a, b| b.sequence.cmp(&a.sequence));
        orders
    }

    pub async fn get(&self, id: &OrderId) -> Option<MonitoredOrder> {
        self.state.read().await.orders.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.orders.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Starts consuming `events`. The returned handle ends the subscription when it is
    /// unsubscribed or dropped.
    pub fn subscribe(&self, mut events: Receiver<OrderEvent>) -> MonitorSubscription {
        let monitor = self.clone();
        let task = tokio::spawn(async move {
            info!("Transaction monitor subscribed to order feed");
            loop {
                match events.recv().await {
                    Ok(event) => monitor.apply(event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Transaction monitor lagged behind the order feed");
                    }
                    Err(RecvError::Closed) => {
                        info!("Order feed closed; transaction monitor stopping");
                        break;
                    }
                }
            }
        });
        MonitorSubscription { task: Some(task) }
    }
}

/// Live subscription of a `TransactionMonitor` to the order feed.
pub struct MonitorSubscription {
    task: Option<JoinHandle<()>>,
}

impl MonitorSubscription {
    /// Stops applying events. Returns once the subscription task has fully stopped.
    pub async fn unsubscribe(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
            info!("Transaction monitor unsubscribed");
        }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().map(|t| !t.is_finished()).unwrap_or(false)
    }
}

impl Drop for MonitorSubscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderStatus;
    use chrono::TimeZone;

    fn order(id: &str, status: OrderStatus) -> Order {
        Order {
            id: OrderId(id.to_string()),
            status,
            total_amount: Some(1200.0),
            mpesa_code: None,
            phone_number: Some("254700000000".to_string()),
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn repeated_updates_replace_the_same_entry() {
        let monitor = TransactionMonitor::new();
        monitor
            .apply(OrderEvent {
                kind: OrderEventKind::Insert,
                order: order("a", OrderStatus::Pending),
            })
            .await;
        monitor
            .apply(OrderEvent {
                kind: OrderEventKind::Update,
                order: order("a", OrderStatus::Paid),
            })
            .await;
        monitor
            .apply(OrderEvent {
                kind: OrderEventKind::Update,
                order: order("a", OrderStatus::Shipped),
            })
            .await;

        let snapshot = monitor.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].order.status, OrderStatus::Shipped);
        assert_eq!(snapshot[0].revision, 3);
        assert_eq!(snapshot[0].last_event, OrderEventKind::Update);
    }

    #[tokio::test]
    async fn snapshot_lists_most_recent_change_first() {
        let monitor = TransactionMonitor::new();
        for id in ["a", "b", "c"] {
            monitor
                .apply(OrderEvent {
                    kind: OrderEventKind::Insert,
                    order: order(id, OrderStatus::Pending),
                })
                .await;
        }
        monitor
            .apply(OrderEvent {
                kind: OrderEventKind::Update,
                order: order("a", OrderStatus::Paid),
            })
            .await;

        let ids: Vec<String> = monitor
            .snapshot()
            .await
            .into_iter()
            .map(|m| m.order.id.0)
            .collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
    }
}
