//! Order change feed.
//!
//! `OrderChangeFeed` is the in-process fan-out (a broadcast channel). `OrderFeedPoller` fills it
//! by polling the platform's `orders` table for rows created or updated after its cursor.
//!
//! Row timestamps come from the database and a row can commit after a later-stamped row was
//! already read, so every poll looks back `overlap` behind the cursor and skips changes it has
//! already published. The cursor starts at the poller's start time; only the overlap window
//! before it is ever replayed.

use crate::app::error::ServiceError;
use crate::domain::order::{Order, OrderEvent, OrderEventKind};
use crate::infra::platform::rest::quote_filter_value;
use crate::infra::platform::PlatformClient;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

const DEFAULT_FEED_CAPACITY: usize = 256;
const DEFAULT_POLL_OVERLAP: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct OrderChangeFeed {
    sender: broadcast::Sender<OrderEvent>,
}

impl Default for OrderChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

impl OrderChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.sender.subscribe()
    }

    /// Delivers `event` to every current subscriber. Returns how many received it.
    pub fn publish(&self, event: OrderEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Where the poller reads changed orders from.
#[async_trait]
pub trait OrderSource: Send + Sync {
    /// Raw `orders` rows created or updated strictly after `since`, oldest first. Rows are
    /// decoded by the poller one at a time.
    async fn changed_since(&self, since: DateTime<Utc>) -> Result<Vec<JsonValue>, ServiceError>;
}

#[async_trait]
impl OrderSource for PlatformClient {
    async fn changed_since(&self, since: DateTime<Utc>) -> Result<Vec<JsonValue>, ServiceError> {
        let ts = quote_filter_value(&since.to_rfc3339_opts(SecondsFormat::Micros, true));
        self.select::<JsonValue>(
            "orders",
            &[
                ("select", "*".to_string()),
                ("or", format!("(created_at.gt.{ts},updated_at.gt.{ts})")),
                ("order", "created_at.asc".to_string()),
            ],
        )
        .await
    }
}

/// Poll position: the newest change time seen, plus the changes already published inside the
/// overlap window behind it.
#[derive(Debug, Clone)]
pub struct FeedCursor {
    position: DateTime<Utc>,
    seen: HashMap<String, DateTime<Utc>>,
}

impl FeedCursor {
    pub fn starting_at(position: DateTime<Utc>) -> Self {
        Self {
            position,
            seen: HashMap::new(),
        }
    }

    pub fn position(&self) -> DateTime<Utc> {
        self.position
    }

    fn advance(&mut self, changed_at: DateTime<Utc>) {
        if changed_at > self.position {
            self.position = changed_at;
        }
    }

    /// Records `key`; `false` if it was already recorded.
    fn remember(&mut self, key: String, changed_at: DateTime<Utc>) -> bool {
        self.seen.insert(key, changed_at).is_none()
    }

    fn forget_before(&mut self, floor: DateTime<Utc>) {
        self.seen.retain(|_, at| *at >= floor);
    }
}

pub struct OrderFeedPoller {
    source: Arc<dyn OrderSource>,
    feed: OrderChangeFeed,
    poll_interval: Duration,
    overlap: TimeDelta,
    shutdown: Arc<Notify>,
}

impl OrderFeedPoller {
    pub fn new(source: Arc<dyn OrderSource>, feed: OrderChangeFeed, poll_interval: Duration) -> Self {
        Self {
            source,
            feed,
            poll_interval,
            overlap: overlap_delta(DEFAULT_POLL_OVERLAP),
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// How far behind the cursor each poll looks again (default 10 s).
    pub fn with_overlap(mut self, overlap: Duration) -> Self {
        self.overlap = overlap_delta(overlap);
        self
    }

    /// Fetches changes inside the overlap window and after the cursor, publishes the ones not
    /// published before and advances the cursor. Rows that do not decode are logged once and
    /// skipped. Returns the number of events published.
    pub async fn poll_once(&self, cursor: &mut FeedCursor) -> Result<usize, ServiceError> {
        let since = cursor.position - self.overlap;
        let rows = self.source.changed_since(since).await?;

        let mut fresh = Vec::new();
        for row in rows {
            match Order::deserialize(&row) {
                Ok(order) => {
                    let changed_at = order.changed_at();
                    cursor.advance(changed_at);
                    let key = format!("{}@{}", order.id, changed_at.to_rfc3339());
                    if cursor.remember(key, changed_at) {
                        fresh.push(order);
                    }
                }
                Err(e) => {
                    let changed_at = row_changed_at(&row);
                    if let Some(at) = changed_at {
                        cursor.advance(at);
                    }
                    let stamp = changed_at.unwrap_or(cursor.position);
                    if cursor.remember(row.to_string(), stamp) {
                        warn!(row = %row, "Skipping order row that does not decode: {}", e);
                    }
                }
            }
        }
        fresh.sort_by_key(Order::changed_at);

        let count = fresh.len();
        for order in fresh {
            let kind = event_kind(&order);
            debug!(order_id = %order.id, ?kind, "Publishing order change");
            self.feed.publish(OrderEvent { kind, order });
        }
        cursor.forget_before(cursor.position - self.overlap);
        Ok(count)
    }

    /// Starts the background polling loop. The loop ends after `shutdown` is called.
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut cursor = FeedCursor::starting_at(Utc::now());
            let mut ticker = interval(self.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(interval = ?self.poll_interval, overlap = %self.overlap, "Order feed poller started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match self.poll_once(&mut cursor).await {
                            Ok(0) => {}
                            Ok(n) => debug!(events = n, "Order feed poll published events"),
                            Err(e) => warn!("Order feed poll failed: {}", e),
                        }
                    }
                    _ = self.shutdown.notified() => {
                        info!("Order feed poller stopping");
                        break;
                    }
                }
            }
        })
    }

    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}

/// A row whose `updated_at` is later than its `created_at` has been modified since insertion.
fn event_kind(order: &Order) -> OrderEventKind {
    match order.updated_at {
        Some(updated) if updated > order.created_at => OrderEventKind::Update,
        _ => OrderEventKind::Insert,
    }
}

fn overlap_delta(overlap: Duration) -> TimeDelta {
    TimeDelta::from_std(overlap).unwrap_or(TimeDelta::zero())
}

fn row_timestamp(row: &JsonValue, field: &str) -> Option<DateTime<Utc>> {
    let raw = row.get(field)?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Best-effort change time of a raw row, for rows that do not decode as an `Order`.
fn row_changed_at(row: &JsonValue) -> Option<DateTime<Utc>> {
    match (row_timestamp(row, "created_at"), row_timestamp(row, "updated_at")) {
        (Some(c), Some(u)) => Some(c.max(u)),
        (c, u) => c.or(u),
    }
}
