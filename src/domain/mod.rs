//! Domain records and the pure logic around them.

pub mod catalog;
pub mod monitor;
pub mod order;
pub mod payment;
pub mod upload;

pub use monitor::{MonitorSubscription, MonitoredOrder, TransactionMonitor};
pub use order::{Order, OrderEvent, OrderEventKind, OrderId, OrderStatus};
