pub mod app;
pub mod domain;
pub mod infra;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::{AdminService, CatalogService, PaymentService, ServiceError, UploadService};
pub use domain::{TransactionMonitor, MonitorSubscription};
pub use infra::config::Settings;
pub use infra::feed::{OrderChangeFeed, OrderFeedPoller};
