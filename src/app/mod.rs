//! Service layer: one service per externally visible feature.

pub mod admin_service;
pub mod catalog_service;
pub mod error;
pub mod payment_service;
pub mod upload_service;

pub use admin_service::AdminService;
pub use catalog_service::CatalogService;
pub use error::ServiceError;
pub use payment_service::PaymentService;
pub use upload_service::UploadService;
