pub mod middleware;
pub mod router;
pub mod types;
pub mod handlers {
    pub mod admin;
    pub mod catalog;
    pub mod health;
    pub mod mpesa;
    pub mod transactions;
    pub mod upload;
}

pub use middleware::RouteGuard;
pub use router::{create_router, ApiDoc};
pub use types::AppState;
