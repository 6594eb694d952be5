use crate::app::admin_service::{AdminStatus, CreateAdminRequest, CreatedAdmin};
use crate::domain::catalog::{Category, Product, ProductDetail, Variant};
use crate::domain::payment::{CallbackAck, StkPushRequest};
use crate::domain::upload::StoredObject;
use crate::domain::{MonitoredOrder, Order, OrderEventKind, OrderId, OrderStatus};
use crate::transport::http::handlers::{admin, catalog, health, mpesa, transactions, upload};
use crate::transport::http::middleware::{require_session, RouteGuard};
use crate::transport::http::types::{AppState, ErrorBody, HealthResponse, UploadForm};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{middleware, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        mpesa::stk_push_handler,
        mpesa::callback_handler,
        upload::upload_handler,
        admin::admin_status_handler,
        admin::create_admin_handler,
        catalog::list_categories_handler,
        catalog::list_products_handler,
        catalog::get_product_handler,
        transactions::transactions_handler
    ),
    components(schemas(
        ErrorBody,
        HealthResponse,
        StkPushRequest,
        CallbackAck,
        UploadForm,
        StoredObject,
        AdminStatus,
        CreateAdminRequest,
        CreatedAdmin,
        Category,
        Product,
        ProductDetail,
        Variant,
        MonitoredOrder,
        Order,
        OrderId,
        OrderStatus,
        OrderEventKind
    ))
)]
#[allow(dead_code)]
pub struct ApiDoc;

/// Builds the full router. `guard` gates the protected page prefixes; uploads may be up to
/// `upload_max_bytes` long.
pub fn create_router(app_state: AppState, guard: RouteGuard, upload_max_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route("/api/mpesa/stkpush", post(mpesa::stk_push_handler))
        .route("/api/mpesa/callback", post(mpesa::callback_handler))
        .route(
            "/api/upload",
            post(upload::upload_handler).layer(DefaultBodyLimit::max(upload_max_bytes)),
        )
        .route(
            "/api/admin/create-admin",
            get(admin::admin_status_handler).post(admin::create_admin_handler),
        )
        .route("/api/categories", get(catalog::list_categories_handler))
        .route("/api/products", get(catalog::list_products_handler))
        .route("/api/products/:id", get(catalog::get_product_handler))
        .route("/admin/transactions", get(transactions::transactions_handler))
        .fallback(health::not_found_handler)
        .layer(middleware::from_fn_with_state(Arc::new(guard), require_session))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
