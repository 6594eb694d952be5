// src/bin/api_server.rs

use better_days_closet::infra::platform::PlatformClient;
use better_days_closet::transport;
use better_days_closet::{OrderChangeFeed, OrderFeedPoller, Settings, TransactionMonitor};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    // --- Change feed + transaction monitor ---
    info!("Starting order feed (poll interval {:?})...", settings.order_poll_interval);
    let feed = OrderChangeFeed::default();
    let monitor = TransactionMonitor::new();
    let subscription = monitor.subscribe(feed.subscribe());

    let platform = PlatformClient::new(settings.platform.clone())?;
    let poller = Arc::new(OrderFeedPoller::new(
        Arc::new(platform),
        feed.clone(),
        settings.order_poll_interval,
    ));
    let poller_task = poller.clone().start();

    // --- Service Initialization ---
    let app_state = transport::http::AppState::from_settings(&settings, monitor)?;
    info!("Payment callbacks will be delivered to {}", app_state.payments.callback_url());

    // --- API Server Initialization ---
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    let app = transport::http::create_router(
        app_state,
        transport::http::RouteGuard::new(&settings.guard),
        settings.upload.max_bytes,
    )
    .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()))
    .layer(cors);

    let listener = tokio::net::TcpListener::bind(&settings.bind_address).await?;
    info!("API server listening on http://{}", settings.bind_address);
    info!("Swagger UI available at http://{}/swagger-ui", settings.bind_address);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    info!("Shutting down order feed...");
    poller.shutdown();
    if let Err(e) = poller_task.await {
        error!("Order feed poller ended abnormally: {}", e);
    }
    subscription.unsubscribe().await;

    served?;
    info!("Graceful shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
