//! Shared fixtures: fake payment provider, fake backend platform, and an in-process API server
//! bound to an ephemeral port.

#![allow(dead_code)]

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use better_days_closet::infra::config::{
    GuardSettings, MpesaSettings, PlatformSettings, Settings, UploadSettings,
};
use better_days_closet::transport::http::{create_router, AppState, RouteGuard};
use better_days_closet::TransactionMonitor;
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Nothing listens here; used for upstreams a test must not reach.
pub const UNREACHABLE: &str = "http://127.0.0.1:9";

/// Serves `router` on an ephemeral port and returns its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn settings(mpesa_url: &str, platform_url: &str) -> Settings {
    Settings {
        bind_address: "127.0.0.1:0".to_string(),
        base_url: "https://shop.example".to_string(),
        mpesa: MpesaSettings {
            base_url: mpesa_url.to_string(),
            consumer_key: "consumer-key".to_string(),
            consumer_secret: "consumer-secret".to_string(),
            shortcode: "174379".to_string(),
            passkey: "test-passkey".to_string(),
            account_reference: "BetterDaysCloset".to_string(),
            transaction_desc: "Payment for order".to_string(),
            timeout: Some(Duration::from_secs(10)),
        },
        platform: PlatformSettings {
            url: platform_url.to_string(),
            anon_key: "anon-key".to_string(),
            service_role_key: "service-role-key".to_string(),
        },
        upload: UploadSettings::default(),
        guard: GuardSettings::default(),
        order_poll_interval: Duration::from_millis(50),
    }
}

/// Starts the API with production wiring against the given upstreams.
pub async fn spawn_app(settings: &Settings, monitor: TransactionMonitor) -> String {
    let state = AppState::from_settings(settings, monitor).unwrap();
    serve(create_router(
        state,
        RouteGuard::new(&settings.guard),
        settings.upload.max_bytes,
    ))
    .await
}

/// reqwest client that does not follow redirects, so guard responses can be inspected.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap()
}

// --- Fake M-PESA provider ---

#[derive(Clone)]
pub struct FakeMpesa {
    pub token_status: StatusCode,
    pub push_status: StatusCode,
    /// Held before the push handler answers.
    pub push_delay: Option<Duration>,
    pub token_calls: Arc<AtomicUsize>,
    pub push_calls: Arc<AtomicUsize>,
    pub last_push: Arc<Mutex<Option<(HeaderMap, JsonValue)>>>,
}

impl FakeMpesa {
    pub fn new(token_status: StatusCode, push_status: StatusCode) -> Self {
        Self {
            token_status,
            push_status,
            push_delay: None,
            token_calls: Arc::new(AtomicUsize::new(0)),
            push_calls: Arc::new(AtomicUsize::new(0)),
            last_push: Arc::new(Mutex::new(None)),
        }
    }

    pub fn token_calls(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
    }

    pub fn push_calls(&self) -> usize {
        self.push_calls.load(Ordering::SeqCst)
    }

    pub async fn start(&self) -> String {
        let router = Router::new()
            .route("/oauth/v1/generate", get(fake_token))
            .route("/mpesa/stkpush/v1/processrequest", post(fake_push))
            .with_state(self.clone());
        serve(router).await
    }
}

async fn fake_token(
    State(fake): State<FakeMpesa>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    fake.token_calls.fetch_add(1, Ordering::SeqCst);
    let has_basic = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("Basic "))
        .unwrap_or(false);
    if !has_basic || query.get("grant_type").map(String::as_str) != Some("client_credentials") {
        return (StatusCode::BAD_REQUEST, Json(json!({ "errorMessage": "bad token request" })))
            .into_response();
    }
    if fake.token_status != StatusCode::OK {
        return (
            fake.token_status,
            Json(json!({ "errorCode": "401.002.01", "errorMessage": "Error Occurred - Invalid Access Token" })),
        )
            .into_response();
    }
    Json(json!({ "access_token": "fake-access-token", "expires_in": "3599" })).into_response()
}

async fn fake_push(
    State(fake): State<FakeMpesa>,
    headers: HeaderMap,
    Json(body): Json<JsonValue>,
) -> Response {
    fake.push_calls.fetch_add(1, Ordering::SeqCst);
    *fake.last_push.lock().unwrap() = Some((headers, body));
    if let Some(delay) = fake.push_delay {
        tokio::time::sleep(delay).await;
    }
    if fake.push_status != StatusCode::OK {
        return (
            fake.push_status,
            Json(json!({
                "requestId": "6e86-45dd-91ac-fd5d4178ab523",
                "errorCode": "400.002.02",
                "errorMessage": "Bad Request - Invalid PhoneNumber"
            })),
        )
            .into_response();
    }
    Json(json!({
        "MerchantRequestID": "29115-34620561-1",
        "CheckoutRequestID": "ws_CO_191220191020363925",
        "ResponseCode": "0",
        "ResponseDescription": "Success. Request accepted for processing",
        "CustomerMessage": "Success. Request accepted for processing"
    }))
    .into_response()
}

// --- Fake backend platform ---

#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub bucket: String,
    pub path: String,
    pub bytes: usize,
    pub content_type: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Clone, Default)]
pub struct FakePlatform {
    pub fail_uploads: bool,
    /// Serve the same order rows on every poll instead of draining them.
    pub sticky_orders: bool,
    pub fail_profile_upserts: Arc<AtomicBool>,
    pub deleted_users: Arc<Mutex<Vec<String>>>,
    pub user_seq: Arc<AtomicUsize>,
    pub uploads: Arc<Mutex<Vec<RecordedUpload>>>,
    pub orders: Arc<Mutex<Vec<JsonValue>>>,
    pub order_queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    pub profiles: Arc<Mutex<Vec<JsonValue>>>,
    pub auth_users: Arc<Mutex<Vec<JsonValue>>>,
    pub products: Arc<Mutex<Vec<JsonValue>>>,
    pub categories: Arc<Mutex<Vec<JsonValue>>>,
}

impl FakePlatform {
    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub async fn start(&self) -> String {
        let router = Router::new()
            .route("/storage/v1/object/:bucket/*path", post(fake_storage_upload))
            .route("/rest/v1/orders", get(fake_orders))
            .route("/rest/v1/profiles", get(fake_profiles).post(fake_profile_upsert))
            .route("/rest/v1/products", get(fake_products))
            .route("/rest/v1/categories", get(fake_categories))
            .route("/auth/v1/admin/users", post(fake_create_user))
            .route("/auth/v1/admin/users/:id", delete(fake_delete_user))
            .with_state(self.clone());
        serve(router).await
    }
}

async fn fake_storage_upload(
    State(fake): State<FakePlatform>,
    Path((bucket, path)): Path<(String, String)>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Response {
    if fake.fail_uploads {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "statusCode": "404", "error": "Bucket not found", "message": "Bucket not found" })),
        )
            .into_response();
    }
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    fake.uploads.lock().unwrap().push(RecordedUpload {
        bucket: bucket.clone(),
        path: path.clone(),
        bytes: body.len(),
        content_type: header("content-type"),
        api_key: header("apikey"),
    });
    Json(json!({ "Key": format!("{}/{}", bucket, path) })).into_response()
}

async fn fake_orders(
    State(fake): State<FakePlatform>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Vec<JsonValue>> {
    fake.order_queries.lock().unwrap().push(query);
    let mut orders = fake.orders.lock().unwrap();
    if fake.sticky_orders {
        Json(orders.clone())
    } else {
        Json(orders.drain(..).collect())
    }
}

async fn fake_profiles(
    State(fake): State<FakePlatform>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Vec<JsonValue>> {
    let wanted_role = query
        .get("role")
        .and_then(|r| r.strip_prefix("eq."))
        .map(str::to_string);
    let profiles = fake.profiles.lock().unwrap();
    Json(
        profiles
            .iter()
            .filter(|p| match &wanted_role {
                Some(role) => p["role"] == JsonValue::String(role.clone()),
                None => true,
            })
            .cloned()
            .collect(),
    )
}

async fn fake_profile_upsert(
    State(fake): State<FakePlatform>,
    Json(row): Json<JsonValue>,
) -> Response {
    if fake.fail_profile_upserts.load(Ordering::SeqCst) {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "message": "upstream connect error" })),
        )
            .into_response();
    }
    fake.profiles.lock().unwrap().push(row);
    StatusCode::CREATED.into_response()
}

async fn fake_create_user(
    State(fake): State<FakePlatform>,
    Json(body): Json<JsonValue>,
) -> Response {
    let mut users = fake.auth_users.lock().unwrap();
    if users.iter().any(|u| u["email"] == body["email"]) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "msg": "A user with this email address has already been registered" })),
        )
            .into_response();
    }
    let seq = fake.user_seq.fetch_add(1, Ordering::SeqCst) + 1;
    let user = json!({
        "id": format!("00000000-0000-0000-0000-{:012}", seq),
        "email": body["email"],
        "email_confirm": body["email_confirm"],
        "user_metadata": body["user_metadata"],
    });
    users.push(user.clone());
    Json(user).into_response()
}

async fn fake_delete_user(State(fake): State<FakePlatform>, Path(id): Path<String>) -> StatusCode {
    let mut users = fake.auth_users.lock().unwrap();
    let before = users.len();
    users.retain(|u| u["id"].as_str() != Some(id.as_str()));
    if users.len() == before {
        return StatusCode::NOT_FOUND;
    }
    fake.deleted_users.lock().unwrap().push(id);
    StatusCode::OK
}

async fn fake_products(
    State(fake): State<FakePlatform>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Vec<JsonValue>> {
    let products = fake.products.lock().unwrap();
    let id = query.get("id").and_then(|v| v.strip_prefix("eq."));
    Json(
        products
            .iter()
            .filter(|p| match id {
                Some(id) => p["id"].as_str() == Some(id),
                None => true,
            })
            .cloned()
            .collect(),
    )
}

async fn fake_categories(State(fake): State<FakePlatform>) -> Json<Vec<JsonValue>> {
    Json(fake.categories.lock().unwrap().clone())
}
