use crate::domain::catalog::{Category, Product, ProductDetail};
use crate::transport::http::types::{AppState, ErrorBody, ProductQuery};
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "All categories by name", body = Vec<Category>),
        (status = 502, description = "Platform request failed", body = ErrorBody)
    )
)]
pub async fn list_categories_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.catalog.categories().await {
        Ok(categories) => Json(categories).into_response(),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(ProductQuery),
    responses(
        (status = 200, description = "Products, newest first", body = Vec<Product>),
        (status = 502, description = "Platform request failed", body = ErrorBody)
    )
)]
pub async fn list_products_handler(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> impl IntoResponse {
    match state
        .catalog
        .products(query.category.as_deref(), query.limit)
        .await
    {
        Ok(products) => Json(products).into_response(),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product with its variants", body = ProductDetail),
        (status = 404, description = "No such product", body = ErrorBody),
        (status = 502, description = "Platform request failed", body = ErrorBody)
    )
)]
pub async fn get_product_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.catalog.product(&id).await {
        Ok(product) => Json(product).into_response(),
        Err(e) => e.into_response(),
    }
}
