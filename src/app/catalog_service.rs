use crate::app::error::ServiceError;
use crate::domain::catalog::{Category, Product, ProductDetail};
use crate::infra::platform::PlatformClient;

const DEFAULT_PRODUCT_LIMIT: u32 = 50;
const MAX_PRODUCT_LIMIT: u32 = 200;

/// Read-only catalog queries for the storefront.
pub struct CatalogService {
    platform: PlatformClient,
}

impl CatalogService {
    pub fn new(platform: PlatformClient) -> Self {
        Self { platform }
    }

    pub async fn categories(&self) -> Result<Vec<Category>, ServiceError> {
        self.platform
            .select(
                "categories",
                &[("select", "*".to_string()), ("order", "name.asc".to_string())],
            )
            .await
    }

    /// Newest products first, optionally restricted to one category.
    pub async fn products(
        &self,
        category_id: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<Product>, ServiceError> {
        let limit = limit
            .unwrap_or(DEFAULT_PRODUCT_LIMIT)
            .clamp(1, MAX_PRODUCT_LIMIT);

        let mut query = vec![
            ("select", "*".to_string()),
            ("order", "created_at.desc".to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(category) = category_id.map(str::trim).filter(|c| !c.is_empty()) {
            query.push(("category_id", format!("eq.{}", category)));
        }
        self.platform.select("products", &query).await
    }

    pub async fn product(&self, id: &str) -> Result<ProductDetail, ServiceError> {
        let rows: Vec<ProductDetail> = self
            .platform
            .select(
                "products",
                &[
                    ("select", "*,variants(*)".to_string()),
                    ("id", format!("eq.{}", id)),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| ServiceError::NotFound(format!("Product '{}' not found", id)))
    }
}
