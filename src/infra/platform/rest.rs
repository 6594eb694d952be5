//! Table access through the platform's PostgREST endpoint (`/rest/v1`).

use super::PlatformClient;
use crate::app::error::ServiceError;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

const REST_PREFIX: &str = "/rest/v1";

/// PostgREST query parameters, e.g. `[("select", "*"), ("role", "eq.admin")]`.
pub type Query<'a> = [(&'a str, String)];

impl PlatformClient {
    /// `GET /rest/v1/{table}?{query}` decoded into rows of `T`.
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query<'_>,
    ) -> Result<Vec<T>, ServiceError> {
        let response = self
            .service(Method::GET, &format!("{}/{}", REST_PREFIX, table))
            .query(query)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json::<Vec<T>>().await?)
    }

    /// Inserts one row and returns the stored representation.
    pub async fn insert_returning(
        &self,
        table: &str,
        row: &JsonValue,
    ) -> Result<Vec<JsonValue>, ServiceError> {
        let response = self
            .service(Method::POST, &format!("{}/{}", REST_PREFIX, table))
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json::<Vec<JsonValue>>().await?)
    }

    /// Inserts or merges one row on its primary key.
    pub async fn upsert(&self, table: &str, row: &JsonValue) -> Result<(), ServiceError> {
        let response = self
            .service(Method::POST, &format!("{}/{}", REST_PREFIX, table))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(row)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// `DELETE /rest/v1/{table}?{column}=eq.{value}`.
    pub async fn delete_eq(
        &self,
        table: &str,
        column: &str,
        value: &str,
    ) -> Result<(), ServiceError> {
        let response = self
            .service(Method::DELETE, &format!("{}/{}", REST_PREFIX, table))
            .query(&[(column, format!("eq.{}", value))])
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// The OpenAPI description PostgREST serves at its root. Used for schema inspection.
    pub async fn rest_openapi(&self) -> Result<JsonValue, ServiceError> {
        let response = self
            .service(Method::GET, &format!("{}/", REST_PREFIX))
            .header("Accept", "application/openapi+json")
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json::<JsonValue>().await?)
    }
}

/// Quotes a filter value for use inside a PostgREST `or=(...)` group, where `,.:()` are
/// reserved.
pub fn quote_filter_value(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_values_are_quoted_and_escaped() {
        assert_eq!(
            quote_filter_value("2024-01-01T00:00:00.000000Z"),
            "\"2024-01-01T00:00:00.000000Z\""
        );
        assert_eq!(quote_filter_value("a\"b"), "\"a\\\"b\"");
    }
}
