//! Auth (GoTrue) endpoints used by the admin bootstrap and the email-resend script.

use super::PlatformClient;
use crate::app::error::ServiceError;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl PlatformClient {
    /// Creates a confirmed auth user through the admin API (service-role key required).
    pub async fn create_auth_user(
        &self,
        email: &str,
        password: &str,
        user_metadata: JsonValue,
    ) -> Result<AuthUser, ServiceError> {
        let response = self
            .service(Method::POST, "/auth/v1/admin/users")
            .json(&json!({
                "email": email,
                "password": password,
                "email_confirm": true,
                "user_metadata": user_metadata,
            }))
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json::<AuthUser>().await?)
    }

    /// Deletes an auth user through the admin API.
    pub async fn delete_auth_user(&self, user_id: &str) -> Result<(), ServiceError> {
        let response = self
            .service(Method::DELETE, &format!("/auth/v1/admin/users/{}", user_id))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Asks the platform to send the signup confirmation email again.
    pub async fn resend_signup_confirmation(&self, email: &str) -> Result<(), ServiceError> {
        let response = self
            .anon(Method::POST, "/auth/v1/resend")
            .json(&json!({ "type": "signup", "email": email }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
