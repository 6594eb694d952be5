//! Initial administrator bootstrap.

use crate::app::error::ServiceError;
use crate::infra::platform::PlatformClient;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use tracing::{error, info, warn};
use utoipa::ToSchema;

const PROFILES_TABLE: &str = "profiles";
const ADMIN_ROLE: &str = "admin";

#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdminRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatus {
    pub admin_exists: bool,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedAdmin {
    pub user_id: String,
    pub email: String,
}

pub struct AdminService {
    platform: PlatformClient,
}

impl AdminService {
    pub fn new(platform: PlatformClient) -> Self {
        Self { platform }
    }

    pub async fn status(&self) -> Result<AdminStatus, ServiceError> {
        let rows: Vec<JsonValue> = self
            .platform
            .select(
                PROFILES_TABLE,
                &[
                    ("select", "id".to_string()),
                    ("role", format!("eq.{}", ADMIN_ROLE)),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(AdminStatus {
            admin_exists: !rows.is_empty(),
        })
    }

    /// Creates the first administrator. Refuses once any admin profile exists.
    ///
    /// The auth user is deleted again if its profile row cannot be written, so a failed attempt
    /// can be retried with the same email. Two concurrent requests can both pass the existence
    /// check; the platform has no uniqueness constraint on the admin role to stop the second.
    pub async fn create_initial_admin(
        &self,
        request: &CreateAdminRequest,
    ) -> Result<CreatedAdmin, ServiceError> {
        let email = non_blank(&request.email);
        let password = non_blank(&request.password);
        let (email, password) = match (email, password) {
            (Some(e), Some(p)) => (e, p),
            _ => return Err(ServiceError::validation("Email and password are required")),
        };

        if self.status().await?.admin_exists {
            return Err(ServiceError::Conflict("An admin account already exists".to_string()));
        }

        let user = self
            .platform
            .create_auth_user(
                email,
                password,
                json!({ "role": ADMIN_ROLE, "full_name": request.full_name }),
            )
            .await?;

        let profile = json!({
            "id": user.id,
            "email": email,
            "full_name": request.full_name,
            "role": ADMIN_ROLE,
        });
        if let Err(e) = self.platform.upsert(PROFILES_TABLE, &profile).await {
            warn!(user_id = %user.id, "Admin profile write failed; removing the auth user");
            if let Err(cleanup) = self.platform.delete_auth_user(&user.id).await {
                error!(user_id = %user.id, "Could not remove orphaned admin auth user: {}", cleanup);
            }
            return Err(e);
        }

        info!(user_id = %user.id, "Created initial admin account");
        Ok(CreatedAdmin {
            user_id: user.id,
            email: user.email.unwrap_or_else(|| email.to_string()),
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
