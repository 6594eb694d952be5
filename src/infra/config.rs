//! Centralized configuration (environment variables + defaults).
//!
//! `Settings::from_env` is what the API server uses; the maintenance binaries only need
//! `PlatformSettings::from_env`.

use std::time::Duration;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_MPESA_BASE_URL: &str = "https://sandbox.safaricom.co.ke";
const DEFAULT_ACCOUNT_REFERENCE: &str = "BetterDaysCloset";
const DEFAULT_TRANSACTION_DESC: &str = "Payment for order";
const DEFAULT_UPLOAD_BUCKET: &str = "product-images";
const DEFAULT_UPLOAD_MAX_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_PROTECTED_PREFIXES: &str = "/admin,/account";
const DEFAULT_SESSION_COOKIE: &str = "sb-access-token";
const DEFAULT_LOGIN_PATH: &str = "/login";
const DEFAULT_ORDER_POLL_INTERVAL_SECS: u64 = 5;

/// Everything the API server needs to start.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_address: String,
    /// Public base URL of this service, used to build the provider callback URL.
    pub base_url: String,
    pub mpesa: MpesaSettings,
    pub platform: PlatformSettings,
    pub upload: UploadSettings,
    pub guard: GuardSettings,
    pub order_poll_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct MpesaSettings {
    pub base_url: String,
    pub consumer_key: String,
    pub consumer_secret: String,
    pub shortcode: String,
    pub passkey: String,
    pub account_reference: String,
    pub transaction_desc: String,
    /// Unset means outbound provider calls never time out.
    pub timeout: Option<Duration>,
}

/// Hosted backend platform (tables, auth, storage).
#[derive(Debug, Clone)]
pub struct PlatformSettings {
    pub url: String,
    pub anon_key: String,
    pub service_role_key: String,
}

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub default_bucket: String,
    pub max_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct GuardSettings {
    pub protected_prefixes: Vec<String>,
    pub session_cookie: String,
    pub login_path: String,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let poll_secs = parsed_or("ORDER_POLL_INTERVAL_SECS", DEFAULT_ORDER_POLL_INTERVAL_SECS)?;

        Ok(Self {
            bind_address: or_default("BIND_ADDRESS", DEFAULT_BIND_ADDRESS),
            base_url: trim_url(&or_default("BASE_URL", DEFAULT_BASE_URL)),
            mpesa: MpesaSettings::from_env()?,
            platform: PlatformSettings::from_env()?,
            upload: UploadSettings {
                default_bucket: or_default("UPLOAD_DEFAULT_BUCKET", DEFAULT_UPLOAD_BUCKET),
                max_bytes: parsed_or("UPLOAD_MAX_BYTES", DEFAULT_UPLOAD_MAX_BYTES)?,
            },
            guard: GuardSettings {
                protected_prefixes: split_prefixes(&or_default(
                    "PROTECTED_PREFIXES",
                    DEFAULT_PROTECTED_PREFIXES,
                )),
                session_cookie: or_default("SESSION_COOKIE", DEFAULT_SESSION_COOKIE),
                login_path: or_default("LOGIN_PATH", DEFAULT_LOGIN_PATH),
            },
            order_poll_interval: Duration::from_secs(poll_secs.max(1)),
        })
    }
}

impl MpesaSettings {
    pub fn from_env() -> anyhow::Result<Self> {
        let timeout = match optional("MPESA_TIMEOUT_SECS") {
            Some(v) => Some(Duration::from_secs(v.parse::<u64>().map_err(|e| {
                anyhow::anyhow!("MPESA_TIMEOUT_SECS must be a number of seconds: {}", e)
            })?)),
            None => None,
        };

        Ok(Self {
            base_url: trim_url(&or_default("MPESA_BASE_URL", DEFAULT_MPESA_BASE_URL)),
            consumer_key: required("MPESA_CONSUMER_KEY")?,
            consumer_secret: required("MPESA_CONSUMER_SECRET")?,
            shortcode: required("MPESA_SHORTCODE")?,
            passkey: required("MPESA_PASSKEY")?,
            account_reference: or_default("MPESA_ACCOUNT_REFERENCE", DEFAULT_ACCOUNT_REFERENCE),
            transaction_desc: or_default("MPESA_TRANSACTION_DESC", DEFAULT_TRANSACTION_DESC),
            timeout,
        })
    }
}

impl PlatformSettings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        Ok(Self {
            url: trim_url(&required("SUPABASE_URL")?),
            anon_key: required("SUPABASE_ANON_KEY")?,
            service_role_key: required("SUPABASE_SERVICE_ROLE_KEY")?,
        })
    }
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self {
            protected_prefixes: split_prefixes(DEFAULT_PROTECTED_PREFIXES),
            session_cookie: DEFAULT_SESSION_COOKIE.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
        }
    }
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            default_bucket: DEFAULT_UPLOAD_BUCKET.to_string(),
            max_bytes: DEFAULT_UPLOAD_MAX_BYTES,
        }
    }
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn required(key: &str) -> anyhow::Result<String> {
    optional(key).ok_or_else(|| anyhow::anyhow!("{} must be set", key))
}

fn or_default(key: &str, default: &str) -> String {
    optional(key).unwrap_or_else(|| default.to_string())
}

fn parsed_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match optional(key) {
        Some(v) => v
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid {} value '{}': {}", key, v, e)),
        None => Ok(default),
    }
}

fn trim_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn split_prefixes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            if p.starts_with('/') {
                p.to_string()
            } else {
                format!("/{}", p)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_are_trimmed_and_rooted() {
        assert_eq!(
            split_prefixes(" /admin, account ,,"),
            vec!["/admin".to_string(), "/account".to_string()]
        );
    }

    #[test]
    fn urls_lose_trailing_slashes() {
        assert_eq!(trim_url("https://example.supabase.co/ "), "https://example.supabase.co");
    }
}
