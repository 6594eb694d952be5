//! Route protection by session-cookie presence.
//!
//! Requests whose path starts with a protected prefix are redirected to the login page unless
//! they carry a non-empty session cookie. The cookie value is not verified: any value passes.

use crate::infra::config::GuardSettings;
use axum::extract::{Request, State};
use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RouteGuard {
    protected_prefixes: Vec<String>,
    session_cookie: String,
    login_path: String,
}

impl RouteGuard {
    pub fn new(settings: &GuardSettings) -> Self {
        Self {
            protected_prefixes: settings.protected_prefixes.clone(),
            session_cookie: settings.session_cookie.clone(),
            login_path: settings.login_path.clone(),
        }
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// `true` when `path` equals a protected prefix or lies below it (`/admin`, `/admin/x`,
    /// but not `/administrator`). The login page itself is never protected.
    pub fn is_protected(&self, path: &str) -> bool {
        if path.trim_end_matches('/') == self.login_path.trim_end_matches('/') {
            return false;
        }
        self.protected_prefixes.iter().any(|prefix| {
            let prefix = prefix.trim_end_matches('/');
            path == prefix
                || path
                    .strip_prefix(prefix)
                    .map(|rest| rest.starts_with('/'))
                    .unwrap_or(false)
        })
    }

    pub fn has_session(&self, headers: &HeaderMap) -> bool {
        cookie_value(headers, &self.session_cookie)
            .map(|v| !v.is_empty())
            .unwrap_or(false)
    }
}

/// Value of cookie `name` across all `Cookie` headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| k.trim() == name)
        .map(|(_, v)| v.trim().trim_matches('"').to_string())
}

pub async fn require_session(
    State(guard): State<Arc<RouteGuard>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    if guard.is_protected(path) && !guard.has_session(request.headers()) {
        debug!(path, "No session cookie on protected path; redirecting to login");
        return Redirect::temporary(guard.login_path()).into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn guard() -> RouteGuard {
        RouteGuard::new(&GuardSettings::default())
    }

    fn headers(cookie: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        h
    }

    #[test]
    fn prefixes_match_on_segment_boundaries() {
        let g = guard();
        assert!(g.is_protected("/admin"));
        assert!(g.is_protected("/admin/transactions"));
        assert!(g.is_protected("/account/orders"));
        assert!(!g.is_protected("/administrator"));
        assert!(!g.is_protected("/api/admin/create-admin"));
        assert!(!g.is_protected("/"));
    }

    #[test]
    fn login_page_stays_reachable_under_a_catch_all_prefix() {
        let g = RouteGuard::new(&GuardSettings {
            protected_prefixes: vec!["/".to_string()],
            ..GuardSettings::default()
        });
        assert!(!g.is_protected(g.login_path()));
        assert!(!g.is_protected("/login/"));
        assert!(g.is_protected("/anything"));
        assert!(g.is_protected("/login-help"));
    }

    #[test]
    fn any_non_empty_cookie_value_counts_as_a_session() {
        let g = guard();
        assert!(g.has_session(&headers("theme=dark; sb-access-token=not-a-real-jwt")));
        assert!(!g.has_session(&headers("sb-access-token=")));
        assert!(!g.has_session(&headers("theme=dark")));
        assert!(!g.has_session(&HeaderMap::new()));
    }

    #[test]
    fn cookie_values_are_unquoted() {
        assert_eq!(
            cookie_value(&headers("a=1; sb-access-token=\"tok\""), "sb-access-token").as_deref(),
            Some("tok")
        );
    }
}
