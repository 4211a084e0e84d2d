//! Route data loaders
//!
//! Each loader runs before its page renders and primes the injected
//! [`QueryStore`] with the data the page needs. Loaders signal navigation by
//! returning [`LoaderOutcome::Redirect`] as an ordinary value; they never
//! fail a route. Every fetch error is logged and reduced to a neutral
//! fallback so rendering proceeds with degraded data.

mod active_enterprise;
mod app_data;
mod course;

pub use active_enterprise::ensure_active_enterprise_customer_user;
pub use app_data::{ensure_enterprise_app_data, EnterpriseAppData};
pub use course::{course_loader, CourseLoaderData};

use std::sync::Arc;

use crate::config::PortalConfig;
use crate::query_store::QueryStore;
use crate::services::ApiClient;
use crate::types::AuthenticatedUser;

/// Result of a route loader: either data for the page or a navigation target
#[derive(Debug, Clone, PartialEq)]
pub enum LoaderOutcome<T> {
    /// Proceed to render with this data
    Continue(T),
    /// Navigate to this path instead of rendering
    Redirect(String),
}

impl<T> LoaderOutcome<T> {
    /// Whether this outcome is a redirect
    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect(_))
    }

    /// The continue payload, if any
    pub fn into_continue(self) -> Option<T> {
        match self {
            Self::Continue(data) => Some(data),
            Self::Redirect(_) => None,
        }
    }

    /// The redirect target, if any
    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Self::Continue(_) => None,
            Self::Redirect(path) => Some(path),
        }
    }
}

/// Shared dependencies injected into every loader
#[derive(Debug, Clone)]
pub struct LoaderContext {
    /// Authenticated REST client
    pub api: Arc<ApiClient>,

    /// Injected query cache
    pub store: Arc<QueryStore>,

    /// Application configuration
    pub config: Arc<PortalConfig>,

    /// Authenticated user, when one is resolved
    pub authenticated_user: Option<AuthenticatedUser>,
}

impl LoaderContext {
    /// Resolve the authenticated user; loaders short-circuit to a no-op
    /// when this is `None`.
    pub fn ensure_authenticated_user(&self) -> Option<&AuthenticatedUser> {
        self.authenticated_user.as_ref()
    }
}

/// Build the login redirect for an unauthenticated request, carrying the
/// request URL as the return-to target.
pub fn login_redirect_url(config: &PortalConfig, request_url: &str) -> String {
    match reqwest::Url::parse_with_params(&config.auth.login_url, &[("next", request_url)]) {
        Ok(url) => url.to_string(),
        Err(error) => {
            tracing::warn!(%error, "Configured login URL is not parseable");
            config.auth.login_url.clone()
        }
    }
}
