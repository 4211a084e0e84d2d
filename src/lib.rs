//! Enterprise learner portal client
//!
//! Data-orchestration layer for an enterprise online-education portal:
//! subsidy redemption with transaction polling, an injected client-side
//! query cache, and route data loaders that prime it before a page renders.

pub mod analytics;
pub mod config;
pub mod enroll;
pub mod loaders;
pub mod metrics;
pub mod observability;
pub mod query_store;
pub mod services;
pub mod test_utils;
pub mod types;

// Re-export commonly used entry points
pub use config::PortalConfig;
pub use enroll::{EnrollCallbacks, EnrollError, StatefulEnroll};
pub use loaders::{LoaderContext, LoaderOutcome};
pub use query_store::{QueryKey, QueryStore};
pub use services::{ApiClient, ApiError};
