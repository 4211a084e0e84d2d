//! Analytics side-effect sinks fired on successful enrollment
//!
//! The enroll flow fires exactly two analytics events when a transaction
//! transitions into `committed`: a search conversion event and an
//! enterprise enrollment event. Callers inject the sink so tests can count
//! invocations instead of hitting a real analytics backend.

use crate::types::SubsidyTransaction;

/// Context attached to every enrollment analytics event
#[derive(Debug, Clone, Copy)]
pub struct EnrollmentEvent<'a> {
    /// Acting LMS user
    pub user_id: u64,

    /// Content the enrollment is for
    pub content_key: &'a str,

    /// Policy the redemption was charged against
    pub policy_uuid: &'a str,

    /// The committed transaction
    pub transaction: &'a SubsidyTransaction,
}

/// Sink for enrollment analytics side-effects
pub trait AnalyticsSink: Send + Sync {
    /// Generic search conversion event
    fn track_search_conversion(&self, event: &EnrollmentEvent<'_>);

    /// Experimentation (Optimizely-style) enrollment event
    fn track_enterprise_enrollment(&self, event: &EnrollmentEvent<'_>);
}

/// Production sink emitting structured log events
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingAnalytics;

impl AnalyticsSink for LoggingAnalytics {
    fn track_search_conversion(&self, event: &EnrollmentEvent<'_>) {
        tracing::info!(
            user_id = %event.user_id,
            content_key = %event.content_key,
            policy_uuid = %event.policy_uuid,
            transaction_uuid = %event.transaction.uuid,
            "Search conversion tracked"
        );
    }

    fn track_enterprise_enrollment(&self, event: &EnrollmentEvent<'_>) {
        tracing::info!(
            user_id = %event.user_id,
            content_key = %event.content_key,
            policy_uuid = %event.policy_uuid,
            transaction_uuid = %event.transaction.uuid,
            "Enterprise enrollment tracked"
        );
    }
}
