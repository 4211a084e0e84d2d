//! Redemption submission
//!
//! Wraps the "submit redemption" POST as a one-shot mutation. A failed
//! submission is returned to the caller as-is; re-invoking `redeem()` is the
//! only retry path.

use super::errors::EnrollError;
use crate::metrics::metrics;
use crate::services::ApiClient;
use crate::types::{SubsidyAccessPolicy, SubsidyTransaction};

/// One redemption submission against a resolved policy
#[derive(Debug)]
pub struct RedemptionRequest<'a> {
    /// Acting LMS user
    pub user_id: u64,

    /// Content to enroll in
    pub content_key: &'a str,

    /// Opaque metadata forwarded to the subsidy backend
    pub metadata: Option<serde_json::Value>,
}

impl<'a> RedemptionRequest<'a> {
    /// Issue the POST and return the created transaction snapshot
    pub async fn submit(
        self,
        api: &ApiClient,
        policy: &SubsidyAccessPolicy,
    ) -> Result<SubsidyTransaction, EnrollError> {
        metrics().redemptions_submitted.inc();
        tracing::debug!(
            user_id = %self.user_id,
            content_key = %self.content_key,
            policy_uuid = %policy.uuid,
            "Submitting redemption"
        );
        let transaction = api
            .submit_redemption(
                &policy.policy_redemption_url,
                self.user_id,
                self.content_key,
                self.metadata,
            )
            .await?;
        Ok(transaction)
    }
}
