//! Subsidy service wrappers: redemption submission, status polling, and
//! can-redeem policy resolution

use reqwest::Method;
use serde_json::json;

use super::{ApiClient, ApiError};
use crate::types::{CanRedeemResponse, SubsidyTransaction};

impl ApiClient {
    /// Submit a redemption against a policy's redemption URL.
    ///
    /// Issues exactly one POST; there is no automatic retry. The returned
    /// transaction may already be terminal when fulfillment is synchronous.
    pub async fn submit_redemption(
        &self,
        policy_redemption_url: &str,
        user_id: u64,
        content_key: &str,
        metadata: Option<serde_json::Value>,
    ) -> Result<SubsidyTransaction, ApiError> {
        let body = json!({
            "lms_user_id": user_id,
            "content_key": content_key,
            "metadata": metadata,
        });
        self.send_json(
            self.request(Method::POST, policy_redemption_url).json(&body),
        )
        .await
    }

    /// Fetch the current snapshot of a transaction from its status URL
    pub async fn fetch_transaction(
        &self,
        transaction_status_api_url: &str,
    ) -> Result<SubsidyTransaction, ApiError> {
        self.send_json(self.request(Method::GET, transaction_status_api_url))
            .await
    }

    /// Resolve redeemability (and the covering policy) for content keys
    pub async fn fetch_can_redeem(
        &self,
        enterprise_uuid: &str,
        content_keys: &[&str],
    ) -> Result<Vec<CanRedeemResponse>, ApiError> {
        let url = format!(
            "{}/api/v1/policy-redemption/enterprise-customer/{}/can-redeem/",
            self.config().api.enterprise_access_base_url,
            enterprise_uuid,
        );
        let query: Vec<(&str, &str)> =
            content_keys.iter().map(|key| ("content_key", *key)).collect();
        self.send_json(self.request(Method::GET, &url).query(&query))
            .await
    }
}
