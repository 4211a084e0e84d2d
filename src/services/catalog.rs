//! Catalog containment check with a neutral error fallback

use reqwest::Method;

use super::ApiClient;
use crate::types::ContainmentResult;

impl ApiClient {
    /// Check whether content keys are contained in an enterprise's catalogs.
    ///
    /// This wrapper never rejects: any transport or HTTP failure is logged
    /// and reduced to `{ contains_content_items: false, catalog_list: [] }`
    /// so the calling page renders an empty state instead of crashing.
    pub async fn fetch_contains_content_items(
        &self,
        enterprise_uuid: &str,
        content_keys: &[&str],
    ) -> ContainmentResult {
        let url = format!(
            "{}/enterprise-customer/{}/contains_content_items/",
            self.config().api.lms_base_url,
            enterprise_uuid,
        );
        let mut query: Vec<(&str, &str)> =
            content_keys.iter().map(|key| ("course_run_ids", *key)).collect();
        query.push(("get_catalogs_containing_specified_content_ids", "true"));

        match self
            .send_json::<ContainmentResult>(self.request(Method::GET, &url).query(&query))
            .await
        {
            Ok(result) => result,
            Err(error) => {
                tracing::error!(
                    enterprise_uuid = %enterprise_uuid,
                    content_keys = ?content_keys,
                    %error,
                    "Catalog containment check failed, falling back to empty result"
                );
                ContainmentResult::fallback()
            }
        }
    }
}
