//! Enterprise service wrappers: learner linkage, active-enterprise
//! selection, academies, and course enrollments

use reqwest::Method;

use super::{ApiClient, ApiError};
use crate::types::{Academy, CourseEnrollment, EnterpriseLearnerData, Paginated};

impl ApiClient {
    /// Fetch the learner's enterprise linkage aggregate
    pub async fn fetch_enterprise_learner(
        &self,
        username: &str,
    ) -> Result<EnterpriseLearnerData, ApiError> {
        let url = format!(
            "{}/enterprise/api/v1/enterprise-learner/",
            self.config().api.lms_base_url,
        );
        self.send_json(
            self.request(Method::GET, &url).query(&[("username", username)]),
        )
        .await
    }

    /// Mark an enterprise as the user's active linked enterprise.
    ///
    /// Form-encoded POST; this is the only server-state mutation the route
    /// loaders are allowed to make.
    pub async fn update_active_enterprise(
        &self,
        enterprise_uuid: &str,
    ) -> Result<(), ApiError> {
        let url = format!(
            "{}/enterprise/select/active/",
            self.config().api.lms_base_url,
        );
        self.send_expect_success(
            self.request(Method::POST, &url)
                .form(&[("enterprise", enterprise_uuid)]),
        )
        .await
    }

    /// Fetch the academies curated for an enterprise
    pub async fn fetch_academies(
        &self,
        enterprise_uuid: &str,
    ) -> Result<Vec<Academy>, ApiError> {
        let url = format!(
            "{}/api/v1/academies/",
            self.config().api.enterprise_catalog_api_base_url,
        );
        let page: Paginated<Academy> = self
            .send_json(
                self.request(Method::GET, &url)
                    .query(&[("enterprise_customer", enterprise_uuid)]),
            )
            .await?;
        Ok(page.results)
    }

    /// Fetch the learner's course enrollments under an enterprise
    pub async fn fetch_course_enrollments(
        &self,
        enterprise_uuid: &str,
    ) -> Result<Vec<CourseEnrollment>, ApiError> {
        let url = format!(
            "{}/enterprise_learner_portal/api/v1/enterprise_course_enrollments/",
            self.config().api.lms_base_url,
        );
        self.send_json(
            self.request(Method::GET, &url)
                .query(&[("enterprise_id", enterprise_uuid)]),
        )
        .await
    }
}
