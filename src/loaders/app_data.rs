//! Enterprise app-data loader
//!
//! Fires the independent cache-priming fetches for a dashboard render
//! concurrently. Individual fetch failures degrade to empty data; the only
//! redirect this loader issues is the single-academy shortcut.

use super::{LoaderContext, LoaderOutcome};
use crate::query_store::QueryKey;
use crate::types::{Academy, CourseEnrollment, EnterpriseCustomer};

/// Data primed for the dashboard routes
#[derive(Debug, Clone, PartialEq)]
pub struct EnterpriseAppData {
    /// Academies curated for the customer
    pub academies: Vec<Academy>,

    /// The learner's enrollments under the customer
    pub course_enrollments: Vec<CourseEnrollment>,
}

/// Prime the app-level queries for `customer` and decide whether to
/// short-cut into the academy detail page.
pub async fn ensure_enterprise_app_data(
    ctx: &LoaderContext,
    customer: &EnterpriseCustomer,
) -> LoaderOutcome<EnterpriseAppData> {
    // Independent fetches, fired concurrently; no ordering among them.
    let (academies, course_enrollments) = tokio::join!(
        ctx.store.ensure_query_data(QueryKey::academies(&customer.uuid), || {
            ctx.api.fetch_academies(&customer.uuid)
        }),
        ctx.store
            .ensure_query_data(QueryKey::course_enrollments(&customer.uuid), || {
                ctx.api.fetch_course_enrollments(&customer.uuid)
            }),
    );

    let academies = academies.unwrap_or_else(|error| {
        tracing::error!(
            enterprise_uuid = %customer.uuid,
            %error,
            "Failed to fetch academies, rendering without them"
        );
        Vec::new()
    });
    let course_enrollments = course_enrollments.unwrap_or_else(|error| {
        tracing::error!(
            enterprise_uuid = %customer.uuid,
            %error,
            "Failed to fetch course enrollments, rendering without them"
        );
        Vec::new()
    });

    if ctx.config.features.enable_one_academy_redirect && customer.enable_one_academy {
        if let [academy] = academies.as_slice() {
            return LoaderOutcome::Redirect(format!(
                "/{}/academies/{}",
                customer.slug, academy.uuid
            ));
        }
    }

    LoaderOutcome::Continue(EnterpriseAppData { academies, course_enrollments })
}
