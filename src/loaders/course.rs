//! Course route loader
//!
//! Primes the catalog containment check and the can-redeem policy
//! resolution for a course, and redirects to the enrollment-completed page
//! when a committed redemption already exists for the requested content.

use super::{LoaderContext, LoaderOutcome};
use crate::query_store::QueryKey;
use crate::services::ApiError;
use crate::types::{CanRedeemResponse, ContainmentResult, SubsidyAccessPolicy};

/// Data primed for the course routes
#[derive(Debug, Clone, PartialEq)]
pub struct CourseLoaderData {
    /// Whether (and where) the course is contained in the customer's catalogs
    pub containment: ContainmentResult,

    /// Policy to redeem against, when the course is redeemable
    pub subsidy_access_policy: Option<SubsidyAccessPolicy>,

    /// Whether a redemption can currently be made
    pub can_redeem: bool,
}

/// Prime the course-level queries for `course_key` under an enterprise.
pub async fn course_loader(
    ctx: &LoaderContext,
    enterprise_uuid: &str,
    enterprise_slug: &str,
    course_key: &str,
) -> LoaderOutcome<CourseLoaderData> {
    let (containment, verdicts) = tokio::join!(
        ctx.store.ensure_query_data(
            QueryKey::contains_content(enterprise_uuid, course_key),
            || async {
                Ok::<ContainmentResult, ApiError>(
                    ctx.api
                        .fetch_contains_content_items(enterprise_uuid, &[course_key])
                        .await,
                )
            },
        ),
        ctx.store.ensure_query_data(
            QueryKey::can_redeem(enterprise_uuid, course_key),
            || async { ctx.api.fetch_can_redeem(enterprise_uuid, &[course_key]).await },
        ),
    );

    // The containment wrapper already reduces its own errors to a fallback.
    let containment = containment.unwrap_or_else(|_| ContainmentResult::fallback());
    let verdicts: Vec<CanRedeemResponse> = verdicts.unwrap_or_else(|error| {
        tracing::error!(
            enterprise_uuid = %enterprise_uuid,
            course_key = %course_key,
            %error,
            "Failed to resolve redeemability, rendering without a policy"
        );
        Vec::new()
    });

    let verdict = verdicts.into_iter().find(|v| v.content_key == course_key);
    if verdict.as_ref().is_some_and(|v| v.has_successful_redemption) {
        return LoaderOutcome::Redirect(format!(
            "/{}/course/{}/enroll/complete",
            enterprise_slug, course_key
        ));
    }

    let can_redeem = verdict.as_ref().is_some_and(|v| v.can_redeem);
    let subsidy_access_policy =
        verdict.and_then(|v| v.redeemable_subsidy_access_policy);

    LoaderOutcome::Continue(CourseLoaderData {
        containment,
        subsidy_access_policy,
        can_redeem,
    })
}
