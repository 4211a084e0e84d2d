//! Active enterprise customer resolution
//!
//! Decides, for the slug in the requested URL, which of the learner's linked
//! enterprise customers should be treated as active, promoting a different
//! one through the select-active API when required. Promotion optimistically
//! patches the cached linkage snapshot; a failed update call is logged and
//! the pre-update data is returned rather than failing the route.

use super::{LoaderContext, LoaderOutcome};
use crate::query_store::QueryKey;
use crate::types::{EnterpriseCustomer, EnterpriseLearnerData};

/// Decision reached by the resolution state machine
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Resolution {
    /// Promote this customer to active via the select-active API
    Promote(EnterpriseCustomer),
    /// Prefer the staff override customer without promoting it
    PreferStaff(EnterpriseCustomer),
    /// Navigate to the active customer's own slug-scoped path
    RedirectToActive(String),
    /// Keep the resolved data as-is
    Unchanged,
}

/// Pure resolution over the learner's linkage data.
///
/// `aggregated` is true when the data came from the batched (aggregated)
/// endpoint, whose slug resolution already happened server-side; the
/// linked-customer search only applies to non-aggregated data.
pub(crate) fn resolve(
    enterprise_slug: &str,
    data: &EnterpriseLearnerData,
    aggregated: bool,
) -> Resolution {
    if data.should_update_active_enterprise_customer_user {
        if let Some(target) = &data.enterprise_customer {
            return Resolution::Promote(target.clone());
        }
    }

    let active = data.active_enterprise_customer.as_ref();

    if !aggregated {
        if let Some(active) = active {
            if active.slug != enterprise_slug {
                let matched = data
                    .all_linked_enterprise_customer_users
                    .iter()
                    .find(|link| link.enterprise_customer.slug == enterprise_slug);
                if let Some(link) = matched {
                    return Resolution::Promote(link.enterprise_customer.clone());
                }
            }
        }
    }

    if let Some(staff) = &data.staff_enterprise_customer {
        return Resolution::PreferStaff(staff.clone());
    }

    if let Some(active) = active {
        if active.slug != enterprise_slug {
            return Resolution::RedirectToActive(format!("/{}", active.slug));
        }
    }

    Resolution::Unchanged
}

/// Resolve the active enterprise customer for the requested slug.
///
/// Short-circuits to `Continue(None)` when there is no authenticated user or
/// the learner is not linked to any enterprise.
pub async fn ensure_active_enterprise_customer_user(
    ctx: &LoaderContext,
    enterprise_slug: &str,
    aggregated: bool,
) -> LoaderOutcome<Option<EnterpriseLearnerData>> {
    let Some(user) = ctx.ensure_authenticated_user() else {
        return LoaderOutcome::Continue(None);
    };
    let username = user.username.clone();

    let learner_key = QueryKey::enterprise_learner(&username);
    let data: EnterpriseLearnerData = match ctx
        .store
        .ensure_query_data(learner_key.clone(), || {
            ctx.api.fetch_enterprise_learner(&username)
        })
        .await
    {
        Ok(data) => data,
        Err(error) => {
            tracing::error!(
                username = %username,
                %error,
                "Failed to fetch enterprise learner data"
            );
            return LoaderOutcome::Continue(None);
        }
    };

    if data.enterprise_customer.is_none() && data.active_enterprise_customer.is_none() {
        return LoaderOutcome::Continue(None);
    }

    match resolve(enterprise_slug, &data, aggregated) {
        Resolution::Promote(target) => {
            let updated = promote(ctx, &learner_key, data, &target).await;
            LoaderOutcome::Continue(Some(updated))
        }
        Resolution::PreferStaff(staff) => {
            let mut preferred = data;
            preferred.enterprise_customer = Some(staff);
            LoaderOutcome::Continue(Some(preferred))
        }
        Resolution::RedirectToActive(path) => LoaderOutcome::Redirect(path),
        Resolution::Unchanged => LoaderOutcome::Continue(Some(data)),
    }
}

/// Call the select-active API once and optimistically patch the cached
/// linkage snapshot. On failure the pre-update data is returned unchanged.
async fn promote(
    ctx: &LoaderContext,
    learner_key: &QueryKey,
    data: EnterpriseLearnerData,
    target: &EnterpriseCustomer,
) -> EnterpriseLearnerData {
    match ctx.api.update_active_enterprise(&target.uuid).await {
        Ok(()) => {
            let updated = data.with_active(target);
            ctx.store.set_query_data(learner_key.clone(), &updated);
            updated
        }
        Err(error) => {
            tracing::error!(
                enterprise_uuid = %target.uuid,
                %error,
                "Failed to update active enterprise, keeping pre-update data"
            );
            data
        }
    }
}
