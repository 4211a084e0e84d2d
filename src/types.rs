//! Common types used throughout the application
//!
//! Wire payloads from the enterprise backends are snake_case JSON; the
//! structs here deserialize them directly with serde's default field naming.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a subsidy redemption transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionState {
    /// Redemption submitted, fulfillment not yet settled
    Pending,
    /// Redemption settled successfully (learner is enrolled)
    Committed,
    /// Redemption settled unsuccessfully
    Failed,
}

impl TransactionState {
    /// Whether this state is terminal (`committed` or `failed`)
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::Failed)
    }

    /// Whether replacing `self` with `next` would move the state backwards.
    ///
    /// A transaction only moves forward (`pending -> committed` or
    /// `pending -> failed`); a cached terminal state is never overwritten
    /// by a stale `pending` snapshot.
    pub fn is_regression_to(self, next: TransactionState) -> bool {
        self.is_terminal() && next == TransactionState::Pending
    }
}

impl std::fmt::Display for TransactionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Committed => write!(f, "committed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// One redemption attempt as tracked by the subsidy backend
///
/// Created server-side when a redemption is submitted; the client only
/// observes snapshots of it via the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsidyTransaction {
    /// Unique transaction identifier
    pub uuid: String,

    /// Current lifecycle state
    pub state: TransactionState,

    /// LMS user the redemption was made for
    #[serde(default)]
    pub lms_user_id: Option<u64>,

    /// Content the redemption covers (course run key)
    #[serde(default)]
    pub content_key: Option<String>,

    /// Policy the redemption was charged against
    #[serde(default)]
    pub subsidy_access_policy_uuid: Option<String>,

    /// Absolute URL to poll for the current transaction state
    #[serde(default)]
    pub transaction_status_api_url: Option<String>,

    /// Coupon code consumed, when the subsidy is coupon-backed
    #[serde(default)]
    pub coupon_code: Option<String>,

    /// Caller-supplied metadata echoed back by the backend
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,

    /// Server-side creation timestamp
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,

    /// Server-side last-modified timestamp
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
}

/// Employer-funded policy covering a piece of content
///
/// Immutable once fetched; resolved through the can-redeem endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsidyAccessPolicy {
    /// Policy identifier
    pub uuid: String,

    /// Absolute URL redemptions against this policy are POSTed to
    pub policy_redemption_url: String,

    /// Policy kind (learner credit, license, coupon code, offer)
    #[serde(default)]
    pub policy_type: Option<String>,

    /// Human-readable policy name
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Per-content redeemability verdict from the can-redeem endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanRedeemResponse {
    /// Content the verdict applies to
    pub content_key: String,

    /// Whether a redemption can currently be made
    pub can_redeem: bool,

    /// Policy to redeem against, when redeemable
    #[serde(default)]
    pub redeemable_subsidy_access_policy: Option<SubsidyAccessPolicy>,

    /// Whether a committed redemption already exists for this content
    #[serde(default)]
    pub has_successful_redemption: bool,
}

/// Result of a catalog containment check
///
/// Also the neutral fallback value when the containment endpoint fails:
/// rendering proceeds with "not contained" rather than crashing the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainmentResult {
    /// Whether all requested content keys are in the enterprise's catalogs
    pub contains_content_items: bool,

    /// Catalogs containing the requested content
    #[serde(default)]
    pub catalog_list: Vec<String>,
}

impl ContainmentResult {
    /// Neutral fallback used when the containment endpoint errors
    pub fn fallback() -> Self {
        Self {
            contains_content_items: false,
            catalog_list: Vec::new(),
        }
    }
}

/// Corporate/organizational tenant a learner belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnterpriseCustomer {
    /// Customer identifier
    pub uuid: String,

    /// URL slug the customer's routes are scoped under
    pub slug: String,

    /// Display name
    pub name: String,

    /// Whether the customer operates in single-academy mode
    #[serde(default)]
    pub enable_one_academy: bool,
}

/// Linkage of a learner to one enterprise customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnterpriseCustomerUser {
    /// Whether this linkage is the learner's active one
    pub active: bool,

    /// The linked customer
    pub enterprise_customer: EnterpriseCustomer,
}

/// Aggregate the active-enterprise resolution operates on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnterpriseLearnerData {
    /// Customer resolved for the requested slug (may differ from active)
    #[serde(default)]
    pub enterprise_customer: Option<EnterpriseCustomer>,

    /// Customer currently marked active for the learner
    #[serde(default)]
    pub active_enterprise_customer: Option<EnterpriseCustomer>,

    /// All customers the learner is linked to
    #[serde(default)]
    pub all_linked_enterprise_customer_users: Vec<EnterpriseCustomerUser>,

    /// Staff override customer, when the acting user is staff
    #[serde(default)]
    pub staff_enterprise_customer: Option<EnterpriseCustomer>,

    /// Whether the backend asks the client to promote `enterprise_customer`
    /// to active
    #[serde(default)]
    pub should_update_active_enterprise_customer_user: bool,
}

impl EnterpriseLearnerData {
    /// Rebuild the aggregate with `target` as the active customer.
    ///
    /// Every linked record is re-marked so exactly the target is active;
    /// the resolved and active customer fields both point at the target.
    pub fn with_active(&self, target: &EnterpriseCustomer) -> Self {
        let all_linked = self
            .all_linked_enterprise_customer_users
            .iter()
            .map(|link| EnterpriseCustomerUser {
                active: link.enterprise_customer.uuid == target.uuid,
                enterprise_customer: link.enterprise_customer.clone(),
            })
            .collect();
        Self {
            enterprise_customer: Some(target.clone()),
            active_enterprise_customer: Some(target.clone()),
            all_linked_enterprise_customer_users: all_linked,
            staff_enterprise_customer: self.staff_enterprise_customer.clone(),
            should_update_active_enterprise_customer_user: false,
        }
    }
}

/// Academy curated for an enterprise customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Academy {
    /// Academy identifier
    pub uuid: String,

    /// Display title
    pub title: String,
}

/// One of the learner's course enrollments under the enterprise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseEnrollment {
    /// Course run the enrollment is for
    pub course_run_id: String,

    /// Display name of the course run
    #[serde(default)]
    pub display_name: Option<String>,

    /// Coarse progress bucket reported by the backend
    #[serde(default)]
    pub course_run_status: Option<String>,
}

/// Authenticated user resolved at application start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// LMS user id
    pub user_id: u64,

    /// Username
    pub username: String,

    /// Platform roles
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Standard paginated envelope used by the enterprise backends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// Total result count across pages
    #[serde(default)]
    pub count: u64,

    /// Results for the current page
    pub results: Vec<T>,
}
