//! Test Utilities Module
//!
//! Deterministic builders for transactions, policies, and learner linkage
//! data, plus a counting analytics sink.
//!
//! These utilities are only compiled when running tests or when the
//! `test_utils` feature is enabled.

#![cfg(any(test, feature = "test_utils"))]

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::analytics::{AnalyticsSink, EnrollmentEvent};
use crate::types::{
    EnterpriseCustomer, EnterpriseCustomerUser, EnterpriseLearnerData, SubsidyAccessPolicy,
    SubsidyTransaction, TransactionState,
};

/// Build a pending transaction pointing at `status_url`
pub fn pending_transaction(uuid: &str, status_url: &str) -> SubsidyTransaction {
    SubsidyTransaction {
        uuid: uuid.to_string(),
        state: TransactionState::Pending,
        lms_user_id: Some(123),
        content_key: Some("course-v1:edX+DemoX+Demo".to_string()),
        subsidy_access_policy_uuid: Some("policy-1".to_string()),
        transaction_status_api_url: Some(status_url.to_string()),
        coupon_code: None,
        metadata: None,
        created: None,
        modified: None,
    }
}

/// Build a committed transaction
pub fn committed_transaction(uuid: &str) -> SubsidyTransaction {
    SubsidyTransaction {
        state: TransactionState::Committed,
        ..pending_transaction(uuid, "https://subsidy.example.com/status/")
    }
}

/// Build a failed transaction
pub fn failed_transaction(uuid: &str) -> SubsidyTransaction {
    SubsidyTransaction {
        state: TransactionState::Failed,
        ..pending_transaction(uuid, "https://subsidy.example.com/status/")
    }
}

/// Build a subsidy access policy redeeming at `redemption_url`
pub fn subsidy_policy(redemption_url: &str) -> SubsidyAccessPolicy {
    SubsidyAccessPolicy {
        uuid: "policy-1".to_string(),
        policy_redemption_url: redemption_url.to_string(),
        policy_type: Some("PerLearnerSpendCreditAccessPolicy".to_string()),
        display_name: Some("Learner Credit".to_string()),
    }
}

/// Build an enterprise customer
pub fn enterprise_customer(uuid: &str, slug: &str) -> EnterpriseCustomer {
    EnterpriseCustomer {
        uuid: uuid.to_string(),
        slug: slug.to_string(),
        name: slug.to_uppercase(),
        enable_one_academy: false,
    }
}

/// Build a linkage record
pub fn linked(customer: EnterpriseCustomer, active: bool) -> EnterpriseCustomerUser {
    EnterpriseCustomerUser { active, enterprise_customer: customer }
}

/// Build a learner linkage aggregate
pub fn learner_data(
    enterprise_customer: Option<EnterpriseCustomer>,
    active: Option<EnterpriseCustomer>,
    all_linked: Vec<EnterpriseCustomerUser>,
) -> EnterpriseLearnerData {
    EnterpriseLearnerData {
        enterprise_customer,
        active_enterprise_customer: active,
        all_linked_enterprise_customer_users: all_linked,
        staff_enterprise_customer: None,
        should_update_active_enterprise_customer_user: false,
    }
}

/// Analytics sink counting invocations for assertions
#[derive(Debug, Default)]
pub struct CountingAnalytics {
    search_conversions: AtomicUsize,
    enterprise_enrollments: AtomicUsize,
}

impl CountingAnalytics {
    /// Number of search conversion events tracked
    pub fn search_conversions(&self) -> usize {
        self.search_conversions.load(Ordering::SeqCst)
    }

    /// Number of enterprise enrollment events tracked
    pub fn enterprise_enrollments(&self) -> usize {
        self.enterprise_enrollments.load(Ordering::SeqCst)
    }
}

impl AnalyticsSink for CountingAnalytics {
    fn track_search_conversion(&self, _event: &EnrollmentEvent<'_>) {
        self.search_conversions.fetch_add(1, Ordering::SeqCst);
    }

    fn track_enterprise_enrollment(&self, _event: &EnrollmentEvent<'_>) {
        self.enterprise_enrollments.fetch_add(1, Ordering::SeqCst);
    }
}
