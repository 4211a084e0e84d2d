//! Stateful enroll flow: redemption submission plus transaction polling
//!
//! [`StatefulEnroll`] composes the redemption mutation and the status poller
//! behind a single `redeem()` entry point and fans results out to
//! caller-supplied callbacks plus analytics side-effects. Within one
//! invocation the POST happens-before the first poll, which happens-before
//! every subsequent poll.

mod errors;
mod poller;
mod redemption;

pub use errors::EnrollError;
pub use poller::{refetch_interval, TransactionPoller};
pub use redemption::RedemptionRequest;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::analytics::{AnalyticsSink, EnrollmentEvent};
use crate::metrics::metrics;
use crate::observability::CorrelationId;
use crate::services::ApiClient;
use crate::types::{SubsidyAccessPolicy, SubsidyTransaction, TransactionState};

/// Caller-supplied lifecycle callbacks for the enroll flow
#[derive(Default)]
pub struct EnrollCallbacks {
    /// Fired when a redemption is submitted, before any network traffic
    pub on_begin_redeem: Option<Box<dyn Fn() + Send + Sync>>,

    /// Fired once when the transaction transitions into `committed`
    pub on_success: Option<Box<dyn Fn(&SubsidyTransaction) + Send + Sync>>,

    /// Fired for transport failures, settled failures, and poll timeouts
    pub on_error: Option<Box<dyn Fn(&EnrollError) + Send + Sync>>,
}

impl std::fmt::Debug for EnrollCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrollCallbacks")
            .field("on_begin_redeem", &self.on_begin_redeem.is_some())
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Orchestrates one learner's subsidized enrollment into one piece of content
pub struct StatefulEnroll {
    api: Arc<ApiClient>,
    analytics: Arc<dyn AnalyticsSink>,
    user_id: u64,
    content_key: String,
    policy: Option<SubsidyAccessPolicy>,
    callbacks: EnrollCallbacks,
    correlation_id: CorrelationId,
    transaction: Mutex<Option<SubsidyTransaction>>,
    committed_fired: AtomicBool,
}

impl StatefulEnroll {
    /// Create an enroll flow for one user/content pair.
    ///
    /// `policy` is the subsidy access policy covering the content, when one
    /// was resolved; `redeem()` refuses to run without it.
    pub fn new(
        api: Arc<ApiClient>,
        analytics: Arc<dyn AnalyticsSink>,
        user_id: u64,
        content_key: impl Into<String>,
        policy: Option<SubsidyAccessPolicy>,
    ) -> Self {
        Self {
            api,
            analytics,
            user_id,
            content_key: content_key.into(),
            policy,
            callbacks: EnrollCallbacks::default(),
            correlation_id: CorrelationId::new(),
            transaction: Mutex::new(None),
            committed_fired: AtomicBool::new(false),
        }
    }

    /// Attach lifecycle callbacks
    pub fn with_callbacks(mut self, callbacks: EnrollCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Current tracked transaction snapshot, if any
    pub fn transaction(&self) -> Option<SubsidyTransaction> {
        self.transaction.lock().clone()
    }

    /// Submit a redemption and drive the resulting transaction to a terminal
    /// state.
    ///
    /// Without a resolved policy this logs a diagnostic, issues no HTTP
    /// request, and returns [`EnrollError::MissingSubsidyPolicy`] without
    /// invoking `on_error`. All other failures are routed through the
    /// unified error handler before being returned.
    pub async fn redeem(
        &self,
        metadata: Option<serde_json::Value>,
    ) -> Result<SubsidyTransaction, EnrollError> {
        let Some(policy) = self.policy.clone() else {
            tracing::error!(
                correlation_id = %self.correlation_id,
                user_id = %self.user_id,
                content_key = %self.content_key,
                "Redemption attempted without a resolved subsidy access policy"
            );
            return Err(EnrollError::MissingSubsidyPolicy);
        };

        self.begin_redeem();
        let timer = metrics().redemption_latency.start_timer();
        let result = self.drive(&policy, metadata).await;
        timer.observe_duration();

        if let Err(error) = &result {
            self.handle_error(&policy, error);
        }
        result
    }

    async fn drive(
        &self,
        policy: &SubsidyAccessPolicy,
        metadata: Option<serde_json::Value>,
    ) -> Result<SubsidyTransaction, EnrollError> {
        let request = RedemptionRequest {
            user_id: self.user_id,
            content_key: &self.content_key,
            metadata,
        };
        let transaction = request.submit(&self.api, policy).await?;
        self.handle_success(&transaction);

        let poller = TransactionPoller::new(&self.api, &self.api.config().polling);
        poller
            .poll_to_terminal(transaction, |snapshot| self.handle_success(snapshot))
            .await
    }

    /// Clear any previously tracked transaction and notify the caller that a
    /// new redemption attempt is starting.
    fn begin_redeem(&self) {
        *self.transaction.lock() = None;
        self.committed_fired.store(false, Ordering::SeqCst);
        if let Some(on_begin_redeem) = &self.callbacks.on_begin_redeem {
            on_begin_redeem();
        }
    }

    /// Unified success handler for the initial POST response and every poll
    /// snapshot.
    ///
    /// Applies the snapshot to the tracked value (forward-only) and, exactly
    /// once per transition into `committed`, fires the two analytics
    /// side-effects followed by the caller's `on_success`.
    pub(crate) fn handle_success(&self, snapshot: &SubsidyTransaction) {
        let effective = self.apply_snapshot(snapshot);
        match effective.state {
            TransactionState::Committed => {
                if !self.committed_fired.swap(true, Ordering::SeqCst) {
                    metrics().redemptions_committed.inc();
                    let event = EnrollmentEvent {
                        user_id: self.user_id,
                        content_key: &self.content_key,
                        policy_uuid: self
                            .policy
                            .as_ref()
                            .map(|p| p.uuid.as_str())
                            .unwrap_or_default(),
                        transaction: &effective,
                    };
                    self.analytics.track_search_conversion(&event);
                    self.analytics.track_enterprise_enrollment(&event);
                    if let Some(on_success) = &self.callbacks.on_success {
                        on_success(&effective);
                    }
                }
            }
            TransactionState::Pending => {
                tracing::debug!(
                    correlation_id = %self.correlation_id,
                    uuid = %effective.uuid,
                    "Transaction still pending"
                );
            }
            TransactionState::Failed => {
                // The poller synthesizes the failure; the error handler owns it.
            }
        }
    }

    /// Replace the tracked transaction with `snapshot` unless that would
    /// regress an already-terminal state.
    fn apply_snapshot(&self, snapshot: &SubsidyTransaction) -> SubsidyTransaction {
        let mut guard = self.transaction.lock();
        if let Some(current) = guard.as_ref() {
            if current.state.is_regression_to(snapshot.state) {
                tracing::warn!(
                    correlation_id = %self.correlation_id,
                    uuid = %current.uuid,
                    "Ignoring snapshot that would regress tracked transaction state"
                );
                return current.clone();
            }
        }
        *guard = Some(snapshot.clone());
        snapshot.clone()
    }

    /// Unified error handler: log with acting-user context, bump metrics,
    /// then invoke the caller's `on_error`.
    fn handle_error(&self, policy: &SubsidyAccessPolicy, error: &EnrollError) {
        tracing::error!(
            correlation_id = %self.correlation_id,
            user_id = %self.user_id,
            content_key = %self.content_key,
            policy_uuid = %policy.uuid,
            %error,
            "Redemption failed"
        );
        match error {
            EnrollError::TransactionFailed { .. } => metrics().redemptions_failed.inc(),
            EnrollError::Timeout { .. } => {
                // Counted at the poll site.
            }
            _ => {}
        }
        if let Some(on_error) = &self.callbacks.on_error {
            on_error(error);
        }
    }
}

impl std::fmt::Debug for StatefulEnroll {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatefulEnroll")
            .field("user_id", &self.user_id)
            .field("content_key", &self.content_key)
            .field("policy", &self.policy)
            .field("correlation_id", &self.correlation_id)
            .finish()
    }
}
