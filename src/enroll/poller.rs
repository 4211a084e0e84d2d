//! Transaction status poller
//!
//! Re-fetches a pending transaction's status on a fixed interval and stops
//! once the state is terminal. Polls never overlap: the next GET is issued
//! only after the previous response has been applied and the interval has
//! elapsed. The loop carries an attempt budget; exhausting it yields
//! [`EnrollError::Timeout`] instead of polling forever.

use std::time::Duration;

use tokio::time::sleep;

use super::errors::EnrollError;
use crate::config::PollingConfig;
use crate::metrics::metrics;
use crate::services::ApiClient;
use crate::types::SubsidyTransaction;

/// Polling gate: how long to wait before the next status fetch.
///
/// Returns `None` (polling disabled) while no transaction is tracked or the
/// tracked transaction is terminal, and the fixed interval while it is
/// pending.
pub fn refetch_interval(
    interval: Duration,
    transaction: Option<&SubsidyTransaction>,
) -> Option<Duration> {
    match transaction {
        Some(tx) if !tx.state.is_terminal() => Some(interval),
        _ => None,
    }
}

/// Poll loop bound to one transaction
#[derive(Debug)]
pub struct TransactionPoller<'a> {
    api: &'a ApiClient,
    interval: Duration,
    max_attempts: u32,
}

impl<'a> TransactionPoller<'a> {
    /// Create a poller with the configured interval and attempt budget
    pub fn new(api: &'a ApiClient, polling: &PollingConfig) -> Self {
        Self {
            api,
            interval: polling.interval(),
            max_attempts: polling.max_attempts,
        }
    }

    /// Drive `initial` to a terminal state, invoking `on_snapshot` for every
    /// status response applied along the way.
    ///
    /// Each snapshot replaces the prior value, except that a stale `pending`
    /// response never overwrites an observed terminal state. A `failed`
    /// terminal state is synthesized into [`EnrollError::TransactionFailed`].
    pub async fn poll_to_terminal(
        &self,
        initial: SubsidyTransaction,
        mut on_snapshot: impl FnMut(&SubsidyTransaction),
    ) -> Result<SubsidyTransaction, EnrollError> {
        let mut current = initial;
        let mut attempts: u32 = 0;

        loop {
            if current.state.is_terminal() {
                if current.state == crate::types::TransactionState::Failed {
                    return Err(EnrollError::TransactionFailed { uuid: current.uuid });
                }
                return Ok(current);
            }

            let Some(delay) = refetch_interval(self.interval, Some(&current)) else {
                // Pending is the only non-terminal state, so the gate always
                // yields an interval here.
                return Ok(current);
            };

            if attempts >= self.max_attempts {
                metrics().redemptions_timed_out.inc();
                return Err(EnrollError::Timeout { uuid: current.uuid, attempts });
            }

            sleep(delay).await;
            attempts += 1;
            metrics().transaction_polls.inc();

            let status_url = current
                .transaction_status_api_url
                .clone()
                .ok_or_else(|| EnrollError::MissingStatusUrl { uuid: current.uuid.clone() })?;
            let snapshot = self.api.fetch_transaction(&status_url).await?;

            if current.state.is_regression_to(snapshot.state) {
                tracing::warn!(
                    uuid = %current.uuid,
                    current_state = %current.state,
                    snapshot_state = %snapshot.state,
                    "Ignoring stale status snapshot that would regress transaction state"
                );
                continue;
            }
            current = snapshot;
            on_snapshot(&current);
        }
    }
}
