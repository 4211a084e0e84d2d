//! Error taxonomy for the stateful enroll flow
//!
//! Three families per the error handling design: precondition failures
//! (no policy resolved, nothing sent to the backend), transport/HTTP
//! failures from the service wrappers, and business-outcome failures
//! (a transaction settling in the `failed` state). Timeouts are their own
//! variant so callers can distinguish an abandoned poll loop from a
//! settled failure.

use thiserror::Error;

use crate::services::ApiError;

/// Error type for redemption submission and transaction polling
#[derive(Debug, Error)]
pub enum EnrollError {
    /// `redeem()` was invoked before a subsidy access policy was resolved;
    /// no backend call is made in this case
    #[error("Redemption attempted without a resolved subsidy access policy")]
    MissingSubsidyPolicy,

    /// Transport/HTTP/decoding failure from the redemption submit or a
    /// status poll
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The transaction settled in the `failed` state
    #[error("Transaction {uuid} failed during redemption.")]
    TransactionFailed {
        /// Identifier of the failed transaction
        uuid: String,
    },

    /// The poll budget was exhausted while the transaction was still pending
    #[error("Transaction {uuid} still pending after {attempts} status polls")]
    Timeout {
        /// Identifier of the abandoned transaction
        uuid: String,
        /// Number of polls issued before giving up
        attempts: u32,
    },

    /// The backend returned a transaction without a status URL to poll
    #[error("Transaction {uuid} has no status URL to poll")]
    MissingStatusUrl {
        /// Identifier of the unpollable transaction
        uuid: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_transaction_message_names_the_transaction() {
        let error = EnrollError::TransactionFailed { uuid: "X".to_string() };
        assert!(error.to_string().contains("Transaction X failed during redemption."));
    }
}
