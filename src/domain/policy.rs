use super::amount::Amount;
use crate::error::PaymentError;
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_millis(300_000);
pub const DEFAULT_MAX_TRANSACTION_AMOUNT: Amount = Amount::new(10_000);

/// Rules a checkout must pass before any payment flow starts.
///
/// Both checks are pure: they never touch the cart or the session, the caller
/// decides what to do with a rejection.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionPolicy {
    pub session_timeout: Duration,
    pub max_amount: Amount,
    pub enforce_session_timeout: bool,
    pub enforce_amount_limit: bool,
}

impl Default for TransactionPolicy {
    fn default() -> Self {
        Self {
            session_timeout: DEFAULT_SESSION_TIMEOUT,
            max_amount: DEFAULT_MAX_TRANSACTION_AMOUNT,
            enforce_session_timeout: true,
            enforce_amount_limit: true,
        }
    }
}

impl TransactionPolicy {
    /// Fails once strictly more than `session_timeout` has passed since the session started.
    pub fn check_session(&self, now: Instant, started_at: Instant) -> Result<(), PaymentError> {
        if self.enforce_session_timeout
            && now.saturating_duration_since(started_at) > self.session_timeout
        {
            return Err(PaymentError::SessionExpired);
        }
        Ok(())
    }

    /// Fails when `total` is strictly above the ceiling.
    pub fn check_limit(&self, total: Amount) -> Result<(), PaymentError> {
        if self.enforce_amount_limit && total > self.max_amount {
            return Err(PaymentError::LimitExceeded {
                amount: total,
                max: self.max_amount,
            });
        }
        Ok(())
    }
}
