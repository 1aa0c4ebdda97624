//! Terminal configuration.
//!
//! Everything has a default matching the stock demo terminal, so an empty
//! JSON object (or no config file at all) is a valid configuration.

use crate::domain::amount::Amount;
use crate::domain::cart::PriceTable;
use crate::domain::outcome::PaymentMethod;
use crate::domain::policy::{
    DEFAULT_MAX_TRANSACTION_AMOUNT, DEFAULT_SESSION_TIMEOUT, TransactionPolicy,
};
use crate::error::Result;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Duration;

/// Inclusive range a randomized delay is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }
}

/// Simulated latencies of every timed step.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Card details submitted until the OTP screen appears.
    pub card_gateway: DelayRange,
    /// OTP accepted until the card payment succeeds.
    pub card_authorisation: DelayRange,
    /// UPI request sent until the payer approves it.
    pub upi_approval_ms: u64,
    /// Starting value of the UPI approval countdown.
    pub upi_countdown_secs: u32,
    pub countdown_tick_ms: u64,
    pub tap_evaluation_ms: u64,
    pub pin_verification_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            card_gateway: DelayRange::new(2000, 5000),
            card_authorisation: DelayRange::new(1500, 3000),
            upi_approval_ms: 35_000,
            upi_countdown_secs: 40,
            countdown_tick_ms: 1000,
            tap_evaluation_ms: 2000,
            pin_verification_ms: 2000,
        }
    }
}

/// Behaviour that differed between the terminal's screen variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    /// Validate card fields as they lose focus.
    pub field_errors: bool,
    /// Vibrate alongside the success/failure tones.
    pub haptics: bool,
    /// Accept swipe gestures as pay / clear shortcuts.
    pub gestures: bool,
    pub session_timeout: bool,
    pub amount_limit: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            field_errors: true,
            haptics: true,
            gestures: true,
            session_timeout: true,
            amount_limit: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CheckoutConfig {
    pub session_timeout_ms: u64,
    pub max_transaction_amount: Amount,
    pub prices: PriceTable,
    /// Method a swipe-to-pay gesture starts.
    pub default_method: PaymentMethod,
    pub timings: Timings,
    pub flags: FeatureFlags,
    /// Seed for the randomized delays; entropy when absent.
    pub seed: Option<u64>,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            session_timeout_ms: DEFAULT_SESSION_TIMEOUT.as_millis() as u64,
            max_transaction_amount: DEFAULT_MAX_TRANSACTION_AMOUNT,
            prices: PriceTable::default(),
            default_method: PaymentMethod::Tap,
            timings: Timings::default(),
            flags: FeatureFlags::default(),
            seed: None,
        }
    }
}

impl CheckoutConfig {
    pub fn from_reader<R: Read>(source: R) -> Result<Self> {
        Ok(serde_json::from_reader(source)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn policy(&self) -> TransactionPolicy {
        TransactionPolicy {
            session_timeout: Duration::from_millis(self.session_timeout_ms),
            max_amount: self.max_transaction_amount,
            enforce_session_timeout: self.flags.session_timeout,
            enforce_amount_limit: self.flags.amount_limit,
        }
    }
}
