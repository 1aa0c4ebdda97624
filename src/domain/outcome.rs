use super::amount::Amount;
use crate::error::PaymentError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Card,
    Upi,
    Tap,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Upi => "upi",
            PaymentMethod::Tap => "tap",
        };
        f.write_str(name)
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "card" => Ok(PaymentMethod::Card),
            "upi" => Ok(PaymentMethod::Upi),
            "tap" | "nfc" => Ok(PaymentMethod::Tap),
            other => Err(format!("unknown payment method '{}'", other)),
        }
    }
}

/// How a payment flow ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentOutcome {
    Success { duration_seconds: f64 },
    Failure { reason: PaymentError },
    Cancelled,
}

impl PaymentOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PaymentOutcome::Success { .. })
    }

    pub fn status(&self) -> &'static str {
        match self {
            PaymentOutcome::Success { .. } => "success",
            PaymentOutcome::Failure { .. } => "failure",
            PaymentOutcome::Cancelled => "cancelled",
        }
    }
}

/// One finished flow, as kept in the session history.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub method: PaymentMethod,
    pub amount: Amount,
    pub outcome: PaymentOutcome,
}

/// Renders a duration the way the success screen shows it.
pub fn duration_text(duration_seconds: f64) -> String {
    format!("Time taken: {:.2} seconds", duration_seconds)
}
