use crate::domain::amount::Amount;
use crate::domain::outcome::PaymentMethod;
use thiserror::Error;

/// Business-rule rejections raised while checking out.
///
/// None of these are fatal: each one blocks a single transition, its message is
/// shown to the customer and the flow stays where it was so the input can be retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    #[error("Please enter a valid 16-digit card number")]
    InvalidCardNumber,
    #[error("Invalid card type")]
    UnknownCardType,
    #[error("Please enter expiry in MM/YY format")]
    InvalidExpiryFormat,
    #[error("Card has expired")]
    CardExpired,
    #[error("Please enter a valid 3-digit CVV")]
    InvalidCvv,
    #[error("Please enter cardholder name")]
    MissingHolderName,
    #[error("Please enter a valid 6-digit OTP")]
    InvalidOtpFormat,
    #[error("Invalid OTP")]
    InvalidOtp,
    #[error("Please enter UPI address")]
    MissingAddress,
    #[error("Please enter a valid UPI address")]
    InvalidAddress,
    #[error("Incorrect PIN")]
    IncorrectPin,
    #[error("Payment Failed - No payment data on card")]
    NoNdefData,
    #[error("Payment Failed - Invalid card")]
    InvalidCardPayload,
    #[error("Payment Failed - Card could not be read")]
    DecodeError,
    #[error("Session expired, please confirm to continue")]
    SessionExpired,
    #[error("Amount {amount} exceeds the transaction limit of {max}")]
    LimitExceeded { amount: Amount, max: Amount },
    #[error("Cart is empty")]
    CartEmpty,
}

impl PaymentError {
    /// Stable machine-readable code, used in receipts.
    pub fn code(&self) -> &'static str {
        match self {
            PaymentError::InvalidCardNumber => "invalid_card_number",
            PaymentError::UnknownCardType => "unknown_card_type",
            PaymentError::InvalidExpiryFormat => "invalid_expiry_format",
            PaymentError::CardExpired => "card_expired",
            PaymentError::InvalidCvv => "invalid_cvv",
            PaymentError::MissingHolderName => "missing_holder_name",
            PaymentError::InvalidOtpFormat => "invalid_otp_format",
            PaymentError::InvalidOtp => "invalid_otp",
            PaymentError::MissingAddress => "missing_address",
            PaymentError::InvalidAddress => "invalid_address",
            PaymentError::IncorrectPin => "incorrect_pin",
            PaymentError::NoNdefData => "no_ndef_data",
            PaymentError::InvalidCardPayload => "invalid_card_payload",
            PaymentError::DecodeError => "decode_error",
            PaymentError::SessionExpired => "session_expired",
            PaymentError::LimitExceeded { .. } => "limit_exceeded",
            PaymentError::CartEmpty => "cart_empty",
        }
    }
}

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error(transparent)]
    Rejected(#[from] PaymentError),
    #[error("Unknown item: {0}")]
    UnknownItem(String),
    #[error("No payment is in progress")]
    NoActiveFlow,
    #[error("A {0} payment is already in progress")]
    FlowAlreadyActive(PaymentMethod),
    #[error("Cannot accept {input} while the payment is in {state}")]
    UnexpectedInput {
        state: &'static str,
        input: &'static str,
    },
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Config error: {0}")]
    ConfigError(#[from] serde_json::Error),
    #[error("Script error: {0}")]
    ScriptError(String),
}

impl CheckoutError {
    /// Returns the business rejection behind this error, if it is one.
    pub fn rejection(&self) -> Option<&PaymentError> {
        match self {
            CheckoutError::Rejected(reason) => Some(reason),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CheckoutError>;
