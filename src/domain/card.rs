use crate::error::PaymentError;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub const CARD_NUMBER_LEN: usize = 16;
pub const CVV_LEN: usize = 3;
pub const OTP_LEN: usize = 6;
/// One-time passwords the simulated issuer accepts.
pub const ACCEPTED_OTPS: [&str; 2] = ["111111", "222222"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CardType {
    Visa,
    Mastercard,
    RuPay,
    Unknown,
}

impl CardType {
    /// Detects the card brand from the leading digits.
    pub fn detect(number: &str) -> Self {
        if number.starts_with('4') {
            CardType::Visa
        } else if number.starts_with('5') || number.starts_with('2') {
            CardType::Mastercard
        } else if ["60", "65", "81", "82"]
            .iter()
            .any(|prefix| number.starts_with(prefix))
        {
            CardType::RuPay
        } else {
            CardType::Unknown
        }
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CardType::Visa => "Visa",
            CardType::Mastercard => "Mastercard",
            CardType::RuPay => "RuPay",
            CardType::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardDetails {
    pub number: String,
    pub expiry: String,
    pub cvv: String,
    pub holder_name: String,
}

impl CardDetails {
    pub fn new(
        number: impl Into<String>,
        expiry: impl Into<String>,
        cvv: impl Into<String>,
        holder_name: impl Into<String>,
    ) -> Self {
        Self {
            number: number.into(),
            expiry: expiry.into(),
            cvv: cvv.into(),
            holder_name: holder_name.into(),
        }
    }

    pub fn card_type(&self) -> CardType {
        CardType::detect(self.number.trim())
    }
}

/// Form fields that are validated individually when they lose focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardField {
    Number,
    Expiry,
    Cvv,
    HolderName,
}

impl FromStr for CardField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "number" => Ok(CardField::Number),
            "expiry" => Ok(CardField::Expiry),
            "cvv" => Ok(CardField::Cvv),
            "name" | "holder_name" => Ok(CardField::HolderName),
            other => Err(format!("unknown card field '{}'", other)),
        }
    }
}

/// Runs every form check in order and reports the first one that fails.
/// On success returns the detected brand.
pub fn validate(details: &CardDetails, today: NaiveDate) -> Result<CardType, PaymentError> {
    validate_number(details.number.trim())?;
    validate_expiry(details.expiry.trim(), today)?;
    validate_cvv(details.cvv.trim())?;
    validate_holder_name(details.holder_name.trim())?;
    Ok(details.card_type())
}

/// Same rules as [`validate`], restricted to a single field.
pub fn validate_field(
    field: CardField,
    details: &CardDetails,
    today: NaiveDate,
) -> Result<(), PaymentError> {
    match field {
        CardField::Number => validate_number(details.number.trim()).map(|_| ()),
        CardField::Expiry => validate_expiry(details.expiry.trim(), today),
        CardField::Cvv => validate_cvv(details.cvv.trim()),
        CardField::HolderName => validate_holder_name(details.holder_name.trim()),
    }
}

fn validate_number(number: &str) -> Result<CardType, PaymentError> {
    if number.chars().count() != CARD_NUMBER_LEN {
        return Err(PaymentError::InvalidCardNumber);
    }
    match CardType::detect(number) {
        CardType::Unknown => Err(PaymentError::UnknownCardType),
        card_type => Ok(card_type),
    }
}

fn validate_expiry(expiry: &str, today: NaiveDate) -> Result<(), PaymentError> {
    if expiry.chars().count() != 5 || !expiry.contains('/') {
        return Err(PaymentError::InvalidExpiryFormat);
    }
    if !is_valid_expiry(expiry, today) {
        return Err(PaymentError::CardExpired);
    }
    Ok(())
}

fn validate_cvv(cvv: &str) -> Result<(), PaymentError> {
    if cvv.chars().count() != CVV_LEN {
        return Err(PaymentError::InvalidCvv);
    }
    Ok(())
}

fn validate_holder_name(name: &str) -> Result<(), PaymentError> {
    if name.is_empty() {
        return Err(PaymentError::MissingHolderName);
    }
    Ok(())
}

/// A card is valid through the whole of its expiry month.
pub fn is_valid_expiry(expiry: &str, today: NaiveDate) -> bool {
    let Some((month, year)) = expiry.split_once('/') else {
        return false;
    };
    let (Ok(month), Ok(year)) = (month.parse::<u32>(), year.parse::<i32>()) else {
        return false;
    };
    if !(1..=12).contains(&month) {
        return false;
    }

    let current_year = today.year() % 100;
    let current_month = today.month();
    year > current_year || (year == current_year && month >= current_month)
}

/// A code of the wrong length is a format error; a well-formed code the
/// issuer does not accept is `InvalidOtp`.
pub fn validate_otp(code: &str) -> Result<(), PaymentError> {
    let code = code.trim();
    if code.chars().count() != OTP_LEN || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(PaymentError::InvalidOtpFormat);
    }
    if !ACCEPTED_OTPS.contains(&code) {
        return Err(PaymentError::InvalidOtp);
    }
    Ok(())
}

/// Inserts the `/` separator once two digits have been typed (`"1225"` -> `"12/25"`).
pub fn format_expiry_input(raw: &str) -> String {
    if raw.contains('/') {
        return raw.to_string();
    }
    match raw.char_indices().nth(2) {
        Some((split, _)) => format!("{}/{}", &raw[..split], &raw[split..]),
        None if raw.chars().count() == 2 => format!("{}/", raw),
        None => raw.to_string(),
    }
}
