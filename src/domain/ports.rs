use super::amount::Amount;
use super::card::{CardField, CardType};
use super::cart::CartLine;
use super::outcome::PaymentMethod;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use std::time::Duration;

/// Reads the NDEF payload of a tag held against the terminal.
///
/// `Ok(None)` means the tag carried no NDEF message; `Err` means the read
/// itself failed.
#[async_trait]
pub trait TagReader: Send + Sync {
    async fn read_tag(&self) -> Result<Option<Vec<u8>>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Tone {
    Ack,
    Nack,
    Beep,
}

/// Audio and haptic feedback. Fire-and-forget.
pub trait Feedback: Send + Sync {
    fn play_tone(&self, tone: Tone);
    fn vibrate(&self, amplitude: u8, duration: Duration);
}

/// A state change the screen should reflect.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum ScreenUpdate {
    Cart {
        lines: Vec<CartLine>,
        total: Amount,
    },
    CardForm,
    /// Brand hint next to the card number; `None` hides it.
    CardBrand {
        card_type: Option<CardType>,
    },
    FieldError {
        field: CardField,
        message: String,
    },
    Processing {
        method: PaymentMethod,
    },
    Otp,
    UpiForm,
    UpiApproval {
        remaining_secs: u32,
    },
    WaitForTag,
    PinEntry,
    TapFailure {
        message: String,
    },
    Success {
        method: PaymentMethod,
        duration_text: String,
    },
    SessionExpired,
}

/// Receives screen updates and user-facing error messages. The core never
/// reads anything back from it.
pub trait Presenter: Send + Sync {
    fn render(&self, update: &ScreenUpdate);
    fn error(&self, error: &PaymentError);
}

/// Source of the calendar date used for card expiry checks.
pub trait Calendar: Send + Sync {
    fn today(&self) -> NaiveDate;
}

pub type TagReaderBox = Box<dyn TagReader>;
pub type FeedbackBox = Box<dyn Feedback>;
pub type PresenterBox = Box<dyn Presenter>;
pub type CalendarBox = Box<dyn Calendar>;
