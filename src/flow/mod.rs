//! Payment flow state machines.
//!
//! Every flow is an enum state plus a transition function: an input (or a
//! fired timer) and the current instant go in, a list of [`Effect`]s comes
//! out. Flows never sleep, spawn or render; the terminal executes their
//! effects and feeds fired timers back in.

pub mod card;
pub mod delay;
pub mod tap;
pub mod upi;

use crate::config::CheckoutConfig;
use crate::domain::amount::Amount;
use crate::domain::card::{CardDetails, CardField};
use crate::domain::outcome::{PaymentMethod, PaymentOutcome};
use crate::domain::ports::{ScreenUpdate, Tone};
use crate::domain::tag::TagRead;
use crate::error::{CheckoutError, Result};
use card::CardFlow;
use chrono::NaiveDate;
use delay::{DelayPolicy, DelayStep};
use std::time::Duration;
use tap::TapFlow;
use tokio::time::Instant;
use upi::UpiFlow;

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Render(ScreenUpdate),
    /// Fire `step` back into the flow after `after`.
    Schedule { step: DelayStep, after: Duration },
    /// Drop every timer the flow still has pending.
    CancelTimers,
    Tone(Tone),
    Vibrate { amplitude: u8, duration: Duration },
    /// The flow is over and must be discarded.
    Finish(PaymentOutcome),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlowInput {
    SubmitCard {
        details: CardDetails,
        today: NaiveDate,
    },
    FieldBlur {
        field: CardField,
        details: CardDetails,
        today: NaiveDate,
    },
    CardNumberChanged(String),
    SubmitOtp(String),
    SubmitUpi(String),
    TagDetected(TagRead),
    SubmitPin(String),
    Retry,
    /// Back navigation.
    Cancel,
}

impl FlowInput {
    pub fn name(&self) -> &'static str {
        match self {
            FlowInput::SubmitCard { .. } => "card details",
            FlowInput::FieldBlur { .. } => "field check",
            FlowInput::CardNumberChanged(_) => "card number",
            FlowInput::SubmitOtp(_) => "OTP",
            FlowInput::SubmitUpi(_) => "UPI address",
            FlowInput::TagDetected(_) => "tag",
            FlowInput::SubmitPin(_) => "PIN",
            FlowInput::Retry => "retry",
            FlowInput::Cancel => "cancel",
        }
    }
}

/// Per-flow switches taken from the terminal configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowOptions {
    pub field_errors: bool,
    pub haptics: bool,
    pub countdown_secs: u32,
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self {
            field_errors: true,
            haptics: true,
            countdown_secs: 40,
        }
    }
}

impl From<&CheckoutConfig> for FlowOptions {
    fn from(config: &CheckoutConfig) -> Self {
        Self {
            field_errors: config.flags.field_errors,
            haptics: config.flags.haptics,
            countdown_secs: config.timings.upi_countdown_secs,
        }
    }
}

/// The one flow a checkout runs, whichever method was picked.
#[derive(Debug)]
pub enum Flow {
    Card(CardFlow),
    Upi(UpiFlow),
    Tap(TapFlow),
}

impl Flow {
    /// Creates the flow for `method` and returns the effects of entering it.
    pub fn start(
        method: PaymentMethod,
        amount: Amount,
        options: FlowOptions,
        now: Instant,
    ) -> (Self, Vec<Effect>) {
        match method {
            PaymentMethod::Card => {
                let (flow, effects) = CardFlow::start(amount, options, now);
                (Flow::Card(flow), effects)
            }
            PaymentMethod::Upi => {
                let (flow, effects) = UpiFlow::start(amount, options, now);
                (Flow::Upi(flow), effects)
            }
            PaymentMethod::Tap => {
                let (flow, effects) = TapFlow::start(amount, options, now);
                (Flow::Tap(flow), effects)
            }
        }
    }

    pub fn method(&self) -> PaymentMethod {
        match self {
            Flow::Card(_) => PaymentMethod::Card,
            Flow::Upi(_) => PaymentMethod::Upi,
            Flow::Tap(_) => PaymentMethod::Tap,
        }
    }

    pub fn amount(&self) -> Amount {
        match self {
            Flow::Card(flow) => flow.amount(),
            Flow::Upi(flow) => flow.amount(),
            Flow::Tap(flow) => flow.amount(),
        }
    }

    pub fn state_name(&self) -> &'static str {
        match self {
            Flow::Card(flow) => flow.state().name(),
            Flow::Upi(flow) => flow.state().name(),
            Flow::Tap(flow) => flow.state().name(),
        }
    }

    pub fn handle(
        &mut self,
        input: FlowInput,
        now: Instant,
        delays: &mut dyn DelayPolicy,
    ) -> Result<Vec<Effect>> {
        match self {
            Flow::Card(flow) => flow.handle(input, now, delays),
            Flow::Upi(flow) => flow.handle(input, now, delays),
            Flow::Tap(flow) => flow.handle(input, now, delays),
        }
    }

    pub fn on_timer(
        &mut self,
        step: DelayStep,
        now: Instant,
        delays: &mut dyn DelayPolicy,
    ) -> Vec<Effect> {
        match self {
            Flow::Card(flow) => flow.on_timer(step, now),
            Flow::Upi(flow) => flow.on_timer(step, now, delays),
            Flow::Tap(flow) => flow.on_timer(step, now),
        }
    }
}

pub(crate) fn unexpected(state: &'static str, input: &FlowInput) -> CheckoutError {
    CheckoutError::UnexpectedInput {
        state,
        input: input.name(),
    }
}

pub(crate) fn cancelled() -> Vec<Effect> {
    vec![Effect::CancelTimers, Effect::Finish(PaymentOutcome::Cancelled)]
}

pub(crate) fn seconds_since(started_at: Instant, now: Instant) -> f64 {
    now.saturating_duration_since(started_at).as_secs_f64()
}
