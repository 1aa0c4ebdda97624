use super::delay::{DelayPolicy, DelayStep};
use super::{Effect, FlowInput, FlowOptions, cancelled, seconds_since, unexpected};
use crate::domain::amount::Amount;
use crate::domain::card::{self, CardType};
use crate::domain::outcome::{PaymentMethod, PaymentOutcome, duration_text};
use crate::domain::ports::ScreenUpdate;
use crate::error::Result;
use tokio::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardState {
    Form,
    /// Waiting on the simulated gateway before the OTP prompt.
    Processing,
    Otp,
    /// OTP accepted, waiting for the final authorisation.
    Authorising,
    Success,
}

impl CardState {
    pub fn name(self) -> &'static str {
        match self {
            CardState::Form => "form",
            CardState::Processing | CardState::Authorising => "processing",
            CardState::Otp => "otp",
            CardState::Success => "success",
        }
    }
}

#[derive(Debug)]
pub struct CardFlow {
    amount: Amount,
    options: FlowOptions,
    state: CardState,
    /// Set when the details are accepted; the reported duration runs from here.
    started_at: Option<Instant>,
    card_type: Option<CardType>,
}

impl CardFlow {
    pub fn start(amount: Amount, options: FlowOptions, _now: Instant) -> (Self, Vec<Effect>) {
        let flow = Self {
            amount,
            options,
            state: CardState::Form,
            started_at: None,
            card_type: None,
        };
        (flow, vec![Effect::Render(ScreenUpdate::CardForm)])
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn state(&self) -> CardState {
        self.state
    }

    pub fn card_type(&self) -> Option<CardType> {
        self.card_type
    }

    pub fn handle(
        &mut self,
        input: FlowInput,
        now: Instant,
        delays: &mut dyn DelayPolicy,
    ) -> Result<Vec<Effect>> {
        match (self.state, input) {
            (CardState::Success, input) => Err(unexpected(self.state.name(), &input)),
            (_, FlowInput::Cancel) => Ok(cancelled()),
            (CardState::Form, FlowInput::SubmitCard { details, today }) => {
                let card_type = card::validate(&details, today)?;
                info!(%card_type, "Card details accepted");
                self.card_type = Some(card_type);
                self.started_at = Some(now);
                self.state = CardState::Processing;
                Ok(vec![
                    Effect::Render(ScreenUpdate::CardBrand {
                        card_type: Some(card_type),
                    }),
                    Effect::Render(ScreenUpdate::Processing {
                        method: PaymentMethod::Card,
                    }),
                    Effect::Schedule {
                        step: DelayStep::CardGateway,
                        after: delays.delay(DelayStep::CardGateway),
                    },
                ])
            }
            (
                CardState::Form,
                FlowInput::FieldBlur {
                    field,
                    details,
                    today,
                },
            ) => {
                if !self.options.field_errors {
                    return Ok(Vec::new());
                }
                Ok(match card::validate_field(field, &details, today) {
                    Ok(()) => Vec::new(),
                    Err(error) => vec![Effect::Render(ScreenUpdate::FieldError {
                        field,
                        message: error.to_string(),
                    })],
                })
            }
            (CardState::Form, FlowInput::CardNumberChanged(number)) => {
                let number = number.trim();
                Ok(match CardType::detect(number) {
                    _ if number.is_empty() => {
                        vec![Effect::Render(ScreenUpdate::CardBrand { card_type: None })]
                    }
                    // Keep whatever hint is showing until a brand is recognised
                    CardType::Unknown => Vec::new(),
                    card_type => vec![Effect::Render(ScreenUpdate::CardBrand {
                        card_type: Some(card_type),
                    })],
                })
            }
            (CardState::Otp, FlowInput::SubmitOtp(code)) => {
                card::validate_otp(&code)?;
                self.state = CardState::Authorising;
                Ok(vec![
                    Effect::Render(ScreenUpdate::Processing {
                        method: PaymentMethod::Card,
                    }),
                    Effect::Schedule {
                        step: DelayStep::CardAuthorisation,
                        after: delays.delay(DelayStep::CardAuthorisation),
                    },
                ])
            }
            (state, input) => Err(unexpected(state.name(), &input)),
        }
    }

    pub fn on_timer(&mut self, step: DelayStep, now: Instant) -> Vec<Effect> {
        match (self.state, step) {
            (CardState::Processing, DelayStep::CardGateway) => {
                self.state = CardState::Otp;
                vec![Effect::Render(ScreenUpdate::Otp)]
            }
            (CardState::Authorising, DelayStep::CardAuthorisation) => {
                self.state = CardState::Success;
                let duration_seconds = seconds_since(self.started_at.unwrap_or(now), now);
                info!(duration_seconds, "Card payment authorised");
                vec![
                    Effect::Render(ScreenUpdate::Success {
                        method: PaymentMethod::Card,
                        duration_text: duration_text(duration_seconds),
                    }),
                    Effect::Finish(PaymentOutcome::Success { duration_seconds }),
                ]
            }
            (state, step) => {
                debug!(state = state.name(), ?step, "Ignoring stale card timer");
                Vec::new()
            }
        }
    }
}
