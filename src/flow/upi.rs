use super::delay::{DelayPolicy, DelayStep};
use super::{Effect, FlowInput, FlowOptions, cancelled, seconds_since, unexpected};
use crate::domain::amount::Amount;
use crate::domain::outcome::{PaymentMethod, PaymentOutcome, duration_text};
use crate::domain::ports::ScreenUpdate;
use crate::domain::upi;
use crate::error::Result;
use tokio::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpiState {
    Form,
    /// Waiting for the payer to approve the collect request. The countdown is
    /// display only: approval arrives on its own timer.
    Approval { remaining_secs: u32 },
    Success,
}

impl UpiState {
    pub fn name(self) -> &'static str {
        match self {
            UpiState::Form => "form",
            UpiState::Approval { .. } => "approval",
            UpiState::Success => "success",
        }
    }
}

#[derive(Debug)]
pub struct UpiFlow {
    amount: Amount,
    options: FlowOptions,
    state: UpiState,
    started_at: Option<Instant>,
}

impl UpiFlow {
    pub fn start(amount: Amount, options: FlowOptions, _now: Instant) -> (Self, Vec<Effect>) {
        let flow = Self {
            amount,
            options,
            state: UpiState::Form,
            started_at: None,
        };
        (flow, vec![Effect::Render(ScreenUpdate::UpiForm)])
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn state(&self) -> UpiState {
        self.state
    }

    pub fn handle(
        &mut self,
        input: FlowInput,
        now: Instant,
        delays: &mut dyn DelayPolicy,
    ) -> Result<Vec<Effect>> {
        match (self.state, input) {
            (UpiState::Success, input) => Err(unexpected(self.state.name(), &input)),
            (_, FlowInput::Cancel) => Ok(cancelled()),
            (UpiState::Form, FlowInput::SubmitUpi(address)) => {
                upi::validate_address(&address)?;
                let remaining_secs = self.options.countdown_secs;
                info!(address = address.trim(), "UPI collect request sent");
                self.started_at = Some(now);
                self.state = UpiState::Approval { remaining_secs };
                Ok(vec![
                    Effect::Render(ScreenUpdate::UpiApproval { remaining_secs }),
                    Effect::Schedule {
                        step: DelayStep::CountdownTick,
                        after: delays.delay(DelayStep::CountdownTick),
                    },
                    Effect::Schedule {
                        step: DelayStep::UpiApproval,
                        after: delays.delay(DelayStep::UpiApproval),
                    },
                ])
            }
            (state, input) => Err(unexpected(state.name(), &input)),
        }
    }

    pub fn on_timer(
        &mut self,
        step: DelayStep,
        now: Instant,
        delays: &mut dyn DelayPolicy,
    ) -> Vec<Effect> {
        match (self.state, step) {
            (UpiState::Approval { remaining_secs }, DelayStep::CountdownTick) => {
                let remaining_secs = remaining_secs.saturating_sub(1);
                self.state = UpiState::Approval { remaining_secs };
                if remaining_secs == 0 {
                    return vec![Effect::Render(ScreenUpdate::Processing {
                        method: PaymentMethod::Upi,
                    })];
                }
                vec![
                    Effect::Render(ScreenUpdate::UpiApproval { remaining_secs }),
                    Effect::Schedule {
                        step: DelayStep::CountdownTick,
                        after: delays.delay(DelayStep::CountdownTick),
                    },
                ]
            }
            (UpiState::Approval { remaining_secs }, DelayStep::UpiApproval) => {
                self.state = UpiState::Success;
                let duration_seconds = seconds_since(self.started_at.unwrap_or(now), now);
                info!(
                    duration_seconds,
                    countdown_left = remaining_secs,
                    "UPI payment approved"
                );
                vec![
                    Effect::CancelTimers,
                    Effect::Render(ScreenUpdate::Success {
                        method: PaymentMethod::Upi,
                        duration_text: duration_text(duration_seconds),
                    }),
                    Effect::Finish(PaymentOutcome::Success { duration_seconds }),
                ]
            }
            (state, step) => {
                debug!(state = state.name(), ?step, "Ignoring stale UPI timer");
                Vec::new()
            }
        }
    }
}
