use super::delay::{DelayPolicy, DelayStep};
use super::{Effect, FlowInput, FlowOptions, seconds_since, unexpected};
use crate::domain::amount::Amount;
use crate::domain::outcome::{PaymentMethod, PaymentOutcome, duration_text};
use crate::domain::ports::{ScreenUpdate, Tone};
use crate::domain::tag::TagRead;
use crate::error::{PaymentError, Result};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// PIN the simulated card is issued with.
pub const CARD_PIN: &str = "2580";

const SUCCESS_VIBRATION: (u8, Duration) = (128, Duration::from_millis(150));
const FAILURE_VIBRATION: (u8, Duration) = (255, Duration::from_millis(400));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TapState {
    WaitForTag,
    /// A tag was read and is being evaluated.
    Reading(TagRead),
    PinEntry,
    /// PIN accepted, finishing the payment.
    Verifying,
    Failure(PaymentError),
    Success,
}

impl TapState {
    pub fn name(&self) -> &'static str {
        match self {
            TapState::WaitForTag => "wait_for_tag",
            TapState::Reading(_) | TapState::Verifying => "processing",
            TapState::PinEntry => "pin_entry",
            TapState::Failure(_) => "failure",
            TapState::Success => "success",
        }
    }
}

#[derive(Debug)]
pub struct TapFlow {
    amount: Amount,
    options: FlowOptions,
    state: TapState,
    /// Reset on every retry; the reported duration includes PIN entry.
    started_at: Instant,
}

impl TapFlow {
    pub fn start(amount: Amount, options: FlowOptions, now: Instant) -> (Self, Vec<Effect>) {
        let flow = Self {
            amount,
            options,
            state: TapState::WaitForTag,
            started_at: now,
        };
        (flow, vec![Effect::Render(ScreenUpdate::WaitForTag)])
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn state(&self) -> &TapState {
        &self.state
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn handle(
        &mut self,
        input: FlowInput,
        now: Instant,
        delays: &mut dyn DelayPolicy,
    ) -> Result<Vec<Effect>> {
        match (&self.state, input) {
            (TapState::Success, input) => Err(unexpected(self.state.name(), &input)),
            (TapState::Failure(reason), FlowInput::Cancel) => {
                let reason = reason.clone();
                Ok(vec![
                    Effect::CancelTimers,
                    Effect::Finish(PaymentOutcome::Failure { reason }),
                ])
            }
            (_, FlowInput::Cancel) => Ok(super::cancelled()),
            (TapState::WaitForTag, FlowInput::TagDetected(read)) => {
                self.state = TapState::Reading(read);
                Ok(vec![
                    Effect::Render(ScreenUpdate::Processing {
                        method: PaymentMethod::Tap,
                    }),
                    Effect::Schedule {
                        step: DelayStep::TapEvaluation,
                        after: delays.delay(DelayStep::TapEvaluation),
                    },
                ])
            }
            (state, FlowInput::TagDetected(_)) => {
                debug!(state = state.name(), "Ignoring tag outside of the tap screen");
                Ok(Vec::new())
            }
            (TapState::PinEntry, FlowInput::SubmitPin(pin)) => {
                if pin.trim() != CARD_PIN {
                    return Err(PaymentError::IncorrectPin.into());
                }
                self.state = TapState::Verifying;
                Ok(vec![
                    Effect::Render(ScreenUpdate::Processing {
                        method: PaymentMethod::Tap,
                    }),
                    Effect::Schedule {
                        step: DelayStep::PinVerification,
                        after: delays.delay(DelayStep::PinVerification),
                    },
                ])
            }
            (TapState::Failure(_), FlowInput::Retry) => {
                self.state = TapState::WaitForTag;
                self.started_at = now;
                Ok(vec![Effect::Render(ScreenUpdate::WaitForTag)])
            }
            (state, input) => Err(unexpected(state.name(), &input)),
        }
    }

    pub fn on_timer(&mut self, step: DelayStep, now: Instant) -> Vec<Effect> {
        match (&self.state, step) {
            (TapState::Reading(read), DelayStep::TapEvaluation) => match read.evaluate() {
                Ok(()) => {
                    self.state = TapState::PinEntry;
                    vec![Effect::Render(ScreenUpdate::PinEntry)]
                }
                Err(reason) => {
                    warn!(%reason, "Tap payment failed");
                    let mut effects = vec![
                        Effect::Render(ScreenUpdate::TapFailure {
                            message: reason.to_string(),
                        }),
                        Effect::Tone(Tone::Nack),
                    ];
                    if self.options.haptics {
                        let (amplitude, duration) = FAILURE_VIBRATION;
                        effects.push(Effect::Vibrate {
                            amplitude,
                            duration,
                        });
                    }
                    self.state = TapState::Failure(reason);
                    effects
                }
            },
            (TapState::Verifying, DelayStep::PinVerification) => {
                self.state = TapState::Success;
                let duration_seconds = seconds_since(self.started_at, now);
                info!(duration_seconds, "Tap payment completed");
                let mut effects = vec![
                    Effect::Render(ScreenUpdate::Success {
                        method: PaymentMethod::Tap,
                        duration_text: duration_text(duration_seconds),
                    }),
                    Effect::Tone(Tone::Ack),
                ];
                if self.options.haptics {
                    let (amplitude, duration) = SUCCESS_VIBRATION;
                    effects.push(Effect::Vibrate {
                        amplitude,
                        duration,
                    });
                }
                effects.push(Effect::Finish(PaymentOutcome::Success { duration_seconds }));
                effects
            }
            (state, step) => {
                debug!(state = state.name(), ?step, "Ignoring stale tap timer");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tag::text_record;
    use crate::error::CheckoutError;
    use crate::flow::delay::FixedDelays;

    fn tap(flow: &mut TapFlow, read: TagRead, now: Instant) -> Vec<Effect> {
        let mut delays = FixedDelays::default();
        flow.handle(FlowInput::TagDetected(read), now, &mut delays)
            .unwrap();
        flow.on_timer(DelayStep::TapEvaluation, now + Duration::from_secs(2))
    }

    #[test]
    fn test_pay_tag_then_pin_succeeds() {
        let mut delays = FixedDelays::default();
        let t0 = Instant::now();
        let (mut flow, effects) = TapFlow::start(Amount::new(50), FlowOptions::default(), t0);
        assert_eq!(effects, vec![Effect::Render(ScreenUpdate::WaitForTag)]);

        let payload = vec![0x02, 0x65, 0x6e, b'P', b'A', b'Y'];
        let effects = tap(&mut flow, TagRead::Payload(payload), t0);
        assert_eq!(effects, vec![Effect::Render(ScreenUpdate::PinEntry)]);

        let t1 = t0 + Duration::from_secs(8);
        let effects = flow
            .handle(FlowInput::SubmitPin("2580".into()), t1, &mut delays)
            .unwrap();
        assert!(effects.contains(&Effect::Schedule {
            step: DelayStep::PinVerification,
            after: Duration::from_secs(2),
        }));
        assert_eq!(flow.state(), &TapState::Verifying);
        assert_eq!(flow.state().name(), "processing");

        let effects = flow.on_timer(DelayStep::PinVerification, t1 + Duration::from_secs(2));
        assert!(effects.contains(&Effect::Tone(Tone::Ack)));
        assert_eq!(
            effects.last(),
            Some(&Effect::Finish(PaymentOutcome::Success {
                duration_seconds: 10.0
            }))
        );
    }

    #[test]
    fn test_bad_tags_fail() {
        let now = Instant::now();
        for (read, reason) in [
            (TagRead::Payload(text_record("NO")), PaymentError::InvalidCardPayload),
            (TagRead::Payload(vec![0x02, 0x65, 0x6e]), PaymentError::InvalidCardPayload),
            (TagRead::NoData, PaymentError::NoNdefData),
            (TagRead::Unreadable, PaymentError::DecodeError),
        ] {
            let (mut flow, _) = TapFlow::start(Amount::new(50), FlowOptions::default(), now);
            let effects = tap(&mut flow, read, now);
            assert!(effects.contains(&Effect::Tone(Tone::Nack)));
            assert!(effects.iter().any(|e| matches!(e, Effect::Vibrate { .. })));
            assert_eq!(flow.state(), &TapState::Failure(reason));
        }
    }

    #[test]
    fn test_failure_without_haptics() {
        let now = Instant::now();
        let options = FlowOptions {
            haptics: false,
            ..FlowOptions::default()
        };
        let (mut flow, _) = TapFlow::start(Amount::new(50), options, now);
        let effects = tap(&mut flow, TagRead::NoData, now);
        assert!(!effects.iter().any(|e| matches!(e, Effect::Vibrate { .. })));
    }

    #[test]
    fn test_retry_resets_start_time() {
        let mut delays = FixedDelays::default();
        let t0 = Instant::now();
        let (mut flow, _) = TapFlow::start(Amount::new(50), FlowOptions::default(), t0);
        tap(&mut flow, TagRead::NoData, t0);

        let t1 = t0 + Duration::from_secs(30);
        let effects = flow.handle(FlowInput::Retry, t1, &mut delays).unwrap();
        assert_eq!(effects, vec![Effect::Render(ScreenUpdate::WaitForTag)]);
        assert_eq!(flow.state(), &TapState::WaitForTag);
        assert_eq!(flow.started_at(), t1);
    }

    #[test]
    fn test_incorrect_pin_stays_in_pin_entry() {
        let mut delays = FixedDelays::default();
        let now = Instant::now();
        let (mut flow, _) = TapFlow::start(Amount::new(50), FlowOptions::default(), now);
        tap(&mut flow, TagRead::Payload(text_record("PAY")), now);

        let result = flow.handle(FlowInput::SubmitPin("1234".into()), now, &mut delays);
        assert!(matches!(
            result,
            Err(CheckoutError::Rejected(PaymentError::IncorrectPin))
        ));
        assert_eq!(flow.state(), &TapState::PinEntry);
    }

    #[test]
    fn test_tag_ignored_while_processing() {
        let mut delays = FixedDelays::default();
        let now = Instant::now();
        let (mut flow, _) = TapFlow::start(Amount::new(50), FlowOptions::default(), now);
        flow.handle(FlowInput::TagDetected(TagRead::NoData), now, &mut delays)
            .unwrap();
        let effects = flow
            .handle(
                FlowInput::TagDetected(TagRead::Payload(text_record("PAY"))),
                now,
                &mut delays,
            )
            .unwrap();
        assert!(effects.is_empty());
        assert_eq!(flow.state(), &TapState::Reading(TagRead::NoData));
    }

    #[test]
    fn test_cancel_from_failure_reports_reason() {
        let mut delays = FixedDelays::default();
        let now = Instant::now();
        let (mut flow, _) = TapFlow::start(Amount::new(50), FlowOptions::default(), now);
        tap(&mut flow, TagRead::NoData, now);

        let effects = flow.handle(FlowInput::Cancel, now, &mut delays).unwrap();
        assert_eq!(
            effects,
            vec![
                Effect::CancelTimers,
                Effect::Finish(PaymentOutcome::Failure {
                    reason: PaymentError::NoNdefData
                })
            ]
        );
    }
}
