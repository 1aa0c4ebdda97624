use crate::config::{DelayRange, Timings};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Every timed step a flow can schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayStep {
    CardGateway,
    CardAuthorisation,
    UpiApproval,
    CountdownTick,
    TapEvaluation,
    PinVerification,
}

/// Decides how long each simulated step takes.
///
/// The delays are presentation flavour, not business logic: swapping the
/// policy never changes which state a flow ends up in.
pub trait DelayPolicy: Send {
    fn delay(&mut self, step: DelayStep) -> Duration;
}

pub type DelayPolicyBox = Box<dyn DelayPolicy>;

/// Card steps are sampled uniformly from their configured ranges, the rest
/// use their fixed configured values.
pub struct RandomDelays {
    timings: Timings,
    rng: StdRng,
}

impl RandomDelays {
    pub fn new(timings: Timings, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { timings, rng }
    }

    fn sample(&mut self, range: DelayRange) -> Duration {
        let (low, high) = if range.min_ms <= range.max_ms {
            (range.min_ms, range.max_ms)
        } else {
            (range.max_ms, range.min_ms)
        };
        Duration::from_millis(self.rng.gen_range(low..=high))
    }
}

impl DelayPolicy for RandomDelays {
    fn delay(&mut self, step: DelayStep) -> Duration {
        match step {
            DelayStep::CardGateway => self.sample(self.timings.card_gateway),
            DelayStep::CardAuthorisation => self.sample(self.timings.card_authorisation),
            other => fixed_delay(&self.timings, other),
        }
    }
}

/// Uses the lower bound of every range, for deterministic runs.
#[derive(Debug, Clone, Default)]
pub struct FixedDelays {
    timings: Timings,
}

impl FixedDelays {
    pub fn new(timings: Timings) -> Self {
        Self { timings }
    }
}

impl DelayPolicy for FixedDelays {
    fn delay(&mut self, step: DelayStep) -> Duration {
        fixed_delay(&self.timings, step)
    }
}

/// Every step completes immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroDelays;

impl DelayPolicy for ZeroDelays {
    fn delay(&mut self, _step: DelayStep) -> Duration {
        Duration::ZERO
    }
}

fn fixed_delay(timings: &Timings, step: DelayStep) -> Duration {
    let millis = match step {
        DelayStep::CardGateway => timings.card_gateway.min_ms.min(timings.card_gateway.max_ms),
        DelayStep::CardAuthorisation => timings
            .card_authorisation
            .min_ms
            .min(timings.card_authorisation.max_ms),
        DelayStep::UpiApproval => timings.upi_approval_ms,
        DelayStep::CountdownTick => timings.countdown_tick_ms,
        DelayStep::TapEvaluation => timings.tap_evaluation_ms,
        DelayStep::PinVerification => timings.pin_verification_ms,
    };
    Duration::from_millis(millis)
}
