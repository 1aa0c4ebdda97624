use crate::config::CheckoutConfig;
use crate::domain::cart::Cart;
use crate::domain::outcome::{PaymentMethod, PaymentOutcome, Receipt};
use crate::domain::policy::TransactionPolicy;
use crate::domain::ports::ScreenUpdate;
use crate::error::{CheckoutError, PaymentError, Result};
use crate::flow::delay::{DelayPolicyBox, DelayStep};
use crate::flow::{Effect, Flow, FlowInput, FlowOptions};
use std::fmt;
use std::str::FromStr;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Identifies one flow instance. Timers carry it so that a timer outliving
/// its flow can be recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlowId(u64);

impl FlowId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "flow-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// Pay with the default method.
    SwipeRight,
    /// Clear the cart.
    SwipeLeft,
}

impl FromStr for Gesture {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "right" | "swipe_right" => Ok(Gesture::SwipeRight),
            "left" | "swipe_left" => Ok(Gesture::SwipeLeft),
            other => Err(format!("unknown gesture '{}'", other)),
        }
    }
}

struct ActiveFlow {
    id: FlowId,
    flow: Flow,
}

/// The long-lived checkout context of one terminal.
///
/// Owns the cart and at most one running payment flow. Everything here is
/// synchronous and clock-free: callers pass the current instant in and
/// execute the returned effects.
pub struct CheckoutSession {
    cart: Cart,
    policy: TransactionPolicy,
    options: FlowOptions,
    gestures: bool,
    default_method: PaymentMethod,
    delays: DelayPolicyBox,
    session_started_at: Instant,
    payment_started_at: Option<Instant>,
    expired: bool,
    active: Option<ActiveFlow>,
    next_flow_id: u64,
    history: Vec<Receipt>,
}

impl CheckoutSession {
    /// Creates a new `CheckoutSession` with an empty cart.
    ///
    /// # Arguments
    ///
    /// * `config` - Prices, policy limits and feature flags.
    /// * `delays` - How long each simulated processing step takes.
    /// * `now` - Session start.
    pub fn new(config: &CheckoutConfig, delays: DelayPolicyBox, now: Instant) -> Self {
        Self {
            cart: Cart::new(config.prices.clone()),
            policy: config.policy(),
            options: FlowOptions::from(config),
            gestures: config.flags.gestures,
            default_method: config.default_method,
            delays,
            session_started_at: now,
            payment_started_at: None,
            expired: false,
            active: None,
            next_flow_id: 1,
            history: Vec::new(),
        }
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn session_started_at(&self) -> Instant {
        self.session_started_at
    }

    pub fn payment_started_at(&self) -> Option<Instant> {
        self.payment_started_at
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    pub fn active_flow_id(&self) -> Option<FlowId> {
        self.active.as_ref().map(|active| active.id)
    }

    pub fn active_method(&self) -> Option<PaymentMethod> {
        self.active.as_ref().map(|active| active.flow.method())
    }

    /// Name of the active flow's state, e.g. `"otp"`.
    pub fn active_state(&self) -> Option<&'static str> {
        self.active.as_ref().map(|active| active.flow.state_name())
    }

    /// Finished flows, oldest first.
    pub fn history(&self) -> &[Receipt] {
        &self.history
    }

    pub fn add_item(&mut self, item: &str) -> Result<Vec<Effect>> {
        self.cart.add_item(item)?;
        Ok(vec![self.cart_update()])
    }

    pub fn remove_item(&mut self, item: &str) -> Vec<Effect> {
        self.cart.remove_item(item);
        vec![self.cart_update()]
    }

    pub fn clear_cart(&mut self) -> Vec<Effect> {
        self.cart.clear();
        vec![self.cart_update()]
    }

    /// Gates a checkout on the policy and, if it passes, starts the flow for `method`.
    ///
    /// Checks run in order: empty cart, running flow, session timeout, amount limit.
    pub fn start_checkout(&mut self, method: PaymentMethod, now: Instant) -> Result<Vec<Effect>> {
        if self.cart.is_empty() {
            return Err(PaymentError::CartEmpty.into());
        }
        if let Some(active) = &self.active {
            return Err(CheckoutError::FlowAlreadyActive(active.flow.method()));
        }
        if self.expired {
            return Err(PaymentError::SessionExpired.into());
        }
        if let Err(rejection) = self.policy.check_session(now, self.session_started_at) {
            warn!("Session expired, awaiting acknowledgement");
            self.expired = true;
            return Err(rejection.into());
        }
        let total = self.cart.total();
        self.policy.check_limit(total)?;

        let id = FlowId(self.next_flow_id);
        self.next_flow_id += 1;
        let (flow, effects) = Flow::start(method, total, self.options, now);
        info!(flow = %id, %method, amount = %total, "Checkout started");
        self.active = Some(ActiveFlow { id, flow });
        self.payment_started_at = Some(now);
        Ok(effects)
    }

    /// Forwards a customer input to the running flow.
    pub fn handle(&mut self, input: FlowInput, now: Instant) -> Result<Vec<Effect>> {
        let active = self.active.as_mut().ok_or(CheckoutError::NoActiveFlow)?;
        let effects = active.flow.handle(input, now, self.delays.as_mut())?;
        Ok(self.absorb(effects))
    }

    /// Back navigation out of the running flow.
    pub fn cancel_flow(&mut self, now: Instant) -> Result<Vec<Effect>> {
        self.handle(FlowInput::Cancel, now)
    }

    /// Delivers a fired timer. Timers of a flow that is no longer running are dropped.
    pub fn on_timer(&mut self, flow: FlowId, step: DelayStep, now: Instant) -> Vec<Effect> {
        let Some(active) = self.active.as_mut().filter(|active| active.id == flow) else {
            debug!(%flow, ?step, "Dropping timer of a finished flow");
            return Vec::new();
        };
        let effects = active.flow.on_timer(step, now, self.delays.as_mut());
        self.absorb(effects)
    }

    /// Tears down the running flow after it reported `outcome`.
    ///
    /// A successful payment empties the cart; any other outcome leaves it as it was.
    pub fn on_flow_outcome(&mut self, outcome: &PaymentOutcome) -> Vec<Effect> {
        let Some(active) = self.active.take() else {
            return Vec::new();
        };
        self.payment_started_at = None;
        let receipt = Receipt {
            method: active.flow.method(),
            amount: active.flow.amount(),
            outcome: outcome.clone(),
        };
        info!(
            flow = %active.id,
            method = %receipt.method,
            status = outcome.status(),
            "Payment flow finished"
        );
        self.history.push(receipt);

        let mut effects = vec![Effect::CancelTimers];
        if outcome.is_success() {
            self.cart.clear();
            effects.push(self.cart_update());
        }
        effects
    }

    /// Confirms the timeout notice: the session restarts with an empty cart.
    pub fn acknowledge_timeout(&mut self, now: Instant) -> Vec<Effect> {
        self.expired = false;
        self.session_started_at = now;
        self.cart.clear();
        info!("Session restarted");
        vec![self.cart_update()]
    }

    /// Swipe shortcuts for paying and clearing. Ignored when gestures are disabled.
    pub fn gesture(&mut self, gesture: Gesture, now: Instant) -> Result<Vec<Effect>> {
        if !self.gestures {
            debug!(?gesture, "Gestures disabled");
            return Ok(Vec::new());
        }
        match gesture {
            Gesture::SwipeRight => self.start_checkout(self.default_method, now),
            Gesture::SwipeLeft => Ok(self.clear_cart()),
        }
    }

    /// Runs the session side of any `Finish` the flow emitted.
    fn absorb(&mut self, mut effects: Vec<Effect>) -> Vec<Effect> {
        let outcome = effects.iter().find_map(|effect| match effect {
            Effect::Finish(outcome) => Some(outcome.clone()),
            _ => None,
        });
        if let Some(outcome) = outcome {
            let teardown = self.on_flow_outcome(&outcome);
            effects.extend(teardown);
        }
        effects
    }

    fn cart_update(&self) -> Effect {
        Effect::Render(ScreenUpdate::Cart {
            lines: self.cart.lines(),
            total: self.cart.total(),
        })
    }
}
