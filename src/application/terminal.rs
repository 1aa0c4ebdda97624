use super::scheduler::{TimerFired, TimerScheduler};
use super::session::{CheckoutSession, Gesture};
use crate::domain::card::{CardDetails, CardField};
use crate::domain::outcome::{PaymentMethod, Receipt};
use crate::domain::ports::{
    CalendarBox, FeedbackBox, PresenterBox, ScreenUpdate, TagReaderBox, Tone,
};
use crate::domain::tag::TagRead;
use crate::error::{CheckoutError, PaymentError, Result};
use crate::flow::{Effect, FlowInput};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

const TAP_WAITING_STATE: &str = "wait_for_tag";

/// One cashier or customer action.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddItem(String),
    RemoveItem(String),
    ClearCart,
    Checkout(PaymentMethod),
    SubmitCard(CardDetails),
    /// Validate one field of the card details last entered.
    FieldBlur(CardField),
    CardNumberChanged(String),
    SubmitOtp(String),
    SubmitUpi(String),
    /// Hold a tag against the reader.
    Tap,
    SubmitPin(String),
    Retry,
    Back,
    /// Let the clock run, delivering any timers that fall due.
    Wait(Duration),
    /// Deliver timers until none is pending.
    Settle,
    Swipe(Gesture),
    AcknowledgeTimeout,
}

/// The terminal event loop.
///
/// `Terminal` owns the session and its collaborators. Commands and fired
/// timers are processed one at a time on the calling task, and every effect
/// they produce is executed here.
pub struct Terminal {
    session: CheckoutSession,
    presenter: PresenterBox,
    feedback: FeedbackBox,
    tag_reader: TagReaderBox,
    calendar: CalendarBox,
    scheduler: TimerScheduler,
    /// Card details as last typed, used for per-field checks.
    draft: CardDetails,
}

impl Terminal {
    /// Creates a new `Terminal`.
    ///
    /// # Arguments
    ///
    /// * `session` - The checkout session to drive.
    /// * `presenter` - Receives screen updates and error messages.
    /// * `feedback` - Plays tones and vibrations.
    /// * `tag_reader` - Source of tag payloads for tap payments.
    /// * `calendar` - Today's date for card expiry checks.
    pub fn new(
        session: CheckoutSession,
        presenter: PresenterBox,
        feedback: FeedbackBox,
        tag_reader: TagReaderBox,
        calendar: CalendarBox,
    ) -> Self {
        Self {
            session,
            presenter,
            feedback,
            tag_reader,
            calendar,
            scheduler: TimerScheduler::new(),
            draft: CardDetails::default(),
        }
    }

    pub fn session(&self) -> &CheckoutSession {
        &self.session
    }

    pub fn history(&self) -> &[Receipt] {
        self.session.history()
    }

    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending_count()
    }

    /// Processes one command.
    ///
    /// Rejections are shown on the presenter and also returned, so callers
    /// can report them; the terminal stays usable either way.
    pub async fn dispatch(&mut self, command: Command) -> Result<()> {
        debug!(?command, "Dispatching command");
        let now = Instant::now();
        let result = match command {
            Command::AddItem(item) => self.session.add_item(&item),
            Command::RemoveItem(item) => Ok(self.session.remove_item(&item)),
            Command::ClearCart => Ok(self.session.clear_cart()),
            Command::Checkout(method) => self.session.start_checkout(method, now),
            Command::SubmitCard(details) => {
                self.draft = details.clone();
                let today = self.calendar.today();
                self.session
                    .handle(FlowInput::SubmitCard { details, today }, now)
            }
            Command::FieldBlur(field) => {
                let input = FlowInput::FieldBlur {
                    field,
                    details: self.draft.clone(),
                    today: self.calendar.today(),
                };
                self.session.handle(input, now)
            }
            Command::CardNumberChanged(number) => {
                self.draft.number = number.clone();
                self.session
                    .handle(FlowInput::CardNumberChanged(number), now)
            }
            Command::SubmitOtp(otp) => self.session.handle(FlowInput::SubmitOtp(otp), now),
            Command::SubmitUpi(address) => {
                self.session.handle(FlowInput::SubmitUpi(address), now)
            }
            Command::Tap => {
                // Only the tap screen listens to the reader; elsewhere the tag is
                // left in the field and the flow sees an empty read.
                let read = if self.session.active_state() == Some(TAP_WAITING_STATE) {
                    self.read_tag().await
                } else {
                    TagRead::NoData
                };
                self.session.handle(FlowInput::TagDetected(read), now)
            }
            Command::SubmitPin(pin) => self.session.handle(FlowInput::SubmitPin(pin), now),
            Command::Retry => self.session.handle(FlowInput::Retry, now),
            Command::Back => self.session.cancel_flow(now),
            Command::Wait(duration) => {
                self.run_for(duration).await;
                return Ok(());
            }
            Command::Settle => {
                self.settle().await;
                return Ok(());
            }
            Command::Swipe(gesture) => self.session.gesture(gesture, now),
            Command::AcknowledgeTimeout => Ok(self.session.acknowledge_timeout(now)),
        };

        match result {
            Ok(effects) => {
                self.apply(effects);
                Ok(())
            }
            Err(error) => {
                self.report(&error);
                Err(error)
            }
        }
    }

    /// Delivers timers until none is pending.
    pub async fn settle(&mut self) {
        while self.scheduler.has_pending() {
            match self.scheduler.next_fired().await {
                Some(fired) => self.deliver(fired),
                None => break,
            }
        }
    }

    /// Runs the loop for exactly `duration`, delivering every timer that
    /// falls due before the deadline.
    pub async fn run_for(&mut self, duration: Duration) {
        let deadline = Instant::now() + duration;
        loop {
            if !self.scheduler.has_pending() {
                tokio::time::sleep_until(deadline).await;
                break;
            }
            let fired = tokio::select! {
                _ = tokio::time::sleep_until(deadline) => break,
                fired = self.scheduler.next_fired() => fired,
            };
            match fired {
                Some(fired) => self.deliver(fired),
                None => break,
            }
        }
    }

    async fn read_tag(&self) -> TagRead {
        match self.tag_reader.read_tag().await {
            Ok(payload) => {
                self.feedback.play_tone(Tone::Beep);
                TagRead::from(payload)
            }
            Err(error) => {
                warn!(%error, "Tag read failed");
                TagRead::Unreadable
            }
        }
    }

    fn deliver(&mut self, fired: TimerFired) {
        let effects = self
            .session
            .on_timer(fired.flow, fired.step, Instant::now());
        self.apply(effects);
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Render(update) => self.presenter.render(&update),
                Effect::Schedule { step, after } => match self.session.active_flow_id() {
                    Some(flow) => self.scheduler.schedule(flow, step, after),
                    None => debug!(?step, "No flow left to schedule for"),
                },
                Effect::CancelTimers => self.scheduler.cancel_all(),
                Effect::Tone(tone) => self.feedback.play_tone(tone),
                Effect::Vibrate {
                    amplitude,
                    duration,
                } => self.feedback.vibrate(amplitude, duration),
                Effect::Finish(outcome) => {
                    info!(status = outcome.status(), "Payment outcome recorded");
                }
            }
        }
    }

    fn report(&self, error: &CheckoutError) {
        match error.rejection() {
            Some(rejection) => {
                if *rejection == PaymentError::SessionExpired {
                    self.presenter.render(&ScreenUpdate::SessionExpired);
                }
                self.presenter.error(rejection);
            }
            None => warn!(%error, "Command rejected"),
        }
    }
}
