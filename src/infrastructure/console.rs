use crate::domain::ports::{Calendar, Feedback, Presenter, ScreenUpdate, Tone};
use crate::error::PaymentError;
use chrono::{Local, NaiveDate};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Shows screen updates as structured log events.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsolePresenter;

impl Presenter for ConsolePresenter {
    fn render(&self, update: &ScreenUpdate) {
        match serde_json::to_string(update) {
            Ok(screen) => info!(%screen, "Screen updated"),
            Err(_) => info!(?update, "Screen updated"),
        }
    }

    fn error(&self, error: &PaymentError) {
        warn!(code = error.code(), "{}", error);
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleFeedback;

impl Feedback for ConsoleFeedback {
    fn play_tone(&self, tone: Tone) {
        debug!(?tone, "Tone");
    }

    fn vibrate(&self, amplitude: u8, duration: Duration) {
        debug!(amplitude, duration_ms = duration.as_millis() as u64, "Vibrate");
    }
}

/// The local calendar date.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCalendar;

impl Calendar for SystemCalendar {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}
