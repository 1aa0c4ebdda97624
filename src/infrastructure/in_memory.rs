use crate::domain::ports::{Calendar, Feedback, Presenter, ScreenUpdate, TagReader, Tone};
use crate::domain::tag::text_record;
use crate::error::{CheckoutError, PaymentError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

type QueuedRead = std::result::Result<Option<Vec<u8>>, String>;

/// A tag reader fed from a queue of prepared reads.
///
/// Clones share the queue, so one handle can be given to the terminal while
/// another keeps presenting tags. Reading from an empty queue yields a tag
/// without NDEF data.
#[derive(Default, Clone)]
pub struct ScriptedTagReader {
    reads: Arc<Mutex<VecDeque<QueuedRead>>>,
}

impl ScriptedTagReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a raw payload; `None` is a tag without NDEF data.
    pub fn present(&self, payload: Option<Vec<u8>>) {
        lock(&self.reads).push_back(Ok(payload));
    }

    /// Queues a tag carrying an English text record.
    pub fn present_text(&self, text: &str) {
        self.present(Some(text_record(text)));
    }

    /// Queues a read that fails in the reader itself.
    pub fn present_unreadable(&self, message: impl Into<String>) {
        lock(&self.reads).push_back(Err(message.into()));
    }

    pub fn remaining(&self) -> usize {
        lock(&self.reads).len()
    }
}

#[async_trait]
impl TagReader for ScriptedTagReader {
    async fn read_tag(&self) -> Result<Option<Vec<u8>>> {
        match lock(&self.reads).pop_front() {
            Some(Ok(payload)) => Ok(payload),
            Some(Err(message)) => Err(CheckoutError::IoError(io::Error::other(message))),
            None => Ok(None),
        }
    }
}

/// Keeps every screen update and error it is shown.
#[derive(Default, Clone)]
pub struct RecordingPresenter {
    updates: Arc<Mutex<Vec<ScreenUpdate>>>,
    errors: Arc<Mutex<Vec<PaymentError>>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> Vec<ScreenUpdate> {
        lock(&self.updates).clone()
    }

    pub fn last_update(&self) -> Option<ScreenUpdate> {
        lock(&self.updates).last().cloned()
    }

    pub fn errors(&self) -> Vec<PaymentError> {
        lock(&self.errors).clone()
    }
}

impl Presenter for RecordingPresenter {
    fn render(&self, update: &ScreenUpdate) {
        lock(&self.updates).push(update.clone());
    }

    fn error(&self, error: &PaymentError) {
        lock(&self.errors).push(error.clone());
    }
}

#[derive(Default, Clone)]
pub struct RecordingFeedback {
    tones: Arc<Mutex<Vec<Tone>>>,
    vibrations: Arc<Mutex<Vec<(u8, Duration)>>>,
}

impl RecordingFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tones(&self) -> Vec<Tone> {
        lock(&self.tones).clone()
    }

    pub fn vibrations(&self) -> Vec<(u8, Duration)> {
        lock(&self.vibrations).clone()
    }
}

impl Feedback for RecordingFeedback {
    fn play_tone(&self, tone: Tone) {
        lock(&self.tones).push(tone);
    }

    fn vibrate(&self, amplitude: u8, duration: Duration) {
        lock(&self.vibrations).push((amplitude, duration));
    }
}

/// A calendar stuck on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedCalendar(pub NaiveDate);

impl Calendar for FixedCalendar {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_reads_in_order() {
        let reader = ScriptedTagReader::new();
        let handle = reader.clone();
        handle.present_text("PAY");
        handle.present(None);
        handle.present_unreadable("tag lost");
        assert_eq!(reader.remaining(), 3);

        assert_eq!(reader.read_tag().await.unwrap(), Some(text_record("PAY")));
        assert_eq!(reader.read_tag().await.unwrap(), None);
        assert!(matches!(
            reader.read_tag().await,
            Err(CheckoutError::IoError(_))
        ));
        assert_eq!(reader.read_tag().await.unwrap(), None);
    }

    #[test]
    fn test_recording_presenter() {
        let presenter = RecordingPresenter::new();
        presenter.render(&ScreenUpdate::WaitForTag);
        presenter.render(&ScreenUpdate::PinEntry);
        presenter.error(&PaymentError::IncorrectPin);

        assert_eq!(presenter.updates().len(), 2);
        assert_eq!(presenter.last_update(), Some(ScreenUpdate::PinEntry));
        assert_eq!(presenter.errors(), vec![PaymentError::IncorrectPin]);
    }

    #[test]
    fn test_recording_feedback() {
        let feedback = RecordingFeedback::new();
        feedback.play_tone(Tone::Ack);
        feedback.vibrate(128, Duration::from_millis(150));
        assert_eq!(feedback.tones(), vec![Tone::Ack]);
        assert_eq!(feedback.vibrations(), vec![(128, Duration::from_millis(150))]);
    }
}
