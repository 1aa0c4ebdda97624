#![allow(dead_code)]

use chrono::NaiveDate;
use std::io::Write;
use tapcheckout::application::session::CheckoutSession;
use tapcheckout::application::terminal::Terminal;
use tapcheckout::config::CheckoutConfig;
use tapcheckout::flow::delay::FixedDelays;
use tapcheckout::infrastructure::in_memory::{
    FixedCalendar, RecordingFeedback, RecordingPresenter, ScriptedTagReader,
};
use tempfile::NamedTempFile;
use tokio::time::Instant;

/// A terminal on recording adapters, with deterministic delays and a
/// calendar fixed at 2024-06-01.
pub struct Harness {
    pub terminal: Terminal,
    pub presenter: RecordingPresenter,
    pub feedback: RecordingFeedback,
    pub tags: ScriptedTagReader,
}

pub fn harness() -> Harness {
    harness_with(CheckoutConfig::default())
}

pub fn harness_with(config: CheckoutConfig) -> Harness {
    let presenter = RecordingPresenter::new();
    let feedback = RecordingFeedback::new();
    let tags = ScriptedTagReader::new();
    let session = CheckoutSession::new(
        &config,
        Box::new(FixedDelays::new(config.timings.clone())),
        Instant::now(),
    );
    let terminal = Terminal::new(
        session,
        Box::new(presenter.clone()),
        Box::new(feedback.clone()),
        Box::new(tags.clone()),
        Box::new(FixedCalendar(june_2024())),
    );
    Harness {
        terminal,
        presenter,
        feedback,
        tags,
    }
}

pub fn june_2024() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

/// Writes a scenario script to a temporary file.
pub fn script(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "action,arg,expiry,cvv,name").unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    file.flush().unwrap();
    file
}
