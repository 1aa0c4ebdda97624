use crate::domain::outcome::{PaymentMethod, PaymentOutcome, Receipt};
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

const HEADER: [&str; 5] = ["method", "status", "amount", "duration", "reason"];

#[derive(Debug, Serialize)]
struct ReceiptRecord {
    method: PaymentMethod,
    status: &'static str,
    amount: Decimal,
    duration: Option<String>,
    reason: Option<&'static str>,
}

impl From<&Receipt> for ReceiptRecord {
    fn from(receipt: &Receipt) -> Self {
        let (duration, reason) = match &receipt.outcome {
            PaymentOutcome::Success { duration_seconds } => {
                (Some(format!("{:.2}", duration_seconds)), None)
            }
            PaymentOutcome::Failure { reason } => (None, Some(reason.code())),
            PaymentOutcome::Cancelled => (None, None),
        };
        Self {
            method: receipt.method,
            status: receipt.outcome.status(),
            amount: receipt.amount.to_major(),
            duration,
            reason,
        }
    }
}

/// Writes the receipt log as CSV.
pub struct ReceiptWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReceiptWriter<W> {
    pub fn new(sink: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(sink);
        Self { writer }
    }

    /// Writes the header followed by one row per receipt, then flushes.
    pub fn write_receipts(&mut self, receipts: &[Receipt]) -> Result<()> {
        self.writer.write_record(HEADER)?;
        for receipt in receipts {
            self.writer.serialize(ReceiptRecord::from(receipt))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
