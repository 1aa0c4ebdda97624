use crate::application::session::Gesture;
use crate::application::terminal::Command;
use crate::domain::card::{CardDetails, CardField, format_expiry_input};
use crate::domain::outcome::PaymentMethod;
use crate::domain::tag::text_record;
use crate::error::{CheckoutError, Result};
use crate::infrastructure::in_memory::ScriptedTagReader;
use serde::Deserialize;
use std::io::Read;
use std::time::Duration;

/// One row of a scenario script: `action,arg,expiry,cvv,name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ScriptRecord {
    pub action: String,
    #[serde(default)]
    pub arg: Option<String>,
    #[serde(default)]
    pub expiry: Option<String>,
    #[serde(default)]
    pub cvv: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl ScriptRecord {
    fn required_arg(&self) -> Result<&str> {
        self.arg
            .as_deref()
            .filter(|arg| !arg.is_empty())
            .ok_or_else(|| {
                CheckoutError::ScriptError(format!("'{}' needs an argument", self.action))
            })
    }

    fn arg_or_empty(&self) -> String {
        self.arg.clone().unwrap_or_default()
    }
}

/// Reads terminal commands from a CSV scenario.
///
/// Tap rows carry the tag content in `arg`; the reader queues it on the
/// shared [`ScriptedTagReader`] as it yields the row, so the terminal reads
/// exactly that tag when the command runs.
pub struct ScriptReader<R: Read> {
    reader: csv::Reader<R>,
    tags: ScriptedTagReader,
}

impl<R: Read> ScriptReader<R> {
    pub fn new(source: R, tags: ScriptedTagReader) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader, tags }
    }

    /// Lazily reads and converts rows. A bad row yields an error and the
    /// iterator carries on with the next one.
    pub fn commands(self) -> impl Iterator<Item = Result<Command>> {
        let tags = self.tags;
        self.reader
            .into_deserialize::<ScriptRecord>()
            .map(move |result| {
                result
                    .map_err(CheckoutError::from)
                    .and_then(|record| to_command(&record, &tags))
            })
    }
}

fn to_command(record: &ScriptRecord, tags: &ScriptedTagReader) -> Result<Command> {
    let command = match record.action.to_ascii_lowercase().as_str() {
        "add" => Command::AddItem(record.required_arg()?.to_string()),
        "remove" => Command::RemoveItem(record.required_arg()?.to_string()),
        "clear" => Command::ClearCart,
        "checkout" => Command::Checkout(
            record
                .required_arg()?
                .parse::<PaymentMethod>()
                .map_err(CheckoutError::ScriptError)?,
        ),
        "card" => Command::SubmitCard(CardDetails::new(
            record.arg_or_empty(),
            format_expiry_input(record.expiry.as_deref().unwrap_or_default()),
            record.cvv.clone().unwrap_or_default(),
            record.name.clone().unwrap_or_default(),
        )),
        "number" => Command::CardNumberChanged(record.arg_or_empty()),
        "blur" => Command::FieldBlur(
            record
                .required_arg()?
                .parse::<CardField>()
                .map_err(CheckoutError::ScriptError)?,
        ),
        "otp" => Command::SubmitOtp(record.arg_or_empty()),
        "upi" => Command::SubmitUpi(record.arg_or_empty()),
        "tap" => {
            tags.present(record.arg.as_deref().map(text_record));
            Command::Tap
        }
        "tap_error" => {
            tags.present_unreadable(
                record
                    .arg
                    .clone()
                    .unwrap_or_else(|| "tag lost".to_string()),
            );
            Command::Tap
        }
        "pin" => Command::SubmitPin(record.arg_or_empty()),
        "retry" => Command::Retry,
        "back" => Command::Back,
        "wait" => {
            let millis = record.required_arg()?.parse::<u64>().map_err(|e| {
                CheckoutError::ScriptError(format!("invalid wait duration: {}", e))
            })?;
            Command::Wait(Duration::from_millis(millis))
        }
        "settle" => Command::Settle,
        "swipe" => Command::Swipe(
            record
                .required_arg()?
                .parse::<Gesture>()
                .map_err(CheckoutError::ScriptError)?,
        ),
        "ack_timeout" => Command::AcknowledgeTimeout,
        other => {
            return Err(CheckoutError::ScriptError(format!(
                "unknown action '{}'",
                other
            )));
        }
    };
    Ok(command)
}
