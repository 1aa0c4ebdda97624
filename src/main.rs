use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tapcheckout::application::session::CheckoutSession;
use tapcheckout::application::terminal::Terminal;
use tapcheckout::config::CheckoutConfig;
use tapcheckout::flow::delay::{DelayPolicyBox, RandomDelays, ZeroDelays};
use tapcheckout::infrastructure::console::{ConsoleFeedback, ConsolePresenter, SystemCalendar};
use tapcheckout::infrastructure::in_memory::ScriptedTagReader;
use tapcheckout::interfaces::csv::receipt_writer::ReceiptWriter;
use tapcheckout::interfaces::csv::script_reader::ScriptReader;
use tokio::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Scenario CSV file (action,arg,expiry,cvv,name)
    script: PathBuf,

    /// Terminal configuration as JSON. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Complete every simulated processing step immediately.
    #[arg(long)]
    fast: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => CheckoutConfig::from_path(path).into_diagnostic()?,
        None => CheckoutConfig::default(),
    };

    let delays: DelayPolicyBox = if cli.fast {
        Box::new(ZeroDelays)
    } else {
        Box::new(RandomDelays::new(config.timings.clone(), config.seed))
    };

    let tags = ScriptedTagReader::new();
    let session = CheckoutSession::new(&config, delays, Instant::now());
    let mut terminal = Terminal::new(
        session,
        Box::new(ConsolePresenter),
        Box::new(ConsoleFeedback),
        Box::new(tags.clone()),
        Box::new(SystemCalendar),
    );

    // Replay the scenario
    let file = File::open(cli.script).into_diagnostic()?;
    let reader = ScriptReader::new(file, tags);
    for command_result in reader.commands() {
        match command_result {
            Ok(command) => {
                if let Err(e) = terminal.dispatch(command).await {
                    eprintln!("Error processing command: {}", e);
                }
            }
            Err(e) => {
                eprintln!("Error reading command: {}", e);
            }
        }
    }

    // Let a flow left mid-processing finish
    terminal.settle().await;

    let stdout = io::stdout();
    let mut writer = ReceiptWriter::new(stdout.lock());
    writer.write_receipts(terminal.history()).into_diagnostic()?;

    Ok(())
}
