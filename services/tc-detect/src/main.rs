//! TC-like object detection for climate model output.
//!
//! Prepares the object tracker's inputs from model history and labels the
//! storms it finds, one simulation case at a time.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use tc_detect::{CasePipeline, Stage, TcDetectConfig};

#[derive(Parser, Debug)]
#[command(name = "tc-detect")]
#[command(about = "Detect and label TC-like objects in climate model output")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Configuration file path
    #[arg(short, long, env = "TC_DETECT_CONFIG", default_value = "config.yaml", global = true)]
    config: PathBuf,

    /// Only process this case (default: all configured)
    #[arg(long, global = true)]
    case: Option<String>,

    /// Log a failing case and continue with the next one
    #[arg(long, global = true)]
    keep_going: bool,

    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Log format: text or json
    #[arg(long, default_value = "text", global = true)]
    log_format: String,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Compute or load the tracker inputs and update the tracker parameters
    Prepare,
    /// Filter tracked storms and write the labeled output
    Label,
    /// Prepare, then label
    Run,
}

impl From<Command> for Stage {
    fn from(command: Command) -> Self {
        match command {
            Command::Prepare => Stage::Prepare,
            Command::Label => Stage::Label,
            Command::Run => Stage::Run,
        }
    }
}

fn init_tracing(log_level: &str, log_format: &str) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true);

    if log_format.eq_ignore_ascii_case("json") {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(&args.log_level, &args.log_format)?;

    info!(config = %args.config.display(), "Starting tc-detect");
    let config = TcDetectConfig::load(&args.config)?;

    let cases = match &args.case {
        Some(case) => {
            if !config.cases.contains(case) {
                warn!(case = %case, "Case is not listed in the configuration");
            }
            vec![case.clone()]
        }
        None => config.cases.clone(),
    };
    info!(cases = ?cases, "Loaded configuration");

    let pipeline = CasePipeline::new(config)?;
    let report = pipeline.run_cases(&cases, args.command.into(), args.keep_going)?;

    info!(
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        "All cases processed"
    );
    if !report.failed.is_empty() {
        anyhow::bail!(
            "{} of {} cases failed",
            report.failed.len(),
            report.failed.len() + report.succeeded.len()
        );
    }
    Ok(())
}
