//! Intake Runner - one-shot batch import entry point
//!
//! Loads configuration from the environment, connects the pool, runs one
//! import invocation, prints the structured response to stdout, and exits
//! 0 on a 200 response or 1 on a 500.

use std::path::PathBuf;

use clap::Parser;
use serde_json::Value;
use tracing::{debug, warn};

use intake_common::logging::{init_logging, LogConfig, LogLevel};
use intake_core::db::{Database, DatabaseConfig};
use intake_runner::{handle, Context, Event, Response};

#[derive(Parser, Debug)]
#[command(name = "intake-runner")]
#[command(author, version, about = "Run one batch import and report the result")]
struct Cli {
    /// Connector kind to run (api or csv); overrides the event payload
    #[arg(short, long)]
    connector: Option<String>,

    /// Path to a JSON event payload
    #[arg(long, value_name = "PATH")]
    event_file: Option<PathBuf>,

    /// Inline JSON event payload
    #[arg(long, conflicts_with = "event_file")]
    event: Option<String>,

    /// Connector option as key=value; repeatable, overrides the payload
    #[arg(short = 'o', long = "option", value_name = "KEY=VALUE")]
    options: Vec<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let mut log_config = LogConfig::from_env().unwrap_or_default();
    if cli.verbose {
        log_config.level = LogLevel::Debug;
    }
    if let Err(e) = init_logging(&log_config) {
        eprintln!("failed to initialize logging: {}", e);
    }

    let response = run(cli).await;
    let exit_code = if response.is_success() { 0 } else { 1 };

    match serde_json::to_string_pretty(&response) {
        Ok(text) => println!("{}", text),
        Err(e) => {
            eprintln!("failed to serialize response: {}", e);
            std::process::exit(1);
        }
    }

    std::process::exit(exit_code);
}

async fn run(cli: Cli) -> Response {
    let event = match build_event(&cli) {
        Ok(event) => event,
        Err(e) => return Response::failure(e),
    };

    let db_config = match DatabaseConfig::from_env() {
        Ok(config) => config,
        Err(e) => return Response::failure(e),
    };

    let db = match Database::connect(&db_config).await {
        Ok(db) => db,
        Err(e) => return Response::failure(e),
    };

    let ctx = Context::new("cli");
    let response = handle(event, &ctx, db.clone()).await;

    db.close().await;
    response
}

/// Assemble the event from file/inline payload plus CLI overrides
fn build_event(cli: &Cli) -> intake_common::Result<Event> {
    let mut event = if let Some(path) = &cli.event_file {
        let text = std::fs::read_to_string(path)?;
        Event::from_json(&text)?
    } else if let Some(text) = &cli.event {
        Event::from_json(text)?
    } else {
        Event::default()
    };

    if let Some(connector) = &cli.connector {
        event.connector = Some(connector.clone());
    }

    for pair in &cli.options {
        match pair.split_once('=') {
            Some((key, value)) => {
                // values parse as JSON where possible so numbers and booleans
                // survive; everything else stays a string
                let value: Value = serde_json::from_str(value)
                    .unwrap_or_else(|_| Value::String(value.to_string()));
                debug!(key, %value, "event option override");
                event.options.insert(key.to_string(), value);
            }
            None => {
                warn!(option = %pair, "ignoring option without '='");
            }
        }
    }

    Ok(event)
}
