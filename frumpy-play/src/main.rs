mod script;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use libfrumpy::logging::{self, LogFormat};
use libfrumpy::{Config, FrumpyError, Model};

use crate::script::{replay, Replay, Script};

#[derive(Parser, Debug)]
#[command(name = "frumpy-play")]
#[command(version, about = "Replay an event script against a frumpy dispatcher")]
#[command(long_about = r#"Replay an event script against a frumpy dispatcher.

The script declares an initial model, handler chains built from recipe
steps, and the events to fire in order. Every accepted model transition
is reported.

EXAMPLES:
    # Replay a TOML script, one line per model change
    frumpy-play counter.toml

    # Same script, machine-readable
    frumpy-play counter.toml --format json | jq '.final'

    # Use a specific config file and show dispatcher logs
    frumpy-play counter.toml --config ./frumpy.toml --verbose

RECIPE STEPS:
    increment {key, by=1}     add to an integer field
    assign    {key, arg=0}    copy an event argument into a field
    merge     {arg=0}         merge an object argument into the model
    remove    {key}           drop a field
    toggle    {key}           flip a boolean field
    clamp     {key, min, max} keep an integer field in range

EXIT CODES:
    0 - Success
    1 - Handler, config or I/O error
    2 - model:change handlers did not settle
    3 - Invalid script (missing model, empty chain, bad argument)
"#)]
struct Args {
    /// Script file (TOML, or JSON when the extension is .json)
    #[arg(value_name = "SCRIPT")]
    script: PathBuf,

    /// Config file (defaults to $FRUMPY_CONFIG or the user config dir)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text", value_name = "FORMAT")]
    #[arg(value_parser = ["text", "json"])]
    format: String,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Log format: text, json or pretty (overrides FRUMPY_LOG_FORMAT)
    #[arg(long, value_name = "FORMAT")]
    log_format: Option<LogFormat>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(rename = "final")]
    final_model: &'a Model,
    changes: &'a [Model],
    revision: u64,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        let code = e
            .downcast_ref::<FrumpyError>()
            .map(FrumpyError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load_or_default()?,
    };

    let mut log_settings = config.logging.clone();
    log_settings.apply_env()?;
    if let Some(format) = args.log_format {
        log_settings.format = format;
    }
    logging::init(&log_settings, args.verbose)?;

    let script = Script::from_path(&args.script)?;
    tracing::info!(
        script = %args.script.display(),
        handlers = script.handlers.len(),
        events = script.events.len(),
        "replaying script"
    );

    let result = replay(script, config.dispatcher)?;
    print_report(&result, &args.format)
}

fn print_report(result: &Replay, format: &str) -> Result<()> {
    match format {
        "json" => {
            let report = JsonReport {
                final_model: &result.final_model,
                changes: &result.changes,
                revision: result.revision,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            for (i, model) in result.changes.iter().enumerate() {
                println!("change {}: {}", i + 1, model);
            }
            println!("final: {}", result.final_model);
        }
    }
    Ok(())
}
