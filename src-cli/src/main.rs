//! Prowl command-line entry point.
//!
//! Wires the collection, resolution, enrichment and export crates into an
//! interactive pipeline. Every prompt has a flag so the whole run can also
//! be scripted with `--yes`.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod cli;
mod console;
mod mode;
mod params;
mod pipeline;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use console::Console;
use mode::RunMode;
use pipeline::Pipeline;
use prowl_core::AppConfig;
use std::process::ExitCode;

/// Initialize tracing subscriber for logging
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,prowl=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    tracing::debug!("Starting Prowl v{}", env!("CARGO_PKG_VERSION"));

    let console = Console::new(cli.yes);
    match run(cli, &console).await {
        Ok(code) => code,
        Err(e) => {
            console.failure(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, console: &Console) -> Result<ExitCode> {
    let mut config = AppConfig::load_with_env().context("failed to load configuration")?;
    if let Some(output) = cli.output {
        config.export.path = output;
    }
    if cli.headful {
        config.browser.headless = false;
    }
    config.validate().context("invalid configuration")?;

    match cli.command {
        Some(Command::Config) => show_config(console, &config),
        Some(Command::Collect(args)) => Pipeline::new(config, console).run_fresh(&args).await,
        Some(Command::Enrich(args)) => Pipeline::new(config, console).run_resume(&args).await,
        None => match mode::choose(console, &config.export.path)? {
            RunMode::Fresh => Pipeline::new(config, console).run_fresh(&cli.collect).await,
            RunMode::Resume => {
                Pipeline::new(config, console)
                    .run_resume(&cli.collect.session)
                    .await
            }
            RunMode::Exit => {
                console.line("Nothing to do");
                Ok(ExitCode::SUCCESS)
            }
        },
    }
}

fn show_config(console: &Console, config: &AppConfig) -> Result<ExitCode> {
    let path = AppConfig::config_path().context("failed to locate the configuration file")?;
    console.header("Configuration");
    console.line(&format!("File: {}", path.display()));

    let mut shown = config.clone();
    if !shown.discovery.token.is_empty() {
        shown.discovery.token = "<redacted>".to_string();
    }
    let rendered = toml::to_string_pretty(&shown).context("failed to render configuration")?;
    println!("\n{rendered}");
    Ok(ExitCode::SUCCESS)
}
