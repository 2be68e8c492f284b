//! Lofi CLI - Slowed + Reverb Converter
//!
//! Command-line interface for the lofi converter.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::{debug, info};

use lofi::cli::{commands, Cli, Commands};
use lofi::config::Settings;
use lofi::LofiError;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Lofi Converter v{}", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load(cli.config.as_deref()).context("failed to load settings")?;
    debug!("settings: {:?}", settings);

    if let Err(e) = handle_command(cli.command, &settings) {
        report(&e);
        std::process::exit(1);
    }
    Ok(())
}

fn handle_command(cmd: Commands, settings: &Settings) -> lofi::Result<()> {
    match cmd {
        Commands::Convert {
            input,
            output,
            mp3,
            effect,
        } => commands::convert(settings, &input, output.as_deref(), mp3, &effect),
        Commands::Fetch { link, json, effect } => commands::fetch(settings, &link, json, &effect),
        Commands::Validate { link } => commands::validate(settings, &link),
        Commands::Presets => commands::list_presets(),
    }
}

fn report(e: &LofiError) {
    eprintln!("Error [{}]: {}", e.error_code(), e.friendly_message());
    for suggestion in e.recovery_suggestions() {
        eprintln!("  - {}", suggestion);
    }
}
