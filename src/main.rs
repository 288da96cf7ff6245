//! Stemmix CLI - Stem Balance Ear Training
//!
//! Command-line interface for the Stemmix game.

use std::io;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{error, info};

use stemmix::cli::commands;
use stemmix::cli::{Cli, Commands};
use stemmix::StemmixError;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    info!("Stemmix v{}", env!("CARGO_PKG_VERSION"));

    let config = commands::load_config(cli.config.as_deref(), cli.seed, cli.difficulty)
        .context("invalid game configuration")?;

    let result = match cli.command {
        Some(cmd) => handle_command(cmd, config),
        None => {
            println!("Stemmix v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = &result {
        if let Some(err) = e.downcast_ref::<StemmixError>() {
            error!("[{}] {}", err.error_code(), err);
            for suggestion in err.recovery_suggestions() {
                eprintln!("  hint: {}", suggestion);
            }
        }
    }
    result
}

fn handle_command(cmd: Commands, config: stemmix::GameConfig) -> Result<()> {
    let mut stdout = io::stdout().lock();
    match cmd {
        Commands::Curve { steps } => commands::print_curve(&config, steps, &mut stdout)?,
        Commands::Score { gains, json } => {
            commands::score_round(config, &gains, json, &mut stdout)?
        }
        Commands::Mixdown {
            stems,
            out,
            gains,
            answer,
            bits,
        } => commands::mixdown(config, &stems, &out, &gains, answer, bits)
            .with_context(|| format!("mixdown of {} failed", stems.display()))?,
        Commands::Play { stems } => {
            let started = Instant::now();
            let clock = move || started.elapsed().as_secs_f64();
            commands::play(config, stems.as_deref(), clock, io::stdin().lock(), &mut stdout)?
        }
    }
    Ok(())
}
