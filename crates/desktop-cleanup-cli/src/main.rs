mod commands;
mod logging;
mod terminal;

use std::{env, process};

use anyhow::Context;

use clap::Parser;
use colored::*;
use commands::{Cli, Commands};
use desktop_cleanup_core::scanner::EntryFilter;
use desktop_cleanup_core::{
    AppConfig, CleanupOutcome, CleanupRoots, ElevatedRelauncher, HandoffFile, ResumeController,
    ShortcutCleaner, StartOutcome,
};
use dotenv::dotenv;
use terminal::TerminalPresenter;
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    restore_relaunch_context(&args)?;

    dotenv().ok();

    let _guard = logging::init_logger();

    let mut config = match desktop_cleanup_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };
    if let Some(path) = &args.handoff_path {
        info!("Elevated copy resuming from {}", path.display());
        config.handoff_path = Some(path.to_string_lossy().into_owned());
    }

    match args.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let code = run(&config)?;
            if code != 0 {
                process::exit(code);
            }
        }
        Commands::List => list(&config)?,
        Commands::PrintConfig => {
            let handoff = HandoffFile::new(config.handoff_path());
            println!("Configuration: {:?}", config);
            println!(
                "Handoff file: {} ({})",
                handoff.path().display(),
                if handoff.exists() { "pending" } else { "none" }
            );
        }
    }

    Ok(())
}

/// An elevated copy starts wherever sudo or UAC put it. Go back to the
/// caller's directory and environment before anything reads `.env`,
/// `Config.toml` or the log path.
fn restore_relaunch_context(args: &Cli) -> anyhow::Result<()> {
    if let Some(dir) = &args.working_dir {
        env::set_current_dir(dir)
            .with_context(|| format!("cannot enter working directory {}", dir.display()))?;
    }
    for (key, value) in &args.carry_env {
        env::set_var(key, value);
    }
    Ok(())
}

fn build_cleaner(config: &AppConfig) -> anyhow::Result<ShortcutCleaner> {
    let roots = CleanupRoots::from_config(config)?;
    if roots.is_empty() {
        anyhow::bail!("none of the configured desktop folders exist");
    }
    let cleaner = ShortcutCleaner::new(roots).with_filter(EntryFilter::from_config(config));
    for root in cleaner.roots().iter() {
        info!("Scanning '{}' at {}", root.label, root.path.display());
    }
    Ok(cleaner)
}

/// One interactive session. Errors reaching the operator were already shown
/// by the presenter, so they only turn into an exit code here.
fn run(config: &AppConfig) -> anyhow::Result<i32> {
    let mut controller = ResumeController::new(
        build_cleaner(config)?,
        HandoffFile::new(config.handoff_path()),
        TerminalPresenter::new(),
        ElevatedRelauncher,
    );

    match controller.start() {
        Ok(StartOutcome::Resumed { cleaned }) => {
            println!("{} shortcut(s) moved after elevation.", format!("{}", cleaned).green());
            return Ok(0);
        }
        Ok(StartOutcome::Fresh) | Ok(StartOutcome::DiscardedHandoff) => {}
        Err(_) => return Ok(1),
    }

    match controller.scan() {
        Ok(0) => return Ok(0),
        Ok(_) => {}
        Err(_) => return Ok(1),
    }

    match controller.clean_up() {
        Ok(CleanupOutcome::Completed { cleaned }) => {
            println!("{} shortcut(s) moved.", format!("{}", cleaned).green());
            Ok(0)
        }
        Ok(CleanupOutcome::Relaunched) => {
            info!("Continuing in the elevated process");
            Ok(0)
        }
        Err(_) => Ok(1),
    }
}

fn list(config: &AppConfig) -> anyhow::Result<()> {
    let mut cleaner = build_cleaner(config)?;
    let shortcuts = cleaner.scan()?;
    terminal::print_table(shortcuts.records());
    Ok(())
}
