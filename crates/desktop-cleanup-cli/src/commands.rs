use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "desktop-cleanup")]
#[command(about = "Move unused desktop shortcuts out of the way", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Handoff file left by the process that asked for elevation
    #[arg(long = "handoff-path", hide = true)]
    pub handoff_path: Option<PathBuf>,

    /// Working directory of the process that asked for elevation
    #[arg(long = "working-dir", hide = true)]
    pub working_dir: Option<PathBuf>,

    /// KEY=VALUE environment entry to restore before configuration loads
    #[arg(long = "carry-env", hide = true, value_parser = parse_env_pair)]
    pub carry_env: Vec<(String, String)>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan the desktops, pick shortcuts and move them to the Unused folders (default)
    Run,
    /// Scan the desktops and print what was found, without moving anything
    List,
    /// Print configuration values
    PrintConfig,
}

fn parse_env_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}
