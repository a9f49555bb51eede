//! Library interface for the `bumpr` CLI.
//!
//! This crate exposes the CLI's argument parser and command structure as a library,
//! primarily for testing. The actual entry point is in `main.rs`.
//!
//! # Structure
//!
//! - [`Cli`] - The root argument parser (clap derive)
//! - [`Commands`] - Available subcommands
//! - [`commands`] - Command implementations

pub mod commands;

use clap::{CommandFactory, Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;

/// Color output preference.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect terminal capabilities automatically.
    #[default]
    Auto,
    /// Always emit colors.
    Always,
    /// Never emit colors.
    Never,
}

impl ColorChoice {
    /// Configure global color output based on this choice.
    ///
    /// Call this once at startup to set the color mode.
    pub fn apply(self) {
        match self {
            Self::Auto => {} // owo-colors auto-detects by default
            Self::Always => owo_colors::set_override(true),
            Self::Never => owo_colors::set_override(false),
        }
    }

    /// Whether log output on stderr should carry ANSI escapes.
    pub fn stderr_ansi(self) -> bool {
        match self {
            Self::Auto => std::io::stderr().is_terminal(),
            Self::Always => true,
            Self::Never => false,
        }
    }
}

const ENV_HELP: &str = "\
ENVIRONMENT VARIABLES:
    RUST_LOG                Log filter (e.g., debug, bumpr_core=trace)
    BUMPR_LOG_PATH          Explicit JSON log file path
    BUMPR_LOG_DIR           JSON log directory
    BUMPR_<KEY>             Override any configuration key (e.g., BUMPR_PACKAGE_TYPE)
    GITHUB_OUTPUT           Step output file used by --scm github
";
/// Command-line interface definition for bumpr.
#[derive(Parser)]
#[command(name = "bumpr")]
#[command(about = "Language agnostic tool to bump version files using SemVer", long_about = None)]
#[command(version)]
#[command(after_long_help = ENV_HELP)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file (merged over discovered config)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Run as if started in DIR
    #[arg(short = 'C', long, global = true)]
    pub chdir: Option<PathBuf>,

    /// Only print errors (suppresses warnings/info)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// More detail (repeatable; e.g. -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Colorize output
    #[arg(long, global = true, value_enum, default_value_t)]
    pub color: ColorChoice,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,
}

/// Available subcommands for the CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// Bump the version of the project in the working directory
    Start(commands::start::StartArgs),

    /// Diagnose configuration and tool availability
    Doctor(commands::doctor::DoctorArgs),
}

/// Returns the clap command, e.g. for help rendering in tests
pub fn command() -> clap::Command {
    Cli::command()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        command().debug_assert();
    }

    #[test]
    fn start_flags_parse() {
        let cli = Cli::try_parse_from([
            "bumpr",
            "--json",
            "start",
            "--package-type",
            "node",
            "--bump-type",
            "minor",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Start(args) => {
                assert_eq!(args.package_type.as_deref(), Some("node"));
                assert_eq!(args.bump_type.as_deref(), Some("minor"));
                assert!(args.scm.is_none());
            }
            Commands::Doctor(_) => panic!("expected start"),
        }
    }
}
