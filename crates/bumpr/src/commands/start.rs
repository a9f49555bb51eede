//! Start command: thin CLI layer over `bumpr_core::pipeline`.

use anyhow::Context;
use clap::Args;
use owo_colors::{OwoColorize, Stream};
use tracing::{debug, instrument};

use bumpr_core::config::{Config, ConfigOverrides};
use bumpr_core::pipeline::{Pipeline, PipelineEvent};

/// Arguments for the `start` subcommand.
#[derive(Args, Debug, Default)]
pub struct StartArgs {
    /// SCM to report outputs to (default, github, bitbucket)
    #[arg(long, value_name = "SCM")]
    pub scm: Option<String>,

    /// Packaging ecosystem (generic, golang, node, python, ruby, chef)
    #[arg(long, value_name = "TYPE")]
    pub package_type: Option<String>,

    /// SemVer component to increment (major, minor, patch)
    #[arg(long, value_name = "INTERVAL")]
    pub bump_type: Option<String>,
}

impl StartArgs {
    /// Configuration overrides for the flags that were given.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            package_type: self.package_type.clone(),
            scm: self.scm.clone(),
            version_bump_type: self.bump_type.clone(),
        }
    }
}

/// Execute the start command.
///
/// Flags were already folded into `config` as overrides by the caller.
#[instrument(name = "cmd_start", skip_all, fields(json_output))]
pub fn cmd_start(
    _args: StartArgs,
    global_json: bool,
    quiet: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing start command");

    let show_progress = !global_json && !quiet;
    let outcome = Pipeline::new(config)
        .start(cwd, |event| {
            if show_progress && let PipelineEvent::StepCompleted(step) = event {
                eprintln!(
                    "  {} {}",
                    "✓".if_supports_color(Stream::Stderr, |t| t.green()),
                    step.if_supports_color(Stream::Stderr, |t| t.dimmed())
                );
            }
        })
        .context("version bump failed")?;

    if global_json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!(
            "version bumped to {}",
            outcome
                .next
                .if_supports_color(Stream::Stdout, |t| t.green().bold().to_string())
        );
        if !quiet {
            eprintln!(
                "  {} {} → {} ({})",
                "→".if_supports_color(Stream::Stderr, |t| t.dimmed()),
                outcome.previous.if_supports_color(Stream::Stderr, |t| t.dimmed()),
                outcome.next.if_supports_color(Stream::Stderr, |t| t.cyan()),
                outcome.package_type
            );
        }
    }

    Ok(())
}
