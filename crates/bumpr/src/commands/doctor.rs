//! Doctor command: diagnose configuration and tool availability.

use clap::Args;
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;
use tracing::{debug, instrument};

use bumpr_core::config::{self, Config};
use bumpr_core::engine::EngineType;
use bumpr_core::process::{CommandRunner, SystemRunner};

/// Arguments for the `doctor` subcommand.
#[derive(Args, Debug, Default)]
pub struct DoctorArgs {
    // No subcommand-specific arguments; uses global --json flag
}

#[derive(Serialize)]
struct DoctorReport {
    config: ConfigStatus,
    settings: Vec<Setting>,
    engines: Vec<EngineStatus>,
}

#[derive(Serialize)]
struct ConfigStatus {
    /// Path to the project config file, if any
    file: Option<String>,
    /// User config directory
    user_dir: Option<String>,
}

#[derive(Serialize)]
struct Setting {
    key: &'static str,
    value: Option<String>,
}

#[derive(Serialize)]
struct EngineStatus {
    package_type: EngineType,
    selected: bool,
    tools: Vec<ToolStatus>,
}

impl EngineStatus {
    fn ready(&self) -> bool {
        self.tools.iter().all(|t| t.path.is_some())
    }
}

#[derive(Serialize)]
struct ToolStatus {
    name: &'static str,
    path: Option<String>,
}

impl DoctorReport {
    fn gather(config: &Config, cwd: &camino::Utf8Path, runner: &dyn CommandRunner) -> Self {
        let settings = Config::KEYS
            .iter()
            .map(|&key| Setting {
                key,
                value: config.lookup(key),
            })
            .collect();

        let engines = EngineType::ALL
            .iter()
            .map(|engine| EngineStatus {
                package_type: *engine,
                selected: engine.to_string() == config.package_type,
                tools: engine
                    .required_tools()
                    .iter()
                    .map(|&name| ToolStatus {
                        name,
                        path: runner.resolve(name).map(|p| p.display().to_string()),
                    })
                    .collect(),
            })
            .collect();

        Self {
            config: ConfigStatus {
                file: config::find_project_config(cwd).map(|p| p.to_string()),
                user_dir: config::user_config_dir().map(|p| p.to_string()),
            },
            settings,
            engines,
        }
    }
}

/// Run diagnostics and report configuration status.
///
/// # Arguments
/// * `global_json` - Global `--json` flag from CLI
/// * `config` - Loaded configuration
/// * `cwd` - Current working directory
#[instrument(name = "cmd_doctor", skip_all, fields(json_output))]
pub fn cmd_doctor(
    _args: DoctorArgs,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing doctor command");

    let report = DoctorReport::gather(config, cwd, &SystemRunner);

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print!("{}", render_text(&report));
    Ok(())
}

fn heading(title: &str) -> String {
    title
        .if_supports_color(Stream::Stdout, |t| t.bold().underline().to_string())
        .to_string()
}

fn dim(text: &str) -> String {
    text.if_supports_color(Stream::Stdout, |t| t.dimmed())
        .to_string()
}

fn cyan(text: &str) -> String {
    text.if_supports_color(Stream::Stdout, |t| t.cyan())
        .to_string()
}

fn render_text(report: &DoctorReport) -> String {
    let ok = "✓".if_supports_color(Stream::Stdout, |t| t.green()).to_string();
    let missing = "✗".if_supports_color(Stream::Stdout, |t| t.red()).to_string();
    let mut out = String::new();

    out.push_str(&format!("{}\n", heading("Configuration")));
    match report.config.file {
        Some(ref file) => out.push_str(&format!("  {ok} Config file: {}\n", cyan(file))),
        None => out.push_str(&format!(
            "  {} No project config file found\n",
            "○".if_supports_color(Stream::Stdout, |t| t.yellow())
        )),
    }
    if let Some(ref dir) = report.config.user_dir {
        out.push_str(&format!("  {}: {}\n", dim("User config dir"), cyan(dir)));
    }
    out.push('\n');

    out.push_str(&format!("{}\n", heading("Settings")));
    for setting in &report.settings {
        let value = match setting.value {
            Some(ref value) => cyan(value),
            None => dim("(unset)"),
        };
        out.push_str(&format!("  {}: {value}\n", dim(setting.key)));
    }
    out.push('\n');

    out.push_str(&format!("{}\n", heading("Engines")));
    for engine in &report.engines {
        let status = if engine.ready() { &ok } else { &missing };
        let marker = if engine.selected {
            " (selected)"
                .if_supports_color(Stream::Stdout, |t| t.bold())
                .to_string()
        } else {
            String::new()
        };
        out.push_str(&format!("  {status} {}{marker}\n", engine.package_type));
        for tool in &engine.tools {
            let location = match tool.path {
                Some(ref path) => dim(path),
                None => "missing"
                    .if_supports_color(Stream::Stdout, |t| t.red())
                    .to_string(),
            };
            out.push_str(&format!("      {} {location}\n", tool.name));
        }
    }

    out
}
