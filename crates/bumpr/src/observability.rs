//! Observability setup: structured logging.
//!
//! **Important**: This module never writes to stdout, which is reserved for
//! command output (`version bumped to ...` or `--json` documents). Human
//! readable logs go to stderr; when a log directory is configured, JSON
//! lines are also appended to a daily-rolled file.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const ENV_LOG_PATH: &str = "BUMPR_LOG_PATH";
const ENV_LOG_DIR: &str = "BUMPR_LOG_DIR";
const LOG_FILE_SUFFIX: &str = ".jsonl";

/// Configuration for observability setup.
#[derive(Clone, Debug)]
pub struct ObservabilityConfig {
    /// The service name used for the log file name.
    pub service: String,
    /// Directory for JSONL log files from the loaded configuration.
    pub log_dir: Option<PathBuf>,
    /// Whether stderr output may use ANSI colors.
    pub ansi: bool,
}

impl ObservabilityConfig {
    /// Create config from the loaded settings.
    pub fn new(log_dir: Option<PathBuf>, ansi: bool) -> Self {
        Self {
            service: env!("CARGO_PKG_NAME").to_string(),
            log_dir,
            ansi,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct LogTarget {
    dir: PathBuf,
    file_name: String,
}

/// Guard that must be held for the lifetime of the application so buffered
/// file logs are flushed on exit.
pub struct ObservabilityGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

/// Initialize logging.
///
/// Returns a guard that must be held for the application lifetime.
///
/// # Errors
///
/// Returns an error if an explicitly requested log location is not
/// writable.
pub fn init_observability(
    cfg: &ObservabilityConfig,
    env_filter: EnvFilter,
) -> Result<ObservabilityGuard> {
    let target = resolve_log_target(&cfg.service, cfg.log_dir.as_deref())?;

    let (file_layer, file_guard) = match target {
        Some(target) => {
            let appender = tracing_appender::rolling::daily(&target.dir, &target.file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(cfg.ansi)
        .with_target(false)
        .without_time();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    tracing::debug!("observability initialized");

    Ok(ObservabilityGuard {
        _file_guard: file_guard,
    })
}

/// Build an `EnvFilter` based on CLI flags and environment.
///
/// Priority: quiet flag > verbose flag > RUST_LOG env > default_level
pub fn env_filter(quiet: bool, verbose: u8, default_level: &str) -> EnvFilter {
    if quiet {
        return EnvFilter::new("error");
    }

    if verbose > 0 {
        let level = match verbose {
            1 => "debug",
            _ => "trace",
        };
        return EnvFilter::new(level);
    }

    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

// ============================================================================
// Log Target Resolution
// ============================================================================

fn resolve_log_target(service: &str, config_log_dir: Option<&Path>) -> Result<Option<LogTarget>> {
    let path_override = std::env::var_os(ENV_LOG_PATH).map(PathBuf::from);
    let dir_override = std::env::var_os(ENV_LOG_DIR).map(PathBuf::from);

    resolve_log_target_with(
        service,
        path_override,
        dir_override,
        config_log_dir.map(PathBuf::from),
    )
}

/// Pick the log file location; `None` means stderr only.
///
/// Priority: `BUMPR_LOG_PATH` > `BUMPR_LOG_DIR` > configured `log_dir`.
fn resolve_log_target_with(
    service: &str,
    path_override: Option<PathBuf>,
    dir_override: Option<PathBuf>,
    config_dir: Option<PathBuf>,
) -> Result<Option<LogTarget>> {
    let target = if let Some(path) = path_override {
        log_target_from_path(&path)?
    } else if let Some(dir) = dir_override.or(config_dir) {
        LogTarget {
            dir,
            file_name: format!("{service}{LOG_FILE_SUFFIX}"),
        }
    } else {
        return Ok(None);
    };

    ensure_writable(&target)?;
    Ok(Some(target))
}

fn log_target_from_path(path: &Path) -> Result<LogTarget> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("{ENV_LOG_PATH} must end in a UTF-8 file name"))?
        .to_string();

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(LogTarget {
        dir: dir.to_path_buf(),
        file_name,
    })
}

fn ensure_writable(target: &LogTarget) -> Result<()> {
    std::fs::create_dir_all(&target.dir).with_context(|| {
        format!("failed to create log directory {}", target.dir.display())
    })?;

    let path = target.dir.join(&target.file_name);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn env_filter_quiet_overrides() {
        let filter = env_filter(true, 2, "info");
        assert_eq!(filter.to_string(), "error");
    }

    #[test]
    fn env_filter_verbose_maps_to_debug_and_trace() {
        assert_eq!(env_filter(false, 1, "info").to_string(), "debug");
        assert_eq!(env_filter(false, 2, "info").to_string(), "trace");
    }

    #[test]
    fn no_target_without_configuration() {
        assert_eq!(resolve_log_target_with("bumpr", None, None, None).unwrap(), None);
    }

    #[test]
    fn path_override_wins() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("logs/custom.jsonl");

        let target = resolve_log_target_with(
            "bumpr",
            Some(file.clone()),
            Some(tmp.path().join("ignored")),
            None,
        )
        .unwrap()
        .unwrap();

        assert_eq!(target.dir.join(&target.file_name), file);
        assert!(file.exists());
        assert!(!tmp.path().join("ignored").exists());
    }

    #[test]
    fn env_dir_beats_config_dir() {
        let tmp = TempDir::new().unwrap();
        let env_dir = tmp.path().join("env");
        let config_dir = tmp.path().join("config");

        let target = resolve_log_target_with("bumpr", None, Some(env_dir.clone()), Some(config_dir))
            .unwrap()
            .unwrap();

        assert_eq!(target.dir, env_dir);
        assert_eq!(target.file_name, format!("bumpr{LOG_FILE_SUFFIX}"));
    }

    #[test]
    fn config_dir_is_used_last() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("config-logs");

        let target = resolve_log_target_with("demo", None, None, Some(dir.clone()))
            .unwrap()
            .unwrap();

        assert_eq!(target.dir, dir);
        assert!(dir.join("demo.jsonl").exists());
    }

    #[cfg(unix)]
    #[test]
    fn unwritable_dir_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, "").unwrap();

        assert!(resolve_log_target_with("demo", None, Some(blocker.join("sub")), None).is_err());
    }
}
