//! Source control output reporting.
//!
//! The pipeline reports the bumped version back to the hosting service
//! through an [`Scm`]. Engines hold a handle but never call it.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;
use tracing::{info, warn};

/// Environment variable GitHub Actions uses for step outputs.
const GITHUB_OUTPUT_ENV: &str = "GITHUB_OUTPUT";

/// Errors from SCM operations.
#[derive(Error, Debug)]
pub enum ScmError {
    /// No SCM is registered under this identifier.
    #[error("unsupported scm type: {0}")]
    Unsupported(String),

    /// Writing an output value failed.
    #[error("failed to write output to {path}: {source}")]
    Output {
        /// File the output was written to.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Result alias for SCM operations.
pub type ScmResult<T> = Result<T, ScmError>;

/// Hosting-service collaborator.
pub trait Scm: fmt::Debug + Send + Sync {
    /// Identifier this SCM was created from.
    fn name(&self) -> &str;

    /// Publish a named output value for later pipeline steps.
    fn set_output(&self, name: &str, value: &str) -> ScmResult<()>;
}

/// Create the SCM registered under `id`.
pub fn create(id: &str) -> ScmResult<Arc<dyn Scm>> {
    match id {
        "default" | "bitbucket" => Ok(Arc::new(DefaultScm::new(id))),
        "github" => Ok(Arc::new(GithubScm::from_env())),
        other => Err(ScmError::Unsupported(other.to_string())),
    }
}

/// SCM without an output channel; values are only logged.
#[derive(Debug, Clone)]
pub struct DefaultScm {
    name: String,
}

impl DefaultScm {
    /// Create a logging-only SCM with the given identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Scm for DefaultScm {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_output(&self, name: &str, value: &str) -> ScmResult<()> {
        info!(scm = %self.name, output = name, value, "pipeline output");
        Ok(())
    }
}

/// GitHub Actions SCM.
///
/// Appends `name=value` lines to the step output file.
#[derive(Debug, Clone)]
pub struct GithubScm {
    output_file: Option<Utf8PathBuf>,
}

impl GithubScm {
    /// Use an explicit output file (or none).
    pub const fn new(output_file: Option<Utf8PathBuf>) -> Self {
        Self { output_file }
    }

    /// Read the output file location from `$GITHUB_OUTPUT`.
    pub fn from_env() -> Self {
        let output_file = std::env::var(GITHUB_OUTPUT_ENV)
            .ok()
            .filter(|v| !v.is_empty())
            .map(Utf8PathBuf::from);
        Self::new(output_file)
    }
}

impl Scm for GithubScm {
    fn name(&self) -> &str {
        "github"
    }

    fn set_output(&self, name: &str, value: &str) -> ScmResult<()> {
        let Some(ref path) = self.output_file else {
            warn!(output = name, value, "{GITHUB_OUTPUT_ENV} is not set, output not recorded");
            return Ok(());
        };

        let write = || -> std::io::Result<()> {
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            writeln!(file, "{name}={value}")
        };
        write().map_err(|source| ScmError::Output {
            path: path.clone(),
            source,
        })?;

        info!(output = name, value, %path, "recorded github output");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn create_known_scms() {
        assert_eq!(create("default").unwrap().name(), "default");
        assert_eq!(create("bitbucket").unwrap().name(), "bitbucket");
        assert_eq!(create("github").unwrap().name(), "github");
    }

    #[test]
    fn create_unknown_scm_fails() {
        assert!(matches!(create("svn"), Err(ScmError::Unsupported(ref s)) if s == "svn"));
    }

    #[test]
    fn github_appends_outputs() {
        let tmp = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(tmp.path().join("output")).unwrap();
        fs::write(&path, "existing=1\n").unwrap();

        let scm = GithubScm::new(Some(path.clone()));
        scm.set_output("release_version", "1.2.3").unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "existing=1\nrelease_version=1.2.3\n"
        );
    }

    #[test]
    fn github_without_output_file_is_noop() {
        GithubScm::new(None)
            .set_output("release_version", "1.2.3")
            .unwrap();
    }

    #[test]
    fn default_scm_accepts_outputs() {
        DefaultScm::new("default")
            .set_output("release_version", "0.0.1")
            .unwrap();
    }
}
