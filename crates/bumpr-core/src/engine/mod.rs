//! Ecosystem version engines.
//!
//! Every engine implements the same contract: construct from an
//! [`EngineContext`] (`init`), check that required tooling is on `PATH`
//! ([`Engine::validate_tools`]), then read the current version, compute the
//! next one and write it back ([`Engine::bump_version`]).
//!
//! [`create`] is the only place that dispatches on the ecosystem
//! identifier; everything else works against `dyn Engine`.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use bumpr_core::Config;
//! use bumpr_core::engine::{self, EngineContext};
//! use bumpr_core::pipeline::PipelineData;
//! use bumpr_core::process::SystemRunner;
//! use bumpr_core::scm::DefaultScm;
//!
//! let config = Config::default();
//! let ctx = EngineContext {
//!     pipeline: PipelineData::new("/src/my-project".into()),
//!     config: &config,
//!     scm: Arc::new(DefaultScm::new("default")),
//!     runner: Arc::new(SystemRunner),
//! };
//! let mut engine = engine::create("generic", ctx)?;
//! engine.validate_tools()?;
//! engine.bump_version()?;
//! println!("next: {}", engine.next_metadata().version);
//! # Ok::<(), bumpr_core::engine::EngineError>(())
//! ```

mod base;
mod chef;
pub mod go_source;
mod generic;
mod golang;
mod node;
mod python;
mod ruby;
mod template;

#[cfg(test)]
pub(crate) mod testing;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::pipeline::PipelineData;
use crate::process::{CommandError, CommandRunner};
use crate::scm::Scm;
use crate::version::VersionError;

pub use base::EngineBase;
pub use chef::ChefEngine;
pub use generic::GenericEngine;
pub use golang::GolangEngine;
pub use node::NodeEngine;
pub use python::PythonEngine;
pub use ruby::RubyEngine;
pub use template::VersionTemplate;

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Errors from engine construction and version bumps.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The version could not be parsed or the bump interval is unknown.
    #[error(transparent)]
    Version(#[from] VersionError),

    /// No text in the version file matched the template.
    #[error("unable to find a version with the format `{template}` in {path}")]
    TemplateMismatch {
        /// The template that was matched against.
        template: String,
        /// The file that was searched.
        path: Utf8PathBuf,
    },

    /// The version template does not have exactly three `%d` placeholders.
    #[error("invalid version template `{0}`: expected exactly three %d placeholders")]
    InvalidTemplate(String),

    /// A required executable is not on `PATH`.
    #[error("{0} binary is missing")]
    ToolMissing(String),

    /// A required artifact is absent; usually the wrong engine was selected.
    #[error("invalid build package: {0}")]
    BuildPackageInvalid(String),

    /// An artifact exists but could not be parsed, or a helper command failed.
    #[error("build package failed: {0}")]
    BuildPackageFailed(String),

    /// No engine is registered under this identifier.
    #[error("unsupported engine type: {0}")]
    UnsupportedEngineType(String),

    /// Reading or writing a file failed.
    #[error("failed to access {path}: {source}")]
    Io {
        /// The file or directory involved.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl From<CommandError> for EngineError {
    fn from(err: CommandError) -> Self {
        Self::BuildPackageFailed(err.to_string())
    }
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// ──────────────────────────────────────────────
// Types
// ──────────────────────────────────────────────

/// A recognized packaging ecosystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineType {
    /// Templated plain-text version file.
    Generic,
    /// Go source file declaring a `version` constant or variable.
    Golang,
    /// `package.json` managed through `npm`.
    Node,
    /// Plain `VERSION` file next to `setup.py`.
    Python,
    /// Gem with a `lib/<name>/version.rb` file.
    Ruby,
    /// Chef cookbook `metadata.rb`.
    Chef,
}

impl EngineType {
    /// All registered engine types.
    pub const ALL: &[Self] = &[
        Self::Generic,
        Self::Golang,
        Self::Node,
        Self::Python,
        Self::Ruby,
        Self::Chef,
    ];

    /// Executables that must be on `PATH` for this engine.
    pub const fn required_tools(self) -> &'static [&'static str] {
        match self {
            Self::Generic => &[],
            Self::Golang => &["go"],
            Self::Node => &["node"],
            Self::Python => &["python"],
            Self::Ruby => &["ruby"],
            Self::Chef => &["knife"],
        }
    }
}

impl fmt::Display for EngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generic => write!(f, "generic"),
            Self::Golang => write!(f, "golang"),
            Self::Node => write!(f, "node"),
            Self::Python => write!(f, "python"),
            Self::Ruby => write!(f, "ruby"),
            Self::Chef => write!(f, "chef"),
        }
    }
}

impl FromStr for EngineType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.to_string() == s)
            .ok_or_else(|| EngineError::UnsupportedEngineType(s.to_string()))
    }
}

/// Package name and version as seen by an engine.
///
/// Deserializes directly from `package.json` and Chef `metadata.json`;
/// unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    /// Package name, when the ecosystem records one.
    pub name: String,
    /// Version string.
    pub version: String,
}

/// Collaborators handed to an engine at construction.
#[derive(Debug)]
pub struct EngineContext<'a> {
    /// Run state; the engine takes ownership for the rest of the run.
    pub pipeline: PipelineData,
    /// Resolved configuration, read once during `init`.
    pub config: &'a Config,
    /// Hosting-service handle. Stored, never invoked by engines.
    pub scm: Arc<dyn Scm>,
    /// Subprocess port for tool lookup and delegated writes.
    pub runner: Arc<dyn CommandRunner>,
}

// ──────────────────────────────────────────────
// Contract
// ──────────────────────────────────────────────

/// Uniform contract implemented by every ecosystem engine.
pub trait Engine: fmt::Debug {
    /// Wire collaborators and resolve ecosystem defaults.
    fn init(ctx: EngineContext<'_>) -> EngineResult<Self>
    where
        Self: Sized;

    /// The ecosystem this engine handles.
    fn engine_type(&self) -> EngineType;

    /// Shared engine state.
    fn base(&self) -> &EngineBase;

    /// Read the current version, compute the next one and write it.
    fn bump_version(&mut self) -> EngineResult<()>;

    /// Check that every required executable resolves on `PATH`.
    fn validate_tools(&self) -> EngineResult<()> {
        self.base().validate_tools(self.engine_type().required_tools())
    }

    /// Metadata read from the working tree.
    fn current_metadata(&self) -> &Metadata {
        self.base().current_metadata()
    }

    /// Metadata that was (or will be) written.
    fn next_metadata(&self) -> &Metadata {
        self.base().next_metadata()
    }

    /// Run state, including the resulting `release_version`.
    fn pipeline_data(&self) -> &PipelineData {
        self.base().pipeline_data()
    }
}

/// Construct and initialize the engine registered under `engine_type`.
///
/// Unknown identifiers fail before any engine is constructed.
pub fn create(engine_type: &str, ctx: EngineContext<'_>) -> EngineResult<Box<dyn Engine>> {
    let engine_type: EngineType = engine_type.parse()?;
    debug!(%engine_type, "creating engine");

    let engine: Box<dyn Engine> = match engine_type {
        EngineType::Generic => Box::new(GenericEngine::init(ctx)?),
        EngineType::Golang => Box::new(GolangEngine::init(ctx)?),
        EngineType::Node => Box::new(NodeEngine::init(ctx)?),
        EngineType::Python => Box::new(PythonEngine::init(ctx)?),
        EngineType::Ruby => Box::new(RubyEngine::init(ctx)?),
        EngineType::Chef => Box::new(ChefEngine::init(ctx)?),
    };
    Ok(engine)
}
