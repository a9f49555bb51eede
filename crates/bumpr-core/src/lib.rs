//! Core library for bumpr.
//!
//! bumpr bumps the version recorded in a project's working tree using
//! SemVer rules. Each packaging ecosystem has an engine that knows where
//! the version lives, how to read it, and how to write the next one.
//!
//! # Modules
//!
//! - [`config`] - Configuration loading and management
//! - [`engine`] - Ecosystem engines and the engine factory
//! - [`error`] - Configuration error types
//! - [`pipeline`] - Orchestration of a single bump
//! - [`process`] - Subprocess port used by engines
//! - [`scm`] - Reporting outputs to the hosting service
//! - [`version`] - SemVer bump algorithm
//!
//! # Quick Start
//!
//! ```no_run
//! use bumpr_core::{ConfigLoader, Pipeline};
//! use camino::Utf8Path;
//!
//! let config = ConfigLoader::new()
//!     .with_user_config(true)
//!     .load()
//!     .expect("Failed to load configuration");
//!
//! let outcome = Pipeline::new(&config)
//!     .start(Utf8Path::new("/src/widget"), |_| {})
//!     .expect("bump failed");
//! println!("bumped to {}", outcome.next);
//! ```
#![deny(unsafe_code)]

pub mod config;

pub mod engine;

pub mod error;

pub mod pipeline;

pub mod process;

pub mod scm;

pub mod version;

pub use config::{Config, ConfigLoader, ConfigOverrides, LogLevel};

pub use engine::{Engine, EngineError, EngineType, Metadata};

pub use error::{ConfigError, ConfigResult};

pub use pipeline::{BumpOutcome, Pipeline, PipelineData, PipelineError, PipelineEvent};

// Re-export semver so downstream crates don't need a direct dependency.
pub use semver;
