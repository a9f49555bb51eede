//! Bump orchestration.
//!
//! A run wires the configured SCM and engine together and drives them in
//! a fixed order:
//!
//! 1. **Create engine**: parse the package type and run the engine's `init`.
//! 2. **Validate tools**: every required executable must be on `PATH`.
//! 3. **Bump version**: read, compute, write.
//! 4. **Report output**: publish `release_version` through the SCM.
//!
//! The CLI is purely a display layer: it passes an event callback and
//! renders the returned [`BumpOutcome`].

use std::fmt;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::engine::{self, EngineContext, EngineError, EngineType};
use crate::process::{CommandRunner, SystemRunner};
use crate::scm::{self, Scm, ScmError};

/// Name of the SCM output that carries the bumped version.
pub const RELEASE_VERSION_OUTPUT: &str = "release_version";

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Errors from a pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Engine creation or the bump itself failed.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The SCM could not be created or rejected the output.
    #[error(transparent)]
    Scm(#[from] ScmError),

    /// The engine finished without recording a release version.
    #[error("{0} engine did not record a release version")]
    MissingReleaseVersion(EngineType),
}

/// Result alias for pipeline runs.
pub type PipelineResult<T> = Result<T, PipelineError>;

// ──────────────────────────────────────────────
// Types
// ──────────────────────────────────────────────

/// Mutable state of a single run, owned by the engine once created.
///
/// `release_version` starts out `None` and is set exactly once, when the
/// engine computes the next version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineData {
    /// Root of the checked-out repository.
    pub git_local_path: Utf8PathBuf,
    /// Parent directory of the checkout; the Go engine may re-point it.
    pub git_parent_path: Utf8PathBuf,
    /// GOPATH-style workspace root prepared by the Go engine.
    pub golang_go_path: Option<Utf8PathBuf>,
    /// The bumped version, once computed.
    pub release_version: Option<String>,
}

impl PipelineData {
    /// Run state for a checkout at `git_local_path`.
    pub fn new(git_local_path: Utf8PathBuf) -> Self {
        let git_parent_path = git_local_path
            .parent()
            .map(Utf8Path::to_path_buf)
            .unwrap_or_default();
        Self {
            git_local_path,
            git_parent_path,
            golang_go_path: None,
            release_version: None,
        }
    }
}

/// A step of the pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    /// Construct the engine for the configured package type.
    CreateEngine,
    /// Check for required executables.
    ValidateTools,
    /// Read, compute and write the version.
    BumpVersion,
    /// Publish the release version through the SCM.
    ReportOutput,
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateEngine => write!(f, "create engine"),
            Self::ValidateTools => write!(f, "validate tools"),
            Self::BumpVersion => write!(f, "bump version"),
            Self::ReportOutput => write!(f, "report output"),
        }
    }
}

/// Progress events for display layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// A step has started.
    StepStarted(PipelineStep),
    /// A step has completed successfully.
    StepCompleted(PipelineStep),
}

/// Result of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct BumpOutcome {
    /// Engine that performed the bump.
    pub package_type: EngineType,
    /// Package name, when the ecosystem records one.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Version found in the working tree.
    pub previous: String,
    /// Version written to the working tree.
    pub next: String,
    /// Version reported to the SCM.
    pub release_version: String,
    /// Final run state.
    pub pipeline: PipelineData,
}

// ──────────────────────────────────────────────
// Orchestrator
// ──────────────────────────────────────────────

/// Drives one bump with a resolved configuration.
#[derive(Debug)]
pub struct Pipeline<'a> {
    config: &'a Config,
    runner: Arc<dyn CommandRunner>,
    scm: Option<Arc<dyn Scm>>,
}

impl<'a> Pipeline<'a> {
    /// Pipeline backed by real processes and the configured SCM.
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            runner: Arc::new(SystemRunner),
            scm: None,
        }
    }

    /// Substitute the subprocess port.
    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Use `scm` instead of creating one from the `scm` setting.
    pub fn with_scm(mut self, scm: Arc<dyn Scm>) -> Self {
        self.scm = Some(scm);
        self
    }

    /// Bump the version of the checkout at `local_path`.
    ///
    /// Calls `on_event` at step boundaries.
    #[instrument(skip_all, fields(
        package_type = %self.config.package_type,
        scm = %self.config.scm,
        %local_path
    ))]
    pub fn start(
        &self,
        local_path: &Utf8Path,
        mut on_event: impl FnMut(PipelineEvent),
    ) -> PipelineResult<BumpOutcome> {
        let scm = match self.scm {
            Some(ref scm) => Arc::clone(scm),
            None => scm::create(&self.config.scm)?,
        };
        debug!(scm = scm.name(), "scm ready");

        on_event(PipelineEvent::StepStarted(PipelineStep::CreateEngine));
        let mut engine = engine::create(
            &self.config.package_type,
            EngineContext {
                pipeline: PipelineData::new(local_path.to_path_buf()),
                config: self.config,
                scm: Arc::clone(&scm),
                runner: Arc::clone(&self.runner),
            },
        )?;
        on_event(PipelineEvent::StepCompleted(PipelineStep::CreateEngine));

        on_event(PipelineEvent::StepStarted(PipelineStep::ValidateTools));
        engine.validate_tools()?;
        on_event(PipelineEvent::StepCompleted(PipelineStep::ValidateTools));

        on_event(PipelineEvent::StepStarted(PipelineStep::BumpVersion));
        engine.bump_version()?;
        on_event(PipelineEvent::StepCompleted(PipelineStep::BumpVersion));

        let package_type = engine.engine_type();
        let release_version = engine
            .pipeline_data()
            .release_version
            .clone()
            .ok_or(PipelineError::MissingReleaseVersion(package_type))?;

        on_event(PipelineEvent::StepStarted(PipelineStep::ReportOutput));
        scm.set_output(RELEASE_VERSION_OUTPUT, &release_version)?;
        on_event(PipelineEvent::StepCompleted(PipelineStep::ReportOutput));

        let outcome = BumpOutcome {
            package_type,
            name: engine.next_metadata().name.clone(),
            previous: engine.current_metadata().version.clone(),
            next: engine.next_metadata().version.clone(),
            release_version,
            pipeline: engine.pipeline_data().clone(),
        };

        info!(
            %package_type,
            previous = %outcome.previous,
            next = %outcome.next,
            "bump complete"
        );
        Ok(outcome)
    }
}
