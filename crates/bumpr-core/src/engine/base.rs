//! State and helpers shared by every engine.

use std::fs;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info};

use super::{EngineContext, EngineError, EngineResult, Metadata};
use crate::pipeline::PipelineData;
use crate::process::CommandRunner;
use crate::scm::Scm;
use crate::version;

/// Shared engine state: run data, collaborators and the metadata pair.
#[derive(Debug)]
pub struct EngineBase {
    pipeline: PipelineData,
    bump_interval: String,
    scm: Arc<dyn Scm>,
    runner: Arc<dyn CommandRunner>,
    current: Metadata,
    next: Metadata,
}

impl EngineBase {
    /// Take ownership of the run state and collaborators from `ctx`.
    pub fn new(ctx: EngineContext<'_>) -> Self {
        Self {
            pipeline: ctx.pipeline,
            bump_interval: ctx.config.version_bump_type.clone(),
            scm: ctx.scm,
            runner: ctx.runner,
            current: Metadata::default(),
            next: Metadata::default(),
        }
    }

    /// Run state.
    pub const fn pipeline_data(&self) -> &PipelineData {
        &self.pipeline
    }

    pub(crate) const fn pipeline_data_mut(&mut self) -> &mut PipelineData {
        &mut self.pipeline
    }

    /// Checked-out repository root.
    pub fn local_path(&self) -> &Utf8Path {
        &self.pipeline.git_local_path
    }

    /// Hosting-service handle.
    pub fn scm(&self) -> &Arc<dyn Scm> {
        &self.scm
    }

    /// Subprocess port.
    pub fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    /// Metadata read from the working tree.
    pub const fn current_metadata(&self) -> &Metadata {
        &self.current
    }

    pub(crate) const fn current_metadata_mut(&mut self) -> &mut Metadata {
        &mut self.current
    }

    /// Metadata to be written.
    pub const fn next_metadata(&self) -> &Metadata {
        &self.next
    }

    /// Fail with [`EngineError::ToolMissing`] for the first tool not on `PATH`.
    pub fn validate_tools(&self, tools: &[&str]) -> EngineResult<()> {
        for tool in tools {
            match self.runner.resolve(tool) {
                Some(path) => debug!(tool, path = %path.display(), "found required tool"),
                None => return Err(EngineError::ToolMissing((*tool).to_string())),
            }
        }
        Ok(())
    }

    /// Compute the successor of `current` using the configured interval.
    pub fn generate_next_version(&self, current: &str) -> EngineResult<String> {
        Ok(version::generate_next_version(current, &self.bump_interval)?)
    }

    /// Derive next metadata from current and record the release version.
    pub fn populate_next_metadata(&mut self) -> EngineResult<()> {
        let next_version = self.generate_next_version(&self.current.version)?;
        info!(
            current = %self.current.version,
            next = %next_version,
            interval = %self.bump_interval,
            "computed next version"
        );

        self.next = Metadata {
            name: self.current.name.clone(),
            version: next_version.clone(),
        };
        self.pipeline.release_version = Some(next_version);
        Ok(())
    }

    /// Resolve `relative` under the repository root, requiring a file.
    ///
    /// A missing file means the wrong engine was selected for this tree.
    pub fn require_artifact(
        &self,
        relative: impl AsRef<Utf8Path>,
        message: impl FnOnce() -> String,
    ) -> EngineResult<Utf8PathBuf> {
        let path = self.local_path().join(relative);
        if path.is_file() {
            Ok(path)
        } else {
            Err(EngineError::BuildPackageInvalid(message()))
        }
    }
}

/// Read a file to a string, attaching the path on failure.
pub(crate) fn read_file(path: &Utf8Path) -> EngineResult<String> {
    fs::read_to_string(path).map_err(|source| EngineError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Replace a file's contents, attaching the path on failure.
pub(crate) fn write_file(path: &Utf8Path, contents: &str) -> EngineResult<()> {
    fs::write(path, contents).map_err(|source| EngineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(%path, bytes = contents.len(), "wrote file");
    Ok(())
}

/// Create a directory and its parents, attaching the path on failure.
pub(crate) fn create_dir_all(path: &Utf8Path) -> EngineResult<()> {
    fs::create_dir_all(path).map_err(|source| EngineError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::super::testing::{FakeRunner, context, fixture};
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    fn base_with(config: &Config, tmp: &TempDir) -> EngineBase {
        EngineBase::new(context(fixture(tmp), config, FakeRunner::new().shared()))
    }

    #[test]
    fn populate_next_copies_name_and_records_release() {
        let tmp = TempDir::new().unwrap();
        let config = Config::default();
        let mut base = base_with(&config, &tmp);
        *base.current_metadata_mut() = Metadata {
            name: "widget".into(),
            version: "1.2.3".into(),
        };

        base.populate_next_metadata().unwrap();

        assert_eq!(base.next_metadata().name, "widget");
        assert_eq!(base.next_metadata().version, "1.2.4");
        assert_eq!(base.pipeline_data().release_version.as_deref(), Some("1.2.4"));
        assert_eq!(base.current_metadata().version, "1.2.3");
    }

    #[test]
    fn populate_next_uses_configured_interval() {
        let tmp = TempDir::new().unwrap();
        let config = Config {
            version_bump_type: "major".into(),
            ..Config::default()
        };
        let mut base = base_with(&config, &tmp);
        base.current_metadata_mut().version = "1.2.3".into();

        base.populate_next_metadata().unwrap();
        assert_eq!(base.next_metadata().version, "2.0.0");
    }

    #[test]
    fn populate_next_rejects_unparseable_current() {
        let tmp = TempDir::new().unwrap();
        let config = Config::default();
        let mut base = base_with(&config, &tmp);
        base.current_metadata_mut().version = "not-a-version".into();

        let err = base.populate_next_metadata().unwrap_err();
        assert!(matches!(err, EngineError::Version(_)));
        assert!(base.pipeline_data().release_version.is_none());
    }

    #[test]
    fn generate_next_rejects_unknown_interval() {
        let tmp = TempDir::new().unwrap();
        let config = Config {
            version_bump_type: "weekly".into(),
            ..Config::default()
        };
        let base = base_with(&config, &tmp);
        assert!(base.generate_next_version("1.0.0").is_err());
    }

    #[test]
    fn require_artifact_resolves_under_local_path() {
        let tmp = TempDir::new().unwrap();
        let config = Config::default();
        let base = base_with(&config, &tmp);
        fs::write(base.local_path().join("setup.py"), "").unwrap();

        let path = base
            .require_artifact("setup.py", || "setup.py is required".into())
            .unwrap();
        assert_eq!(path, base.local_path().join("setup.py"));

        let err = base
            .require_artifact("missing.txt", || "missing.txt is required".into())
            .unwrap_err();
        assert!(matches!(err, EngineError::BuildPackageInvalid(ref m) if m == "missing.txt is required"));
    }

    #[test]
    fn require_artifact_rejects_directories() {
        let tmp = TempDir::new().unwrap();
        let config = Config::default();
        let base = base_with(&config, &tmp);
        fs::create_dir(base.local_path().join("VERSION")).unwrap();

        assert!(base.require_artifact("VERSION", String::new).is_err());
    }
}
