//! Go modules with a version constant or variable in source.

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info};

use super::base::{create_dir_all, read_file, write_file};
use super::go_source::{self, GoSourceError};
use super::{Engine, EngineBase, EngineContext, EngineError, EngineResult, EngineType};

/// Version source file used when `version_metadata_path` is unset.
pub const DEFAULT_VERSION_PATH: &str = "pkg/version/version.go";

#[derive(Debug)]
struct GolangSettings {
    version_metadata_path: Utf8PathBuf,
    package_path: String,
}

/// Engine for Go projects.
///
/// `init` lays out a GOPATH-style workspace under the parent of the
/// checkout (`bin/`, `src/`, `src/<package prefix>`) and records it in the
/// pipeline data: `golang_go_path` becomes the old parent and
/// `git_parent_path` moves to the package prefix directory.
#[derive(Debug)]
pub struct GolangEngine {
    base: EngineBase,
    settings: GolangSettings,
}

/// Hosting domain used to derive the default package path.
fn scm_domain(scm: &str) -> &'static str {
    if scm == "bitbucket" {
        "bitbucket.org"
    } else {
        "github.com"
    }
}

/// Everything up to (not including) the last path segment.
fn package_prefix(package_path: &str) -> &str {
    package_path
        .trim_end_matches('/')
        .rsplit_once('/')
        .map_or("", |(prefix, _)| prefix)
}

impl GolangEngine {
    fn prepare_workspace(&mut self) -> EngineResult<()> {
        let go_path = self.base.pipeline_data().git_parent_path.clone();
        if go_path.as_str().is_empty() {
            debug!("no parent path, skipping go workspace layout");
            return Ok(());
        }

        create_dir_all(&go_path.join("bin"))?;
        create_dir_all(&go_path.join("src"))?;

        let package_parent = go_path.join("src").join(package_prefix(&self.settings.package_path));
        create_dir_all(&package_parent)?;

        info!(%go_path, %package_parent, package = %self.settings.package_path, "prepared go workspace");

        let pipeline = self.base.pipeline_data_mut();
        pipeline.golang_go_path = Some(go_path);
        pipeline.git_parent_path = package_parent;
        Ok(())
    }

    fn source_error(path: &Utf8Path, err: GoSourceError) -> EngineError {
        EngineError::BuildPackageFailed(format!("{path}: {err}"))
    }

    /// Go package path, e.g. `github.com/acme/widget`.
    pub fn package_path(&self) -> &str {
        &self.settings.package_path
    }
}

impl Engine for GolangEngine {
    fn init(ctx: EngineContext<'_>) -> EngineResult<Self> {
        let config = ctx.config;
        let package_path = config.engine_golang_package_path.clone().unwrap_or_else(|| {
            format!(
                "{}/{}",
                scm_domain(&config.scm),
                config
                    .scm_repo_full_name
                    .as_deref()
                    .unwrap_or_default()
                    .to_lowercase()
            )
        });
        let settings = GolangSettings {
            version_metadata_path: config
                .version_metadata_path
                .as_deref()
                .unwrap_or(DEFAULT_VERSION_PATH)
                .into(),
            package_path,
        };

        let mut engine = Self {
            base: EngineBase::new(ctx),
            settings,
        };
        engine.prepare_workspace()?;
        Ok(engine)
    }

    fn engine_type(&self) -> EngineType {
        EngineType::Golang
    }

    fn base(&self) -> &EngineBase {
        &self.base
    }

    fn bump_version(&mut self) -> EngineResult<()> {
        let path = self.base.require_artifact(&self.settings.version_metadata_path, || {
            format!(
                "version file ({}) is required for metadata storage via the golang engine",
                self.settings.version_metadata_path
            )
        })?;

        let source = read_file(&path)?;
        let declaration =
            go_source::find_version(&source).map_err(|err| Self::source_error(&path, err))?;
        debug!(name = %declaration.name, version = %declaration.value, %path, "read current version");
        self.base.current_metadata_mut().version = declaration.value;

        self.base.populate_next_metadata()?;

        let source = read_file(&path)?;
        let rewritten = go_source::replace_version(&source, &self.base.next_metadata().version)
            .map_err(|err| Self::source_error(&path, err))?;
        write_file(&path, &rewritten)
    }
}
