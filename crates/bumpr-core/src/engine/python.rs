//! Python packages with a plain `VERSION` file.

use camino::Utf8PathBuf;
use tracing::{debug, warn};

use super::base::{read_file, write_file};
use super::{Engine, EngineBase, EngineContext, EngineResult, EngineType};

/// Version file used when `version_metadata_path` is unset.
pub const DEFAULT_VERSION_PATH: &str = "VERSION";

/// Version written when the version file does not exist yet.
const SEED_VERSION: &str = "0.0.0";

/// Engine for `setup.py` projects.
#[derive(Debug)]
pub struct PythonEngine {
    base: EngineBase,
    version_metadata_path: Utf8PathBuf,
}

impl Engine for PythonEngine {
    fn init(ctx: EngineContext<'_>) -> EngineResult<Self> {
        let version_metadata_path = ctx
            .config
            .version_metadata_path
            .as_deref()
            .unwrap_or(DEFAULT_VERSION_PATH)
            .into();
        Ok(Self {
            base: EngineBase::new(ctx),
            version_metadata_path,
        })
    }

    fn engine_type(&self) -> EngineType {
        EngineType::Python
    }

    fn base(&self) -> &EngineBase {
        &self.base
    }

    fn bump_version(&mut self) -> EngineResult<()> {
        self.base.require_artifact("setup.py", || {
            "setup.py file is required to process Python package".to_string()
        })?;

        let path = self.base.local_path().join(&self.version_metadata_path);
        if !path.exists() {
            warn!(%path, seed = SEED_VERSION, "version file missing, creating it");
            write_file(&path, SEED_VERSION)?;
        }

        let version = read_file(&path)?.trim().to_string();
        debug!(%version, %path, "read current version");
        self.base.current_metadata_mut().version = version;

        self.base.populate_next_metadata()?;
        write_file(&path, &self.base.next_metadata().version)
    }
}
