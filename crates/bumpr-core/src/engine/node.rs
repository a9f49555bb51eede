//! npm packages.

use tracing::debug;

use super::base::read_file;
use super::{Engine, EngineBase, EngineContext, EngineError, EngineResult, EngineType, Metadata};

const PACKAGE_JSON: &str = "package.json";

/// Engine for `package.json` projects. Writes are delegated to `npm`.
#[derive(Debug)]
pub struct NodeEngine {
    base: EngineBase,
}

impl Engine for NodeEngine {
    fn init(ctx: EngineContext<'_>) -> EngineResult<Self> {
        Ok(Self {
            base: EngineBase::new(ctx),
        })
    }

    fn engine_type(&self) -> EngineType {
        EngineType::Node
    }

    fn base(&self) -> &EngineBase {
        &self.base
    }

    fn bump_version(&mut self) -> EngineResult<()> {
        let path = self.base.require_artifact(PACKAGE_JSON, || {
            "package.json file is required to process Node package".to_string()
        })?;

        let content = read_file(&path)?;
        let metadata: Metadata = serde_json::from_str(&content).map_err(|err| {
            EngineError::BuildPackageFailed(format!("unable to parse {path}: {err}"))
        })?;
        debug!(name = %metadata.name, version = %metadata.version, "read package.json");
        *self.base.current_metadata_mut() = metadata;

        self.base.populate_next_metadata()?;

        let args = vec![
            "--no-git-tag-version".to_string(),
            "version".to_string(),
            self.base.next_metadata().version.clone(),
        ];
        self.base.runner().run("npm", &args, self.base.local_path())?;
        Ok(())
    }
}
