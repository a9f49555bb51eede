//! Chef cookbooks.
//!
//! `knife` renders `metadata.rb` to a transient `metadata.json` for
//! reading, and `knife spork` performs the write.

use std::fs;

use camino::Utf8Path;
use tracing::{debug, warn};

use super::base::read_file;
use super::{Engine, EngineBase, EngineContext, EngineError, EngineResult, EngineType, Metadata};

/// Engine for cookbooks with a `metadata.rb`.
#[derive(Debug)]
pub struct ChefEngine {
    base: EngineBase,
}

impl ChefEngine {
    /// Cookbook directory name; knife addresses cookbooks by it.
    fn cookbook_name(&self) -> EngineResult<String> {
        self.base
            .local_path()
            .file_name()
            .map(ToString::to_string)
            .ok_or_else(|| {
                EngineError::BuildPackageInvalid(format!(
                    "unable to determine cookbook name from {}",
                    self.base.local_path()
                ))
            })
    }

    fn knife(&self, args: &[&str]) -> EngineResult<()> {
        let args: Vec<String> = args.iter().map(ToString::to_string).collect();
        self.base.runner().run("knife", &args, self.base.local_path())?;
        Ok(())
    }

    /// Read and remove the rendered `metadata.json`.
    fn take_rendered_metadata(path: &Utf8Path) -> EngineResult<Metadata> {
        let content = read_file(path);
        if let Err(err) = fs::remove_file(path) {
            warn!(%path, error = %err, "unable to remove rendered metadata");
        }
        serde_json::from_str(&content?).map_err(|err| {
            EngineError::BuildPackageFailed(format!("unable to parse {path}: {err}"))
        })
    }
}

impl Engine for ChefEngine {
    fn init(ctx: EngineContext<'_>) -> EngineResult<Self> {
        Ok(Self {
            base: EngineBase::new(ctx),
        })
    }

    fn engine_type(&self) -> EngineType {
        EngineType::Chef
    }

    fn base(&self) -> &EngineBase {
        &self.base
    }

    fn bump_version(&mut self) -> EngineResult<()> {
        self.base.require_artifact("metadata.rb", || {
            "metadata.rb file is required to process Chef cookbook".to_string()
        })?;
        let cookbook = self.cookbook_name()?;

        self.knife(&["cookbook", "metadata", "-o", "../", cookbook.as_str()])?;
        let metadata = Self::take_rendered_metadata(&self.base.local_path().join("metadata.json"))?;
        debug!(name = %metadata.name, version = %metadata.version, "read cookbook metadata");
        *self.base.current_metadata_mut() = metadata;

        self.base.populate_next_metadata()?;

        let next = self.base.next_metadata().version.clone();
        self.knife(&["spork", "bump", cookbook.as_str(), "manual", next.as_str(), "-o", "../"])
    }
}
