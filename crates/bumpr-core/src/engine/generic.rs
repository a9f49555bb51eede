//! Templated plain-text version files.
//!
//! In the default mode the whole file is the rendered template and is
//! overwritten on write. In merge mode the version lives on one line of a
//! larger file; only the first occurrence of the old rendered version is
//! replaced and everything else is left untouched.

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, warn};

use super::base::{read_file, write_file};
use super::{Engine, EngineBase, EngineContext, EngineError, EngineResult, EngineType, VersionTemplate};
use crate::version::parse_version;

/// Version file used when `version_metadata_path` is unset.
pub const DEFAULT_VERSION_PATH: &str = "VERSION";

/// Template used when `generic_version_template` is unset.
pub const DEFAULT_VERSION_TEMPLATE: &str = r#"version := "%d.%d.%d""#;

#[derive(Debug)]
struct GenericSettings {
    version_metadata_path: Utf8PathBuf,
    template: VersionTemplate,
    merge_version_file: bool,
}

/// Engine for repositories that keep their version in a templated file.
#[derive(Debug)]
pub struct GenericEngine {
    base: EngineBase,
    settings: GenericSettings,
}

impl GenericEngine {
    fn retrieve_current_metadata(&mut self, path: &Utf8Path) -> EngineResult<()> {
        let content = read_file(path)?;
        let template = &self.settings.template;

        let found = if self.settings.merge_version_file {
            content.lines().find_map(|line| template.extract(line))
        } else {
            template.extract(&content)
        };
        let version = found.ok_or_else(|| EngineError::TemplateMismatch {
            template: template.as_str().to_string(),
            path: path.to_path_buf(),
        })?;

        debug!(%version, %path, merge = self.settings.merge_version_file, "read current version");
        self.base.current_metadata_mut().version = version.to_string();
        Ok(())
    }

    fn write_next_metadata(&self, path: &Utf8Path) -> EngineResult<()> {
        let template = &self.settings.template;
        let next = parse_version(&self.base.next_metadata().version)?;
        let rendered = template.render(&next);

        if !self.settings.merge_version_file {
            return write_file(path, &rendered);
        }

        let merged = match std::fs::read_to_string(path) {
            Ok(content) => {
                let current = parse_version(&self.base.current_metadata().version)?;
                let old = template.render(&current);
                if !content.contains(&old) {
                    warn!(%path, %old, "current version text not found, leaving file unchanged");
                }
                content.replacen(&old, &rendered, 1)
            }
            Err(err) => {
                warn!(%path, error = %err, "version file unreadable, creating a new one");
                rendered
            }
        };
        write_file(path, &merged)
    }
}

impl Engine for GenericEngine {
    fn init(ctx: EngineContext<'_>) -> EngineResult<Self> {
        let config = ctx.config;
        let settings = GenericSettings {
            version_metadata_path: config
                .version_metadata_path
                .as_deref()
                .unwrap_or(DEFAULT_VERSION_PATH)
                .into(),
            template: VersionTemplate::parse(
                config
                    .generic_version_template
                    .as_deref()
                    .unwrap_or(DEFAULT_VERSION_TEMPLATE),
            )?,
            merge_version_file: config.generic_merge_version_file,
        };

        Ok(Self {
            base: EngineBase::new(ctx),
            settings,
        })
    }

    fn engine_type(&self) -> EngineType {
        EngineType::Generic
    }

    fn base(&self) -> &EngineBase {
        &self.base
    }

    fn bump_version(&mut self) -> EngineResult<()> {
        let path = self.base.require_artifact(&self.settings.version_metadata_path, || {
            format!(
                "version file ({}) is required for metadata storage via the generic engine",
                self.settings.version_metadata_path
            )
        })?;

        self.retrieve_current_metadata(&path)?;
        self.base.populate_next_metadata()?;
        self.write_next_metadata(&path)
    }
}
