//! Ruby gems.
//!
//! The gemspec is evaluated by `ruby` itself, which writes the name and
//! version to a temporary JSON file. The version is then rewritten in
//! `lib/<name>/version.rb`.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use regex::{NoExpand, Regex};
use serde::Deserialize;
use tracing::{debug, warn};

use super::base::{read_file, write_file};
use super::{Engine, EngineBase, EngineContext, EngineError, EngineResult, EngineType};

/// Loads `ARGV[0]` as a gemspec and writes its name and version to `ARGV[1]`.
const GEMSPEC_SCRIPT: &str = r#"require 'json'
spec = Gem::Specification.load(ARGV[0])
abort("unable to load gemspec #{ARGV[0]}") if spec.nil?
File.write(ARGV[1], JSON.generate('name' => spec.name, 'version' => spec.version.to_s))"#;

#[derive(Debug, Deserialize)]
struct GemspecInfo {
    name: String,
    version: String,
}

/// Engine for gems described by a `*.gemspec` file.
#[derive(Debug)]
pub struct RubyEngine {
    base: EngineBase,
}

impl RubyEngine {
    fn find_gemspec(&self) -> EngineResult<Utf8PathBuf> {
        let root = self.base.local_path();
        let entries = root.read_dir_utf8().map_err(|source| EngineError::Io {
            path: root.to_path_buf(),
            source,
        })?;

        let mut specs: Vec<Utf8PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.into_path())
            .filter(|path| path.extension() == Some("gemspec") && path.is_file())
            .collect();
        specs.sort();

        if specs.len() > 1 {
            warn!(count = specs.len(), using = %specs[0], "multiple gemspecs found");
        }
        specs.into_iter().next().ok_or_else(|| {
            EngineError::BuildPackageInvalid(
                "*.gemspec file is required to process Ruby gem".to_string(),
            )
        })
    }

    fn evaluate_gemspec(&self, gemspec: &Utf8Path) -> EngineResult<GemspecInfo> {
        let output = tempfile::Builder::new()
            .prefix("gemspec")
            .suffix(".json")
            .tempfile()
            .map_err(|err| {
                EngineError::BuildPackageFailed(format!("unable to create temporary file: {err}"))
            })?;
        let output_path = Utf8Path::from_path(output.path()).ok_or_else(|| {
            EngineError::BuildPackageFailed("temporary file path is not UTF-8".to_string())
        })?;

        let args = vec![
            "-e".to_string(),
            GEMSPEC_SCRIPT.to_string(),
            gemspec.to_string(),
            output_path.to_string(),
        ];
        self.base.runner().run("ruby", &args, self.base.local_path())?;

        let content = fs::read_to_string(output_path).map_err(|err| {
            EngineError::BuildPackageFailed(format!("unable to read gemspec output: {err}"))
        })?;
        serde_json::from_str(&content).map_err(|err| {
            EngineError::BuildPackageFailed(format!("unable to parse gemspec output: {err}"))
        })
    }

    fn version_file(&self) -> Utf8PathBuf {
        self.base
            .local_path()
            .join("lib")
            .join(&self.base.current_metadata().name)
            .join("version.rb")
    }
}

impl Engine for RubyEngine {
    fn init(ctx: EngineContext<'_>) -> EngineResult<Self> {
        Ok(Self {
            base: EngineBase::new(ctx),
        })
    }

    fn engine_type(&self) -> EngineType {
        EngineType::Ruby
    }

    fn base(&self) -> &EngineBase {
        &self.base
    }

    fn bump_version(&mut self) -> EngineResult<()> {
        let gemspec = self.find_gemspec()?;
        let info = self.evaluate_gemspec(&gemspec)?;
        debug!(name = %info.name, version = %info.version, %gemspec, "evaluated gemspec");

        let current = self.base.current_metadata_mut();
        current.name = info.name;
        current.version = info.version;

        let version_file = self.version_file();
        if !version_file.is_file() {
            return Err(EngineError::BuildPackageInvalid(format!(
                "version.rb file ({version_file}) is required to process Ruby gem"
            )));
        }

        let triplet = Regex::new(r"(\d+)\.(\d+)\.(\d+)")
            .map_err(|err| EngineError::BuildPackageFailed(err.to_string()))?;
        let content = read_file(&version_file)?;
        if !triplet.is_match(&content) {
            return Err(EngineError::BuildPackageFailed(format!(
                "{version_file} does not contain a MAJOR.MINOR.PATCH version"
            )));
        }

        self.base.populate_next_metadata()?;
        let next = &self.base.next_metadata().version;
        let updated = triplet.replacen(&content, 1, NoExpand(next));
        write_file(&version_file, &updated)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{FakeRunner, context, fixture};
    use super::*;
    use crate::config::Config;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Runner that answers the gemspec script with fixed JSON.
    fn ruby_runner(json: &'static str) -> Arc<FakeRunner> {
        FakeRunner::new()
            .on_run(move |_, args, _| {
                fs::write(&args[3], json).unwrap();
                Ok(Default::default())
            })
            .shared()
    }

    fn gem_tree(tmp: &TempDir, version_rb: Option<&str>) -> crate::pipeline::PipelineData {
        let pipeline = fixture(tmp);
        let root = &pipeline.git_local_path;
        fs::write(root.join("widget.gemspec"), "Gem::Specification.new").unwrap();
        if let Some(body) = version_rb {
            fs::create_dir_all(root.join("lib/widget")).unwrap();
            fs::write(root.join("lib/widget/version.rb"), body).unwrap();
        }
        pipeline
    }

    #[test]
    fn bumps_version_rb() {
        let tmp = TempDir::new().unwrap();
        let original = "module Widget\n  VERSION = '0.7.1'\n  # supports 2.0.0 APIs\nend\n";
        let pipeline = gem_tree(&tmp, Some(original));
        let root = pipeline.git_local_path.clone();
        let runner = ruby_runner(r#"{"name":"widget","version":"0.7.1"}"#);
        let config = Config::default();

        let mut engine = RubyEngine::init(context(pipeline, &config, runner.clone())).unwrap();
        engine.bump_version().unwrap();

        assert_eq!(engine.current_metadata().name, "widget");
        assert_eq!(engine.next_metadata().name, "widget");
        assert_eq!(engine.next_metadata().version, "0.7.2");
        assert_eq!(
            fs::read_to_string(root.join("lib/widget/version.rb")).unwrap(),
            "module Widget\n  VERSION = '0.7.2'\n  # supports 2.0.0 APIs\nend\n"
        );

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "ruby");
        assert_eq!(calls[0].args[0], "-e");
        assert_eq!(calls[0].args[2], root.join("widget.gemspec").as_str());
    }

    #[test]
    fn missing_gemspec_is_invalid() {
        let tmp = TempDir::new().unwrap();
        let runner = FakeRunner::new().shared();
        let config = Config::default();
        let mut engine = RubyEngine::init(context(fixture(&tmp), &config, runner.clone())).unwrap();

        assert!(matches!(
            engine.bump_version(),
            Err(EngineError::BuildPackageInvalid(_))
        ));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn missing_version_rb_is_invalid() {
        let tmp = TempDir::new().unwrap();
        let pipeline = gem_tree(&tmp, None);
        let runner = ruby_runner(r#"{"name":"widget","version":"1.0.0"}"#);
        let config = Config::default();

        let mut engine = RubyEngine::init(context(pipeline, &config, runner)).unwrap();
        let err = engine.bump_version().unwrap_err();
        assert!(matches!(err, EngineError::BuildPackageInvalid(ref m) if m.contains("version.rb")));
        assert!(engine.pipeline_data().release_version.is_none());
    }

    #[test]
    fn version_rb_without_triplet_fails_build() {
        let tmp = TempDir::new().unwrap();
        let original = "module Widget\n  VERSION = Gem::VERSION\nend\n";
        let pipeline = gem_tree(&tmp, Some(original));
        let root = pipeline.git_local_path.clone();
        let runner = ruby_runner(r#"{"name":"widget","version":"1.0.0"}"#);
        let config = Config::default();

        let mut engine = RubyEngine::init(context(pipeline, &config, runner)).unwrap();
        let err = engine.bump_version().unwrap_err();
        assert!(matches!(err, EngineError::BuildPackageFailed(ref m) if m.contains("version.rb")));
        assert!(engine.pipeline_data().release_version.is_none());
        assert_eq!(
            fs::read_to_string(root.join("lib/widget/version.rb")).unwrap(),
            original
        );
    }

    #[test]
    fn garbage_gemspec_output_fails_build() {
        let tmp = TempDir::new().unwrap();
        let pipeline = gem_tree(&tmp, Some("VERSION = '1.0.0'\n"));
        let runner = ruby_runner("not json");
        let config = Config::default();

        let mut engine = RubyEngine::init(context(pipeline, &config, runner)).unwrap();
        assert!(matches!(
            engine.bump_version(),
            Err(EngineError::BuildPackageFailed(_))
        ));
    }

    #[test]
    fn picks_first_gemspec_in_sorted_order() {
        let tmp = TempDir::new().unwrap();
        let pipeline = gem_tree(&tmp, Some("VERSION = '1.0.0'\n"));
        fs::write(pipeline.git_local_path.join("zzz.gemspec"), "").unwrap();
        fs::write(pipeline.git_local_path.join("aaa.gemspec"), "").unwrap();
        let runner = ruby_runner(r#"{"name":"widget","version":"1.0.0"}"#);
        let config = Config::default();

        let mut engine = RubyEngine::init(context(pipeline, &config, runner.clone())).unwrap();
        engine.bump_version().unwrap();
        assert!(runner.calls()[0].args[2].ends_with("aaa.gemspec"));
    }
}
