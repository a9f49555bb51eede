//! Test doubles shared by the engine tests.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

use super::EngineContext;
use crate::config::Config;
use crate::pipeline::PipelineData;
use crate::process::{CommandOutput, CommandResult, CommandRunner};
use crate::scm::DefaultScm;

type Handler = dyn Fn(&str, &[String], &Utf8Path) -> CommandResult<CommandOutput> + Send + Sync;

/// A recorded call to [`FakeRunner::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Utf8PathBuf,
}

/// Runner that resolves a fixed tool list and records every invocation.
pub struct FakeRunner {
    tools: Vec<String>,
    calls: Mutex<Vec<Invocation>>,
    handler: Box<Handler>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            calls: Mutex::new(Vec::new()),
            handler: Box::new(|_, _, _| Ok(CommandOutput::default())),
        }
    }

    pub fn with_tools(mut self, tools: &[&str]) -> Self {
        self.tools = tools.iter().map(ToString::to_string).collect();
        self
    }

    /// Simulate command side effects.
    pub fn on_run(
        mut self,
        handler: impl Fn(&str, &[String], &Utf8Path) -> CommandResult<CommandOutput>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.handler = Box::new(handler);
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }
}

impl fmt::Debug for FakeRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeRunner")
            .field("tools", &self.tools)
            .field("calls", &self.calls)
            .finish_non_exhaustive()
    }
}

impl CommandRunner for FakeRunner {
    fn resolve(&self, binary: &str) -> Option<PathBuf> {
        self.tools
            .iter()
            .any(|t| t == binary)
            .then(|| PathBuf::from("/usr/bin").join(binary))
    }

    fn run(&self, program: &str, args: &[String], cwd: &Utf8Path) -> CommandResult<CommandOutput> {
        self.calls.lock().unwrap().push(Invocation {
            program: program.to_string(),
            args: args.to_vec(),
            cwd: cwd.to_path_buf(),
        });
        (self.handler)(program, args, cwd)
    }
}

/// Pipeline rooted at `<tmp>/project` with `<tmp>` as parent.
pub fn fixture(tmp: &TempDir) -> PipelineData {
    let parent = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
    let local = parent.join("project");
    std::fs::create_dir_all(&local).unwrap();
    PipelineData::new(local)
}

pub fn context(
    pipeline: PipelineData,
    config: &Config,
    runner: Arc<dyn CommandRunner>,
) -> EngineContext<'_> {
    EngineContext {
        pipeline,
        config,
        scm: Arc::new(DefaultScm::new("default")),
        runner,
    }
}
