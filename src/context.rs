use crate::traits::{
    DirectoryWorkspace, FileTeeSink, LogSink, ProcessLauncher, RealProcessLauncher, TerminalSink,
    WorkspaceResolver,
};
#[cfg(test)]
use crate::traits::{MockLogSink, MockProcessLauncher};
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Application context that holds the collaborators of a step execution
pub struct Context {
    pub launcher: Arc<dyn ProcessLauncher>,
    pub sink: Arc<dyn LogSink>,
    pub workspace: Arc<dyn WorkspaceResolver>,
}

impl Context {
    /// Create a new context with real implementations (for production use)
    ///
    /// Relative project paths resolve against `workspace_root`, or the current
    /// directory when none is given. With `log_file`, streamed output is also
    /// appended to that file.
    pub fn new(workspace_root: Option<PathBuf>, log_file: Option<&Path>) -> Result<Self> {
        let workspace = match workspace_root {
            Some(root) => DirectoryWorkspace::new(root),
            None => DirectoryWorkspace::current().context("Failed to read current directory")?,
        };

        let terminal: Arc<dyn LogSink> = Arc::new(TerminalSink);
        let sink: Arc<dyn LogSink> = match log_file {
            Some(path) => Arc::new(
                FileTeeSink::open(path, terminal)
                    .with_context(|| format!("Failed to open log file: {:?}", path))?,
            ),
            None => terminal,
        };

        Ok(Self {
            launcher: Arc::new(RealProcessLauncher::new()),
            sink,
            workspace: Arc::new(workspace),
        })
    }

    /// Create a new context with mock implementations (for testing)
    #[cfg(test)]
    pub fn test() -> Self {
        Self {
            launcher: Arc::new(MockProcessLauncher::new()),
            sink: Arc::new(MockLogSink::new()),
            workspace: Arc::new(DirectoryWorkspace::new("/workspace")),
        }
    }

    /// Create a test context with specific mock implementations
    #[cfg(test)]
    pub fn test_with(
        launcher: Arc<dyn ProcessLauncher>,
        sink: Arc<dyn LogSink>,
        workspace: Arc<dyn WorkspaceResolver>,
    ) -> Self {
        Self {
            launcher,
            sink,
            workspace,
        }
    }
}

impl Clone for Context {
    fn clone(&self) -> Self {
        Self {
            launcher: Arc::clone(&self.launcher),
            sink: Arc::clone(&self.sink),
            workspace: Arc::clone(&self.workspace),
        }
    }
}
