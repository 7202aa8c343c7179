pub mod command;
pub mod output;
pub mod workspace;

pub use command::{ProcessLauncher, RealProcessLauncher};
pub use output::{FileTeeSink, LogSink, TerminalSink};
pub use workspace::{DirectoryWorkspace, WorkspaceResolver};

#[cfg(test)]
pub use command::MockProcessLauncher;
#[cfg(test)]
pub use output::MockLogSink;
