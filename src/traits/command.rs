use super::output::LogSink;
use std::ffi::OsString;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Child, Command, Stdio};

/// Trait for launching child processes, allowing for mocking in tests
pub trait ProcessLauncher: Send + Sync {
    /// Start `args[0]` with the remaining arguments in `working_dir`, stream its
    /// combined output to `sink` and block until it exits.
    ///
    /// Returns the exit code; a process terminated by a signal reports -1.
    fn launch(&self, args: &[OsString], working_dir: &Path, sink: &dyn LogSink) -> io::Result<i32>;
}

/// Real launcher using std::process::Command
pub struct RealProcessLauncher;

impl RealProcessLauncher {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RealProcessLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessLauncher for RealProcessLauncher {
    fn launch(&self, args: &[OsString], working_dir: &Path, sink: &dyn LogSink) -> io::Result<i32> {
        let (program, rest) = args
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Empty command provided"))?;

        let mut child = Command::new(program)
            .args(rest)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let streamed = stream_output(&mut child, stdout, stderr, sink);

        let status = child.wait()?;
        streamed?;

        Ok(status.code().unwrap_or(-1))
    }
}

/// Drain both pipes of `child` into the sink, stderr on a scoped thread.
///
/// Both pipes must drain or the child can block on a full buffer. If stdout
/// cannot be read, the child is killed so that stderr closes and the caller's
/// `wait()` returns.
fn stream_output(
    child: &mut Child,
    stdout: Option<impl Read>,
    stderr: Option<impl Read + Send>,
    sink: &dyn LogSink,
) -> io::Result<()> {
    std::thread::scope(|scope| -> io::Result<()> {
        let stderr_reader = stderr.map(|stderr| scope.spawn(move || stream_lines(stderr, sink)));

        let stdout_result = stdout.map_or(Ok(()), |stdout| stream_lines(stdout, sink));
        if let Err(err) = &stdout_result {
            tracing::warn!(error = %err, "failed to read process output, killing it");
            let _ = child.kill();
        }

        let stderr_result = match stderr_reader {
            Some(handle) => handle
                .join()
                .map_err(|_| io::Error::other("stderr reader panicked"))?,
            None => Ok(()),
        };

        stdout_result.and(stderr_result)
    })
}

/// Forward every line read from `reader` to the sink, without its line ending
fn stream_lines(reader: impl Read, sink: &dyn LogSink) -> io::Result<()> {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();

        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }

        let line = String::from_utf8_lossy(&buf);
        sink.line(line.trim_end_matches(['\n', '\r']));
    }
}

/// A single recorded call to MockProcessLauncher
#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub args: Vec<OsString>,
    pub working_dir: std::path::PathBuf,
}

#[cfg(test)]
impl Invocation {
    /// The Terraform subcommand (first argument after the binary)
    pub fn subcommand(&self) -> &str {
        self.args.get(1).and_then(|arg| arg.to_str()).unwrap_or_default()
    }
}

/// Mock launcher for testing: records invocations and replays configured
/// exit codes and output keyed by subcommand
#[cfg(test)]
pub struct MockProcessLauncher {
    invocations: std::sync::Mutex<Vec<Invocation>>,
    exit_codes: std::sync::Mutex<Vec<(String, i32)>>,
    output: Vec<(String, String)>,
}

#[cfg(test)]
impl MockProcessLauncher {
    pub fn new() -> Self {
        Self {
            invocations: std::sync::Mutex::new(Vec::new()),
            exit_codes: std::sync::Mutex::new(Vec::new()),
            output: Vec::new(),
        }
    }

    /// Make the next invocation of `subcommand` exit with `code`
    pub fn with_exit_code(self, subcommand: &str, code: i32) -> Self {
        self.exit_codes
            .lock()
            .unwrap()
            .push((subcommand.to_string(), code));
        self
    }

    /// Emit `line` to the sink whenever `subcommand` runs
    pub fn with_output(mut self, subcommand: &str, line: &str) -> Self {
        self.output.push((subcommand.to_string(), line.to_string()));
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn subcommands(&self) -> Vec<String> {
        self.invocations()
            .iter()
            .map(|invocation| invocation.subcommand().to_string())
            .collect()
    }
}

#[cfg(test)]
impl Default for MockProcessLauncher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl ProcessLauncher for MockProcessLauncher {
    fn launch(&self, args: &[OsString], working_dir: &Path, sink: &dyn LogSink) -> io::Result<i32> {
        let invocation = Invocation {
            args: args.to_vec(),
            working_dir: working_dir.to_path_buf(),
        };
        let subcommand = invocation.subcommand().to_string();
        self.invocations.lock().unwrap().push(invocation);

        for (_, line) in self.output.iter().filter(|(cmd, _)| *cmd == subcommand) {
            sink.line(line);
        }

        let mut exit_codes = self.exit_codes.lock().unwrap();

        if let Some(index) = exit_codes.iter().position(|(cmd, _)| *cmd == subcommand) {
            let (_, code) = exit_codes.remove(index);
            return Ok(code);
        }

        // Default: success
        Ok(0)
    }
}
