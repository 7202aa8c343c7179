use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Message captured by MockLogSink for testing
#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub enum LogMessage {
    Phase(String),
    Line(String),
}

/// Trait for the log that receives Terraform's streamed output
pub trait LogSink: Send + Sync {
    /// Announce the command about to run
    fn phase(&self, title: &str);

    /// One line of child-process output, without its line ending
    fn line(&self, line: &str);
}

/// Terminal sink using the output module
pub struct TerminalSink;

impl LogSink for TerminalSink {
    fn phase(&self, title: &str) {
        crate::output::subsection(title);
    }

    fn line(&self, line: &str) {
        crate::output::passthrough(line);
    }
}

/// Sink that appends a plain-text copy of everything to a log file before
/// forwarding to another sink
pub struct FileTeeSink {
    file: Mutex<File>,
    inner: Arc<dyn LogSink>,
}

impl FileTeeSink {
    pub fn open(path: &Path, inner: Arc<dyn LogSink>) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            file: Mutex::new(file),
            inner,
        })
    }

    fn append(&self, text: &str) {
        let Ok(mut file) = self.file.lock() else {
            return;
        };

        if let Err(err) = writeln!(file, "{}", text) {
            tracing::warn!(error = %err, "failed to write to log file");
        }
    }
}

impl LogSink for FileTeeSink {
    fn phase(&self, title: &str) {
        self.append(&format!("==> {}", title));
        self.inner.phase(title);
    }

    fn line(&self, line: &str) {
        self.append(line);
        self.inner.line(line);
    }
}

/// Mock sink for testing (captures everything)
#[cfg(test)]
pub struct MockLogSink {
    messages: Mutex<Vec<LogMessage>>,
}

#[cfg(test)]
impl MockLogSink {
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
        }
    }

    /// Get all captured messages
    pub fn get_messages(&self) -> Vec<LogMessage> {
        self.messages.lock().unwrap().clone()
    }

    /// Get the streamed output lines only
    pub fn lines(&self) -> Vec<String> {
        self.get_messages()
            .into_iter()
            .filter_map(|m| match m {
                LogMessage::Line(line) => Some(line),
                LogMessage::Phase(_) => None,
            })
            .collect()
    }

    /// Get the phase titles only
    pub fn phases(&self) -> Vec<String> {
        self.get_messages()
            .into_iter()
            .filter_map(|m| match m {
                LogMessage::Phase(title) => Some(title),
                LogMessage::Line(_) => None,
            })
            .collect()
    }
}

#[cfg(test)]
impl Default for MockLogSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl LogSink for MockLogSink {
    fn phase(&self, title: &str) {
        self.messages
            .lock()
            .unwrap()
            .push(LogMessage::Phase(title.to_string()));
    }

    fn line(&self, line: &str) {
        self.messages
            .lock()
            .unwrap()
            .push(LogMessage::Line(line.to_string()));
    }
}
