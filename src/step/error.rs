use crate::terraform::TerraformCommand;
use std::fmt;

/// Error types for a pipeline step execution
#[derive(Debug)]
pub enum StepError {
    /// Command string did not match any known Terraform command
    UnrecognizedCommand(String),

    /// Known command that cannot be requested as a step operation
    UnsupportedCommand(TerraformCommand),

    /// Required setting absent from both the command line and the step file
    MissingSetting(&'static str),

    /// Step file parsing error
    ConfigParse(String),

    /// Terraform exited with a non-zero code
    CommandFailed { command: String, exit_code: i32 },

    /// A step phase failed; the whole execution was aborted
    Aborted(String),

    /// General I/O error
    Io(std::io::Error),
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepError::UnrecognizedCommand(command) => {
                write!(f, "{} is not a valid command", command)
            }
            StepError::UnsupportedCommand(command) => {
                write!(f, "Unsupported command: {}", command)
            }
            StepError::MissingSetting(name) => {
                write!(f, "Missing required setting: {}", name)
            }
            StepError::ConfigParse(msg) => {
                write!(f, "Failed to parse step file: {}", msg)
            }
            StepError::CommandFailed { command, exit_code } => {
                write!(
                    f,
                    "Terraform command '{}' failed with exit code {}",
                    command, exit_code
                )
            }
            StepError::Aborted(msg) => write!(f, "{}", msg),
            StepError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for StepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StepError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StepError {
    fn from(err: std::io::Error) -> Self {
        StepError::Io(err)
    }
}

impl From<serde_yaml::Error> for StepError {
    fn from(err: serde_yaml::Error) -> Self {
        StepError::ConfigParse(err.to_string())
    }
}

/// Result type for step operations
pub type StepResult<T> = Result<T, StepError>;
