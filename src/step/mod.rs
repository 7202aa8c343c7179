pub mod config;
pub mod error;
pub mod execution;

pub use config::{StepConfig, StepSettings};
pub use error::{StepError, StepResult};
pub use execution::StepExecution;
