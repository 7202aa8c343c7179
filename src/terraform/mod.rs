pub mod args;
pub mod runner;
pub mod vocabulary;

pub use args::ArgumentList;
pub use runner::TerraformRunner;
pub use vocabulary::{TerraformCommand, TerraformFlag, TerraformOption};

/// Binary executed when no bin path is configured, resolved through PATH
pub const DEFAULT_BIN_PATH: &str = "terraform";
