use crate::step::StepError;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::str::FromStr;

/// Subcommand tokens understood by the Terraform binary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerraformCommand {
    Init,
    Plan,
    Apply,
    Destroy,
    Workspace,
    Select,
}

impl TerraformCommand {
    pub const ALL: [TerraformCommand; 6] = [
        TerraformCommand::Init,
        TerraformCommand::Plan,
        TerraformCommand::Apply,
        TerraformCommand::Destroy,
        TerraformCommand::Workspace,
        TerraformCommand::Select,
    ];

    /// Commands a step may request directly
    pub const SUPPORTED: [TerraformCommand; 3] = [
        TerraformCommand::Plan,
        TerraformCommand::Apply,
        TerraformCommand::Destroy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TerraformCommand::Init => "init",
            TerraformCommand::Plan => "plan",
            TerraformCommand::Apply => "apply",
            TerraformCommand::Destroy => "destroy",
            TerraformCommand::Workspace => "workspace",
            TerraformCommand::Select => "select",
        }
    }

    pub fn is_supported(&self) -> bool {
        Self::SUPPORTED.contains(self)
    }
}

impl fmt::Display for TerraformCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TerraformCommand {
    type Err = StepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|command| command.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| StepError::UnrecognizedCommand(s.to_string()))
    }
}

/// Boolean flags, rendered as a single literal token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerraformFlag {
    AutoApprove,
    NoColor,
}

impl fmt::Display for TerraformFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerraformFlag::AutoApprove => f.write_str("-auto-approve"),
            TerraformFlag::NoColor => f.write_str("-no-color"),
        }
    }
}

/// Keyed options, rendered as `-name=value`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerraformOption {
    Input,
    PlanOut,
    VarFile,
}

impl TerraformOption {
    pub fn name(&self) -> &'static str {
        match self {
            TerraformOption::Input => "input",
            TerraformOption::PlanOut => "out",
            TerraformOption::VarFile => "var-file",
        }
    }

    /// Render the option with its value as one argument
    pub fn render(&self, value: impl AsRef<OsStr>) -> OsString {
        let mut rendered = OsString::from(format!("-{}=", self.name()));
        rendered.push(value);
        rendered
    }
}

impl fmt::Display for TerraformOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
