use super::error::{StepError, StepResult};
use crate::terraform::DEFAULT_BIN_PATH;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Step settings as supplied by one source (command line or step file).
/// Every field is optional; sources are layered with [`StepSettings::or`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepSettings {
    pub project_path: Option<PathBuf>,
    pub command: Option<String>,
    pub workspace: Option<String>,
    pub variables_file: Option<String>,
    pub plan_file: Option<PathBuf>,
    pub bin_path: Option<String>,
    pub force_init: Option<bool>,
    pub log_file: Option<PathBuf>,
}

impl StepSettings {
    /// Load settings from a YAML step file
    pub fn from_file(path: &Path) -> StepResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> StepResult<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        Ok(serde_yaml::from_str(contents)?)
    }

    /// Keep values set here, take the rest from `fallback`
    pub fn or(self, fallback: StepSettings) -> StepSettings {
        StepSettings {
            project_path: self.project_path.or(fallback.project_path),
            command: self.command.or(fallback.command),
            workspace: self.workspace.or(fallback.workspace),
            variables_file: self.variables_file.or(fallback.variables_file),
            plan_file: self.plan_file.or(fallback.plan_file),
            bin_path: self.bin_path.or(fallback.bin_path),
            force_init: self.force_init.or(fallback.force_init),
            log_file: self.log_file.or(fallback.log_file),
        }
    }
}

/// Fully resolved request for one step execution
#[derive(Debug, Clone, PartialEq)]
pub struct StepConfig {
    /// Directory containing the Terraform configuration
    pub project_path: PathBuf,
    /// One of plan, apply or destroy
    pub command: String,
    /// Workspace selected before running the command
    pub workspace: Option<String>,
    /// Passed as `-var-file` to plan, apply and destroy
    pub variables_file: Option<String>,
    /// Existing plan to apply instead of generating one
    pub plan_file: Option<PathBuf>,
    pub bin_path: String,
    pub force_init: bool,
    pub log_file: Option<PathBuf>,
}

impl StepConfig {
    pub fn new(project_path: impl Into<PathBuf>, command: impl Into<String>) -> Self {
        Self {
            project_path: project_path.into(),
            command: command.into(),
            workspace: None,
            variables_file: None,
            plan_file: None,
            bin_path: DEFAULT_BIN_PATH.to_string(),
            force_init: true,
            log_file: None,
        }
    }
}

impl TryFrom<StepSettings> for StepConfig {
    type Error = StepError;

    fn try_from(settings: StepSettings) -> Result<Self, Self::Error> {
        let project_path = settings
            .project_path
            .filter(|path| !path.as_os_str().is_empty())
            .ok_or(StepError::MissingSetting("project_path"))?;
        let command = non_empty(settings.command).ok_or(StepError::MissingSetting("command"))?;

        Ok(StepConfig {
            workspace: non_empty(settings.workspace),
            variables_file: non_empty(settings.variables_file),
            plan_file: settings
                .plan_file
                .filter(|path| !path.as_os_str().is_empty()),
            bin_path: non_empty(settings.bin_path).unwrap_or_else(|| DEFAULT_BIN_PATH.to_string()),
            force_init: settings.force_init.unwrap_or(true),
            log_file: settings.log_file,
            ..StepConfig::new(project_path, command)
        })
    }
}

/// Blank values from forms and step files count as unset
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
