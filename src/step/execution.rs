use super::config::StepConfig;
use super::error::{StepError, StepResult};
use crate::context::Context;
use crate::terraform::{TerraformCommand, TerraformRunner};
use serde_json::{Value, json};
use std::fmt;
use std::path::PathBuf;

/// What a successful step execution hands back to the pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// destroy finished
    Destroyed(bool),
    /// Plan file produced by plan, or the plan that apply consumed
    PlanFile(PathBuf),
}

impl StepOutcome {
    pub fn to_json(&self, command: TerraformCommand) -> Value {
        let result = match self {
            StepOutcome::Destroyed(done) => json!(done),
            StepOutcome::PlanFile(path) => json!(path.display().to_string()),
        };

        json!({ "command": command.as_str(), "result": result })
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOutcome::Destroyed(done) => write!(f, "{}", done),
            StepOutcome::PlanFile(path) => write!(f, "{}", path.display()),
        }
    }
}

/// One run of the pipeline step: validates the request, then drives the
/// runner through init, workspace selection and the requested command
pub struct StepExecution<'a> {
    ctx: &'a Context,
    config: &'a StepConfig,
}

impl<'a> StepExecution<'a> {
    pub fn new(ctx: &'a Context, config: &'a StepConfig) -> Self {
        Self { ctx, config }
    }

    /// Resolve the requested command, rejecting anything but plan, apply
    /// and destroy before a process is started
    pub fn command(&self) -> StepResult<TerraformCommand> {
        let command: TerraformCommand = self.config.command.parse()?;

        if !command.is_supported() {
            return Err(StepError::UnsupportedCommand(command));
        }

        Ok(command)
    }

    pub fn run(&self) -> StepResult<StepOutcome> {
        let command = self.command()?;
        let project_dir = self.ctx.workspace.resolve(&self.config.project_path);

        let runner = TerraformRunner::new(self.ctx, self.config.bin_path.as_str(), project_dir)
            .with_variables_file(self.config.variables_file.clone());

        self.execute(command, &runner)
            .map_err(|err| StepError::Aborted(err.to_string()))
    }

    fn execute(&self, command: TerraformCommand, runner: &TerraformRunner) -> StepResult<StepOutcome> {
        if self.config.force_init {
            tracing::debug!(dir = %runner.project_dir().display(), "Initializing Terraform");
            runner.init()?;
        }

        if let Some(workspace) = &self.config.workspace {
            tracing::debug!(workspace = %workspace, "Selecting workspace");
            runner.select_workspace(workspace)?;
        }

        if command == TerraformCommand::Destroy {
            tracing::debug!("Destroying existing infrastructure");
            runner.destroy()?;
            return Ok(StepOutcome::Destroyed(true));
        }

        let plan_file = match &self.config.plan_file {
            Some(plan_file) => plan_file.clone(),
            None => {
                tracing::debug!("Planning changes");
                runner.plan()?
            }
        };
        tracing::debug!(plan_file = %plan_file.display(), "Plan summary saved");

        if command == TerraformCommand::Apply {
            tracing::debug!("Applying changes to infrastructure");
            runner.apply(&plan_file)?;
        }

        Ok(StepOutcome::PlanFile(plan_file))
    }
}
