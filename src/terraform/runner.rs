use super::{ArgumentList, TerraformCommand, TerraformFlag, TerraformOption};
use crate::context::Context;
use crate::step::{StepError, StepResult};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Builds and runs Terraform invocations against one project directory
pub struct TerraformRunner<'a> {
    ctx: &'a Context,
    bin_path: String,
    project_dir: PathBuf,
    variables_file: Option<String>,
}

impl<'a> TerraformRunner<'a> {
    pub fn new(ctx: &'a Context, bin_path: impl Into<String>, project_dir: impl Into<PathBuf>) -> Self {
        Self {
            ctx,
            bin_path: bin_path.into(),
            project_dir: project_dir.into(),
            variables_file: None,
        }
    }

    /// Pass `-var-file` to plan, apply and destroy
    pub fn with_variables_file(mut self, variables_file: Option<String>) -> Self {
        self.variables_file = variables_file;
        self
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// terraform init
    pub fn init(&self) -> StepResult<()> {
        let args = self
            .base()
            .command(TerraformCommand::Init)
            .flag(TerraformFlag::NoColor);

        self.run(&args)
    }

    /// terraform workspace select <name>
    pub fn select_workspace(&self, workspace: &str) -> StepResult<()> {
        let args = self
            .base()
            .command(TerraformCommand::Workspace)
            .command(TerraformCommand::Select)
            .arg(workspace)
            .flag(TerraformFlag::NoColor);

        self.run(&args)
    }

    /// terraform plan, saving the plan to a fresh temporary file whose path
    /// is returned
    pub fn plan(&self) -> StepResult<PathBuf> {
        let plan_file = create_plan_file()?;
        let args = self
            .base()
            .command(TerraformCommand::Plan)
            .flag(TerraformFlag::NoColor)
            .option(TerraformOption::Input, "false")
            .fragment(self.variables_file_arg())
            .option(TerraformOption::PlanOut, &plan_file);

        self.run(&args)?;
        Ok(plan_file)
    }

    /// terraform apply <plan file>
    pub fn apply(&self, plan_file: &Path) -> StepResult<()> {
        let args = self
            .base()
            .command(TerraformCommand::Apply)
            .flag(TerraformFlag::NoColor)
            .option(TerraformOption::Input, "false")
            .flag(TerraformFlag::AutoApprove)
            .fragment(self.variables_file_arg())
            .arg(plan_file);

        self.run(&args)
    }

    /// terraform destroy
    pub fn destroy(&self) -> StepResult<()> {
        let args = self
            .base()
            .command(TerraformCommand::Destroy)
            .flag(TerraformFlag::NoColor)
            .option(TerraformOption::Input, "false")
            .flag(TerraformFlag::AutoApprove)
            .fragment(self.variables_file_arg());

        self.run(&args)
    }

    fn base(&self) -> ArgumentList {
        ArgumentList::new(self.bin_path.as_str())
    }

    fn variables_file_arg(&self) -> Option<OsString> {
        self.variables_file
            .as_deref()
            .map(|file| TerraformOption::VarFile.render(file))
    }

    fn run(&self, args: &ArgumentList) -> StepResult<()> {
        let command = args.describe();
        tracing::debug!(%args, dir = %self.project_dir.display(), "running terraform");

        self.ctx.sink.phase(&args.to_string());

        let exit_code = self.ctx.launcher.launch(
            args.as_slice(),
            &self.project_dir,
            self.ctx.sink.as_ref(),
        )?;

        tracing::debug!(command = %command, exit_code, "terraform exited");

        if exit_code != 0 {
            return Err(StepError::CommandFailed { command, exit_code });
        }

        Ok(())
    }
}

/// Allocate a new, empty, uniquely named file in the temp directory.
/// The file outlives the runner; Terraform overwrites it.
fn create_plan_file() -> StepResult<PathBuf> {
    let path = tempfile::Builder::new()
        .prefix("plan")
        .tempfile()?
        .into_temp_path()
        .keep()
        .map_err(|err| StepError::Io(err.error))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{DirectoryWorkspace, MockLogSink, MockProcessLauncher};
    use std::sync::Arc;

    struct Harness {
        launcher: Arc<MockProcessLauncher>,
        sink: Arc<MockLogSink>,
        ctx: Context,
    }

    fn harness(launcher: MockProcessLauncher) -> Harness {
        let launcher = Arc::new(launcher);
        let sink = Arc::new(MockLogSink::new());
        let ctx = Context::test_with(
            launcher.clone(),
            sink.clone(),
            Arc::new(DirectoryWorkspace::new("/workspace")),
        );

        Harness {
            launcher,
            sink,
            ctx,
        }
    }

    fn args_of(launcher: &MockProcessLauncher, index: usize) -> Vec<OsString> {
        launcher.invocations()[index].args.clone()
    }

    fn out_arg(plan_file: &Path) -> OsString {
        let mut arg = OsString::from("-out=");
        arg.push(plan_file);
        arg
    }

    #[test]
    fn test_init_args() {
        let h = harness(MockProcessLauncher::new());
        let runner = TerraformRunner::new(&h.ctx, "terraform", "/workspace/infra");

        runner.init().unwrap();

        assert_eq!(args_of(&h.launcher, 0), ["terraform", "init", "-no-color"]);
        assert_eq!(
            h.launcher.invocations()[0].working_dir,
            PathBuf::from("/workspace/infra")
        );
    }

    #[test]
    fn test_select_workspace_args() {
        let h = harness(MockProcessLauncher::new());
        let runner = TerraformRunner::new(&h.ctx, "/opt/bin/terraform", "/p");

        runner.select_workspace("staging").unwrap();

        assert_eq!(
            args_of(&h.launcher, 0),
            ["/opt/bin/terraform", "workspace", "select", "staging", "-no-color"]
        );
    }

    #[test]
    fn test_plan_args_without_variables_file() {
        let h = harness(MockProcessLauncher::new());
        let runner = TerraformRunner::new(&h.ctx, "terraform", "/p");

        let plan_file = runner.plan().unwrap();

        assert_eq!(
            args_of(&h.launcher, 0),
            vec![
                OsString::from("terraform"),
                "plan".into(),
                "-no-color".into(),
                "-input=false".into(),
                out_arg(&plan_file),
            ]
        );
        assert!(plan_file.is_file());
        std::fs::remove_file(plan_file).unwrap();
    }

    #[test]
    fn test_plan_args_with_variables_file() {
        let h = harness(MockProcessLauncher::new());
        let runner = TerraformRunner::new(&h.ctx, "terraform", "/p")
            .with_variables_file(Some("vars.tfvars".to_string()));

        let plan_file = runner.plan().unwrap();

        assert_eq!(
            args_of(&h.launcher, 0),
            vec![
                OsString::from("terraform"),
                "plan".into(),
                "-no-color".into(),
                "-input=false".into(),
                "-var-file=vars.tfvars".into(),
                out_arg(&plan_file),
            ]
        );
        std::fs::remove_file(plan_file).unwrap();
    }

    #[test]
    fn test_plan_files_are_unique_and_empty() {
        let h = harness(MockProcessLauncher::new());
        let runner = TerraformRunner::new(&h.ctx, "terraform", "/p");

        let first = runner.plan().unwrap();
        let second = runner.plan().unwrap();

        assert_ne!(first, second);
        assert!(first.is_absolute());
        assert!(first
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("plan"));
        assert_eq!(std::fs::metadata(&first).unwrap().len(), 0);

        std::fs::remove_file(first).unwrap();
        std::fs::remove_file(second).unwrap();
    }

    #[test]
    fn test_apply_args() {
        let h = harness(MockProcessLauncher::new());
        let runner = TerraformRunner::new(&h.ctx, "terraform", "/p");

        runner.apply(Path::new("/tmp/plan123")).unwrap();

        assert_eq!(
            args_of(&h.launcher, 0),
            [
                "terraform",
                "apply",
                "-no-color",
                "-input=false",
                "-auto-approve",
                "/tmp/plan123"
            ]
        );
    }

    #[test]
    fn test_apply_args_with_variables_file() {
        let h = harness(MockProcessLauncher::new());
        let runner = TerraformRunner::new(&h.ctx, "terraform", "/p")
            .with_variables_file(Some("prod.tfvars".to_string()));

        runner.apply(Path::new("/tmp/plan123")).unwrap();

        assert_eq!(
            args_of(&h.launcher, 0),
            [
                "terraform",
                "apply",
                "-no-color",
                "-input=false",
                "-auto-approve",
                "-var-file=prod.tfvars",
                "/tmp/plan123"
            ]
        );
    }

    #[test]
    fn test_destroy_args() {
        let h = harness(MockProcessLauncher::new());
        let runner = TerraformRunner::new(&h.ctx, "terraform", "/p");

        runner.destroy().unwrap();

        assert_eq!(
            args_of(&h.launcher, 0),
            ["terraform", "destroy", "-no-color", "-input=false", "-auto-approve"]
        );
    }

    #[test]
    fn test_destroy_args_with_variables_file() {
        let h = harness(MockProcessLauncher::new());
        let runner = TerraformRunner::new(&h.ctx, "terraform", "/p")
            .with_variables_file(Some("prod.tfvars".to_string()));

        runner.destroy().unwrap();

        assert_eq!(
            args_of(&h.launcher, 0),
            [
                "terraform",
                "destroy",
                "-no-color",
                "-input=false",
                "-auto-approve",
                "-var-file=prod.tfvars"
            ]
        );
    }

    #[test]
    fn test_non_zero_exit_fails_with_code() {
        let h = harness(MockProcessLauncher::new().with_exit_code("workspace", 1));
        let runner = TerraformRunner::new(&h.ctx, "terraform", "/p");

        let err = runner.select_workspace("missing").unwrap_err();

        match err {
            StepError::CommandFailed { command, exit_code } => {
                assert_eq!(command, "workspace select");
                assert_eq!(exit_code, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_output_is_streamed_to_sink() {
        let h = harness(
            MockProcessLauncher::new()
                .with_output("init", "Initializing provider plugins...")
                .with_output("init", "Terraform has been successfully initialized!"),
        );
        let runner = TerraformRunner::new(&h.ctx, "terraform", "/p");

        runner.init().unwrap();

        assert_eq!(h.sink.phases(), vec!["terraform init -no-color"]);
        assert_eq!(
            h.sink.lines(),
            vec![
                "Initializing provider plugins...",
                "Terraform has been successfully initialized!"
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_apply_passes_non_utf8_plan_path_unchanged() {
        use std::os::unix::ffi::OsStrExt;

        let h = harness(MockProcessLauncher::new());
        let runner = TerraformRunner::new(&h.ctx, "terraform", "/p");
        let plan_file = Path::new(std::ffi::OsStr::from_bytes(b"/tmp/plan\xff"));

        runner.apply(plan_file).unwrap();

        let args = args_of(&h.launcher, 0);
        assert_eq!(args.last().unwrap().as_bytes(), b"/tmp/plan\xff");
    }
}
