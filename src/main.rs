mod context;
mod output;
mod step;
mod terraform;
mod traits;

use anyhow::{Context as _, Result};
use clap::{Parser, ValueEnum};
use context::Context;
use std::path::PathBuf;
use step::{StepConfig, StepExecution, StepSettings};
use terraform::TerraformCommand;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tfstep")]
#[command(about = "Run Terraform plan, apply or destroy as a pipeline step", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory containing the Terraform configuration, relative to the workspace root
    #[arg(short, long, env = "TFSTEP_PROJECT_PATH")]
    project_path: Option<PathBuf>,

    /// Operation to run: plan, apply or destroy
    #[arg(short, long, env = "TFSTEP_COMMAND")]
    command: Option<String>,

    /// Terraform workspace to select before running the command
    #[arg(short, long, env = "TFSTEP_WORKSPACE")]
    workspace: Option<String>,

    /// Variables file passed to plan, apply and destroy
    #[arg(long, env = "TFSTEP_VAR_FILE")]
    var_file: Option<String>,

    /// Existing plan file to use instead of running plan
    #[arg(long, env = "TFSTEP_PLAN_FILE")]
    plan_file: Option<PathBuf>,

    /// Terraform binary to execute (defaults to `terraform` on PATH)
    #[arg(long, env = "TFSTEP_BIN_PATH")]
    bin_path: Option<String>,

    /// Run `terraform init` first (the default; overrides a step file's `force_init: false`)
    #[arg(long, overrides_with = "no_init")]
    init: bool,

    /// Skip `terraform init`
    #[arg(long, overrides_with = "init")]
    no_init: bool,

    /// YAML step file providing defaults for the options above
    #[arg(long, env = "TFSTEP_CONFIG")]
    config: Option<PathBuf>,

    /// Directory relative project paths are resolved against (defaults to the current directory)
    #[arg(long, env = "TFSTEP_WORKSPACE_ROOT")]
    workspace_root: Option<PathBuf>,

    /// Also append Terraform output to this file
    #[arg(long, env = "TFSTEP_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Format of the result printed on stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    fn settings(&self) -> StepSettings {
        StepSettings {
            project_path: self.project_path.clone(),
            command: self.command.clone(),
            workspace: self.workspace.clone(),
            variables_file: self.var_file.clone(),
            plan_file: self.plan_file.clone(),
            bin_path: self.bin_path.clone(),
            force_init: self.force_init(),
            log_file: self.log_file.clone(),
        }
    }

    /// The last of `--init` / `--no-init` wins; neither defers to the step file
    fn force_init(&self) -> Option<bool> {
        match (self.init, self.no_init) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    /// Command line values layered over the step file, if any
    fn step_config(&self) -> Result<StepConfig> {
        let file_settings = match &self.config {
            Some(path) => StepSettings::from_file(path)
                .with_context(|| format!("Failed to load step file: {:?}", path))?,
            None => StepSettings::default(),
        };

        Ok(StepConfig::try_from(self.settings().or(file_settings))?)
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "tfstep=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// A validated request, ready to start processes
struct PreparedStep {
    config: StepConfig,
    ctx: Context,
    command: TerraformCommand,
}

/// Why a run stopped short
enum Failure {
    /// Rejected before any process was started
    Rejected(anyhow::Error),
    /// Terraform or I/O failure once the step was underway
    Failed(anyhow::Error),
}

impl Failure {
    fn exit_code(&self) -> i32 {
        match self {
            Failure::Rejected(_) => 2,
            Failure::Failed(_) => 1,
        }
    }

    fn error(&self) -> &anyhow::Error {
        match self {
            Failure::Rejected(err) | Failure::Failed(err) => err,
        }
    }
}

fn prepare(cli: &Cli) -> Result<PreparedStep> {
    let config = cli.step_config()?;
    let ctx = Context::new(cli.workspace_root.clone(), config.log_file.as_deref())?;
    let command = StepExecution::new(&ctx, &config).command()?;

    Ok(PreparedStep {
        config,
        ctx,
        command,
    })
}

fn execute(cli: &Cli, step: &PreparedStep) -> Result<()> {
    let PreparedStep {
        config,
        ctx,
        command,
    } = step;

    output::section(&format!("terraform {}", command));
    output::key_value("Project", &ctx.workspace.resolve(&config.project_path).display().to_string());
    output::key_value("Binary", &config.bin_path);

    if let Some(workspace) = &config.workspace {
        output::key_value("Workspace", workspace);
    }

    if let Some(variables_file) = &config.variables_file {
        output::key_value("Variables file", variables_file);
    }

    let outcome = StepExecution::new(ctx, config).run()?;

    output::success(&format!("terraform {} completed", command));

    match cli.output {
        OutputFormat::Text => output::result(&outcome.to_string()),
        OutputFormat::Json => output::result(&outcome.to_json(*command).to_string()),
    }

    Ok(())
}

fn run(cli: &Cli) -> std::result::Result<(), Failure> {
    let step = prepare(cli).map_err(Failure::Rejected)?;
    execute(cli, &step).map_err(Failure::Failed)
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(failure) = run(&cli) {
        output::error(&format!("{:#}", failure.error()));
        std::process::exit(failure.exit_code());
    }
}
