use super::vocabulary::{TerraformCommand, TerraformFlag, TerraformOption};
use std::ffi::{OsStr, OsString};
use std::fmt;

/// Ordered argument vector for one Terraform invocation, program first.
///
/// Arguments are kept as `OsString` so paths reach the process byte for byte.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentList {
    args: Vec<OsString>,
    commands: Vec<TerraformCommand>,
}

impl ArgumentList {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            args: vec![program.into()],
            commands: Vec::new(),
        }
    }

    pub fn command(mut self, command: TerraformCommand) -> Self {
        self.args.push(command.as_str().into());
        self.commands.push(command);
        self
    }

    pub fn flag(mut self, flag: TerraformFlag) -> Self {
        self.args.push(flag.to_string().into());
        self
    }

    pub fn option(mut self, option: TerraformOption, value: impl AsRef<OsStr>) -> Self {
        self.args.push(option.render(value));
        self
    }

    /// Append a pre-rendered fragment when present
    pub fn fragment(mut self, fragment: Option<OsString>) -> Self {
        self.args.extend(fragment);
        self
    }

    /// Append a positional argument
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// The subcommand tokens, e.g. `workspace select`
    pub fn describe(&self) -> String {
        self.commands
            .iter()
            .map(TerraformCommand::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn as_slice(&self) -> &[OsString] {
        &self.args
    }
}

impl fmt::Display for ArgumentList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<_> = self.args.iter().map(|arg| arg.to_string_lossy()).collect();
        f.write_str(&rendered.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_in_append_order() {
        let args = ArgumentList::new("terraform")
            .command(TerraformCommand::Workspace)
            .command(TerraformCommand::Select)
            .arg("staging")
            .flag(TerraformFlag::NoColor);

        assert_eq!(
            args.as_slice(),
            ["terraform", "workspace", "select", "staging", "-no-color"]
        );
        assert_eq!(args.describe(), "workspace select");
        assert_eq!(args.to_string(), "terraform workspace select staging -no-color");
    }

    #[test]
    fn test_absent_fragment_is_skipped() {
        let args = ArgumentList::new("tofu")
            .command(TerraformCommand::Destroy)
            .fragment(None)
            .option(TerraformOption::Input, "false")
            .fragment(Some("-var-file=a.tfvars".into()));

        assert_eq!(
            args.as_slice(),
            ["tofu", "destroy", "-input=false", "-var-file=a.tfvars"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_values_are_kept_verbatim() {
        use std::os::unix::ffi::OsStrExt;

        let path = OsStr::from_bytes(b"/tmp/plan\xff");
        let args = ArgumentList::new("terraform")
            .option(TerraformOption::PlanOut, path)
            .arg(path);

        assert_eq!(args.as_slice()[1].as_bytes(), b"-out=/tmp/plan\xff");
        assert_eq!(args.as_slice()[2].as_os_str(), path);
        assert_eq!(args.to_string(), "terraform -out=/tmp/plan\u{FFFD} /tmp/plan\u{FFFD}");
    }
}
