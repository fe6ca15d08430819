use crate::error::CommandError;

/// How a child's output is wired up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// stdout and stderr go straight to the terminal.
    Stream,
    /// stdout is discarded, stderr still reaches the terminal.
    Quiet,
    /// stdout is captured and handed back for parsing.
    Capture,
}

/// Describes one `docker` invocation. The `args` field is the full argument
/// list after the program name (the pipeline layer is responsible for
/// assembling it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerCommand {
    pub args: Vec<String>,
    pub mode: OutputMode,
}

impl DockerCommand {
    pub fn new(args: Vec<String>, mode: OutputMode) -> Self {
        Self { args, mode }
    }

    /// Shell-quoted argument list, suitable for logs and error messages.
    pub fn display(&self) -> String {
        shell_words::join(&self.args)
    }
}

/// Outcome of a successful invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Captured stdout; empty unless the command ran in [`OutputMode::Capture`].
    pub stdout: String,
}

/// Executes `docker` invocations, one at a time, to completion.
///
/// A non-zero exit is reported as [`CommandError::CommandFailed`]; whether
/// that is fatal is the caller's decision. Implementations never retry.
pub trait CommandRunner {
    fn run(&self, cmd: &DockerCommand) -> Result<CommandOutput, CommandError>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, cmd: &DockerCommand) -> Result<CommandOutput, CommandError> {
        (**self).run(cmd)
    }
}
