use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::{debug, info, warn};

use crate::error::CommandError;

use super::types::{CommandOutput, CommandRunner, DockerCommand, OutputMode};

const DOCKER_PROGRAM: &str = "docker";

/// Runs commands against the real `docker` executable.
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: String,
    work_dir: PathBuf,
}

impl DockerCli {
    /// Every command is spawned with `work_dir` as its current directory.
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: DOCKER_PROGRAM.to_string(),
            work_dir: work_dir.into(),
        }
    }

    /// Use a different executable (e.g. a `docker`-compatible wrapper).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

impl CommandRunner for DockerCli {
    fn run(&self, cmd: &DockerCommand) -> Result<CommandOutput, CommandError> {
        let line = cmd.display();
        info!("{} {}", self.program, line);

        let mut command = Command::new(&self.program);
        command.args(&cmd.args).current_dir(&self.work_dir);

        let spawn_err = |source| CommandError::Spawn {
            command: line.clone(),
            source,
        };

        let (status, stdout) = match cmd.mode {
            OutputMode::Stream => {
                let status = command
                    .stdin(Stdio::null())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit())
                    .status()
                    .map_err(spawn_err)?;
                (status, String::new())
            }
            OutputMode::Quiet => {
                let status = command
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::inherit())
                    .status()
                    .map_err(spawn_err)?;
                (status, String::new())
            }
            OutputMode::Capture => {
                let output = command
                    .stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped())
                    .output()
                    .map_err(spawn_err)?;
                let stderr = String::from_utf8_lossy(&output.stderr);
                if !output.status.success() && !stderr.trim().is_empty() {
                    warn!("{}", stderr.trim_end());
                }
                (
                    output.status,
                    String::from_utf8_lossy(&output.stdout).into_owned(),
                )
            }
        };

        debug!(%status, "docker {} finished", line);

        if !status.success() {
            return Err(CommandError::CommandFailed {
                command: line,
                code: status.code(),
            });
        }

        Ok(CommandOutput { stdout })
    }
}
