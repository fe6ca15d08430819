use anyhow::{Context, Result};

use super::types::{CommandRunner, DockerCommand, OutputMode};

/// Verify that the Docker daemon is reachable with the given global args
/// (e.g. `--host`). Returns the server version.
pub fn ensure_available(runner: &dyn CommandRunner, global_args: &[String]) -> Result<String> {
    let mut args = global_args.to_vec();
    args.extend([
        "version".to_string(),
        "--format".to_string(),
        "{{.Server.Version}}".to_string(),
    ]);

    let output = runner
        .run(&DockerCommand::new(args, OutputMode::Capture))
        .context("docker daemon is not reachable; is it installed and running?")?;

    Ok(output.stdout.trim().to_string())
}
