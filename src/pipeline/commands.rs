use std::path::Path;

use crate::config::BuildConfig;
use crate::docker::{DockerCommand, OutputMode};

/// Format template for `docker images`: repository, a tab, creation time.
pub const IMAGE_LIST_FORMAT: &str = "{{.Repository}}\t{{.CreatedAt}}";

fn with_global(global_args: &[String], subcommand: &str) -> Vec<String> {
    let mut args = global_args.to_vec();
    args.push(subcommand.to_string());
    args
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Build a `docker build` command tagging the result with `tag`.
pub fn build_command(cfg: &BuildConfig, tag: &str) -> DockerCommand {
    let mut args = with_global(&cfg.docker_args, "build");
    if cfg.pull {
        args.push("--pull".into());
    }
    if cfg.no_cache {
        args.push("--no-cache".into());
    }
    for build_arg in &cfg.build_args {
        args.extend(["--build-arg".into(), build_arg.clone()]);
    }
    args.extend(cfg.docker_build_args.iter().cloned());
    args.extend([
        "-f".into(),
        path_arg(&cfg.dockerfile),
        "-t".into(),
        tag.to_string(),
        path_arg(&cfg.docker_context),
    ]);

    DockerCommand::new(args, OutputMode::Stream)
}

/// Build a `docker create` command for the named container. Run passthrough
/// arguments go here since they configure the container.
pub fn create_command(cfg: &BuildConfig, tag: &str, container: &str) -> DockerCommand {
    let mut args = with_global(&cfg.docker_args, "create");
    args.extend(["--init".into(), "--name".into(), container.to_string()]);
    args.extend(cfg.docker_run_args.iter().cloned());
    args.push(tag.to_string());

    DockerCommand::new(args, OutputMode::Stream)
}

/// Build a `docker start --attach` command. It returns once the container's
/// process has exited, with that process's exit code.
pub fn start_command(global_args: &[String], container: &str) -> DockerCommand {
    let mut args = with_global(global_args, "start");
    args.extend(["--attach".into(), container.to_string()]);

    DockerCommand::new(args, OutputMode::Stream)
}

/// Build a `docker inspect` command printing the container's working directory.
pub fn inspect_workdir_command(cfg: &BuildConfig, container: &str) -> DockerCommand {
    let mut args = with_global(&cfg.docker_args, "inspect");
    args.extend([
        "--format".into(),
        "{{.Config.WorkingDir}}".into(),
        container.to_string(),
    ]);

    DockerCommand::new(args, OutputMode::Capture)
}

/// Build a `docker cp` command copying the contents of `source_dir` (inside
/// the container) into the configured output directory.
pub fn copy_command(cfg: &BuildConfig, container: &str, source_dir: &str) -> DockerCommand {
    let mut args = with_global(&cfg.docker_args, "cp");
    args.extend(cfg.docker_cp_args.iter().cloned());
    args.extend([
        format!("{container}:{}/.", source_dir.trim_end_matches('/')),
        path_arg(&cfg.out_dir),
    ]);

    DockerCommand::new(args, OutputMode::Stream)
}

/// Build a `docker rm` command for the transient container.
pub fn remove_container_command(global_args: &[String], container: &str) -> DockerCommand {
    let mut args = with_global(global_args, "rm");
    args.extend(["--volumes".into(), "--force".into(), container.to_string()]);

    DockerCommand::new(args, OutputMode::Quiet)
}

/// Build a `docker images` command listing repositories named `{prefix}-*`.
pub fn list_images_command(global_args: &[String], prefix: &str) -> DockerCommand {
    let mut args = with_global(global_args, "images");
    args.extend([
        "--filter".into(),
        format!("reference={prefix}-*"),
        "--format".into(),
        IMAGE_LIST_FORMAT.into(),
    ]);

    DockerCommand::new(args, OutputMode::Capture)
}

/// Build a `docker rmi` command.
pub fn remove_image_command(global_args: &[String], image: &str) -> DockerCommand {
    let mut args = with_global(global_args, "rmi");
    args.push(image.to_string());

    DockerCommand::new(args, OutputMode::Quiet)
}

/// Where the artifacts live inside the container. A relative `dist_dir` is
/// taken relative to the container's working directory.
pub fn container_source_dir(dist_dir: &str, container_workdir: &str) -> String {
    if dist_dir.starts_with('/') {
        return dist_dir.to_string();
    }
    let base = container_workdir.trim_end_matches('/');
    let rel = dist_dir.trim_start_matches("./");
    if rel.is_empty() || rel == "." {
        return if base.is_empty() { "/".into() } else { base.into() };
    }
    format!("{base}/{rel}")
}
