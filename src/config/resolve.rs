use std::path::{Component, Path, PathBuf};

use crate::cli::Cli;

use super::loader::FileConfig;
use super::types::{BuildConfig, ConfigError, DEFAULT_NUM_CACHED_IMAGES};

/// Merge command-line flags over the config file and resolve every path
/// against the working directory.
///
/// Scalars set on the command line win; lists are concatenated with the
/// file's entries first.
pub fn resolve(cli: &Cli, file: Option<&FileConfig>) -> Result<BuildConfig, ConfigError> {
    let defaults = FileConfig::default();
    let file = file.unwrap_or(&defaults);

    let work_dir = resolve_work_dir(&cli.workdir)?;

    let dist_dir = cli
        .dist_dir
        .clone()
        .or_else(|| file.dist_dir.clone())
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .ok_or(ConfigError::MissingDistDir)?;

    // A dist-dir like `/app/dist` must not default to the host's `/app/dist`.
    let out_dir = cli
        .out_dir
        .clone()
        .or_else(|| file.out_dir.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(dist_dir.trim_start_matches('/')));
    let out_dir = normalize(&work_dir.join(out_dir));
    if work_dir.starts_with(&out_dir) {
        return Err(ConfigError::UnsafeOutDir {
            out_dir: out_dir.display().to_string(),
        });
    }

    let image_prefix = match cli.image_name.clone().or_else(|| file.image_name.clone()) {
        Some(name) => name,
        None => default_image_prefix(&work_dir)?,
    };
    validate_image_prefix(&image_prefix)?;

    let dockerfile = cli
        .dockerfile
        .clone()
        .or_else(|| file.dockerfile.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("Dockerfile"));
    let docker_context = cli
        .docker_context
        .clone()
        .or_else(|| file.docker_context.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));

    let build_args = concat(&file.build_args, &cli.build_args)
        .into_iter()
        .filter(|arg| !arg.is_empty())
        .map(|arg| match arg.split_once('=') {
            Some((key, _)) if !key.is_empty() => Ok(arg),
            _ => Err(ConfigError::InvalidBuildArg(arg)),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(BuildConfig {
        dockerfile: normalize(&work_dir.join(dockerfile)),
        docker_context: normalize(&work_dir.join(docker_context)),
        dist_dir,
        out_dir,
        image_prefix,
        num_cached_images: cli
            .num_cached_images
            .or(file.num_cached_images)
            .unwrap_or(DEFAULT_NUM_CACHED_IMAGES),
        pull: !(cli.no_pull || file.no_pull.unwrap_or(false)),
        no_cache: cli.no_cache || file.no_cache.unwrap_or(false),
        build_args,
        docker_args: split_passthrough("--docker", &concat(&file.docker_args, &cli.docker_args))?,
        docker_build_args: split_passthrough(
            "--docker-build",
            &concat(&file.docker_build_args, &cli.docker_build_args),
        )?,
        docker_run_args: split_passthrough(
            "--docker-run",
            &concat(&file.docker_run_args, &cli.docker_run_args),
        )?,
        docker_cp_args: split_passthrough(
            "--docker-cp",
            &concat(&file.docker_cp_args, &cli.docker_cp_args),
        )?,
        work_dir,
    })
}

/// Turn `--flag=value` entries into separate argv entries.
///
/// Empty entries are dropped and a bare `--flag` is kept as is. The flags
/// themselves are not interpreted; they belong to docker.
pub fn split_passthrough(list: &'static str, entries: &[String]) -> Result<Vec<String>, ConfigError> {
    let mut args = Vec::with_capacity(entries.len() * 2);
    for entry in entries {
        if entry.is_empty() {
            continue;
        }
        if !entry.starts_with('-') {
            return Err(ConfigError::InvalidPassthrough {
                list,
                value: entry.clone(),
            });
        }
        match entry.split_once('=') {
            Some((flag, value)) => {
                args.push(flag.to_string());
                args.push(value.to_string());
            }
            None => args.push(entry.clone()),
        }
    }
    Ok(args)
}

fn resolve_work_dir(path: &Path) -> Result<PathBuf, ConfigError> {
    let path = if path.as_os_str().is_empty() {
        Path::new(".")
    } else {
        path
    };
    let err = |reason: String| ConfigError::WorkDir {
        path: path.display().to_string(),
        reason,
    };
    let dir = path.canonicalize().map_err(|e| err(e.to_string()))?;
    if !dir.is_dir() {
        return Err(err("not a directory".to_string()));
    }
    Ok(dir)
}

fn default_image_prefix(work_dir: &Path) -> Result<String, ConfigError> {
    work_dir
        .file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ConfigError::NoDefaultImageName(work_dir.display().to_string()))
}

fn validate_image_prefix(prefix: &str) -> Result<(), ConfigError> {
    let valid = !prefix.is_empty()
        && prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '/'));
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidImageName(prefix.to_string()))
    }
}

fn concat(first: &[String], second: &[String]) -> Vec<String> {
    first.iter().chain(second).cloned().collect()
}

/// Lexically clean `.` and `..` out of an absolute path. The path may not
/// exist yet, so the filesystem is not consulted.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
