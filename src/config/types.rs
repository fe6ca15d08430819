use std::path::PathBuf;

use thiserror::Error;

/// Cache size used when neither the command line nor the config file set one.
pub const DEFAULT_NUM_CACHED_IMAGES: usize = 5;

/// Fully resolved settings for one invocation. Built once, never mutated.
///
/// Host paths are absolute; `dist_dir` is a path inside the container and is
/// kept as written. Passthrough lists are already split into argv entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    pub work_dir: PathBuf,
    pub dockerfile: PathBuf,
    pub docker_context: PathBuf,
    pub dist_dir: String,
    pub out_dir: PathBuf,
    pub image_prefix: String,
    pub num_cached_images: usize,
    pub pull: bool,
    pub no_cache: bool,
    pub build_args: Vec<String>,
    pub docker_args: Vec<String>,
    pub docker_build_args: Vec<String>,
    pub docker_run_args: Vec<String>,
    pub docker_cp_args: Vec<String>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("working directory {path} is not accessible: {reason}")]
    WorkDir { path: String, reason: String },

    #[error("--dist-dir is required and must not be empty")]
    MissingDistDir,

    #[error("invalid image name {0:?}: only [a-zA-Z0-9-./] characters are allowed")]
    InvalidImageName(String),

    #[error("cannot derive an image name from working directory {0}; pass --image-name")]
    NoDefaultImageName(String),

    #[error("invalid {list} argument {value:?}: expected --flag or --flag=value")]
    InvalidPassthrough { list: &'static str, value: String },

    #[error("invalid build arg {0:?}: expected KEY=VALUE")]
    InvalidBuildArg(String),

    #[error("output directory {out_dir} would contain the working directory; refusing to clear it")]
    UnsafeOutDir { out_dir: String },
}
