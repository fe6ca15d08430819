//! Command-line surface.

use std::path::PathBuf;

use clap::Parser;

/// Build project with Dockerfile.
///
/// Builds a Docker image, runs a container from it, copies the artifacts out
/// of the container, then removes the container and old cached images.
#[derive(Parser, Debug, Clone)]
#[command(name = "docker-build")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory inside the container which contains build artifacts
    #[arg(long, value_name = "DIR")]
    pub dist_dir: Option<String>,

    /// Output directory into which build artifacts are copied, relative to
    /// --workdir; defaults to --dist-dir
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Working directory in which docker is executed
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub workdir: PathBuf,

    /// Prefix used for image names ([a-zA-Z0-9-./] characters allowed);
    /// defaults to the name of the working directory
    #[arg(long = "image-name", value_name = "PREFIX")]
    pub image_name: Option<String>,

    /// Number of the most recent images to keep in cache [default: 5]
    #[arg(long, value_name = "N")]
    pub num_cached_images: Option<usize>,

    /// Disable automatic pull of the Docker base image
    #[arg(long)]
    pub no_pull: bool,

    /// Build the image without using the layer cache
    #[arg(long)]
    pub no_cache: bool,

    /// Build arg appended to docker build (repeatable)
    #[arg(long = "build-arg", value_name = "KEY=VALUE")]
    pub build_args: Vec<String>,

    /// Path to the Dockerfile, relative to --workdir [default: Dockerfile]
    #[arg(long = "file", short = 'f', value_name = "PATH")]
    pub dockerfile: Option<PathBuf>,

    /// Context of docker build, relative to --workdir [default: .]
    #[arg(long, value_name = "PATH")]
    pub docker_context: Option<PathBuf>,

    /// Argument passed to every docker call, e.g. --docker="--host=127.0.0.1"
    #[arg(long = "docker", value_name = "ARG", allow_hyphen_values = true)]
    pub docker_args: Vec<String>,

    /// Argument passed to docker build, e.g. --docker-build="--network=host"
    #[arg(long = "docker-build", value_name = "ARG", allow_hyphen_values = true)]
    pub docker_build_args: Vec<String>,

    /// Argument passed to docker run, e.g. --docker-run="--env=CI=1"
    #[arg(long = "docker-run", value_name = "ARG", allow_hyphen_values = true)]
    pub docker_run_args: Vec<String>,

    /// Argument passed to docker cp, e.g. --docker-cp="--archive"
    #[arg(long = "docker-cp", value_name = "ARG", allow_hyphen_values = true)]
    pub docker_cp_args: Vec<String>,

    /// Config file [default: .docker-build.yaml in --workdir, if present]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write a JSON report of the run to this path
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}
