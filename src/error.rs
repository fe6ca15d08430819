//! Error taxonomy for a single build invocation.

use thiserror::Error;

/// Failure of one `docker` invocation.
#[derive(Error, Debug)]
pub enum CommandError {
    /// The process could not be started at all.
    #[error("failed to invoke `docker {command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran and exited with a non-zero status.
    #[error("`docker {command}` exited with {}", describe_code(.code))]
    CommandFailed { command: String, code: Option<i32> },
}

impl CommandError {
    /// Exit code of the failed process, when it exited normally.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Spawn { .. } => None,
            Self::CommandFailed { code, .. } => *code,
        }
    }
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// Outcome classes of the build workflow.
///
/// The first group aborts the build; the second is reported as warnings and
/// never changes the exit status.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("building the image failed: {0}")]
    BuildFailed(#[source] CommandError),

    #[error("running the build container failed: {0}")]
    RunFailed(#[source] CommandError),

    #[error("copying build artifacts failed: {0}")]
    CopyFailed(#[source] CommandError),

    #[error("could not prepare output directory {path}: {source}")]
    OutputDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("build succeeded, but there are no files in {path}")]
    NoArtifacts { path: String },

    #[error("removing container {container} failed: {source}")]
    ContainerRemovalFailed {
        container: String,
        #[source]
        source: CommandError,
    },

    #[error("listing cached images failed: {0}")]
    ImageListingFailed(#[source] CommandError),

    #[error("removing image {image} failed: {source}")]
    ImageRemovalFailed {
        image: String,
        #[source]
        source: CommandError,
    },
}

impl BuildError {
    /// Whether this error decides the exit status of the run.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::BuildFailed(_)
            | Self::RunFailed(_)
            | Self::CopyFailed(_)
            | Self::OutputDir { .. }
            | Self::NoArtifacts { .. } => true,
            Self::ContainerRemovalFailed { .. }
            | Self::ImageListingFailed(_)
            | Self::ImageRemovalFailed { .. } => false,
        }
    }
}
