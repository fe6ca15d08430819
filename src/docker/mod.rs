// Docker invocation: argument vectors in, exit status and captured output back.

pub mod engine;
pub mod run;
pub mod types;

pub use engine::ensure_available;
pub use run::DockerCli;
pub use types::{CommandOutput, CommandRunner, DockerCommand, OutputMode};
