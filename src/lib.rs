//! Build a project inside a disposable Docker image, copy the artifacts to
//! the host, then clean up the container and old cached images.

pub mod cli;
pub mod config;
pub mod docker;
pub mod error;
pub mod pipeline;
pub mod tag;
