use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Name of the config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".docker-build.yaml";

/// Defaults read from a YAML file. Keys mirror the command-line flags.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub dist_dir: Option<String>,
    pub out_dir: Option<String>,
    pub image_name: Option<String>,
    pub num_cached_images: Option<usize>,
    pub no_pull: Option<bool>,
    pub no_cache: Option<bool>,
    pub build_args: Vec<String>,
    pub dockerfile: Option<String>,
    pub docker_context: Option<String>,
    pub docker_args: Vec<String>,
    pub docker_build_args: Vec<String>,
    pub docker_run_args: Vec<String>,
    pub docker_cp_args: Vec<String>,
}

impl FileConfig {
    /// Load `.docker-build.yaml` from the given directory, if it exists.
    pub fn load(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(None);
        }
        Self::load_file(&path).map(Some)
    }

    /// Load an explicitly named config file; a missing file is an error.
    pub fn load_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&contents)
            .with_context(|| format!("invalid config file {}", path.display()))
    }
}
