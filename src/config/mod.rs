mod loader;
mod resolve;
mod types;

pub use loader::{CONFIG_FILE_NAME, FileConfig};
pub use resolve::{resolve, split_passthrough};
pub use types::{BuildConfig, ConfigError, DEFAULT_NUM_CACHED_IMAGES};
