//! Configuration file loading for careline
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `CARELINE_` environment variables (`__` separates sections)
//! 2. `--config <path>` specified file
//! 3. Project root: `./careline.toml` or `./.careline.toml`
//! 4. Global: `$XDG_CONFIG_HOME/careline/config.toml` (or `~/.config/careline/config.toml`)
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, DEFAULT_BASE_URL, FileBackendConfig, FileConfig, FileLoggingConfig,
    FileOutputConfig, FilePolicyConfig, FilePollingConfig,
};
pub use loader::ConfigLoader;
