//! Configuration file loading for staged-quorum
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `--config <path>` specified file
//! 2. Project root: `./staged.toml` or `./.staged.toml`
//! 3. XDG config: `$XDG_CONFIG_HOME/staged-quorum/config.toml`
//! 4. Fallback: `~/.config/staged-quorum/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    FileBodyConfig, FileConfig, FileCoordinatorConfig, FileOutputConfig, FileOutputFormat,
    FilePermissionsConfig, FileStageConfig,
};
pub use loader::ConfigLoader;
