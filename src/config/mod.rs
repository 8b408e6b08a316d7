//! Configuration loading for `.pyanalyzer.toml`.
//!
//! The configuration value is passed explicitly into every pipeline stage;
//! nothing here is global.

pub mod core;
pub mod loader;

pub use self::core::{
    AnalyzerConfig, DedupConfig, DedupMode, ExcludeConfig, FailOn, FixConfig, OutputConfig,
    ToolSettings, ToolsConfig,
};
pub use loader::{
    default_config_toml, find_config_file, load_config, load_config_from, CONFIG_FILE_NAME,
};
