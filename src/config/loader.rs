use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::core::AnalyzerConfig;
use crate::core::ConfigError;

pub const CONFIG_FILE_NAME: &str = ".pyanalyzer.toml";

const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Pure function to read config file contents
pub(crate) fn read_config_file(path: &Path) -> Result<String, std::io::Error> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Parse and validate config from a TOML string
pub fn parse_and_validate_config(contents: &str, path: &Path) -> Result<AnalyzerConfig, ConfigError> {
    let config = toml::from_str::<AnalyzerConfig>(contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

/// Load an explicitly requested config file. Any failure is an error.
pub fn load_config_from(path: &Path) -> Result<AnalyzerConfig, ConfigError> {
    let contents = read_config_file(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_and_validate_config(&contents, path)?;
    tracing::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Try loading a discovered config; problems are logged, not fatal
pub(crate) fn try_load_config_from_path(config_path: &Path) -> Option<AnalyzerConfig> {
    let contents = match read_config_file(config_path) {
        Ok(contents) => contents,
        Err(e) => {
            handle_read_error(config_path, &e);
            return None;
        }
    };

    match parse_and_validate_config(&contents, config_path) {
        Ok(config) => {
            tracing::debug!("Loaded config from {}", config_path.display());
            Some(config)
        }
        Err(e) => {
            tracing::warn!("{}. Using defaults.", e);
            None
        }
    }
}

/// Only log actual errors, not "file not found"
pub(crate) fn handle_read_error(config_path: &Path, error: &std::io::Error) {
    if error.kind() != std::io::ErrorKind::NotFound {
        tracing::warn!(
            "Failed to read config file {}: {}",
            config_path.display(),
            error
        );
    }
}

/// Directory ancestors of `start`, nearest first, up to `max_depth` entries
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Nearest `.pyanalyzer.toml` at or above `start`, if any
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    directory_ancestors(start.to_path_buf(), MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|path| path.is_file())
}

/// Load the nearest config file at or above `start`.
///
/// Only the nearest file is considered: if it cannot be read or is invalid,
/// the defaults are used rather than a config further up the tree.
pub fn load_config(start: &Path) -> AnalyzerConfig {
    let Some(path) = find_config_file(start) else {
        tracing::debug!(
            "No config found after checking {} directories. Using default config.",
            MAX_TRAVERSAL_DEPTH
        );
        return AnalyzerConfig::default();
    };
    try_load_config_from_path(&path).unwrap_or_default()
}

/// Contents written by `configure`
pub fn default_config_toml() -> &'static str {
    r#"# pyanalyzer configuration

[tools.type_checker]
enabled = true
# executable = ".venv/bin/pyright"
args = []
timeout_secs = 120

[tools.linter]
enabled = true
args = []
timeout_secs = 60

[dedup]
# "exact" (default) or "fuzzy" (best-effort similarity matching)
mode = "exact"
threshold = 0.9

[output]
default_format = "terminal"
fail_on = "error"

[exclude]
patterns = [
    ".venv/**",
    "venv/**",
    "build/**",
]

[fix]
backup = true
unsafe_fixes = false
"#
}
