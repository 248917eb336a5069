//! Configuration loading from disk.
//!
//! Several files may be given; they are parsed independently, deep-merged in
//! order (later files win on conflicting keys, arrays are replaced wholesale)
//! and only then deserialized into [`FakeApiConfig`].

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::config::schema::FakeApiConfig;
use crate::config::validation::{validate_config, ConfigIssue};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Unsupported config format for {0} (expected .toml, .yml, .yaml or .json)")]
    UnsupportedFormat(PathBuf),

    #[error("No configuration file given")]
    NoFiles,

    #[error("Invalid configuration: {0}")]
    Schema(String),

    #[error("Validation failed: {}", join_issues(.0))]
    Validation(Vec<ConfigIssue>),
}

fn join_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, merge and validate configuration from one or more files.
pub fn load_config<P: AsRef<Path>>(paths: &[P]) -> Result<FakeApiConfig, ConfigError> {
    if paths.is_empty() {
        return Err(ConfigError::NoFiles);
    }

    let mut merged = Value::Object(Default::default());
    for path in paths {
        let value = read_value(path.as_ref())?;
        merge_values(&mut merged, value);
    }

    let config: FakeApiConfig =
        serde_json::from_value(merged).map_err(|e| ConfigError::Schema(e.to_string()))?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse a single file into a format-neutral value tree.
fn read_value(path: &Path) -> Result<Value, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let parse_error = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };

    match extension.as_deref() {
        Some("toml") => toml::from_str(&content).map_err(|e| parse_error(e.to_string())),
        Some("yml") | Some("yaml") => {
            // An empty YAML document parses to null; treat it as an empty table.
            let value: Value =
                serde_yaml::from_str(&content).map_err(|e| parse_error(e.to_string()))?;
            Ok(if value.is_null() {
                Value::Object(Default::default())
            } else {
                value
            })
        }
        Some("json") => serde_json::from_str(&content).map_err(|e| parse_error(e.to_string())),
        _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Recursively merge `overlay` into `base`. Objects merge key by key, every
/// other value kind replaces what was there.
pub fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
