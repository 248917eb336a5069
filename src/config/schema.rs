//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the fake API
//! server. All types derive Serde traits for deserialization from TOML, YAML
//! or JSON config files.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the fake API server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FakeApiConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Endpoint and resource definitions.
    #[serde(alias = "rest")]
    pub api: ApiConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// The fake REST API itself.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ApiConfig {
    /// Path prefix every endpoint is mounted under (e.g. "/api/v1").
    pub prefix: String,

    /// Single URL definitions.
    pub urls: Vec<EndpointDefinition>,

    /// Resource definitions, each expanding into a set of CRUD endpoints.
    pub resources: Vec<ResourceDefinition>,

    /// Directory `file` fields are resolved against.
    /// Overridden by `--resource-dir` on the command line.
    pub resource_dir: Option<PathBuf>,

    /// Fixed delay applied to every response, in milliseconds.
    /// Read once at startup; a hot reload does not change it.
    #[serde(alias = "delay")]
    pub delay_ms: u64,

    /// Refuse to start when any definition fails validation.
    pub strict: bool,

    /// Static directory served next to the fake endpoints.
    #[serde(rename = "static")]
    pub static_dir: Option<StaticConfig>,
}

/// A single user-authored URL definition.
///
/// Every field except `path` is optional and resolved by defaulting
/// during normalization.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct EndpointDefinition {
    #[serde(alias = "url")]
    pub path: String,

    pub method: String,

    #[serde(alias = "contentType")]
    pub content_type: String,

    pub file: String,

    #[serde(alias = "status_code", alias = "statusCode")]
    pub status: u16,

    pub headers: BTreeMap<String, String>,
}

/// A resource definition backed by a JSON array data file.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ResourceDefinition {
    /// Collection name; becomes the first path segment.
    pub name: String,

    /// Data file; defaults to `<name>.json`.
    pub file: Option<String>,

    pub headers: BTreeMap<String, String>,
}

/// Static file serving.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StaticConfig {
    /// URL prefix (e.g. "/assets").
    pub url: String,

    /// Directory on disk.
    pub path: PathBuf,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
