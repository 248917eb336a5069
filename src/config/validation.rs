//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation of server-level settings (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! Per-endpoint checks (defaults, backing files) are not done here: they
//! need the resource root and belong to `routing::table`.
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FakeApiConfig → Result<(), Vec<ConfigIssue>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::FakeApiConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ConfigIssue {
    pub field: &'static str,
    pub message: String,
}

impl ConfigIssue {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Characters that make a mount point a path template.
const MOUNT_RESERVED: [char; 4] = ['{', '}', ':', '*'];

/// Check server-level settings, collecting every issue found.
pub fn validate_config(config: &FakeApiConfig) -> Result<(), Vec<ConfigIssue>> {
    let mut issues = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        issues.push(ConfigIssue::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.is_empty() {
            issues.push(ConfigIssue::new("listener.tls.cert_path", "must not be empty"));
        }
        if tls.key_path.is_empty() {
            issues.push(ConfigIssue::new("listener.tls.key_path", "must not be empty"));
        }
    }

    let prefix = &config.api.prefix;
    if !prefix.is_empty() && (!prefix.starts_with('/') || prefix.ends_with('/')) {
        issues.push(ConfigIssue::new(
            "api.prefix",
            format!("'{}' must start with '/' and must not end with '/'", prefix),
        ));
    }
    if prefix.contains(MOUNT_RESERVED) {
        issues.push(ConfigIssue::new(
            "api.prefix",
            format!("'{}' must not contain path parameters", prefix),
        ));
    }

    if let Some(static_dir) = &config.api.static_dir {
        if !static_dir.url.starts_with('/') {
            issues.push(ConfigIssue::new(
                "api.static.url",
                format!("'{}' must start with '/'", static_dir.url),
            ));
        }
        if static_dir.url.contains(MOUNT_RESERVED) {
            issues.push(ConfigIssue::new(
                "api.static.url",
                format!("'{}' must not contain path parameters", static_dir.url),
            ));
        }
    }

    if config.timeouts.request_secs == 0 {
        issues.push(ConfigIssue::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        issues.push(ConfigIssue::new(
            "observability.metrics_address",
            format!(
                "'{}' is not a socket address",
                config.observability.metrics_address
            ),
        ));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&FakeApiConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_issues() {
        let mut config = FakeApiConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.api.prefix = "api/".into();
        config.timeouts.request_secs = 0;

        let issues = validate_config(&config).unwrap_err();
        let fields: Vec<_> = issues.iter().map(|i| i.field).collect();
        assert_eq!(
            fields,
            vec!["listener.bind_address", "api.prefix", "timeouts.request_secs"]
        );
    }

    #[test]
    fn test_prefix_must_be_literal() {
        let mut config = FakeApiConfig::default();
        config.api.prefix = "/api/{version}".into();
        let issues = validate_config(&config).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "api.prefix");
    }

    #[test]
    fn test_metrics_address_only_checked_when_enabled() {
        let mut config = FakeApiConfig::default();
        config.observability.metrics_address = "bad".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
