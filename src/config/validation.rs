//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate the upstream base address before any request is served
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("upstream.base_url '{0}' is not a valid URL")]
    BaseUrl(String),

    #[error("upstream.base_url must use http, got '{0}'")]
    BaseUrlScheme(String),

    #[error("upstream.base_url must not carry a query or fragment")]
    BaseUrlSuffix,

    #[error("upstream.timeout_ms must be greater than zero")]
    ZeroTimeout,

    #[error("upstream.mount_path '{0}' must start with '/'")]
    MountPath(String),

    #[error("upstream.routing_param must not be empty")]
    RoutingParam,

    #[error("security.max_body_size must be greater than zero")]
    ZeroBodyLimit,

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let upstream = &config.upstream;
    match Url::parse(&upstream.base_url) {
        Ok(url) => {
            // hyper's HttpConnector only speaks plain http
            if url.scheme() != "http" {
                errors.push(ValidationError::BaseUrlScheme(url.scheme().to_string()));
            }
            if !url.has_host() {
                errors.push(ValidationError::BaseUrl(upstream.base_url.clone()));
            }
            if url.query().is_some() || url.fragment().is_some() {
                errors.push(ValidationError::BaseUrlSuffix);
            }
        }
        Err(_) => errors.push(ValidationError::BaseUrl(upstream.base_url.clone())),
    }

    if upstream.timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if !upstream.mount_path.starts_with('/') {
        errors.push(ValidationError::MountPath(upstream.mount_path.clone()));
    }
    if upstream.routing_param.is_empty() {
        errors.push(ValidationError::RoutingParam);
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::MetricsAddress(observability.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&ProxyConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ProxyConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.upstream.base_url = "https://backend.example".into();
        config.upstream.timeout_ms = 0;
        config.security.max_body_size = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::BindAddress("nowhere".into()),
                ValidationError::BaseUrlScheme("https".into()),
                ValidationError::ZeroTimeout,
                ValidationError::ZeroBodyLimit,
            ]
        );
    }

    #[test]
    fn test_rejects_unparseable_base_url() {
        let mut config = ProxyConfig::default();
        config.upstream.base_url = "not a url".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::BaseUrl("not a url".into())]);
    }

    #[test]
    fn test_rejects_base_url_with_query() {
        let mut config = ProxyConfig::default();
        config.upstream.base_url = "http://127.0.0.1:5021/?k=v".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::BaseUrlSuffix]);
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = ProxyConfig::default();
        config.observability.metrics_address = "bad".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::MetricsAddress("bad".into())]);
    }
}
