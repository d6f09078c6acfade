// Copyright 2025-Present Operator Telemetry contributors
// SPDX-License-Identifier: Apache-2.0

use crate::error::ServiceError;
use std::collections::HashMap;
use std::env;
use telemetry_pipeline::payload::CollectionKind;
use telemetry_pipeline::retention::DEFAULT_RETENTION_CAPACITY;

/// Default base URL of the remote collection service.
pub const DEFAULT_SERVER_URL: &str = "https://telemetry.example.com";
/// How often each collection type runs unless overridden.
pub const DEFAULT_COLLECTION_INTERVAL_SECS: u64 = 86_400;
/// Floor applied to per-type interval overrides.
pub const MIN_COLLECTION_INTERVAL_SECS: u64 = 3_600;
/// Window over which collection start times are jittered.
pub const COLLECTION_OFFSET_RANGE_SECS: u64 = 3_600;
/// Per-attempt HTTP timeout unless overridden.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Configuration for the telemetry service
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Base URL of the remote collection service
    pub server_url: String,
    /// Remote transmission credential; presence selects the pro tier
    pub api_key: Option<String>,
    /// HTTPS proxy URL
    pub https_proxy: Option<String>,
    /// Per-attempt HTTP request timeout, in seconds
    pub request_timeout_secs: u64,
    /// Capacity of the local retention store (free tier)
    pub retention_capacity: usize,
    /// Log level (e.g. trace, debug, info, warn, error)
    pub log_level: String,
    /// Per-collection-type interval overrides, in seconds
    pub interval_overrides: HashMap<CollectionKind, u64>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            api_key: None,
            https_proxy: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            retention_capacity: DEFAULT_RETENTION_CAPACITY,
            log_level: "info".to_string(),
            interval_overrides: HashMap::new(),
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ServiceError> {
        let server_url =
            env::var("TELEMETRY_SERVER_URL").unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());
        let api_key = env::var("TELEMETRY_API_KEY").ok().filter(|k| !k.is_empty());
        let https_proxy = env::var("TELEMETRY_HTTPS_PROXY")
            .or_else(|_| env::var("HTTPS_PROXY"))
            .ok();
        let request_timeout_secs = env::var("TELEMETRY_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        let retention_capacity = env::var("TELEMETRY_RETENTION_CAPACITY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_RETENTION_CAPACITY);
        let log_level = env::var("TELEMETRY_LOG_LEVEL")
            .map(|v| v.to_lowercase())
            .unwrap_or_else(|_| "info".to_string());

        let mut interval_overrides = HashMap::new();
        for kind in CollectionKind::ALL {
            if let Some(secs) = env::var(interval_env_var(kind))
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
            {
                interval_overrides.insert(kind, secs);
            }
        }

        let config = Self {
            server_url,
            api_key,
            https_proxy,
            request_timeout_secs,
            retention_capacity,
            log_level,
            interval_overrides,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.server_url.trim().is_empty() {
            return Err(ServiceError::InvalidConfig(
                "server URL cannot be empty".to_string(),
            ));
        }
        if !self.server_url.starts_with("http://") && !self.server_url.starts_with("https://") {
            return Err(ServiceError::InvalidConfig(format!(
                "server URL must be http(s), got '{}'",
                self.server_url
            )));
        }

        if self.retention_capacity == 0 {
            return Err(ServiceError::InvalidConfig(
                "retention capacity must be at least 1".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ServiceError::InvalidConfig(
                "request timeout must be at least 1 second".to_string(),
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.as_str()) {
            return Err(ServiceError::InvalidConfig(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        Ok(())
    }

    /// Effective collection interval for a type, before the scheduler's
    /// minimum-interval clamp.
    pub fn interval_for(&self, kind: CollectionKind) -> u64 {
        self.interval_overrides
            .get(&kind)
            .copied()
            .unwrap_or(DEFAULT_COLLECTION_INTERVAL_SECS)
    }
}

/// Env var carrying the interval override for a collection type, e.g.
/// `TELEMETRY_CLUSTER_METADATA_INTERVAL_SECS`.
pub fn interval_env_var(kind: CollectionKind) -> String {
    format!(
        "TELEMETRY_{}_INTERVAL_SECS",
        kind.as_str().to_uppercase().replace('-', "_")
    )
}
