// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Backend selection. A backend identifier picks a concrete adapter;
//! anything unrecognized is a configuration error, not a runtime one.

use std::env;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::backends::memory::InMemoryBackend;
use crate::backends::rest::{RestBackend, RestBackendConfig};
use crate::backends::VectorBackend;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Unsupported vector backend: {0}")]
    Unsupported(String),

    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid setting {name}: {message}")]
    Invalid {
        name: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Memory,
    Rest,
}

impl BackendKind {
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        match name {
            "memory" => Ok(BackendKind::Memory),
            "rest" => Ok(BackendKind::Rest),
            other => Err(ConfigError::Unsupported(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub enum BackendConfig {
    Memory,
    Rest(RestBackendConfig),
}

pub fn create_backend(config: BackendConfig) -> Arc<dyn VectorBackend> {
    match config {
        BackendConfig::Memory => Arc::new(InMemoryBackend::new()),
        BackendConfig::Rest(config) => Arc::new(RestBackend::new(config)),
    }
}

/// Resolve a backend configuration from the environment.
///
/// `VECTOR_BACKEND` selects the adapter (defaults to `memory`). The rest
/// adapter additionally reads `VECTOR_BACKEND_URL` (required),
/// `VECTOR_BACKEND_API_KEY`, and `VECTOR_BACKEND_TIMEOUT_MS`.
pub fn config_from_env() -> Result<BackendConfig, ConfigError> {
    let name = env::var("VECTOR_BACKEND").unwrap_or_else(|_| "memory".to_string());

    match BackendKind::parse(&name)? {
        BackendKind::Memory => Ok(BackendConfig::Memory),
        BackendKind::Rest => {
            let base_url = env::var("VECTOR_BACKEND_URL")
                .map_err(|_| ConfigError::Missing("VECTOR_BACKEND_URL"))?;

            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err(ConfigError::Invalid {
                    name: "VECTOR_BACKEND_URL",
                    message: "must start with http:// or https://".to_string(),
                });
            }

            let mut config = RestBackendConfig::new(base_url);
            config.api_key = env::var("VECTOR_BACKEND_API_KEY").ok();
            if let Some(millis) = env::var("VECTOR_BACKEND_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
            {
                config.timeout = Duration::from_millis(millis);
            }

            Ok(BackendConfig::Rest(config))
        }
    }
}

pub fn create_backend_from_env() -> Result<Arc<dyn VectorBackend>, ConfigError> {
    let config = config_from_env()?;
    log_configuration_summary(&config);
    Ok(create_backend(config))
}

fn log_configuration_summary(config: &BackendConfig) {
    match config {
        BackendConfig::Memory => {
            info!(backend = "memory", "vector backend configured");
        }
        BackendConfig::Rest(rest) => {
            info!(
                backend = "rest",
                url = %rest.base_url,
                api_key = rest.api_key.is_some(),
                timeout_ms = rest.timeout.as_millis() as u64,
                "vector backend configured"
            );
        }
    }
}
