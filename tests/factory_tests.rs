// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Backend selection from configuration and environment.

use vector_gateway::backends::{config_from_env, create_backend_from_env, BackendConfig, ConfigError};

// One test function so the environment mutations run sequentially; this
// binary has no other tests reading these variables.
#[test]
fn test_backend_selection_from_env() {
    std::env::remove_var("VECTOR_BACKEND");
    std::env::remove_var("VECTOR_BACKEND_URL");
    std::env::remove_var("VECTOR_BACKEND_API_KEY");
    std::env::remove_var("VECTOR_BACKEND_TIMEOUT_MS");

    // Unset selector defaults to the in-memory backend.
    assert!(matches!(config_from_env().unwrap(), BackendConfig::Memory));

    std::env::set_var("VECTOR_BACKEND", "weaviate");
    assert_eq!(
        config_from_env().unwrap_err(),
        ConfigError::Unsupported("weaviate".to_string())
    );

    std::env::set_var("VECTOR_BACKEND", "rest");
    assert_eq!(
        config_from_env().unwrap_err(),
        ConfigError::Missing("VECTOR_BACKEND_URL")
    );

    std::env::set_var("VECTOR_BACKEND_URL", "localhost:8000");
    assert!(matches!(
        config_from_env().unwrap_err(),
        ConfigError::Invalid { name: "VECTOR_BACKEND_URL", .. }
    ));

    std::env::set_var("VECTOR_BACKEND_URL", "http://localhost:8000");
    std::env::set_var("VECTOR_BACKEND_API_KEY", "test-api-key");
    std::env::set_var("VECTOR_BACKEND_TIMEOUT_MS", "1500");
    match config_from_env().unwrap() {
        BackendConfig::Rest(config) => {
            assert_eq!(config.base_url, "http://localhost:8000");
            assert_eq!(config.api_key.as_deref(), Some("test-api-key"));
            assert_eq!(config.timeout.as_millis(), 1500);
        }
        other => panic!("expected rest config, got {:?}", other),
    }

    let backend = create_backend_from_env().unwrap();
    assert_eq!(backend.name(), "rest");

    std::env::set_var("VECTOR_BACKEND", "memory");
    let backend = create_backend_from_env().unwrap();
    assert_eq!(backend.name(), "memory");

    std::env::remove_var("VECTOR_BACKEND");
    std::env::remove_var("VECTOR_BACKEND_URL");
    std::env::remove_var("VECTOR_BACKEND_API_KEY");
    std::env::remove_var("VECTOR_BACKEND_TIMEOUT_MS");
}
