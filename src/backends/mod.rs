// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Backend handle abstraction and the adapters that satisfy it.

pub mod factory;
pub mod memory;
pub mod rest;

pub use factory::{
    config_from_env, create_backend, create_backend_from_env, BackendConfig, BackendKind,
    ConfigError,
};
pub use memory::InMemoryBackend;
pub use rest::{RestBackend, RestBackendConfig};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

use crate::core::filter::FilterExpression;

/// Batch size used when a backend doesn't declare its own write limit.
pub const DEFAULT_UPSERT_BATCH: usize = 100;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Backend rejected the request: {0}")]
    Rejected(String),

    #[error("Backend does not support {0}")]
    Unsupported(&'static str),
}

/// One vector the way the backend stores it: id, embedding, and a flat
/// metadata map with backend-encoded values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub embedding: Vec<f32>,
    pub metadata: Map<String, JsonValue>,
}

/// A single search hit before sanitization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMatch {
    pub id: String,
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, JsonValue>>,
}

/// What a backend can do, advertised up front so the store can pick a
/// delete path (or refuse) without a failed round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendCapabilities {
    pub max_upsert_batch: usize,
    pub delete_by_ids: bool,
    pub delete_by_filter: bool,
    pub delete_all: bool,
}

impl Default for BackendCapabilities {
    fn default() -> Self {
        BackendCapabilities {
            max_upsert_batch: DEFAULT_UPSERT_BATCH,
            delete_by_ids: true,
            delete_by_filter: true,
            delete_all: true,
        }
    }
}

/// Capability surface every concrete vector backend satisfies.
///
/// Implementations must be safe for concurrent use: the store fans out
/// query searches against a shared handle.
#[async_trait]
pub trait VectorBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities::default()
    }

    /// Insert or replace records. Fails on malformed records (e.g. an
    /// embedding length that doesn't match the collection) or
    /// unavailability.
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), BackendError>;

    /// Similarity search returning up to `top_k` matches in backend rank
    /// order, filtered by `filter` when non-empty.
    async fn search(
        &self,
        embedding: &[f32],
        top_k: usize,
        filter: &FilterExpression,
        include_metadata: bool,
    ) -> Result<Vec<RawMatch>, BackendError>;

    async fn delete_by_ids(&self, ids: &[String]) -> Result<(), BackendError>;

    async fn delete_by_filter(&self, filter: &FilterExpression) -> Result<(), BackendError>;

    async fn delete_all(&self) -> Result<(), BackendError>;
}
