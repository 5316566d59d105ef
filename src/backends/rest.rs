// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! HTTP adapter for a remote vector service speaking a small JSON
//! protocol. The wire client is internal; the rest of the crate only sees
//! the `VectorBackend` surface.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;

use crate::backends::{
    BackendCapabilities, BackendError, RawMatch, VectorBackend, VectorRecord, DEFAULT_UPSERT_BATCH,
};
use crate::core::filter::FilterExpression;

#[derive(Debug, Clone)]
pub struct RestBackendConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub max_upsert_batch: usize,
}

impl RestBackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        RestBackendConfig {
            base_url: base_url.into(),
            api_key: None,
            timeout: Duration::from_secs(30),
            max_upsert_batch: DEFAULT_UPSERT_BATCH,
        }
    }
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [VectorRecord],
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    embedding: &'a [f32],
    top_k: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<JsonValue>,
    include_metadata: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    matches: Vec<RawMatch>,
}

#[derive(Debug, Serialize)]
struct DeleteRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delete_all: Option<bool>,
}

/// Wire-level client, kept separate from the trait impl so transport
/// concerns stay in one place.
#[derive(Debug, Clone)]
struct RestClient {
    base_url: String,
    api_key: Option<String>,
    http_client: Client,
}

impl RestClient {
    fn new(config: &RestBackendConfig) -> Self {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        RestClient {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            http_client,
        }
    }

    async fn post_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Response> {
        let mut request = self
            .http_client
            .post(format!("{}{}", self.base_url, path))
            .json(body);

        if let Some(api_key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", api_key));
        }

        request.send().await.map_err(|e| anyhow!(e))
    }
}

pub struct RestBackend {
    client: RestClient,
    max_upsert_batch: usize,
}

impl RestBackend {
    pub fn new(config: RestBackendConfig) -> Self {
        RestBackend {
            client: RestClient::new(&config),
            max_upsert_batch: config.max_upsert_batch,
        }
    }
}

fn transport_error(operation: &'static str, error: anyhow::Error) -> BackendError {
    BackendError::Unavailable(format!("{}: {}", operation, error))
}

fn status_error(operation: &'static str, status: StatusCode) -> BackendError {
    if status.is_client_error() {
        BackendError::Rejected(format!("{} returned {}", operation, status))
    } else {
        BackendError::Unavailable(format!("{} returned {}", operation, status))
    }
}

#[async_trait]
impl VectorBackend for RestBackend {
    fn name(&self) -> &'static str {
        "rest"
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            max_upsert_batch: self.max_upsert_batch,
            ..Default::default()
        }
    }

    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), BackendError> {
        let body = UpsertRequest { vectors: &records };
        let response = self
            .client
            .post_json("/vectors/upsert", &body)
            .await
            .map_err(|e| transport_error("upsert", e))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(status_error("upsert", status))
        }
    }

    async fn search(
        &self,
        embedding: &[f32],
        top_k: usize,
        filter: &FilterExpression,
        include_metadata: bool,
    ) -> Result<Vec<RawMatch>, BackendError> {
        let body = QueryRequest {
            embedding,
            top_k,
            filter: (!filter.is_empty()).then(|| filter.to_query_json()),
            include_metadata,
        };
        let response = self
            .client
            .post_json("/vectors/query", &body)
            .await
            .map_err(|e| transport_error("query", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error("query", status));
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Unavailable(format!("query response decode: {}", e)))?;
        Ok(parsed.matches)
    }

    async fn delete_by_ids(&self, ids: &[String]) -> Result<(), BackendError> {
        let body = DeleteRequest {
            ids: Some(ids.to_vec()),
            filter: None,
            delete_all: None,
        };
        let response = self
            .client
            .post_json("/vectors/delete", &body)
            .await
            .map_err(|e| transport_error("delete", e))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(status_error("delete", status))
        }
    }

    async fn delete_by_filter(&self, filter: &FilterExpression) -> Result<(), BackendError> {
        let body = DeleteRequest {
            ids: None,
            filter: Some(filter.to_query_json()),
            delete_all: None,
        };
        let response = self
            .client
            .post_json("/vectors/delete", &body)
            .await
            .map_err(|e| transport_error("delete", e))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(status_error("delete", status))
        }
    }

    async fn delete_all(&self) -> Result<(), BackendError> {
        let body = DeleteRequest {
            ids: None,
            filter: None,
            delete_all: Some(true),
        };
        let response = self
            .client
            .post_json("/vectors/delete", &body)
            .await
            .map_err(|e| transport_error("delete", e))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(status_error("delete", status))
        }
    }
}
