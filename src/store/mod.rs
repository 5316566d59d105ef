// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! The uniform store surface: batched writes, concurrent queries, and
//! precedence-resolved deletes over any `VectorBackend`.

use futures::future::try_join_all;
use serde_json::{json, Map, Value as JsonValue};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::backends::{BackendError, VectorBackend, VectorRecord};
use crate::core::filter::{translate_filter, DocumentFilter, CREATED_AT_FIELD};
use crate::core::sanitize::{extract_text, sanitize_metadata, TEXT_FIELD};
use crate::core::types::{DocumentChunk, QueryResult, QueryWithEmbedding, ScoredChunk};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid chunk: {0}")]
    Validation(String),

    #[error("{operation} failed")]
    Backend {
        operation: String,
        #[source]
        source: BackendError,
    },

    #[error("Backend does not support {mode} deletes")]
    Capability { mode: &'static str },
}

/// Uniform access layer over one backend handle.
///
/// Queries within a single `query()` call run concurrently against the
/// shared handle; writes within a single `upsert()` call run sequentially,
/// batch by batch. The store itself holds no mutable state.
pub struct VectorStore {
    backend: Arc<dyn VectorBackend>,
}

impl VectorStore {
    pub fn new(backend: Arc<dyn VectorBackend>) -> Self {
        VectorStore { backend }
    }

    /// Write chunks to the backend in batches of the backend's declared
    /// write limit, submitted in order. The first failing batch aborts the
    /// remainder; batches already submitted stay written.
    ///
    /// Returns one id per distinct input chunk, in first-occurrence order.
    pub async fn upsert(&self, chunks: &[DocumentChunk]) -> Result<Vec<String>, StoreError> {
        let mut ids = Vec::new();
        let mut seen = HashSet::new();
        for chunk in chunks {
            validate_chunk(chunk)?;
            if seen.insert(chunk.id.as_str()) {
                ids.push(chunk.id.clone());
            }
        }

        let records: Vec<VectorRecord> = chunks.iter().map(encode_chunk).collect();
        let batch_size = self.backend.capabilities().max_upsert_batch.max(1);

        for (index, batch) in records.chunks(batch_size).enumerate() {
            debug!(batch = index, size = batch.len(), "upserting batch");
            self.backend
                .upsert(batch.to_vec())
                .await
                .map_err(|source| {
                    error!(batch = index, error = %source, "upsert batch failed");
                    StoreError::Backend {
                        operation: format!("upsert batch {}", index),
                        source,
                    }
                })?;
        }

        Ok(ids)
    }

    /// Run every query concurrently and return one result set per query,
    /// in input order. The first failing search aborts the whole call and
    /// its error is propagated; sibling searches are dropped.
    pub async fn query(
        &self,
        queries: &[QueryWithEmbedding],
    ) -> Result<Vec<QueryResult>, StoreError> {
        let searches = queries
            .iter()
            .enumerate()
            .map(|(index, query)| self.run_single_query(index, query));

        try_join_all(searches).await
    }

    async fn run_single_query(
        &self,
        index: usize,
        query: &QueryWithEmbedding,
    ) -> Result<QueryResult, StoreError> {
        // top_k of zero selects nothing; skip the backend round trip.
        if query.top_k == 0 {
            return Ok(QueryResult {
                query: query.query.clone(),
                results: Vec::new(),
            });
        }

        let expression = translate_filter(query.filter.as_ref());
        let matches = self
            .backend
            .search(&query.embedding, query.top_k, &expression, true)
            .await
            .map_err(|source| {
                error!(query = index, error = %source, "search failed");
                StoreError::Backend {
                    operation: format!("query {}", index),
                    source,
                }
            })?;

        let results = matches
            .into_iter()
            .map(|raw| {
                let (text, metadata) = match &raw.metadata {
                    Some(map) => (extract_text(map), Some(sanitize_metadata(map))),
                    None => (None, None),
                };
                ScoredChunk {
                    id: raw.id,
                    score: raw.score,
                    text,
                    metadata,
                }
            })
            .collect();

        Ok(QueryResult {
            query: query.query.clone(),
            results,
        })
    }

    /// Remove vectors by one of three intents, in fixed precedence:
    /// `delete_all` wins and ignores the rest; otherwise a filter that
    /// translates to a non-empty expression; otherwise a non-empty id
    /// list. With no applicable intent the call succeeds without touching
    /// the backend — deleting nothing is not an error.
    pub async fn delete(
        &self,
        ids: Option<&[String]>,
        filter: Option<&DocumentFilter>,
        delete_all: bool,
    ) -> Result<bool, StoreError> {
        let capabilities = self.backend.capabilities();

        if delete_all {
            if !capabilities.delete_all {
                return Err(StoreError::Capability { mode: "delete-all" });
            }
            self.backend.delete_all().await.map_err(|source| {
                error!(error = %source, "delete all failed");
                StoreError::Backend {
                    operation: "delete all".to_string(),
                    source,
                }
            })?;
            info!("deleted all vectors");
            return Ok(true);
        }

        let expression = translate_filter(filter);
        if !expression.is_empty() {
            if !capabilities.delete_by_filter {
                return Err(StoreError::Capability { mode: "filter" });
            }
            self.backend
                .delete_by_filter(&expression)
                .await
                .map_err(|source| {
                    error!(error = %source, "filter delete failed");
                    StoreError::Backend {
                        operation: "delete by filter".to_string(),
                        source,
                    }
                })?;
            return Ok(true);
        }

        if let Some(ids) = ids {
            if !ids.is_empty() {
                if !capabilities.delete_by_ids {
                    return Err(StoreError::Capability { mode: "id" });
                }
                self.backend.delete_by_ids(ids).await.map_err(|source| {
                    error!(count = ids.len(), error = %source, "id delete failed");
                    StoreError::Backend {
                        operation: "delete by ids".to_string(),
                        source,
                    }
                })?;
                return Ok(true);
            }
        }

        debug!("delete called without ids, filter, or delete_all; nothing to remove");
        Ok(true)
    }
}

fn validate_chunk(chunk: &DocumentChunk) -> Result<(), StoreError> {
    if chunk.id.is_empty() {
        return Err(StoreError::Validation("chunk id cannot be empty".to_string()));
    }
    if chunk.embedding.is_empty() {
        return Err(StoreError::Validation(format!(
            "chunk {} has an empty embedding",
            chunk.id
        )));
    }
    Ok(())
}

/// Lower a chunk to the backend record shape. Dates are stored as unix
/// timestamps so filter range clauses stay numeric, and the text rides in
/// the metadata map so searches can hand it back without a second lookup.
fn encode_chunk(chunk: &DocumentChunk) -> VectorRecord {
    let mut metadata = Map::new();

    if let Some(document_id) = &chunk.metadata.document_id {
        metadata.insert("document_id".to_string(), json!(document_id));
    }
    if let Some(source) = chunk.metadata.source {
        metadata.insert("source".to_string(), json!(source.as_str()));
    }
    if let Some(source_id) = &chunk.metadata.source_id {
        metadata.insert("source_id".to_string(), json!(source_id));
    }
    if let Some(author) = &chunk.metadata.author {
        metadata.insert("author".to_string(), json!(author));
    }
    if let Some(created_at) = chunk.metadata.created_at {
        metadata.insert(CREATED_AT_FIELD.to_string(), json!(created_at.timestamp()));
    }
    for (key, value) in &chunk.metadata.extra {
        metadata.insert(key.clone(), value.clone());
    }
    metadata.insert(TEXT_FIELD.to_string(), JsonValue::String(chunk.text.clone()));

    VectorRecord {
        id: chunk.id.clone(),
        embedding: chunk.embedding.clone(),
        metadata,
    }
}
