// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! In-memory backend with cosine scoring and client-side filter
//! evaluation. Used for tests and local development; it also records the
//! size of every upsert batch it receives so batching behavior can be
//! asserted from the outside.

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::backends::{
    BackendCapabilities, BackendError, RawMatch, VectorBackend, VectorRecord, DEFAULT_UPSERT_BATCH,
};
use crate::core::filter::FilterExpression;

struct StoredRecord {
    embedding: Vec<f32>,
    metadata: Map<String, JsonValue>,
}

pub struct InMemoryBackend {
    records: RwLock<HashMap<String, StoredRecord>>,
    dimension: RwLock<Option<usize>>,
    upsert_batches: RwLock<Vec<usize>>,
    max_upsert_batch: usize,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::with_batch_limit(DEFAULT_UPSERT_BATCH)
    }

    pub fn with_batch_limit(max_upsert_batch: usize) -> Self {
        InMemoryBackend {
            records: RwLock::new(HashMap::new()),
            dimension: RwLock::new(None),
            upsert_batches: RwLock::new(Vec::new()),
            max_upsert_batch,
        }
    }

    /// Sizes of the upsert batches received so far, in submission order.
    pub async fn upsert_batch_sizes(&self) -> Vec<usize> {
        self.upsert_batches.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot_product / (mag_a * mag_b)
}

#[async_trait]
impl VectorBackend for InMemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            max_upsert_batch: self.max_upsert_batch,
            ..Default::default()
        }
    }

    async fn upsert(&self, batch: Vec<VectorRecord>) -> Result<(), BackendError> {
        self.upsert_batches.write().await.push(batch.len());

        let mut dimension = self.dimension.write().await;
        let mut records = self.records.write().await;

        for record in batch {
            if record.embedding.is_empty() {
                return Err(BackendError::Rejected(format!(
                    "record {} has an empty embedding",
                    record.id
                )));
            }
            match *dimension {
                Some(expected) if expected != record.embedding.len() => {
                    return Err(BackendError::Rejected(format!(
                        "embedding length mismatch: expected {}, got {}",
                        expected,
                        record.embedding.len()
                    )));
                }
                Some(_) => {}
                None => *dimension = Some(record.embedding.len()),
            }
            records.insert(
                record.id,
                StoredRecord {
                    embedding: record.embedding,
                    metadata: record.metadata,
                },
            );
        }

        Ok(())
    }

    async fn search(
        &self,
        embedding: &[f32],
        top_k: usize,
        filter: &FilterExpression,
        include_metadata: bool,
    ) -> Result<Vec<RawMatch>, BackendError> {
        // Lock order matches upsert: dimension before records.
        if let Some(expected) = *self.dimension.read().await {
            if expected != embedding.len() {
                return Err(BackendError::Rejected(format!(
                    "embedding length mismatch: expected {}, got {}",
                    expected,
                    embedding.len()
                )));
            }
        }

        let records = self.records.read().await;

        let mut matches: Vec<RawMatch> = records
            .iter()
            .filter(|(_, record)| filter.matches(&record.metadata))
            .map(|(id, record)| RawMatch {
                id: id.clone(),
                score: cosine_similarity(embedding, &record.embedding),
                metadata: include_metadata.then(|| record.metadata.clone()),
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(top_k);

        Ok(matches)
    }

    async fn delete_by_ids(&self, ids: &[String]) -> Result<(), BackendError> {
        let mut records = self.records.write().await;
        for id in ids {
            records.remove(id);
        }
        Ok(())
    }

    async fn delete_by_filter(&self, filter: &FilterExpression) -> Result<(), BackendError> {
        let mut records = self.records.write().await;
        records.retain(|_, record| !filter.matches(&record.metadata));
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), BackendError> {
        self.records.write().await.clear();
        *self.dimension.write().await = None;
        Ok(())
    }
}
