// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Canonical document-chunk types shared by every backend adapter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::core::filter::DocumentFilter;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ChunkError {
    #[error("Chunk id cannot be empty")]
    EmptyId,

    #[error("Embedding cannot be empty")]
    EmptyEmbedding,
}

/// Where a chunk's parent document originally came from.
///
/// Stored metadata may predate this enum; unrecognized values are normalized
/// to absent on read instead of rejected (see `sanitize_metadata`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Email,
    File,
    Chat,
}

impl Source {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "email" => Some(Source::Email),
            "file" => Some(Source::File),
            "chat" => Some(Source::Chat),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Email => "email",
            Source::File => "file",
            Source::Chat => "chat",
        }
    }
}

/// Metadata attached to a chunk. Recognized fields are typed; anything else
/// rides along in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// One unit of embedded content, stored and retrieved by id.
///
/// Chunks are immutable once stored; writing a chunk with an existing id
/// replaces the stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
    pub metadata: ChunkMetadata,
}

impl DocumentChunk {
    pub fn new(
        id: String,
        text: String,
        embedding: Vec<f32>,
        metadata: ChunkMetadata,
    ) -> Result<Self, ChunkError> {
        if id.is_empty() {
            return Err(ChunkError::EmptyId);
        }
        if embedding.is_empty() {
            return Err(ChunkError::EmptyEmbedding);
        }
        Ok(DocumentChunk {
            id,
            text,
            embedding,
            metadata,
        })
    }

    /// Fresh random chunk id for callers that don't assign their own.
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// A single similarity query. `query` is advisory context for the caller and
/// is echoed back on the result set; only `embedding` is matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryWithEmbedding {
    pub query: String,
    pub embedding: Vec<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<DocumentFilter>,
    pub top_k: usize,
}

/// One search hit. `score` is backend-native similarity and is not
/// comparable across backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub id: String,
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ChunkMetadata>,
}

/// Result set for one query, in backend rank order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub query: String,
    pub results: Vec<ScoredChunk>,
}
