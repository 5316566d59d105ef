// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

pub mod filter;
pub mod sanitize;
pub mod types;

pub use filter::{
    translate_filter, DocumentFilter, FilterClause, FilterExpression, FilterOp, CREATED_AT_FIELD,
};
pub use sanitize::{extract_text, sanitize_metadata, TEXT_FIELD};
pub use types::{
    ChunkError, ChunkMetadata, DocumentChunk, QueryResult, QueryWithEmbedding, ScoredChunk, Source,
};
