// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Normalization of raw metadata maps returned by backends.
//!
//! Backends hand back whatever was stored, including fields written before
//! the current schema was constrained. Sanitization keeps queries available
//! despite stale data: the chunk text is split out rather than duplicated,
//! and a `source` value outside the enum is dropped instead of raised.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value as JsonValue};

use crate::core::filter::CREATED_AT_FIELD;
use crate::core::types::{ChunkMetadata, Source};

/// Metadata key holding the chunk text inside backend records.
pub const TEXT_FIELD: &str = "text";

/// Pull the chunk text out of a raw match's metadata, if present.
pub fn extract_text(raw: &Map<String, JsonValue>) -> Option<String> {
    raw.get(TEXT_FIELD)
        .and_then(JsonValue::as_str)
        .map(str::to_string)
}

/// Build caller-facing metadata from a raw backend map.
///
/// - `text` is removed (returned separately via `extract_text`).
/// - An unrecognized `source` value becomes absent, never an error.
/// - `created_at` is decoded from a unix timestamp (or RFC 3339 string).
/// - Every other field passes through unchanged, typed where recognized.
///
/// Idempotent: sanitizing already-sanitized metadata changes nothing.
pub fn sanitize_metadata(raw: &Map<String, JsonValue>) -> ChunkMetadata {
    let mut metadata = ChunkMetadata::default();

    for (key, value) in raw {
        match key.as_str() {
            TEXT_FIELD => {}
            "source" => {
                metadata.source = value.as_str().and_then(Source::parse);
            }
            "document_id" => match value.as_str() {
                Some(id) => metadata.document_id = Some(id.to_string()),
                None => {
                    metadata.extra.insert(key.clone(), value.clone());
                }
            },
            "source_id" => match value.as_str() {
                Some(id) => metadata.source_id = Some(id.to_string()),
                None => {
                    metadata.extra.insert(key.clone(), value.clone());
                }
            },
            "author" => match value.as_str() {
                Some(author) => metadata.author = Some(author.to_string()),
                None => {
                    metadata.extra.insert(key.clone(), value.clone());
                }
            },
            CREATED_AT_FIELD => match decode_timestamp(value) {
                Some(created_at) => metadata.created_at = Some(created_at),
                None => {
                    metadata.extra.insert(key.clone(), value.clone());
                }
            },
            _ => {
                metadata.extra.insert(key.clone(), value.clone());
            }
        }
    }

    metadata
}

fn decode_timestamp(value: &JsonValue) -> Option<DateTime<Utc>> {
    if let Some(seconds) = value.as_i64() {
        return Utc.timestamp_opt(seconds, 0).single();
    }
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
