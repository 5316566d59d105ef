// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Canonical metadata filter and its translation to backend clauses.
//!
//! Callers describe predicates with `DocumentFilter`; backends never see it
//! directly. `translate_filter` lowers it to a `FilterExpression`, a flat
//! conjunction of clauses that every adapter renders in its own syntax.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};

use crate::core::types::Source;

/// Metadata field carrying the chunk creation time. Encoded backend-side as
/// a unix-timestamp number so range clauses stay numeric.
pub const CREATED_AT_FIELD: &str = "created_at";

/// Optional predicates over chunk metadata. Unset fields contribute no
/// clause; an all-unset filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq,
    Gte,
    Lte,
}

impl FilterOp {
    /// Mongo-style operator token used in the wire rendering.
    pub fn query_operator(&self) -> &'static str {
        match self {
            FilterOp::Eq => "$eq",
            FilterOp::Gte => "$gte",
            FilterOp::Lte => "$lte",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterClause {
    pub field: String,
    pub op: FilterOp,
    pub value: JsonValue,
}

/// Conjunction of filter clauses. Empty means no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterExpression {
    clauses: Vec<FilterClause>,
}

impl FilterExpression {
    pub fn empty() -> Self {
        FilterExpression::default()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn clauses(&self) -> &[FilterClause] {
        &self.clauses
    }

    /// Evaluate the conjunction against a raw metadata map. Range clauses
    /// compare numerically; a missing field fails its clause.
    pub fn matches(&self, metadata: &Map<String, JsonValue>) -> bool {
        self.clauses.iter().all(|clause| {
            let Some(value) = metadata.get(&clause.field) else {
                return false;
            };
            match clause.op {
                FilterOp::Eq => value == &clause.value,
                FilterOp::Gte => match (value.as_f64(), clause.value.as_f64()) {
                    (Some(actual), Some(bound)) => actual >= bound,
                    _ => false,
                },
                FilterOp::Lte => match (value.as_f64(), clause.value.as_f64()) {
                    (Some(actual), Some(bound)) => actual <= bound,
                    _ => false,
                },
            }
        })
    }

    /// Render as a Mongo-style JSON object, merging range operators that
    /// target the same field: `{"created_at": {"$gte": a, "$lte": b}}`.
    pub fn to_query_json(&self) -> JsonValue {
        let mut root = Map::new();
        for clause in &self.clauses {
            let entry = root
                .entry(clause.field.clone())
                .or_insert_with(|| JsonValue::Object(Map::new()));
            if let JsonValue::Object(operators) = entry {
                operators.insert(
                    clause.op.query_operator().to_string(),
                    clause.value.clone(),
                );
            }
        }
        JsonValue::Object(root)
    }
}

/// Lower a caller filter to the canonical clause list. `None` and the
/// all-unset filter both produce the empty expression.
pub fn translate_filter(filter: Option<&DocumentFilter>) -> FilterExpression {
    let mut clauses = Vec::new();

    if let Some(filter) = filter {
        if let Some(document_id) = &filter.document_id {
            clauses.push(FilterClause {
                field: "document_id".to_string(),
                op: FilterOp::Eq,
                value: json!(document_id),
            });
        }
        if let Some(source) = filter.source {
            clauses.push(FilterClause {
                field: "source".to_string(),
                op: FilterOp::Eq,
                value: json!(source.as_str()),
            });
        }
        if let Some(source_id) = &filter.source_id {
            clauses.push(FilterClause {
                field: "source_id".to_string(),
                op: FilterOp::Eq,
                value: json!(source_id),
            });
        }
        if let Some(author) = &filter.author {
            clauses.push(FilterClause {
                field: "author".to_string(),
                op: FilterOp::Eq,
                value: json!(author),
            });
        }
        if let Some(start) = filter.start_date {
            clauses.push(FilterClause {
                field: CREATED_AT_FIELD.to_string(),
                op: FilterOp::Gte,
                value: json!(start.timestamp()),
            });
        }
        if let Some(end) = filter.end_date {
            clauses.push(FilterClause {
                field: CREATED_AT_FIELD.to_string(),
                op: FilterOp::Lte,
                value: json!(end.timestamp()),
            });
        }
    }

    FilterExpression { clauses }
}
