//! Error taxonomy.
//!
//! No error is fatal: every failure degrades to "keep the last good data
//! epoch and report". Input-shape problems are [`FormatError`]s and reject
//! the whole dataset, host bridge failures are [`FetchError`]s, and caller
//! mistakes (bad regex, unknown timeline selections) are reported as
//! warnings next to a valid result instead of failing the call.

use serde::Serialize;
use thiserror::Error;

use crate::source::DatasetKey;

/// Malformed or invariant-violating input data.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("malformed document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("feature {node_id}: totalLines is {actual}, but lines plus children add up to {expected}")]
    InvariantViolation {
        node_id: String,
        expected: u64,
        actual: u64,
    },

    #[error("feature {node_id}: lines plus children overflow a line count")]
    LineCountOverflow { node_id: String },

    #[error("feature {node_id}: block {start}..{end} in {path} ends before it starts")]
    InvalidBlock {
        node_id: String,
        path: String,
        start: i64,
        end: i64,
    },

    #[error("duplicate feature identifier: {id}")]
    DuplicateId { id: String },

    #[error("series point {index} references feature {feature_index} / commit {commit_index}, which do not exist")]
    PointOutOfRange {
        index: usize,
        feature_index: usize,
        commit_index: usize,
    },
}

/// Host bridge failure. The previous data epoch is retained.
#[derive(Debug, Clone, Error)]
#[error("could not retrieve data for {key}: {code} {message}")]
pub struct FetchError {
    pub key: String,
    pub code: i32,
    pub message: String,
}

impl FetchError {
    /// Code used when the request never produced a status.
    pub const TRANSPORT: i32 = -1;

    pub fn new(key: impl Into<String>, code: i32, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            code,
            message: message.into(),
        }
    }
}

/// Invalid search input. Never escapes the search index.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryInputError {
    #[error("invalid pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// Invalid timeline selection. Reported alongside the filtered result.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionInputError {
    #[error("some selected features were not found in the data: {}", names.join(", "))]
    UnknownFeatures { names: Vec<String> },
}

/// A view was requested before the first successful fetch completed.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ViewError {
    #[error("feature data has not been fetched yet")]
    NotInitialized,
}

/// Crate-wide error.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("{key}: {source}")]
    Document {
        key: DatasetKey,
        #[source]
        source: FormatError,
    },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    View(#[from] ViewError),

    #[error("feature not found: {0}")]
    UnknownFeature(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
