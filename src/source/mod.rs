//! The host bridge: where feature documents come from and where host
//! commands go.
//!
//! Every fetch is a single request for one [`DatasetKey`] that resolves to the
//! raw JSON text or a [`FetchError`]. Sources do not deduplicate concurrent
//! requests for the same key; the [`Explorer`](crate::explorer::Explorer)
//! serializes them.

mod dir;
mod http;
mod memory;

pub use dir::DirectorySource;
pub use http::HttpSource;
pub use memory::MemorySource;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// The datasets a host can deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatasetKey {
    /// Root features with nested children.
    #[serde(rename = "tree")]
    Tree,
    /// Every feature at top level plus tangling links.
    #[serde(rename = "tangling")]
    Tangling,
    /// Feature × commit history and deleted features.
    #[serde(rename = "featureHistory")]
    FeatureHistory,
}

impl DatasetKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tree => "tree",
            Self::Tangling => "tangling",
            Self::FeatureHistory => "featureHistory",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "tree" => Some(Self::Tree),
            "tangling" => Some(Self::Tangling),
            "featureHistory" => Some(Self::FeatureHistory),
            _ => None,
        }
    }
}

impl fmt::Display for DatasetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requests that act on the host IDE instead of fetching data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum HostCommand {
    /// Open a file, optionally selecting a 0-based inclusive line range.
    OpenPath {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lines: Option<(i64, i64)>,
    },
    /// Reveal a feature in the feature model.
    HighlightFeature { id: String },
    /// Reveal a feature's declaration in the editor.
    HighlightPsiElement { id: String },
}

impl HostCommand {
    /// The comma-separated request string the host bridge understands.
    pub fn request_string(&self) -> String {
        match self {
            Self::OpenPath {
                path,
                lines: Some((start, end)),
            } => format!("openPath,{},{},{}", path, start, end),
            Self::OpenPath { path, lines: None } => format!("openPath,{}", path),
            Self::HighlightFeature { id } => format!("highlightFeature,{}", id),
            Self::HighlightPsiElement { id } => format!("highlightPsiElement,{}", id),
        }
    }
}

/// A host that serves feature documents.
#[async_trait]
pub trait FeatureSource: Send + Sync {
    /// Fetch the raw JSON document for `key`.
    async fn fetch(&self, key: DatasetKey) -> Result<String, FetchError>;

    /// Forward a command to the host. Sources without a host accept and drop it.
    async fn dispatch(&self, command: &HostCommand) -> Result<(), FetchError> {
        tracing::debug!("No host attached, dropping {}", command.request_string());
        Ok(())
    }
}
