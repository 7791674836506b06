use serde::{Deserialize, Serialize};

/// Feature × commit incidences over a repository's history.
///
/// Fetched fresh every time a history view is activated and never patched
/// in place: a newer snapshot replaces the old one entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSnapshot {
    /// Feature names, indexed by [`SeriesPoint::feature_index`].
    #[serde(default)]
    pub features: Vec<String>,
    /// Commit time labels, indexed by [`SeriesPoint::commit_index`].
    #[serde(default)]
    pub commits: Vec<String>,
    #[serde(default)]
    pub series_data: Vec<SeriesPoint>,
    #[serde(default)]
    pub deleted_features: Vec<DeletedFeatureRecord>,
}

/// A feature touched by a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub feature_index: usize,
    pub commit_index: usize,
    #[serde(default)]
    pub commit_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// A feature that no longer exists in the current tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedFeatureRecord {
    pub feature_name: String,
    #[serde(default)]
    pub last_commit_time: String,
    #[serde(default)]
    pub commit_hash: String,
}
