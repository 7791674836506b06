//! Feature history: the commit timeline and the deleted-features table.
//!
//! The timeline's category axis lists feature names. Selecting a subset of
//! features rebuilds that axis in the original feature order and renumbers
//! every point's feature index to match it.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::color::Color;
use crate::error::{FormatError, SelectionInputError};
use crate::models::{DeletedFeatureRecord, FeatureSnapshot, SeriesPoint};

pub const DEFAULT_CATEGORY: &str = "default";

const CRITICAL: Color = Color::rgb(0xe7, 0x4c, 0x3c);
const NORMAL: Color = Color::rgb(0x2e, 0xcc, 0x71);
const MINOR: Color = Color::rgb(0xf1, 0xc4, 0x0f);
const PRIMARY: Color = Color::rgb(0x5e, 0x42, 0xa6);

/// Length of the abbreviated commit hash shown in the deleted-features table.
pub const SHORT_HASH_LEN: usize = 7;

/// Point color for a category tag. Unknown tags use the default color.
pub fn category_color(category: &str) -> Color {
    match category {
        "critical" => CRITICAL,
        "normal" => NORMAL,
        "minor" => MINOR,
        _ => PRIMARY,
    }
}

/// Anything positioned on the feature axis.
pub trait FeaturePoint: Clone {
    fn feature_index(&self) -> usize;
    fn set_feature_index(&mut self, index: usize);
}

impl FeaturePoint for SeriesPoint {
    fn feature_index(&self) -> usize {
        self.feature_index
    }

    fn set_feature_index(&mut self, index: usize) {
        self.feature_index = index;
    }
}

/// A decorated timeline point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelinePoint {
    pub feature_index: usize,
    pub commit_index: usize,
    pub commit_hash: String,
    pub category: String,
    /// Feature name, fixed when the point is created.
    pub name: String,
    pub commit_time: String,
    pub color: Color,
}

impl FeaturePoint for TimelinePoint {
    fn feature_index(&self) -> usize {
        self.feature_index
    }

    fn set_feature_index(&mut self, index: usize) {
        self.feature_index = index;
    }
}

/// Result of a feature selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineSelection<P> {
    pub categories: Vec<String>,
    pub points: Vec<P>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<SelectionInputError>,
}

impl<P> TimelineSelection<P> {
    /// Nothing selected.
    pub fn empty() -> Self {
        Self {
            categories: Vec::new(),
            points: Vec::new(),
            warning: None,
        }
    }
}

/// Keep only the points of `selected` features and renumber their feature axis.
///
/// Categories keep the relative order of `all_feature_names`; the order of
/// `selected` is irrelevant. A name listed twice in `all_feature_names` maps to
/// one category. Selected names that do not exist are dropped and reported in
/// `warning`. Points pass through unchanged apart from their feature index.
pub fn filter<P: FeaturePoint>(
    full_points: &[P],
    all_feature_names: &[String],
    selected: &[String],
) -> TimelineSelection<P> {
    if selected.is_empty() {
        return TimelineSelection::empty();
    }

    let wanted: HashSet<&str> = selected.iter().map(String::as_str).collect();

    let mut categories = Vec::new();
    let mut new_index_by_name: HashMap<&str, usize> = HashMap::new();
    let mut remap: Vec<Option<usize>> = Vec::with_capacity(all_feature_names.len());
    for name in all_feature_names {
        if !wanted.contains(name.as_str()) {
            remap.push(None);
            continue;
        }
        let new_index = *new_index_by_name.entry(name.as_str()).or_insert_with(|| {
            categories.push(name.clone());
            categories.len() - 1
        });
        remap.push(Some(new_index));
    }

    let mut unknown = Vec::new();
    let mut reported = HashSet::new();
    for name in selected {
        if !new_index_by_name.contains_key(name.as_str()) && reported.insert(name.as_str()) {
            unknown.push(name.clone());
        }
    }
    let warning = if unknown.is_empty() {
        None
    } else {
        let warning = SelectionInputError::UnknownFeatures { names: unknown };
        tracing::warn!("Timeline: {}", warning);
        Some(warning)
    };

    let points = full_points
        .iter()
        .filter_map(|point| {
            let new_index = remap.get(point.feature_index()).copied().flatten()?;
            let mut point = point.clone();
            point.set_feature_index(new_index);
            Some(point)
        })
        .collect();

    TimelineSelection {
        categories,
        points,
        warning,
    }
}

/// The full timeline of one history snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineView {
    pub features: Vec<String>,
    pub commits: Vec<String>,
    pub points: Vec<TimelinePoint>,
}

impl TimelineView {
    /// Decorate every point of `snapshot`.
    ///
    /// Fails when a point references a feature or commit that is not listed.
    pub fn from_snapshot(snapshot: &FeatureSnapshot) -> Result<Self, FormatError> {
        let points = snapshot
            .series_data
            .iter()
            .enumerate()
            .map(|(index, point)| {
                let (Some(name), Some(commit_time)) = (
                    snapshot.features.get(point.feature_index),
                    snapshot.commits.get(point.commit_index),
                ) else {
                    return Err(FormatError::PointOutOfRange {
                        index,
                        feature_index: point.feature_index,
                        commit_index: point.commit_index,
                    });
                };
                let category = point
                    .category
                    .clone()
                    .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
                Ok(TimelinePoint {
                    feature_index: point.feature_index,
                    commit_index: point.commit_index,
                    commit_hash: point.commit_hash.clone(),
                    color: category_color(&category),
                    category,
                    name: name.clone(),
                    commit_time: commit_time.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            features: snapshot.features.clone(),
            commits: snapshot.commits.clone(),
            points,
        })
    }

    /// Restrict the timeline to `selected` features.
    pub fn select(&self, selected: &[String]) -> TimelineSelection<TimelinePoint> {
        filter(&self.points, &self.features, selected)
    }
}

/// A row of the deleted-features table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedFeatureRow {
    pub feature_name: String,
    pub last_commit_time: String,
    pub commit_hash: String,
    pub short_hash: String,
}

impl From<&DeletedFeatureRecord> for DeletedFeatureRow {
    fn from(record: &DeletedFeatureRecord) -> Self {
        Self {
            feature_name: record.feature_name.clone(),
            last_commit_time: record.last_commit_time.clone(),
            commit_hash: record.commit_hash.clone(),
            short_hash: record.commit_hash.chars().take(SHORT_HASH_LEN).collect(),
        }
    }
}

pub fn deleted_feature_rows(snapshot: &FeatureSnapshot) -> Vec<DeletedFeatureRow> {
    snapshot
        .deleted_features
        .iter()
        .map(DeletedFeatureRow::from)
        .collect()
}
