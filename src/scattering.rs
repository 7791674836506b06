//! Scattering view: one feature in the middle, the files it touches around it.

use serde::Serialize;

use crate::color::{color_of, link_color, Color};
use crate::models::{Block, FeatureNode};
use crate::tree::FeatureTree;

/// Symbol size of the center feature node.
pub const BASE_SYMBOL_SIZE: f64 = 60.0;
/// Width of a location symbol relative to the center.
const LOCATION_WIDTH_RATIO: f64 = 0.8;

/// Identifier the detail panel shows when no feature is selected.
pub const NO_SELECTION: &str = "-";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatteringCenter {
    pub id: String,
    pub name: String,
    pub scattering_degree: u32,
    pub lines: u64,
    pub total_lines: u64,
    pub color: Color,
    pub symbol_size: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationNode {
    /// The location's path, which identifies it in the graph.
    pub id: String,
    pub name: String,
    /// Line count reported by the producer for this file, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<u64>,
    /// Lines covered by the location's line-range blocks.
    pub attributed_lines: u64,
    /// `attributed_lines / feature.lines`.
    pub coverage: f64,
    pub blocks: Vec<Block>,
    pub color: Color,
    pub symbol_size: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatteringLink {
    pub source: String,
    pub target: String,
    pub coverage: f64,
    pub color: Color,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatteringGraph {
    pub center: ScatteringCenter,
    pub locations: Vec<LocationNode>,
    pub links: Vec<ScatteringLink>,
}

/// Share of a feature's own lines found at one location.
///
/// Only line-range blocks are counted. Whole-file blocks are left out even
/// though the feature's `lines` may include them, so coverages of one
/// feature need not add up to 1. A feature without lines has zero coverage
/// everywhere.
pub fn coverage(attributed_lines: u64, feature_lines: u64) -> f64 {
    if feature_lines == 0 {
        0.0
    } else {
        attributed_lines as f64 / feature_lines as f64
    }
}

/// Build the scattering graph of `feature_id`.
///
/// Returns `None` for the empty selection and for identifiers that are not in
/// the tree.
pub fn assemble(tree: &FeatureTree, feature_id: &str) -> Option<ScatteringGraph> {
    if feature_id.is_empty() || feature_id == NO_SELECTION {
        return None;
    }
    let Some(feature) = tree.find_by_id(feature_id) else {
        tracing::warn!("Scattering requested for unknown feature {}", feature_id);
        return None;
    };
    Some(assemble_feature(feature))
}

pub fn assemble_feature(feature: &FeatureNode) -> ScatteringGraph {
    let center = ScatteringCenter {
        id: feature.id.clone(),
        name: feature.name.clone(),
        scattering_degree: feature.scattering_degree,
        lines: feature.lines,
        total_lines: feature.total_lines,
        color: color_of(&feature.id),
        symbol_size: [BASE_SYMBOL_SIZE, BASE_SYMBOL_SIZE],
    };

    let mut locations = Vec::with_capacity(feature.locations.len());
    let mut links = Vec::with_capacity(feature.locations.len());
    for location in &feature.locations {
        let attributed_lines = location.attributed_lines();
        let coverage = coverage(attributed_lines, feature.lines);
        let width = if attributed_lines == feature.lines {
            BASE_SYMBOL_SIZE
        } else {
            LOCATION_WIDTH_RATIO * BASE_SYMBOL_SIZE
        };

        links.push(ScatteringLink {
            source: feature.id.clone(),
            target: location.path.clone(),
            coverage,
            color: link_color(&feature.id, &location.path),
            width: coverage * BASE_SYMBOL_SIZE * 0.5 + 1.0,
        });
        locations.push(LocationNode {
            id: location.path.clone(),
            name: location.file_name.clone(),
            lines: location.lines,
            attributed_lines,
            coverage,
            blocks: location.blocks.clone(),
            color: color_of(&location.path),
            symbol_size: [width, BASE_SYMBOL_SIZE],
        });
    }

    tracing::debug!(
        "Scattering for {}: {} locations",
        feature.id,
        locations.len()
    );
    ScatteringGraph {
        center,
        locations,
        links,
    }
}
