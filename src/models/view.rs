use serde::{Deserialize, Serialize};

/// The projection currently shown.
///
/// - `Tree` and `Treemap` are hierarchical: their node numbering reserves
///   index 0 for a synthetic root.
/// - `TanglingGraph` and `Scattering` are graph views over flat indices.
/// - `Timeline` and `DeletedFeatures` are driven by the feature history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartView {
    #[default]
    Tree,
    Treemap,
    #[serde(rename = "tangling")]
    TanglingGraph,
    Scattering,
    Timeline,
    #[serde(rename = "deleted")]
    DeletedFeatures,
}

impl ChartView {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tree => "tree",
            Self::Treemap => "treemap",
            Self::TanglingGraph => "tangling",
            Self::Scattering => "scattering",
            Self::Timeline => "timeline",
            Self::DeletedFeatures => "deleted",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "tree" => Some(Self::Tree),
            "treemap" => Some(Self::Treemap),
            "tangling" => Some(Self::TanglingGraph),
            "scattering" => Some(Self::Scattering),
            "timeline" => Some(Self::Timeline),
            "deleted" => Some(Self::DeletedFeatures),
            _ => None,
        }
    }

    /// Views whose highlight indices live in the hierarchical index space.
    pub fn is_hierarchical(&self) -> bool {
        matches!(self, Self::Tree | Self::Treemap)
    }

    /// Views rendered from the feature history rather than the feature tree.
    pub fn needs_history(&self) -> bool {
        matches!(self, Self::Timeline | Self::DeletedFeatures)
    }
}

/// Tangling graph layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphMode {
    #[default]
    Circular,
    /// Force-directed "normal graph" layout.
    Normal,
}

impl GraphMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Circular => "circular",
            Self::Normal => "normal",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "circular" => Some(Self::Circular),
            "normal" => Some(Self::Normal),
            _ => None,
        }
    }

    /// Layout name handed to the renderer.
    pub fn layout(&self) -> &'static str {
        match self {
            Self::Circular => "circular",
            Self::Normal => "force",
        }
    }

    /// Link stroke width: wide strokes for the force layout, thin for the circle.
    pub fn link_width(&self) -> f64 {
        match self {
            Self::Circular => 2.0,
            Self::Normal => 5.0,
        }
    }
}
