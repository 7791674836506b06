//! Pure transforms from a [`FeatureTree`] into per-view shapes.
//!
//! Outputs are recomputed on every view activation and never cached
//! across data epochs.

mod detail;

pub use detail::*;

use serde::Serialize;

use crate::color::{color_of, link_color, Color};
use crate::models::{FeatureNode, GraphMode, Location, TanglingLink};
use crate::tree::FeatureTree;

/// Smallest symbol a tangling node is drawn with.
pub const MIN_SYMBOL_SIZE: f64 = 10.0;
const SYMBOL_SCALE: f64 = 25.0;

/// A node of the hierarchy tree view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeShapeNode {
    pub id: String,
    pub name: String,
    pub lines: u64,
    pub total_lines: u64,
    pub tangling_degree: u32,
    pub scattering_degree: u32,
    pub children: Vec<TreeShapeNode>,
}

/// A node of the area-proportional treemap view. `value` drives the area.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreemapNode {
    pub id: String,
    pub name: String,
    pub value: u64,
    pub locations: Vec<Location>,
    pub children: Vec<TreemapNode>,
}

/// A feature in the tangling graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub name: String,
    /// Text shown next to the node: the identifier or the display name.
    pub label: String,
    pub symbol_size: f64,
    pub color: Color,
    pub tangling_degree: u32,
    pub scattering_degree: u32,
    pub total_lines: u64,
}

/// A link in a graph view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    pub color: Color,
    pub width: f64,
}

/// The tangling graph view model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TanglingGraph {
    pub mode: GraphMode,
    pub layout: &'static str,
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

/// Hierarchy view: the forest as-is, minus locations.
pub fn to_tree_shape(tree: &FeatureTree) -> Vec<TreeShapeNode> {
    fn map(node: &FeatureNode) -> TreeShapeNode {
        TreeShapeNode {
            id: node.id.clone(),
            name: node.name.clone(),
            lines: node.lines,
            total_lines: node.total_lines,
            tangling_degree: node.tangling_degree,
            scattering_degree: node.scattering_degree,
            children: node.children.iter().map(map).collect(),
        }
    }
    tree.features().iter().map(map).collect()
}

/// Treemap view: every node's value is its `total_lines`.
///
/// Given a validated tree, a parent's value equals its own lines plus the sum
/// of its children's values, so it is never smaller than that sum.
pub fn to_treemap_shape(tree: &FeatureTree) -> Vec<TreemapNode> {
    tree.features().iter().map(treemap_node).collect()
}

fn treemap_node(node: &FeatureNode) -> TreemapNode {
    TreemapNode {
        id: node.id.clone(),
        name: node.name.clone(),
        value: node.total_lines,
        locations: node.locations.clone(),
        children: node.children.iter().map(treemap_node).collect(),
    }
}

/// Symbol size for a tangling degree: `max(25 * log2(degree + 1), 10)`.
///
/// Grows sub-linearly so highly tangled features stay readable, while
/// untangled ones stay visible.
pub fn tangling_symbol_size(degree: u32) -> f64 {
    (SYMBOL_SCALE * (f64::from(degree) + 1.0).log2()).max(MIN_SYMBOL_SIZE)
}

/// Tangling view over the flat feature list.
///
/// Links whose endpoints are not in `nodes` are dropped.
pub fn to_tangling_graph(
    nodes: &[FeatureNode],
    links: &[TanglingLink],
    mode: GraphMode,
    show_identifiers: bool,
) -> TanglingGraph {
    let graph_nodes: Vec<GraphNode> = nodes
        .iter()
        .map(|node| GraphNode {
            id: node.id.clone(),
            name: node.name.clone(),
            label: if show_identifiers {
                node.id.clone()
            } else {
                node.name.clone()
            },
            symbol_size: tangling_symbol_size(node.tangling_degree),
            color: color_of(&node.id),
            tangling_degree: node.tangling_degree,
            scattering_degree: node.scattering_degree,
            total_lines: node.total_lines,
        })
        .collect();

    let known = |id: &str| graph_nodes.iter().any(|n| n.id == id);
    let graph_links: Vec<GraphLink> = links
        .iter()
        .filter(|link| {
            let keep = known(&link.source) && known(&link.target);
            if !keep {
                tracing::debug!(
                    "Dropping tangling link {} -> {}: endpoint not in graph",
                    link.source,
                    link.target
                );
            }
            keep
        })
        .map(|link| GraphLink {
            source: link.source.clone(),
            target: link.target.clone(),
            color: link_color(&link.source, &link.target),
            width: mode.link_width(),
        })
        .collect();

    TanglingGraph {
        mode,
        layout: mode.layout(),
        nodes: graph_nodes,
        links: graph_links,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, degree: u32) -> FeatureNode {
        FeatureNode {
            id: id.to_string(),
            name: id.rsplit("::").next().unwrap_or(id).to_string(),
            total_lines: 0,
            lines: 0,
            tangling_degree: degree,
            scattering_degree: 1,
            children: vec![],
            locations: vec![],
        }
    }

    fn link(source: &str, target: &str) -> TanglingLink {
        TanglingLink {
            source: source.to_string(),
            target: target.to_string(),
        }
    }

    #[test]
    fn symbol_size_is_logarithmic_with_floor() {
        assert_eq!(tangling_symbol_size(0), MIN_SYMBOL_SIZE);
        assert_eq!(tangling_symbol_size(1), 25.0);
        assert_eq!(tangling_symbol_size(3), 50.0);
        assert_eq!(tangling_symbol_size(7), 75.0);
        assert!(tangling_symbol_size(100) < 200.0);
    }

    #[test]
    fn link_colors_blend_endpoint_colors() {
        let nodes = vec![node("Shop::Cart", 1), node("Shop::Pay", 1)];
        let graph = to_tangling_graph(
            &nodes,
            &[link("Shop::Cart", "Shop::Pay")],
            GraphMode::Circular,
            true,
        );
        let expected = crate::color::midpoint(color_of("Shop::Cart"), color_of("Shop::Pay"));
        assert_eq!(graph.links[0].color, expected);
        assert_eq!(graph.links[0].width, 2.0);
        assert_eq!(graph.layout, "circular");
    }

    #[test]
    fn force_layout_uses_wider_links() {
        let nodes = vec![node("A", 1), node("B", 1)];
        let graph = to_tangling_graph(&nodes, &[link("A", "B")], GraphMode::Normal, true);
        assert_eq!(graph.links[0].width, 5.0);
        assert_eq!(graph.layout, "force");
    }

    #[test]
    fn labels_follow_identifier_preference() {
        let nodes = vec![node("Shop::Cart", 0)];
        let shown = to_tangling_graph(&nodes, &[], GraphMode::Circular, true);
        let hidden = to_tangling_graph(&nodes, &[], GraphMode::Circular, false);
        assert_eq!(shown.nodes[0].label, "Shop::Cart");
        assert_eq!(hidden.nodes[0].label, "Cart");
    }

    #[test]
    fn dangling_links_are_dropped() {
        let nodes = vec![node("A", 1)];
        let graph = to_tangling_graph(&nodes, &[link("A", "Gone")], GraphMode::Normal, true);
        assert!(graph.links.is_empty());
    }
}
