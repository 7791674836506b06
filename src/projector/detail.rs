use serde::Serialize;

use crate::models::{Block, BlockKind, FeatureNode, Location};

/// Everything the feature detail panel shows for one feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureDetail {
    pub id: String,
    pub name: String,
    pub tangling_degree: u32,
    pub scattering_degree: u32,
    pub lines: u64,
    pub total_lines: u64,
    /// Sorted by file name.
    pub locations: Vec<LocationDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationDetail {
    pub path: String,
    pub file_name: String,
    /// Sorted by start offset.
    pub blocks: Vec<BlockDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockDetail {
    pub start: i64,
    pub end: i64,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub label: String,
}

impl From<&Block> for BlockDetail {
    fn from(block: &Block) -> Self {
        Self {
            start: block.start,
            end: block.end,
            kind: block.kind,
            label: block_label(block),
        }
    }
}

/// Human-readable block label with 1-based line numbers.
pub fn block_label(block: &Block) -> String {
    match block.kind {
        BlockKind::File => "Feature file".to_string(),
        BlockKind::LineRange if block.start == block.end => format!("Line: {}", block.start + 1),
        BlockKind::LineRange => format!("Line: {} - {}", block.start + 1, block.end + 1),
    }
}

fn location_detail(location: &Location) -> LocationDetail {
    LocationDetail {
        path: location.path.clone(),
        file_name: location.file_name.clone(),
        blocks: location
            .sorted_blocks()
            .into_iter()
            .map(BlockDetail::from)
            .collect(),
    }
}

impl From<&FeatureNode> for FeatureDetail {
    fn from(node: &FeatureNode) -> Self {
        let mut locations: Vec<LocationDetail> =
            node.locations.iter().map(location_detail).collect();
        locations.sort_by_cached_key(|l| l.file_name.to_lowercase());

        Self {
            id: node.id.clone(),
            name: node.name.clone(),
            tangling_degree: node.tangling_degree,
            scattering_degree: node.scattering_degree,
            lines: node.lines,
            total_lines: node.total_lines,
            locations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_one_based() {
        assert_eq!(block_label(&Block::line_range(15, 15)), "Line: 16");
        assert_eq!(block_label(&Block::line_range(0, 9)), "Line: 1 - 10");
        assert_eq!(block_label(&Block::whole_file()), "Feature file");
    }

    #[test]
    fn sorts_locations_and_blocks() {
        let node = FeatureNode {
            id: "Shop::Cart".to_string(),
            name: "Cart".to_string(),
            total_lines: 7,
            lines: 7,
            tangling_degree: 0,
            scattering_degree: 2,
            children: vec![],
            locations: vec![
                Location {
                    path: "src/z.rs".to_string(),
                    file_name: "z.rs".to_string(),
                    lines: None,
                    blocks: vec![
                        Block::line_range(40, 41),
                        Block::line_range(3, 4),
                        Block::line_range(3, 3),
                    ],
                },
                Location {
                    path: "src/a.rs".to_string(),
                    file_name: "a.rs".to_string(),
                    lines: None,
                    blocks: vec![Block::line_range(1, 1)],
                },
            ],
        };

        let detail = FeatureDetail::from(&node);
        assert_eq!(detail.locations[0].file_name, "a.rs");
        let labels: Vec<_> = detail.locations[1]
            .blocks
            .iter()
            .map(|b| b.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Line: 4 - 5", "Line: 4", "Line: 41 - 42"]);
    }

    #[test]
    fn location_order_ignores_case() {
        let location = |name: &str| Location {
            path: format!("src/{}", name),
            file_name: name.to_string(),
            lines: None,
            blocks: vec![Block::line_range(0, 0)],
        };
        let node = FeatureNode {
            id: "Shop".to_string(),
            name: "Shop".to_string(),
            total_lines: 3,
            lines: 3,
            tangling_degree: 0,
            scattering_degree: 3,
            children: vec![],
            locations: vec![location("Zeta.rs"), location("beta.rs"), location("alpha.rs")],
        };

        let names: Vec<_> = FeatureDetail::from(&node)
            .locations
            .into_iter()
            .map(|l| l.file_name)
            .collect();
        assert_eq!(names, vec!["alpha.rs", "beta.rs", "Zeta.rs"]);
    }
}
