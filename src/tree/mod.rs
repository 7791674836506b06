//! The normalized feature tree and its two index spaces.
//!
//! Graph views number features by their position in the top-level feature
//! list (the [`FlatIndex`] space). Tree and treemap views number their nodes
//! with a synthetic root at index 0, so the same feature sits at
//! [`HierarchicalIndex`] `flat + 1`. Both numberings are exposed as distinct
//! types so callers never do the offset arithmetic themselves.

pub mod render;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::FormatError;
use crate::models::{BlockKind, FeatureDocument, FeatureNode, TanglingLink};

/// What to do with a document that parses but violates a data invariant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationPolicy {
    /// Reject the whole dataset.
    #[default]
    Strict,
    /// Log every violation and keep the data as the producer sent it.
    Warn,
}

impl ValidationPolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "strict" => Some(Self::Strict),
            "warn" => Some(Self::Warn),
            _ => None,
        }
    }
}

/// Position of a feature in the top-level feature list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatIndex(pub usize);

/// Position of a feature in a tree/treemap rendering, where 0 is the synthetic root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HierarchicalIndex(pub usize);

impl From<FlatIndex> for HierarchicalIndex {
    fn from(flat: FlatIndex) -> Self {
        Self(flat.0 + 1)
    }
}

/// A validated feature forest.
///
/// Owned by one data epoch and replaced wholesale when new data arrives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTree {
    features: Vec<FeatureNode>,
}

impl FeatureTree {
    /// Parse a `{ "features": [...] }` document, rejecting invariant violations.
    pub fn parse(raw: &str) -> Result<Self, FormatError> {
        Self::parse_with(raw, ValidationPolicy::Strict)
    }

    pub fn parse_with(raw: &str, policy: ValidationPolicy) -> Result<Self, FormatError> {
        let document: FeatureDocument = serde_json::from_str(raw)?;
        Self::from_features(document.features, policy)
    }

    /// Validate already-typed features.
    pub fn from_features(
        features: Vec<FeatureNode>,
        policy: ValidationPolicy,
    ) -> Result<Self, FormatError> {
        let violations = validate(&features);
        match policy {
            ValidationPolicy::Strict => {
                if let Some(first) = violations.into_iter().next() {
                    return Err(first);
                }
            }
            ValidationPolicy::Warn => {
                for violation in &violations {
                    tracing::warn!("Accepting feature data despite: {}", violation);
                }
            }
        }
        Ok(Self { features })
    }

    /// The top-level features, in document order.
    pub fn features(&self) -> &[FeatureNode] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Features in flat index order, as graph views number them.
    pub fn graph_order(&self) -> impl Iterator<Item = (FlatIndex, &FeatureNode)> {
        self.features
            .iter()
            .enumerate()
            .map(|(i, node)| (FlatIndex(i), node))
    }

    /// Every node of the forest in depth-first preorder, as tree views walk it.
    ///
    /// Positions in the returned list are offset by one from the rendering's
    /// own numbering, which puts the synthetic root first.
    pub fn hierarchical_order(&self) -> Vec<(HierarchicalIndex, &FeatureNode)> {
        let mut out = Vec::new();
        let mut stack: Vec<&FeatureNode> = self.features.iter().rev().collect();
        while let Some(node) = stack.pop() {
            out.push((HierarchicalIndex(out.len() + 1), node));
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Exact lookup by identifier, searching the whole forest.
    pub fn find_by_id(&self, id: &str) -> Option<&FeatureNode> {
        fn find<'a>(nodes: &'a [FeatureNode], id: &str) -> Option<&'a FeatureNode> {
            nodes.iter().find_map(|node| {
                if node.id == id {
                    Some(node)
                } else {
                    find(&node.children, id)
                }
            })
        }
        find(&self.features, id)
    }

    pub fn total_lines(&self) -> u64 {
        self.features
            .iter()
            .map(|f| f.total_lines)
            .fold(0, u64::saturating_add)
    }
}

/// The "tangling" dataset: every feature at top level plus the links between them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TanglingDataset {
    pub tree: FeatureTree,
    pub links: Vec<TanglingLink>,
}

impl TanglingDataset {
    pub fn parse_with(raw: &str, policy: ValidationPolicy) -> Result<Self, FormatError> {
        let document: FeatureDocument = serde_json::from_str(raw)?;
        Ok(Self {
            tree: FeatureTree::from_features(document.features, policy)?,
            links: document.tangling_links,
        })
    }
}

/// Every invariant violation in `features`, in preorder.
fn validate(features: &[FeatureNode]) -> Vec<FormatError> {
    let mut violations = Vec::new();

    let mut seen = HashSet::new();
    for feature in features {
        if !seen.insert(feature.id.as_str()) {
            violations.push(FormatError::DuplicateId {
                id: feature.id.clone(),
            });
        }
    }

    for feature in features {
        validate_node(feature, &mut violations);
    }
    violations
}

fn validate_node(node: &FeatureNode, violations: &mut Vec<FormatError>) {
    match node
        .children_total_lines()
        .and_then(|children| children.checked_add(node.lines))
    {
        Some(expected) if expected != node.total_lines => {
            violations.push(FormatError::InvariantViolation {
                node_id: node.id.clone(),
                expected,
                actual: node.total_lines,
            });
        }
        Some(_) => {}
        None => violations.push(FormatError::LineCountOverflow {
            node_id: node.id.clone(),
        }),
    }

    for location in &node.locations {
        for block in &location.blocks {
            if block.kind == BlockKind::LineRange && block.end < block.start {
                violations.push(FormatError::InvalidBlock {
                    node_id: node.id.clone(),
                    path: location.path.clone(),
                    start: block.start,
                    end: block.end,
                });
            }
        }
    }

    for child in &node.children {
        validate_node(child, violations);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> String {
        value.to_string()
    }

    #[test]
    fn parses_nested_features() {
        let raw = doc(json!({
            "features": [{
                "id": "A", "name": "A", "lines": 10, "totalLines": 30,
                "children": [{ "id": "A::B", "name": "B", "lines": 20, "totalLines": 20 }]
            }]
        }));
        let tree = FeatureTree::parse(&raw).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.find_by_id("A::B").unwrap().name, "B");
        assert!(tree.find_by_id("missing").is_none());
    }

    #[test]
    fn rejects_rollup_mismatch() {
        let raw = doc(json!({
            "features": [{
                "id": "A", "name": "A", "lines": 10, "totalLines": 31,
                "children": [{ "id": "A::B", "name": "B", "lines": 20, "totalLines": 20 }]
            }]
        }));
        match FeatureTree::parse(&raw) {
            Err(FormatError::InvariantViolation {
                node_id,
                expected,
                actual,
            }) => {
                assert_eq!(node_id, "A");
                assert_eq!(expected, 30);
                assert_eq!(actual, 31);
            }
            other => panic!("expected invariant violation, got {:?}", other),
        }
    }

    #[test]
    fn rejects_line_counts_that_overflow() {
        let raw = doc(json!({
            "features": [{
                "id": "A", "name": "A", "lines": 1, "totalLines": 1,
                "children": [{
                    "id": "A::B", "name": "B", "lines": u64::MAX, "totalLines": u64::MAX
                }]
            }]
        }));
        assert!(matches!(
            FeatureTree::parse(&raw),
            Err(FormatError::LineCountOverflow { node_id }) if node_id == "A"
        ));

        let tree = FeatureTree::parse_with(&raw, ValidationPolicy::Warn).unwrap();
        assert_eq!(tree.total_lines(), 1);
    }

    #[test]
    fn accepts_unrecognized_block_types() {
        let raw = doc(json!({
            "features": [{
                "id": "A", "name": "A", "lines": 3, "totalLines": 3,
                "locations": [{
                    "path": "src/a.rs", "fileName": "a.rs",
                    "blocks": [{ "start": 0, "end": 2, "type": "folder" }]
                }]
            }]
        }));
        let tree = FeatureTree::parse(&raw).unwrap();
        assert_eq!(tree.features()[0].locations[0].attributed_lines(), 3);
    }

    #[test]
    fn warn_policy_keeps_data() {
        let raw = doc(json!({
            "features": [{ "id": "A", "name": "A", "lines": 1, "totalLines": 5 }]
        }));
        let tree = FeatureTree::parse_with(&raw, ValidationPolicy::Warn).unwrap();
        assert_eq!(tree.features()[0].total_lines, 5);
    }

    #[test]
    fn rejects_inverted_line_range() {
        let raw = doc(json!({
            "features": [{
                "id": "A", "name": "A", "lines": 0, "totalLines": 0,
                "locations": [{
                    "path": "src/a.rs", "fileName": "a.rs",
                    "blocks": [{ "start": 9, "end": 3, "type": "line-range" }]
                }]
            }]
        }));
        assert!(matches!(
            FeatureTree::parse(&raw),
            Err(FormatError::InvalidBlock { start: 9, end: 3, .. })
        ));
    }

    #[test]
    fn file_blocks_may_carry_sentinel_offsets() {
        let raw = doc(json!({
            "features": [{
                "id": "A", "name": "A", "lines": 0, "totalLines": 0,
                "locations": [{
                    "path": "src/a.rs", "fileName": "a.rs",
                    "blocks": [{ "start": 0, "end": -1, "type": "file" }]
                }]
            }]
        }));
        assert!(FeatureTree::parse(&raw).is_ok());
    }

    #[test]
    fn rejects_duplicate_top_level_ids() {
        let raw = doc(json!({
            "features": [
                { "id": "A", "name": "A" },
                { "id": "A", "name": "A again" }
            ]
        }));
        assert!(matches!(
            FeatureTree::parse(&raw),
            Err(FormatError::DuplicateId { .. })
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            FeatureTree::parse("{\"features\": [{\"name\": 3}]}"),
            Err(FormatError::Json(_))
        ));
    }

    #[test]
    fn index_spaces_differ_by_root_offset() {
        let raw = doc(json!({
            "features": [
                { "id": "A", "name": "A", "children": [{ "id": "A::C", "name": "C" }] },
                { "id": "B", "name": "B" }
            ]
        }));
        let tree = FeatureTree::parse(&raw).unwrap();

        let flat: Vec<_> = tree.graph_order().map(|(i, n)| (i.0, n.id.as_str())).collect();
        assert_eq!(flat, vec![(0, "A"), (1, "B")]);

        let hierarchical: Vec<_> = tree
            .hierarchical_order()
            .into_iter()
            .map(|(i, n)| (i.0, n.id.as_str()))
            .collect();
        assert_eq!(hierarchical, vec![(1, "A"), (2, "A::C"), (3, "B")]);

        assert_eq!(HierarchicalIndex::from(FlatIndex(4)), HierarchicalIndex(5));
    }
}
