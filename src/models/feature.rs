use serde::{Deserialize, Serialize};

/// A feature extracted from a codebase.
///
/// Features form a tree through `children`. Line counts are rolled up by
/// the producer: `total_lines` covers this feature and every descendant,
/// `lines` only the code annotated with this feature directly. The rollup
/// is checked when a [`FeatureTree`](crate::tree::FeatureTree) is parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureNode {
    /// Lexical path qualifier, e.g. `Shop::Checkout::Payment`. Treated as opaque.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub total_lines: u64,
    #[serde(default)]
    pub lines: u64,
    /// Number of distinct other features interleaved with this one.
    #[serde(default)]
    pub tangling_degree: u32,
    /// Number of distinct files this feature spans.
    #[serde(default)]
    pub scattering_degree: u32,
    #[serde(default)]
    pub children: Vec<FeatureNode>,
    #[serde(default)]
    pub locations: Vec<Location>,
}

impl FeatureNode {
    /// Sum of the children's `total_lines`, or `None` if it overflows.
    pub fn children_total_lines(&self) -> Option<u64> {
        self.children
            .iter()
            .try_fold(0u64, |sum, c| sum.checked_add(c.total_lines))
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// A file a feature's code lives in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub path: String,
    pub file_name: String,
    /// Line count the producer attributes to this file, when it reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<u64>,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl Location {
    /// Blocks ordered by start offset. Ties keep their original order.
    pub fn sorted_blocks(&self) -> Vec<&Block> {
        let mut blocks: Vec<&Block> = self.blocks.iter().collect();
        blocks.sort_by_key(|b| b.start);
        blocks
    }

    /// Lines covered by line-range blocks. Whole-file blocks do not count.
    pub fn attributed_lines(&self) -> u64 {
        self.blocks
            .iter()
            .filter_map(Block::line_count)
            .fold(0, u64::saturating_add)
    }
}

/// A run of lines (0-based, inclusive) or a whole-file marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub start: i64,
    pub end: i64,
    #[serde(rename = "type")]
    pub kind: BlockKind,
}

impl Block {
    pub fn line_range(start: i64, end: i64) -> Self {
        Self {
            start,
            end,
            kind: BlockKind::LineRange,
        }
    }

    /// A whole-file block. Its offsets are a sentinel and carry no meaning.
    pub fn whole_file() -> Self {
        Self {
            start: 0,
            end: -1,
            kind: BlockKind::File,
        }
    }

    /// Number of lines in a line-range block; `None` for whole-file blocks.
    pub fn line_count(&self) -> Option<u64> {
        match self.kind {
            BlockKind::LineRange if self.end >= self.start => {
                Some(self.end.abs_diff(self.start).saturating_add(1))
            }
            _ => None,
        }
    }
}

/// How a block was annotated.
///
/// Hosts write their annotation type verbatim; only `"file"` is special and
/// every other tag reads as a line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum BlockKind {
    #[serde(rename = "line-range")]
    LineRange,
    #[serde(rename = "file")]
    File,
}

impl From<String> for BlockKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "file" => Self::File,
            _ => Self::LineRange,
        }
    }
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LineRange => "line-range",
            Self::File => "file",
        }
    }
}

/// Coupling between two features. Undirected by convention; never mirrored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TanglingLink {
    pub source: String,
    pub target: String,
}

/// The raw document a host sends for the "tree" and "tangling" datasets.
///
/// "tree" documents carry root features only. "tangling" documents list every
/// feature at top level and add `tanglingLinks`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureDocument {
    #[serde(default)]
    pub features: Vec<FeatureNode>,
    #[serde(default)]
    pub tangling_links: Vec<TanglingLink>,
}
