//! Text search over feature names and identifiers.
//!
//! A query resolves to match positions in both index spaces at once, so the
//! caller highlights with whichever one the active view uses.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::QueryInputError;
use crate::models::ChartView;
use crate::tree::{FeatureTree, FlatIndex, HierarchicalIndex};

/// Independent matching flags.
///
/// With `use_regex` set, the query is a pattern and only `case_sensitive`
/// applies. Otherwise `exact_match` selects full-string equality over
/// substring containment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMode {
    #[serde(default)]
    pub use_regex: bool,
    #[serde(default)]
    pub exact_match: bool,
    #[serde(default)]
    pub case_sensitive: bool,
}

/// Matching features, in flat order, in both index spaces.
///
/// `hierarchical[i]` is always `flat[i] + 1`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchMatches {
    pub flat: Vec<FlatIndex>,
    pub hierarchical: Vec<HierarchicalIndex>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<QueryInputError>,
}

impl SearchMatches {
    fn push(&mut self, index: FlatIndex) {
        self.flat.push(index);
        self.hierarchical.push(index.into());
    }

    pub fn is_empty(&self) -> bool {
        self.flat.is_empty()
    }

    pub fn len(&self) -> usize {
        self.flat.len()
    }

    /// Indices to highlight in `view`.
    pub fn indices_for(&self, view: ChartView) -> Vec<usize> {
        if view.is_hierarchical() {
            self.hierarchical.iter().map(|i| i.0).collect()
        } else {
            self.flat.iter().map(|i| i.0).collect()
        }
    }
}

enum Matcher {
    Pattern(Regex),
    Exact { needle: String, fold: bool },
    Contains { needle: String, fold: bool },
}

impl Matcher {
    fn new(text: &str, mode: SearchMode) -> Result<Self, QueryInputError> {
        if mode.use_regex {
            return RegexBuilder::new(text)
                .case_insensitive(!mode.case_sensitive)
                .build()
                .map(Matcher::Pattern)
                .map_err(|e| QueryInputError::InvalidPattern {
                    pattern: text.to_string(),
                    message: e.to_string(),
                });
        }

        let fold = !mode.case_sensitive;
        let needle = if fold {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        Ok(if mode.exact_match {
            Matcher::Exact { needle, fold }
        } else {
            Matcher::Contains { needle, fold }
        })
    }

    fn matches(&self, candidate: &str) -> bool {
        match self {
            Matcher::Pattern(regex) => regex.is_match(candidate),
            Matcher::Exact { needle, fold: true } => candidate.to_lowercase() == *needle,
            Matcher::Exact { needle, fold: false } => candidate == needle,
            Matcher::Contains { needle, fold: true } => {
                candidate.to_lowercase().contains(needle.as_str())
            }
            Matcher::Contains { needle, fold: false } => candidate.contains(needle.as_str()),
        }
    }
}

/// Search over the flat feature list of one data epoch.
pub struct SearchIndex<'a> {
    tree: &'a FeatureTree,
    match_identifiers: bool,
}

impl<'a> SearchIndex<'a> {
    /// `match_identifiers` decides whether identifiers are searched besides
    /// names. Hidden identifiers must not be searchable.
    pub fn new(tree: &'a FeatureTree, match_identifiers: bool) -> Self {
        Self {
            tree,
            match_identifiers,
        }
    }

    /// Index configured for `view`: hierarchical views never match
    /// identifiers, graph views do when they are shown.
    pub fn for_view(tree: &'a FeatureTree, view: ChartView, show_identifiers: bool) -> Self {
        Self::new(tree, show_identifiers && !view.is_hierarchical())
    }

    /// Resolve `text` to matching features.
    ///
    /// An empty query yields no matches. An invalid pattern yields no matches
    /// and a warning.
    pub fn query(&self, text: &str, mode: SearchMode) -> SearchMatches {
        let mut matches = SearchMatches::default();
        if text.is_empty() {
            return matches;
        }

        let matcher = match Matcher::new(text, mode) {
            Ok(matcher) => matcher,
            Err(e) => {
                tracing::warn!("Search: {}", e);
                matches.warning = Some(e);
                return matches;
            }
        };

        for (index, feature) in self.tree.graph_order() {
            let hit = matcher.matches(&feature.name)
                || (self.match_identifiers && matcher.matches(&feature.id));
            if hit {
                matches.push(index);
            }
        }

        tracing::debug!("Search {:?} matched {} features", text, matches.len());
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FeatureNode;
    use crate::tree::ValidationPolicy;

    fn leaf(id: &str, name: &str) -> FeatureNode {
        FeatureNode {
            id: id.to_string(),
            name: name.to_string(),
            total_lines: 0,
            lines: 0,
            tangling_degree: 0,
            scattering_degree: 0,
            children: vec![],
            locations: vec![],
        }
    }

    fn tree() -> FeatureTree {
        FeatureTree::from_features(
            vec![
                leaf("Shop", "Shop"),
                leaf("Shop::Drinks", "Drinks"),
                leaf("Shop::Food", "Food"),
                leaf("Shop::Food::Seafood", "Seafood"),
            ],
            ValidationPolicy::Strict,
        )
        .unwrap()
    }

    fn flat(matches: &SearchMatches) -> Vec<usize> {
        matches.flat.iter().map(|i| i.0).collect()
    }

    #[test]
    fn substring_is_case_insensitive_by_default() {
        let tree = tree();
        let matches = SearchIndex::new(&tree, false).query("food", SearchMode::default());
        assert_eq!(flat(&matches), vec![2, 3]);
        assert_eq!(
            matches.hierarchical,
            vec![HierarchicalIndex(3), HierarchicalIndex(4)]
        );
    }

    #[test]
    fn exact_match_compares_whole_strings() {
        let tree = tree();
        let mode = SearchMode {
            exact_match: true,
            ..SearchMode::default()
        };
        let matches = SearchIndex::new(&tree, false).query("food", mode);
        assert_eq!(flat(&matches), vec![2]);
    }

    #[test]
    fn case_sensitive_substring() {
        let tree = tree();
        let mode = SearchMode {
            case_sensitive: true,
            ..SearchMode::default()
        };
        let index = SearchIndex::new(&tree, false);
        assert!(index.query("food", mode).is_empty());
        assert_eq!(flat(&index.query("Food", mode)), vec![2]);
    }

    #[test]
    fn identifiers_only_match_when_enabled() {
        let tree = tree();
        let mode = SearchMode::default();
        assert_eq!(
            flat(&SearchIndex::new(&tree, true).query("shop::d", mode)),
            vec![1]
        );
        assert!(SearchIndex::new(&tree, false).query("shop::d", mode).is_empty());
    }

    #[test]
    fn hierarchical_views_never_match_identifiers() {
        let tree = tree();
        let index = SearchIndex::for_view(&tree, ChartView::Treemap, true);
        assert!(index.query("shop::d", SearchMode::default()).is_empty());
    }

    #[test]
    fn regex_ignores_exact_flag() {
        let tree = tree();
        let mode = SearchMode {
            use_regex: true,
            exact_match: true,
            case_sensitive: false,
        };
        let matches = SearchIndex::new(&tree, false).query("^(drinks|food)$", mode);
        assert_eq!(flat(&matches), vec![1, 2]);
    }

    #[test]
    fn invalid_regex_is_zero_matches_with_warning() {
        let tree = tree();
        let mode = SearchMode {
            use_regex: true,
            ..SearchMode::default()
        };
        let matches = SearchIndex::new(&tree, true).query("foo(", mode);
        assert!(matches.is_empty());
        assert!(matches!(
            matches.warning,
            Some(QueryInputError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn empty_query_clears() {
        let tree = tree();
        let regex = SearchMode {
            use_regex: true,
            ..SearchMode::default()
        };
        assert!(SearchIndex::new(&tree, true).query("", regex).is_empty());
        assert!(SearchIndex::new(&tree, true)
            .query("", SearchMode::default())
            .is_empty());
    }

    #[test]
    fn indices_for_view_pick_the_right_space() {
        let tree = tree();
        let matches = SearchIndex::new(&tree, false).query("drinks", SearchMode::default());
        assert_eq!(matches.indices_for(ChartView::Tree), vec![2]);
        assert_eq!(matches.indices_for(ChartView::TanglingGraph), vec![1]);
    }
}
