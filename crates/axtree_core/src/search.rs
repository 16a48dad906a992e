//! Highlight/search index.
//!
//! Case-insensitive substring match over role label, display name and id.
//! Results are recomputed wholesale for every query.

use std::collections::HashSet;

use axtree_snapshot::AccessibilityNodeRaw;
use tracing::debug;

/// Matching node ids in list order, with O(1) membership.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightSet {
    ordered: Vec<String>,
    members: HashSet<String>,
}

impl HighlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for id in ids {
            set.insert(id.into());
        }
        set
    }

    fn insert(&mut self, id: String) {
        if self.members.insert(id.clone()) {
            self.ordered.push(id);
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    /// First match in list order; the auto-focus target.
    pub fn first(&self) -> Option<&str> {
        self.ordered.first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ordered.iter().map(String::as_str)
    }
}

/// Normalised query: trimmed and lower-cased, `None` when blank.
pub fn normalize_query(query: &str) -> Option<String> {
    let q = query.trim();
    (!q.is_empty()).then(|| q.to_lowercase())
}

pub fn node_matches(node: &AccessibilityNodeRaw, needle: &str) -> bool {
    node.role_key().contains(needle)
        || node.name_label().to_lowercase().contains(needle)
        || node.id.to_lowercase().contains(needle)
}

/// Ids of `nodes` matching `query`. Blank queries match nothing.
pub fn search(nodes: &[AccessibilityNodeRaw], query: &str) -> HighlightSet {
    let Some(needle) = normalize_query(query) else {
        return HighlightSet::new();
    };
    let set = HighlightSet::from_ids(
        nodes
            .iter()
            .filter(|n| node_matches(n, &needle))
            .map(|n| n.id.clone()),
    );
    debug!(query = %needle, matches = set.len(), "search");
    set
}
