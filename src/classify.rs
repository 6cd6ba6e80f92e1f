use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Serialize;

use crate::models::EtbRow;

pub const SEPARATOR: &str = " > ";

// ---------------------------------------------------------------------------
// ClassificationPath
// ---------------------------------------------------------------------------

/// One to four non-empty labels, e.g. `Assets > Current > Cash`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct ClassificationPath(Vec<String>);

impl ClassificationPath {
    /// The row's non-empty grouping labels in order, or `None` when it has none.
    pub fn from_row(row: &EtbRow) -> Option<Self> {
        let labels = row.grouping_labels();
        if labels.is_empty() {
            return None;
        }
        Some(Self(labels.into_iter().map(str::to_string).collect()))
    }

    /// Split on `" > "` only, so a label such as `A>B` stays one segment.
    pub fn parse(s: &str) -> Option<Self> {
        let segments: Vec<String> = s
            .trim()
            .split(SEPARATOR)
            .map(|seg| seg.trim().to_string())
            .collect();
        if segments.iter().any(|seg| seg.is_empty()) {
            return None;
        }
        Some(Self(segments))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn label(&self) -> &str {
        self.0.last().map(String::as_str).unwrap_or_default()
    }

    /// True when `self` is a strict prefix of `other` at segment boundaries.
    pub fn is_strict_prefix_of(&self, other: &ClassificationPath) -> bool {
        self.depth() < other.depth() && other.0.starts_with(&self.0)
    }

    fn prefix(&self, depth: usize) -> Self {
        Self(self.0[..depth].to_vec())
    }
}

impl fmt::Display for ClassificationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(SEPARATOR))
    }
}

/// False when `label` would read as more than one segment once joined into a path.
pub fn is_clean_label(label: &str) -> bool {
    !format!(" {label} ").contains(SEPARATOR)
}

impl From<ClassificationPath> for String {
    fn from(path: ClassificationPath) -> Self {
        path.to_string()
    }
}

// ---------------------------------------------------------------------------
// Sibling ordering
// ---------------------------------------------------------------------------

fn squash(label: &str) -> String {
    label
        .chars()
        .filter(|c| !matches!(c, '-' | ' ' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

fn is_current(label: &str) -> bool {
    squash(label) == "current"
}

fn is_non_current(label: &str) -> bool {
    squash(label) == "noncurrent"
}

/// Put sibling entries in presentation order: lexicographic by label, except that when
/// both a "Non-current" and a "Current" sibling exist, the non-current ones move to sit
/// immediately before the first current one.
pub fn sort_siblings<T>(items: &mut Vec<T>, label: impl Fn(&T) -> &str) {
    items.sort_by(|a, b| label(a).cmp(label(b)));
    let has_current = items.iter().any(|i| is_current(label(i)));
    if !has_current || !items.iter().any(|i| is_non_current(label(i))) {
        return;
    }
    let (moved, mut rest): (Vec<T>, Vec<T>) = std::mem::take(items)
        .into_iter()
        .partition(|i| is_non_current(label(i)));
    let at = rest.iter().position(|i| is_current(label(i))).unwrap_or(0);
    rest.splice(at..at, moved);
    *items = rest;
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

pub type NodeId = usize;

#[derive(Debug, Clone, Serialize)]
pub struct ClassificationNode {
    pub path: ClassificationPath,
    pub parent: Option<NodeId>,
    pub children: BTreeMap<String, NodeId>,
    /// Indices into the dataset's rows whose full path equals this node's path.
    pub direct_rows: Vec<usize>,
}

impl ClassificationNode {
    /// A node is a leaf when no deeper classification extends it.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.path.depth()
    }

    pub fn label(&self) -> &str {
        self.path.label()
    }
}

/// Arena of classification nodes keyed by path, built once per dataset.
#[derive(Debug, Clone, Default)]
pub struct ClassificationTree {
    nodes: Vec<ClassificationNode>,
    index: HashMap<ClassificationPath, NodeId>,
    roots: BTreeMap<String, NodeId>,
    unclassified: Vec<usize>,
}

impl ClassificationTree {
    pub fn build(rows: &[EtbRow]) -> Self {
        let mut tree = Self::default();
        for (row_idx, row) in rows.iter().enumerate() {
            match ClassificationPath::from_row(row) {
                Some(path) => {
                    let id = tree.insert(&path);
                    tree.nodes[id].direct_rows.push(row_idx);
                }
                None => tree.unclassified.push(row_idx),
            }
        }
        tree
    }

    /// Insert `path` and every strict prefix of it, returning the node for `path`.
    fn insert(&mut self, path: &ClassificationPath) -> NodeId {
        let mut parent: Option<NodeId> = None;
        for depth in 1..=path.depth() {
            let key = path.prefix(depth);
            let id = match self.index.get(&key) {
                Some(&id) => id,
                None => {
                    let id = self.nodes.len();
                    let label = key.label().to_string();
                    self.nodes.push(ClassificationNode {
                        path: key.clone(),
                        parent,
                        children: BTreeMap::new(),
                        direct_rows: Vec::new(),
                    });
                    self.index.insert(key, id);
                    match parent {
                        Some(p) => {
                            debug_assert!(self.nodes[p].path.is_strict_prefix_of(&self.nodes[id].path));
                            self.nodes[p].children.insert(label, id);
                        }
                        None => {
                            self.roots.insert(label, id);
                        }
                    }
                    id
                }
            };
            parent = Some(id);
        }
        // depth >= 1 is guaranteed by ClassificationPath construction
        parent.unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &ClassificationNode {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &ClassificationNode)> {
        self.nodes.iter().enumerate()
    }

    pub fn find(&self, path: &ClassificationPath) -> Option<NodeId> {
        self.index.get(path).copied()
    }

    pub fn find_str(&self, path: &str) -> Option<NodeId> {
        ClassificationPath::parse(path).and_then(|p| self.find(&p))
    }

    /// Every depth-1 node whose label matches `label` ignoring case, in presentation order.
    pub fn roots_named(&self, label: &str) -> Vec<NodeId> {
        self.roots()
            .into_iter()
            .filter(|&id| self.nodes[id].label().eq_ignore_ascii_case(label.trim()))
            .collect()
    }

    /// Depth-1 nodes in presentation order.
    pub fn roots(&self) -> Vec<NodeId> {
        ordered(&self.roots)
    }

    /// Children of `id` in presentation order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        ordered(&self.nodes[id].children)
    }

    /// Indices of rows that have no grouping labels at all.
    pub fn unclassified(&self) -> &[usize] {
        &self.unclassified
    }

    pub fn is_ancestor(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        while let Some(parent) = self.nodes[node].parent {
            if parent == ancestor {
                return true;
            }
            node = parent;
        }
        false
    }

    /// Leaf nodes at depth 3 or deeper, grouped by their depth-1 and depth-2 labels.
    ///
    /// A node that some row stops at but that another row extends is not a leaf and is
    /// left out here, although its rows still count in every rollup.
    pub fn navigation(&self) -> Vec<NavigationGroup> {
        let mut groups = Vec::new();
        for root in self.roots() {
            let mut sections = Vec::new();
            for section in self.children(root) {
                let mut leaves = Vec::new();
                self.collect_leaves(section, &mut leaves);
                if !leaves.is_empty() {
                    sections.push(NavigationSection {
                        label: self.nodes[section].label().to_string(),
                        node: section,
                        leaves,
                    });
                }
            }
            if !sections.is_empty() {
                groups.push(NavigationGroup {
                    label: self.nodes[root].label().to_string(),
                    node: root,
                    sections,
                });
            }
        }
        groups
    }

    fn collect_leaves(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let node = &self.nodes[id];
        if node.is_leaf() {
            if node.depth() >= 3 {
                out.push(id);
            }
            return;
        }
        for child in self.children(id) {
            self.collect_leaves(child, out);
        }
    }
}

fn ordered(map: &BTreeMap<String, NodeId>) -> Vec<NodeId> {
    let mut entries: Vec<(&String, &NodeId)> = map.iter().collect();
    sort_siblings(&mut entries, |e| e.0.as_str());
    entries.into_iter().map(|(_, &id)| id).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationGroup {
    pub label: String,
    pub node: NodeId,
    pub sections: Vec<NavigationSection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationSection {
    pub label: String,
    pub node: NodeId,
    pub leaves: Vec<NodeId>,
}
