//! Path-tree projection of corpus keys.
//!
//! # Responsibility
//! - Turn a flat set of `/`-delimited keys into one nested tree for browsing.
//! - Map tree node ids back to corpus keys.
//!
//! # Invariants
//! - Leaf ids with the `root/` prefix stripped equal the input key set exactly.
//! - Children are ordered by segment name, so rebuilding is deterministic.
//! - A node with zero children carries `children: None`.
//! - Zero-length segments are kept as nodes named `""`.

use crate::model::corpus::{Corpus, KEY_SEPARATOR};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Id and name of the synthetic root node.
pub const ROOT_ID: &str = "root";

/// One path segment in the projected tree.
///
/// Serializes as `{ "id", "name", "isLeaf", "children"? }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathTreeNode {
    /// Slash-joined chain of segment names from the root.
    pub id: String,
    /// Segment string.
    pub name: String,
    /// True iff `id` minus the root prefix is a corpus key.
    pub is_leaf: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<PathTreeNode>>,
}

impl PathTreeNode {
    /// Child nodes, empty for childless nodes.
    pub fn children(&self) -> &[PathTreeNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Finds a node by id in this subtree.
    pub fn find(&self, id: &str) -> Option<&PathTreeNode> {
        if self.id == id {
            return Some(self);
        }
        // Ids are prefix chains, so only one child can lead to `id`.
        let rest = id.strip_prefix(self.id.as_str())?;
        if !rest.starts_with(KEY_SEPARATOR) {
            return None;
        }
        self.children()
            .iter()
            .find(|child| id == child.id || id.starts_with(&format!("{}{KEY_SEPARATOR}", child.id)))
            .and_then(|child| child.find(id))
    }

    /// Corpus keys recovered from leaf nodes, in tree order.
    pub fn leaf_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        collect_leaf_keys(self, &mut keys);
        keys
    }

    /// Total number of nodes including this one.
    pub fn node_count(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(PathTreeNode::node_count)
            .sum::<usize>()
    }

    /// Content hash of the tree, stable across rebuilds of the same key set.
    /// Changes iff the serialized tree changes.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hash_node(self, &mut hasher);
        hasher.finalize().to_hex().to_string()
    }
}

/// Path tree for one corpus snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTree {
    root: PathTreeNode,
}

impl PathTree {
    /// Builds the tree for the current corpus key set.
    pub fn rebuild(corpus: &Corpus) -> Self {
        Self {
            root: build_tree(corpus.keys()),
        }
    }

    pub fn root(&self) -> &PathTreeNode {
        &self.root
    }

    /// Tree widgets take a forest; this tree always has exactly one root.
    pub fn to_forest(&self) -> Vec<PathTreeNode> {
        vec![self.root.clone()]
    }

    pub fn find(&self, id: &str) -> Option<&PathTreeNode> {
        self.root.find(id)
    }

    pub fn leaf_keys(&self) -> Vec<String> {
        self.root.leaf_keys()
    }

    pub fn fingerprint(&self) -> String {
        self.root.fingerprint()
    }
}

impl Default for PathTree {
    fn default() -> Self {
        Self {
            root: build_tree(std::iter::empty::<&str>()),
        }
    }
}

#[derive(Default)]
struct DraftNode {
    is_leaf: bool,
    children: BTreeMap<String, DraftNode>,
}

/// Builds a tree under a synthetic `root` node from path keys.
///
/// A key that is also the prefix of another key (`a` and `a/b`) produces a
/// node that is a leaf and still has children.
pub fn build_tree<I, S>(keys: I) -> PathTreeNode
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut root = DraftNode::default();
    for key in keys {
        let mut cursor = &mut root;
        for segment in key.as_ref().split(KEY_SEPARATOR) {
            cursor = cursor.children.entry(segment.to_string()).or_default();
        }
        cursor.is_leaf = true;
    }

    finish_node(ROOT_ID.to_string(), ROOT_ID.to_string(), root)
}

/// Maps a node id back to its corpus key. Returns `None` for the root itself
/// and for ids outside this tree.
pub fn node_id_to_key(id: &str) -> Option<&str> {
    id.strip_prefix(ROOT_ID)?.strip_prefix(KEY_SEPARATOR)
}

/// Maps a corpus key to its node id.
pub fn key_to_node_id(key: &str) -> String {
    format!("{ROOT_ID}{KEY_SEPARATOR}{key}")
}

fn finish_node(id: String, name: String, draft: DraftNode) -> PathTreeNode {
    let children = draft
        .children
        .into_iter()
        .map(|(segment, child)| {
            let child_id = format!("{id}{KEY_SEPARATOR}{segment}");
            finish_node(child_id, segment, child)
        })
        .collect::<Vec<_>>();

    PathTreeNode {
        id,
        name,
        is_leaf: draft.is_leaf,
        children: if children.is_empty() {
            None
        } else {
            Some(children)
        },
    }
}

fn collect_leaf_keys(node: &PathTreeNode, keys: &mut Vec<String>) {
    if node.is_leaf {
        if let Some(key) = node_id_to_key(&node.id) {
            keys.push(key.to_string());
        }
    }
    for child in node.children() {
        collect_leaf_keys(child, keys);
    }
}

fn hash_node(node: &PathTreeNode, hasher: &mut blake3::Hasher) {
    // Length prefixes keep `ab`+`c` distinct from `a`+`bc`.
    hasher.update(&(node.id.len() as u64).to_le_bytes());
    hasher.update(node.id.as_bytes());
    hasher.update(&(node.name.len() as u64).to_le_bytes());
    hasher.update(node.name.as_bytes());
    hasher.update(&[u8::from(node.is_leaf), u8::from(node.children.is_some())]);
    hasher.update(&(node.children().len() as u64).to_le_bytes());
    for child in node.children() {
        hash_node(child, hasher);
    }
}

#[cfg(test)]
mod tests {
    use super::{build_tree, key_to_node_id, node_id_to_key, PathTree, PathTreeNode, ROOT_ID};
    use crate::model::corpus::Corpus;
    use std::collections::BTreeSet;

    fn leaf_set(node: &PathTreeNode) -> BTreeSet<String> {
        node.leaf_keys().into_iter().collect()
    }

    #[test]
    fn empty_key_set_yields_root_only() {
        let root = build_tree(Vec::<String>::new());
        assert_eq!(root.id, ROOT_ID);
        assert_eq!(root.name, ROOT_ID);
        assert!(!root.is_leaf);
        assert!(root.children.is_none());
    }

    #[test]
    fn shared_prefix_becomes_interior_node() {
        let root = build_tree(["a/b", "a/c"]);

        let children = root.children();
        assert_eq!(children.len(), 1);
        let a = &children[0];
        assert_eq!(a.id, "root/a");
        assert_eq!(a.name, "a");
        assert!(!a.is_leaf);

        let leaves = a.children();
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0].id, "root/a/b");
        assert_eq!(leaves[1].id, "root/a/c");
        assert!(leaves.iter().all(|leaf| leaf.is_leaf && leaf.children.is_none()));
    }

    #[test]
    fn key_that_prefixes_another_key_stays_a_leaf() {
        let root = build_tree(["a", "a/b"]);
        let a = root.find("root/a").expect("node should exist");

        assert!(a.is_leaf);
        assert_eq!(a.children().len(), 1);
        assert_eq!(
            leaf_set(&root),
            BTreeSet::from(["a".to_string(), "a/b".to_string()])
        );
    }

    #[test]
    fn empty_segments_are_kept_as_nodes() {
        let keys = ["/lead", "x//y", "trail/"];
        let root = build_tree(keys);

        let lead_parent = root.find("root/").expect("leading empty segment node");
        assert_eq!(lead_parent.name, "");
        assert!(!lead_parent.is_leaf);
        assert!(root.find("root/x/").is_some());
        assert!(root.find("root/trail/").map(|node| node.is_leaf).unwrap_or(false));

        let expected: BTreeSet<String> = keys.iter().map(|key| key.to_string()).collect();
        assert_eq!(leaf_set(&root), expected);
    }

    #[test]
    fn leaf_keys_round_trip_varied_key_sets() {
        let key_sets: Vec<Vec<&str>> = vec![
            vec!["single"],
            vec!["vault/daily/2024-01-01.md", "vault/daily/2024-01-02.md", "vault/index.md"],
            vec!["a", "a/b", "a/b/c", "b"],
            vec!["", "/", "//"],
            vec!["ünïcode/ñote.md", "emoji/📝.md"],
        ];

        for keys in key_sets {
            let expected: BTreeSet<String> = keys.iter().map(|key| key.to_string()).collect();
            let root = build_tree(&keys);
            assert_eq!(leaf_set(&root), expected, "round trip failed for {keys:?}");
        }
    }

    #[test]
    fn rebuild_is_deterministic_regardless_of_input_order() {
        let forward = build_tree(["b/2", "a/1", "b/1"]);
        let reversed = build_tree(["b/1", "a/1", "b/2"]);

        assert_eq!(forward, reversed);
        assert_eq!(forward.fingerprint(), reversed.fingerprint());
        assert_eq!(forward.children()[0].name, "a");
    }

    #[test]
    fn fingerprint_changes_with_structure() {
        let before = build_tree(["a/b"]);
        let after = build_tree(["a/b", "a/c"]);
        assert_ne!(before.fingerprint(), after.fingerprint());
    }

    #[test]
    fn node_ids_map_back_to_keys() {
        assert_eq!(node_id_to_key("root/vault/a.md"), Some("vault/a.md"));
        assert_eq!(node_id_to_key("root"), None);
        assert_eq!(node_id_to_key("rooted/a"), None);
        assert_eq!(node_id_to_key("root/"), Some(""));
        assert_eq!(key_to_node_id("vault/a.md"), "root/vault/a.md");
    }

    #[test]
    fn find_returns_none_for_unknown_ids() {
        let root = build_tree(["ab/c"]);
        assert!(root.find("root/a").is_none());
        assert!(root.find("root/ab/c/d").is_none());
        assert!(root.find("other").is_none());
        assert_eq!(root.find("root/ab/c").map(|node| node.is_leaf), Some(true));
    }

    #[test]
    fn serializes_with_camel_case_and_absent_children() {
        let root = build_tree(["a"]);
        let json = serde_json::to_value(&root).unwrap();

        assert_eq!(json["id"], "root");
        assert_eq!(json["isLeaf"], false);
        let leaf = &json["children"][0];
        assert_eq!(leaf["id"], "root/a");
        assert_eq!(leaf["isLeaf"], true);
        assert!(leaf.get("children").is_none());
    }

    #[test]
    fn path_tree_wraps_corpus_keys() {
        let mut corpus = Corpus::new();
        corpus.insert("notes/a.md", "alpha");
        corpus.insert("notes/b.md", "beta");

        let tree = PathTree::rebuild(&corpus);
        assert_eq!(tree.to_forest().len(), 1);
        assert_eq!(tree.root().node_count(), 4);
        assert_eq!(tree.leaf_keys(), vec!["notes/a.md", "notes/b.md"]);
        assert_eq!(PathTree::default().root().node_count(), 1);
    }
}
