use notebase_core::{build_tree, Corpus, PathTree, PathTreeNode};
use std::collections::BTreeSet;

fn leaves(node: &PathTreeNode) -> BTreeSet<String> {
    node.leaf_keys().into_iter().collect()
}

fn pseudo_random_keys(seed: u64, count: usize) -> Vec<String> {
    let segments = ["a", "b", "notes", "daily", "", "x.md", "y.md"];
    let mut state = seed;
    let mut next = move || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (state >> 33) as usize
    };

    (0..count)
        .map(|_| {
            let depth = 1 + next() % 4;
            (0..depth)
                .map(|_| segments[next() % segments.len()])
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect()
}

#[test]
fn leaf_ids_equal_key_set_for_generated_corpora() {
    for seed in 0..50 {
        let keys = pseudo_random_keys(seed, 25);
        let expected: BTreeSet<String> = keys.iter().cloned().collect();

        let root = build_tree(&keys);
        assert_eq!(leaves(&root), expected, "seed {seed}");

        let rebuilt = build_tree(expected.iter());
        assert_eq!(root, rebuilt, "seed {seed} rebuild differs");
    }
}

#[test]
fn empty_corpus_projects_to_root_only() {
    let tree = PathTree::rebuild(&Corpus::new());
    let root = tree.root();

    assert_eq!(root.id, "root");
    assert!(!root.is_leaf);
    assert!(root.children.is_none());
    assert!(tree.leaf_keys().is_empty());
}

#[test]
fn sibling_leaves_under_one_folder() {
    let root = build_tree(["a/b", "a/c"]);

    assert_eq!(root.children().len(), 1);
    let folder = &root.children()[0];
    assert_eq!(folder.id, "root/a");
    assert!(!folder.is_leaf);

    let ids: Vec<&str> = folder.children().iter().map(|node| node.id.as_str()).collect();
    assert_eq!(ids, vec!["root/a/b", "root/a/c"]);
    assert!(folder.children().iter().all(|node| node.is_leaf));
}

#[test]
fn malformed_notes_still_appear_in_tree() {
    let corpus = Corpus::from_json(r#"{"vault/ok.md": "text", "vault/bad.md": 42}"#).unwrap();
    let tree = PathTree::rebuild(&corpus);

    let bad = tree.find("root/vault/bad.md").expect("malformed note should be in tree");
    assert!(bad.is_leaf);
    assert_eq!(tree.leaf_keys(), vec!["vault/bad.md", "vault/ok.md"]);
}

#[test]
fn tree_json_matches_widget_shape() {
    let root = build_tree(["notes/a.md"]);
    let json = serde_json::to_string(&root).unwrap();

    assert_eq!(
        json,
        r#"{"id":"root","name":"root","isLeaf":false,"children":[{"id":"root/notes","name":"notes","isLeaf":false,"children":[{"id":"root/notes/a.md","name":"a.md","isLeaf":true}]}]}"#
    );

    let decoded: PathTreeNode = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, root);
    assert_eq!(decoded.fingerprint(), root.fingerprint());
}
