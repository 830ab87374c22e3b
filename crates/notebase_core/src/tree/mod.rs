//! Hierarchical browsing view over corpus keys.
//!
//! # Responsibility
//! - Project the flat key set into a nested tree of path segments.
//! - Keep the projection lossless and rebuildable from scratch.

pub mod path_tree;
