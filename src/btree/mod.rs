//! In-memory B+-tree index: typed keys mapped to record identifiers.
//!
//! Grounded in `B+tree/btree_mgr.c`. The tree lives entirely in memory for
//! the handle's lifetime (Open Question: index persistence, SPEC_FULL §6.2)
//! and the `(max_keys, key_type, min_keys)` triple lives on the tree handle
//! rather than a module-level global, fixing the original's process-wide
//! mutable state (SPEC_FULL §5.3).

mod node;
mod scan;
mod tree;

pub use scan::TreeScan;
pub use tree::{BTree, TreeNode};
