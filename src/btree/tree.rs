//! Tree creation, search, insertion (with preemptive top-down split), and
//! deletion (with predecessor replacement and borrow/merge underflow
//! handling). Grounded in `createBtree`/`findKey`/`insertKey`/`deleteKey`/
//! `handleUnderflow` in `btree_mgr.c`.

use super::node::{Node, NodeId};
use crate::error::{Result, StorageError};
use crate::types::{DataType, Rid, Value};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A debug/visualization snapshot of one tree node, serializable for
/// tooling. Mirrors the teacher crate's `TreeNode` export type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub is_leaf: bool,
    pub keys: Vec<String>,
    pub rids: Vec<String>,
    pub children: Vec<TreeNode>,
}

/// Search `keys` for `key`. `Ok(idx)` means `keys[idx] == key`; `Err(idx)`
/// means `key` belongs at position `idx` (i.e. it is less than `keys[idx]`,
/// or `idx == keys.len()`).
fn find_pos(keys: &[Value], key: &Value) -> Result<std::result::Result<usize, usize>> {
    for (i, k) in keys.iter().enumerate() {
        match key.compare_typed(k)? {
            Ordering::Equal => return Ok(Ok(i)),
            Ordering::Less => return Ok(Err(i)),
            Ordering::Greater => {}
        }
    }
    Ok(Err(keys.len()))
}

/// An in-memory B+-tree mapping typed keys to record identifiers.
pub struct BTree {
    arena: Vec<Option<Node>>,
    free: Vec<NodeId>,
    root: Option<NodeId>,
    key_type: DataType,
    /// Maximum entries per node before it must split.
    max_keys: usize,
    /// Minimum entries a non-root node must retain after a deletion.
    min_keys: usize,
    num_nodes: usize,
    num_entries: usize,
}

impl BTree {
    /// Create an empty tree of order `n`. `n` bounds the number of children
    /// an internal node may have at the order's minimum fill, giving
    /// `max_keys = 2n - 1` entries per node before a split. Mirrors
    /// `createBtree`.
    pub fn create(key_type: DataType, n: usize) -> Result<Self> {
        if n < 2 {
            return Err(StorageError::invalid_operation(
                "B+-tree order must be at least 2",
            ));
        }
        let max_keys = 2 * n - 1;
        Ok(Self {
            arena: Vec::new(),
            free: Vec::new(),
            root: None,
            key_type,
            max_keys,
            min_keys: max_keys / 2,
            num_nodes: 0,
            num_entries: 0,
        })
    }

    /// Open a (by-name, by-convention) tree handle. Per the Open Question
    /// decision on index persistence, this always starts empty: the tree's
    /// contents are never written to or read from a backing file. Mirrors
    /// `openBtree`.
    pub fn open(key_type: DataType, n: usize) -> Result<Self> {
        Self::create(key_type, n)
    }

    pub fn key_type(&self) -> DataType {
        self.key_type
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn num_entries(&self) -> usize {
        self.num_entries
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.arena[id] = Some(node);
            id
        } else {
            self.arena.push(Some(node));
            self.num_nodes += 1;
            self.arena.len() - 1
        }
    }

    fn release(&mut self, id: NodeId) {
        self.arena[id] = None;
        self.free.push(id);
        self.num_nodes -= 1;
    }

    fn get(&self, id: NodeId) -> &Node {
        self.arena[id].as_ref().expect("dangling node id")
    }

    fn take(&mut self, id: NodeId) -> Node {
        self.arena[id].take().expect("dangling node id")
    }

    fn put(&mut self, id: NodeId, node: Node) {
        self.arena[id] = Some(node);
    }

    fn check_key_type(&self, key: &Value) -> Result<()> {
        if key.data_type() != self.key_type {
            return Err(StorageError::invalid_operation(format!(
                "tree keyed on {:?}, got {:?}",
                self.key_type,
                key.data_type()
            )));
        }
        Ok(())
    }

    /// Look up `key`. Mirrors `findKey`.
    pub fn search(&self, key: &Value) -> Result<Rid> {
        self.check_key_type(key)?;
        let mut cur = self.root.ok_or(StorageError::ImKeyNotFound)?;
        loop {
            let node = self.get(cur);
            match find_pos(&node.keys, key)? {
                Ok(idx) => return Ok(node.rids[idx]),
                Err(idx) => {
                    if node.is_leaf {
                        return Err(StorageError::ImKeyNotFound);
                    }
                    cur = node.children[idx];
                }
            }
        }
    }

    /// Insert `key` -> `rid`. Mirrors `insertKey`/`splitFullRoot`/
    /// `insertInNonFull`.
    pub fn insert(&mut self, key: Value, rid: Rid) -> Result<()> {
        self.check_key_type(&key)?;

        let root_id = match self.root {
            Some(id) => id,
            None => {
                let id = self.alloc(Node::leaf());
                self.root = Some(id);
                id
            }
        };

        if self.get(root_id).keys.len() == self.max_keys {
            let new_root_id = self.alloc(Node::internal());
            let mut new_root = self.take(new_root_id);
            new_root.children.push(root_id);
            self.put(new_root_id, new_root);
            self.split_child(new_root_id, 0);
            self.root = Some(new_root_id);
        }

        self.insert_non_full(self.root.unwrap(), key, rid)
    }

    fn split_child(&mut self, parent_id: NodeId, i: usize) {
        let mut parent = self.take(parent_id);
        let child_id = parent.children[i];
        let mut child = self.take(child_id);
        let mid = child.keys.len() / 2;

        let sibling = if child.is_leaf {
            let sep_key = child.keys.remove(mid);
            let sep_rid = child.rids.remove(mid);
            let sib_keys = child.keys.split_off(mid);
            let sib_rids = child.rids.split_off(mid);
            parent.keys.insert(i, sep_key);
            parent.rids.insert(i, sep_rid);
            Node {
                is_leaf: true,
                keys: sib_keys,
                rids: sib_rids,
                children: Vec::new(),
            }
        } else {
            let sep_key = child.keys.remove(mid);
            let sep_rid = child.rids.remove(mid);
            let sib_keys = child.keys.split_off(mid);
            let sib_rids = child.rids.split_off(mid);
            let sib_children = child.children.split_off(mid + 1);
            parent.keys.insert(i, sep_key);
            parent.rids.insert(i, sep_rid);
            Node {
                is_leaf: false,
                keys: sib_keys,
                rids: sib_rids,
                children: sib_children,
            }
        };

        self.put(child_id, child);
        let sibling_id = self.alloc(sibling);
        parent.children.insert(i + 1, sibling_id);
        self.put(parent_id, parent);
    }

    fn insert_non_full(&mut self, node_id: NodeId, key: Value, rid: Rid) -> Result<()> {
        if self.get(node_id).is_leaf {
            let mut node = self.take(node_id);
            let result = match find_pos(&node.keys, &key) {
                Ok(Ok(_)) => Err(StorageError::invalid_operation("duplicate key")),
                Ok(Err(pos)) => {
                    node.keys.insert(pos, key);
                    node.rids.insert(pos, rid);
                    Ok(())
                }
                Err(e) => Err(e),
            };
            self.put(node_id, node);
            if result.is_ok() {
                self.num_entries += 1;
            }
            return result;
        }

        let mut i = match find_pos(&self.get(node_id).keys, &key)? {
            Ok(_) => return Err(StorageError::invalid_operation("duplicate key")),
            Err(pos) => pos,
        };

        let child_id = self.get(node_id).children[i];
        if self.get(child_id).keys.len() == self.max_keys {
            self.split_child(node_id, i);
            if key.compare_typed(&self.get(node_id).keys[i])? == Ordering::Greater {
                i += 1;
            }
        }
        let child_id = self.get(node_id).children[i];
        self.insert_non_full(child_id, key, rid)
    }

    /// Delete `key`. Mirrors `deleteKey`/`handleUnderflow`.
    pub fn delete(&mut self, key: &Value) -> Result<()> {
        self.check_key_type(key)?;
        let root_id = self.root.ok_or(StorageError::ImKeyNotFound)?;
        self.delete_rec(root_id, key)?;

        let root = self.get(root_id);
        if !root.is_leaf && root.keys.is_empty() {
            let new_root = root.children[0];
            self.release(root_id);
            self.root = Some(new_root);
        }
        Ok(())
    }

    fn delete_rec(&mut self, node_id: NodeId, key: &Value) -> Result<()> {
        if self.get(node_id).is_leaf {
            let mut node = self.take(node_id);
            let result = match find_pos(&node.keys, key)? {
                Ok(idx) => {
                    node.keys.remove(idx);
                    node.rids.remove(idx);
                    Ok(())
                }
                Err(_) => Err(StorageError::ImKeyNotFound),
            };
            if result.is_ok() {
                self.num_entries -= 1;
            }
            self.put(node_id, node);
            return result;
        }

        match find_pos(&self.get(node_id).keys, key)? {
            Ok(idx) => {
                self.fix_child(node_id, idx)?;
                match find_pos(&self.get(node_id).keys, key)? {
                    Ok(idx2) => {
                        let child_id = self.get(node_id).children[idx2];
                        // remove_max's decrement is the correct net effect here: the
                        // predecessor leaves its leaf slot and overwrites (not
                        // extends) node.keys[idx2], so the tree's total entry count
                        // drops by exactly one, same as a direct leaf deletion.
                        let (pred_key, pred_rid) = self.remove_max(child_id)?;
                        let mut node = self.take(node_id);
                        node.keys[idx2] = pred_key;
                        node.rids[idx2] = pred_rid;
                        self.put(node_id, node);
                        Ok(())
                    }
                    Err(descend_idx) => {
                        let child_id = self.get(node_id).children[descend_idx];
                        self.delete_rec(child_id, key)
                    }
                }
            }
            Err(descend_idx) => {
                self.fix_child(node_id, descend_idx)?;
                let idx = match find_pos(&self.get(node_id).keys, key)? {
                    Ok(i) => i,
                    Err(i) => i,
                };
                let child_id = self.get(node_id).children[idx];
                self.delete_rec(child_id, key)
            }
        }
    }

    /// Remove and return the largest entry in the subtree rooted at
    /// `node_id`, fixing underflow along the descent path.
    fn remove_max(&mut self, node_id: NodeId) -> Result<(Value, Rid)> {
        if self.get(node_id).is_leaf {
            let mut node = self.take(node_id);
            let k = node.keys.pop().expect("non-empty leaf");
            let r = node.rids.pop().expect("non-empty leaf");
            self.num_entries -= 1;
            self.put(node_id, node);
            return Ok((k, r));
        }
        let last_idx = self.get(node_id).children.len() - 1;
        self.fix_child(node_id, last_idx)?;
        let new_last_idx = self.get(node_id).children.len() - 1;
        let child_id = self.get(node_id).children[new_last_idx];
        self.remove_max(child_id)
    }

    /// Ensure `children[child_idx]` has more than `min_keys` entries,
    /// borrowing from a sibling or merging as needed.
    fn fix_child(&mut self, parent_id: NodeId, child_idx: usize) -> Result<()> {
        let child_id = self.get(parent_id).children[child_idx];
        if self.get(child_id).keys.len() > self.min_keys {
            return Ok(());
        }
        let num_children = self.get(parent_id).children.len();

        if child_idx > 0 {
            let left_id = self.get(parent_id).children[child_idx - 1];
            if self.get(left_id).keys.len() > self.min_keys {
                self.borrow_from_left(parent_id, child_idx);
                return Ok(());
            }
        }
        if child_idx + 1 < num_children {
            let right_id = self.get(parent_id).children[child_idx + 1];
            if self.get(right_id).keys.len() > self.min_keys {
                self.borrow_from_right(parent_id, child_idx);
                return Ok(());
            }
        }
        if child_idx + 1 < num_children {
            self.merge(parent_id, child_idx);
        } else {
            self.merge(parent_id, child_idx - 1);
        }
        Ok(())
    }

    fn borrow_from_left(&mut self, parent_id: NodeId, child_idx: usize) {
        let mut parent = self.take(parent_id);
        let left_id = parent.children[child_idx - 1];
        let child_id = parent.children[child_idx];
        let mut left = self.take(left_id);
        let mut child = self.take(child_id);

        if child.is_leaf {
            let k = left.keys.pop().unwrap();
            let r = left.rids.pop().unwrap();
            child.keys.insert(0, k.clone());
            child.rids.insert(0, r);
            parent.keys[child_idx - 1] = k;
            parent.rids[child_idx - 1] = r;
        } else {
            let sep_key = parent.keys[child_idx - 1].clone();
            let sep_rid = parent.rids[child_idx - 1];
            child.keys.insert(0, sep_key);
            child.rids.insert(0, sep_rid);
            let moved_child = left.children.pop().unwrap();
            child.children.insert(0, moved_child);
            let new_sep_key = left.keys.pop().unwrap();
            let new_sep_rid = left.rids.pop().unwrap();
            parent.keys[child_idx - 1] = new_sep_key;
            parent.rids[child_idx - 1] = new_sep_rid;
        }

        self.put(left_id, left);
        self.put(child_id, child);
        self.put(parent_id, parent);
    }

    fn borrow_from_right(&mut self, parent_id: NodeId, child_idx: usize) {
        let mut parent = self.take(parent_id);
        let child_id = parent.children[child_idx];
        let right_id = parent.children[child_idx + 1];
        let mut child = self.take(child_id);
        let mut right = self.take(right_id);

        if child.is_leaf {
            let k = right.keys.remove(0);
            let r = right.rids.remove(0);
            child.keys.push(k.clone());
            child.rids.push(r);
            parent.keys[child_idx] = right.keys[0].clone();
            parent.rids[child_idx] = right.rids[0];
        } else {
            let sep_key = parent.keys[child_idx].clone();
            let sep_rid = parent.rids[child_idx];
            child.keys.push(sep_key);
            child.rids.push(sep_rid);
            let moved_child = right.children.remove(0);
            child.children.push(moved_child);
            let new_sep_key = right.keys.remove(0);
            let new_sep_rid = right.rids.remove(0);
            parent.keys[child_idx] = new_sep_key;
            parent.rids[child_idx] = new_sep_rid;
        }

        self.put(child_id, child);
        self.put(right_id, right);
        self.put(parent_id, parent);
    }

    /// Merge `children[child_idx]` and `children[child_idx + 1]`, pulling
    /// the separator between them down from the parent. The merged content
    /// ends up under `children[child_idx]`'s node id.
    fn merge(&mut self, parent_id: NodeId, child_idx: usize) {
        let mut parent = self.take(parent_id);
        let left_id = parent.children[child_idx];
        let right_id = parent.children[child_idx + 1];
        let sep_key = parent.keys.remove(child_idx);
        let sep_rid = parent.rids.remove(child_idx);
        parent.children.remove(child_idx + 1);

        let mut left = self.take(left_id);
        let right = self.take(right_id);

        if left.is_leaf {
            left.keys.extend(right.keys);
            left.rids.extend(right.rids);
        } else {
            left.keys.push(sep_key);
            left.rids.push(sep_rid);
            left.keys.extend(right.keys);
            left.rids.extend(right.rids);
            left.children.extend(right.children);
        }

        self.release(right_id);
        self.put(left_id, left);
        self.put(parent_id, parent);
    }

    /// Materialize every entry in ascending key order. Mirrors
    /// `openTreeScan`'s `addEntries`.
    pub fn entries(&self) -> Vec<(Value, Rid)> {
        let mut out = Vec::with_capacity(self.num_entries);
        if let Some(root) = self.root {
            self.collect_inorder(root, &mut out);
        }
        out
    }

    fn collect_inorder(&self, node_id: NodeId, out: &mut Vec<(Value, Rid)>) {
        let node = self.get(node_id);
        if node.is_leaf {
            for i in 0..node.keys.len() {
                out.push((node.keys[i].clone(), node.rids[i]));
            }
        } else {
            for i in 0..node.keys.len() {
                self.collect_inorder(node.children[i], out);
                out.push((node.keys[i].clone(), node.rids[i]));
            }
            self.collect_inorder(node.children[node.keys.len()], out);
        }
    }

    /// Export the tree as a serializable snapshot for debugging/tooling.
    pub fn export_tree(&self) -> Option<TreeNode> {
        self.root.map(|id| self.export_node(id))
    }

    fn export_node(&self, node_id: NodeId) -> TreeNode {
        let node = self.get(node_id);
        TreeNode {
            is_leaf: node.is_leaf,
            keys: node.keys.iter().map(|k| k.to_string()).collect(),
            rids: node.rids.iter().map(|r| r.to_string()).collect(),
            children: node.children.iter().map(|&c| self.export_node(c)).collect(),
        }
    }

    /// A human-readable dump of the tree shape. Mirrors `printTree`.
    pub fn debug_dump(&self) -> String {
        let mut out = String::new();
        if let Some(root) = self.root {
            self.dump_node(root, 0, &mut out);
        } else {
            out.push_str("(empty)\n");
        }
        out
    }

    fn dump_node(&self, node_id: NodeId, depth: usize, out: &mut String) {
        let node = self.get(node_id);
        let indent = "  ".repeat(depth);
        let kind = if node.is_leaf { "leaf" } else { "internal" };
        out.push_str(&format!(
            "{indent}{kind}#{node_id} keys={:?}\n",
            node.keys.iter().map(|k| k.to_string()).collect::<Vec<_>>()
        ));
        for &child in &node.children {
            self.dump_node(child, depth + 1, out);
        }
    }
}
