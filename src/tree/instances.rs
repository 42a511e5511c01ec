//! Tree operations: insert, remove, reparent, selectors.

use std::collections::{HashMap, VecDeque};

use slotmap::{SecondaryMap, SlotMap};
use thiserror::Error;

use super::node::{InstanceData, NodeKey};
use super::InstanceKinds;
use crate::ids::InstanceId;

/// Empty slice constant for returning when a node has no children.
const EMPTY_CHILDREN: &[NodeKey] = &[];

/// Structural errors from editing an [`Instances`] tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("instance `{0}` already exists")]
    DuplicateInstance(InstanceId),
    #[error("instance `{0}` does not exist")]
    UnknownInstance(InstanceId),
    #[error("cannot move `{node}` under its own descendant `{parent}`")]
    Cycle { node: InstanceId, parent: InstanceId },
}

/// In-memory instance tree, backed by a slotmap arena.
///
/// Nodes live in a single `SlotMap`; parent/child links are kept in
/// secondary maps and an index maps stable [`InstanceId`]s to slots.
#[derive(Debug, Clone, Default)]
pub struct Instances {
    nodes: SlotMap<NodeKey, InstanceData>,
    children: SecondaryMap<NodeKey, Vec<NodeKey>>,
    parent: SecondaryMap<NodeKey, NodeKey>,
    index: HashMap<InstanceId, NodeKey>,
    root: Option<NodeKey>,
}

impl Instances {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a parentless instance. The first one inserted becomes the root.
    pub fn insert(&mut self, data: InstanceData) -> Result<NodeKey, TreeError> {
        let key = self.alloc(data)?;
        if self.root.is_none() {
            self.root = Some(key);
        }
        Ok(key)
    }

    /// Insert an instance as the last child of `parent`.
    pub fn insert_child(
        &mut self,
        parent: &InstanceId,
        data: InstanceData,
    ) -> Result<NodeKey, TreeError> {
        let parent_key = self.key(parent)?;
        let key = self.alloc(data)?;
        self.parent.insert(key, parent_key);
        if let Some(siblings) = self.children.get_mut(parent_key) {
            siblings.push(key);
        }
        Ok(key)
    }

    fn alloc(&mut self, data: InstanceData) -> Result<NodeKey, TreeError> {
        if self.index.contains_key(&data.id) {
            return Err(TreeError::DuplicateInstance(data.id));
        }
        let id = data.id.clone();
        let key = self.nodes.insert(data);
        self.children.insert(key, Vec::new());
        self.index.insert(id, key);
        Ok(key)
    }

    fn key(&self, id: &InstanceId) -> Result<NodeKey, TreeError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| TreeError::UnknownInstance(id.clone()))
    }

    /// Remove an instance and all its descendants.
    ///
    /// Returns the removed instance's data, or `None` if it didn't exist.
    pub fn remove(&mut self, id: &InstanceId) -> Option<InstanceData> {
        let key = self.index.get(id).copied()?;

        if let Some(parent_key) = self.parent.remove(key) {
            if let Some(siblings) = self.children.get_mut(parent_key) {
                siblings.retain(|&child| child != key);
            }
        }
        if self.root == Some(key) {
            self.root = None;
        }

        let mut to_remove = VecDeque::from([key]);
        let mut removed = None;
        while let Some(current) = to_remove.pop_front() {
            if let Some(kids) = self.children.remove(current) {
                to_remove.extend(kids);
            }
            self.parent.remove(current);
            if let Some(data) = self.nodes.remove(current) {
                self.index.remove(&data.id);
                if current == key {
                    removed = Some(data);
                }
            }
        }
        removed
    }

    /// Move `node` (with its subtree) under `new_parent`.
    pub fn reparent(&mut self, node: &InstanceId, new_parent: &InstanceId) -> Result<(), TreeError> {
        let key = self.key(node)?;
        let parent_key = self.key(new_parent)?;
        if key == parent_key || self.ancestor_keys(parent_key).contains(&key) {
            return Err(TreeError::Cycle {
                node: node.clone(),
                parent: new_parent.clone(),
            });
        }

        if let Some(old_parent) = self.parent.remove(key) {
            if let Some(siblings) = self.children.get_mut(old_parent) {
                siblings.retain(|&child| child != key);
            }
        }
        if self.root == Some(key) {
            self.root = None;
        }
        self.parent.insert(key, parent_key);
        if let Some(siblings) = self.children.get_mut(parent_key) {
            siblings.push(key);
        }
        Ok(())
    }

    fn ancestor_keys(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut result = Vec::new();
        let mut current = key;
        while let Some(p) = self.parent.get(current).copied() {
            result.push(p);
            current = p;
        }
        result
    }

    fn id_of(&self, key: NodeKey) -> Option<&InstanceId> {
        self.nodes.get(key).map(|data| &data.id)
    }

    /// The selector of `id`: the instance itself followed by its ancestors up
    /// to the root. `None` if the instance doesn't exist.
    pub fn selector(&self, id: &InstanceId) -> Option<Vec<InstanceId>> {
        let key = self.index.get(id).copied()?;
        let mut selector = vec![id.clone()];
        selector.extend(
            self.ancestor_keys(key)
                .into_iter()
                .filter_map(|k| self.id_of(k).cloned()),
        );
        Some(selector)
    }

    pub fn parent(&self, id: &InstanceId) -> Option<&InstanceId> {
        let key = self.index.get(id)?;
        self.parent.get(*key).and_then(|p| self.id_of(*p))
    }

    /// Children of an instance in insertion order. Empty if the instance has
    /// no children or does not exist.
    pub fn children(&self, id: &InstanceId) -> Vec<&InstanceId> {
        let kids = self
            .index
            .get(id)
            .and_then(|key| self.children.get(*key))
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_CHILDREN);
        kids.iter().filter_map(|k| self.id_of(*k)).collect()
    }

    pub fn get(&self, id: &InstanceId) -> Option<&InstanceData> {
        self.index.get(id).and_then(|key| self.nodes.get(*key))
    }

    pub fn root(&self) -> Option<&InstanceId> {
        self.root.and_then(|key| self.id_of(key))
    }

    pub fn contains(&self, id: &InstanceId) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Pre-order depth-first traversal starting from `start`.
    pub fn walk_depth_first(&self, start: &InstanceId) -> Vec<&InstanceId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeKey> = self.index.get(start).copied().into_iter().collect();
        while let Some(current) = stack.pop() {
            let Some(data) = self.nodes.get(current) else {
                continue;
            };
            result.push(&data.id);
            if let Some(kids) = self.children.get(current) {
                stack.extend(kids.iter().rev().copied());
            }
        }
        result
    }
}

impl InstanceKinds for Instances {
    fn kind(&self, id: &InstanceId) -> Option<&str> {
        self.get(id).map(|data| data.kind.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn id(s: &str) -> InstanceId {
        InstanceId::new(s)
    }

    fn ids(items: &[&str]) -> Vec<InstanceId> {
        items.iter().map(|s| id(s)).collect()
    }

    /// Build a small test tree:
    /// ```text
    ///       body
    ///      /    \
    ///   list     footer
    ///   /  \
    /// card  title
    /// ```
    fn build_tree() -> Instances {
        let mut tree = Instances::new();
        tree.insert(InstanceData::new("body", "Body")).unwrap();
        tree.insert_child(&id("body"), InstanceData::new("list", "Collection"))
            .unwrap();
        tree.insert_child(&id("body"), InstanceData::new("footer", "Box"))
            .unwrap();
        tree.insert_child(&id("list"), InstanceData::new("card", "Box"))
            .unwrap();
        tree.insert_child(&id("list"), InstanceData::new("title", "Text"))
            .unwrap();
        tree
    }

    #[test]
    fn insert_sets_root() {
        let tree = build_tree();
        assert_eq!(tree.root(), Some(&id("body")));
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut tree = build_tree();
        let err = tree
            .insert_child(&id("body"), InstanceData::new("card", "Box"))
            .unwrap_err();
        assert_eq!(err, TreeError::DuplicateInstance(id("card")));
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn insert_under_unknown_parent() {
        let mut tree = build_tree();
        let err = tree
            .insert_child(&id("nope"), InstanceData::new("x", "Box"))
            .unwrap_err();
        assert_eq!(err.to_string(), "instance `nope` does not exist");
    }

    #[test]
    fn selector_is_target_first() {
        let tree = build_tree();
        assert_eq!(tree.selector(&id("card")), Some(ids(&["card", "list", "body"])));
        assert_eq!(tree.selector(&id("body")), Some(ids(&["body"])));
        assert_eq!(tree.selector(&id("ghost")), None);
    }

    #[test]
    fn parent_and_children() {
        let tree = build_tree();
        assert_eq!(tree.parent(&id("card")), Some(&id("list")));
        assert_eq!(tree.parent(&id("body")), None);
        assert_eq!(tree.children(&id("list")), vec![&id("card"), &id("title")]);
        assert!(tree.children(&id("card")).is_empty());
    }

    #[test]
    fn kinds() {
        let tree = build_tree();
        assert_eq!(tree.kind(&id("list")), Some("Collection"));
        assert_eq!(tree.kind(&id("ghost")), None);
    }

    #[test]
    fn remove_subtree() {
        let mut tree = build_tree();
        let removed = tree.remove(&id("list")).unwrap();
        assert_eq!(removed.kind, "Collection");
        assert!(!tree.contains(&id("card")));
        assert!(!tree.contains(&id("title")));
        assert_eq!(tree.children(&id("body")), vec![&id("footer")]);
        assert_eq!(tree.len(), 2);
        assert!(tree.remove(&id("list")).is_none());
    }

    #[test]
    fn removed_ids_can_be_reused() {
        let mut tree = build_tree();
        tree.remove(&id("card"));
        assert!(tree
            .insert_child(&id("footer"), InstanceData::new("card", "Box"))
            .is_ok());
        assert_eq!(tree.selector(&id("card")), Some(ids(&["card", "footer", "body"])));
    }

    #[test]
    fn reparent_moves_subtree() {
        let mut tree = build_tree();
        tree.reparent(&id("list"), &id("footer")).unwrap();
        assert_eq!(
            tree.selector(&id("title")),
            Some(ids(&["title", "list", "footer", "body"]))
        );
    }

    #[test]
    fn reparent_under_descendant_is_a_cycle() {
        let mut tree = build_tree();
        let err = tree.reparent(&id("list"), &id("card")).unwrap_err();
        assert!(matches!(err, TreeError::Cycle { .. }));
        assert_eq!(tree.parent(&id("list")), Some(&id("body")));
    }

    #[test]
    fn walk_depth_first() {
        let tree = build_tree();
        let order: Vec<&str> = tree
            .walk_depth_first(&id("body"))
            .into_iter()
            .map(InstanceId::as_str)
            .collect();
        assert_eq!(order, vec!["body", "list", "card", "title", "footer"]);
    }
}
