//! Immutable id-ordered collections and their transaction drafts.

use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use super::model::Entity;
use super::transaction::Delta;

/// An immutable mapping from id to entity, ordered by id.
///
/// Cloning is cheap: the map sits behind an [`Arc`], so snapshots share
/// storage until a transaction replaces it.
pub struct Collection<V: Entity> {
    items: Arc<BTreeMap<V::Id, V>>,
}

impl<V: Entity> Clone for Collection<V> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

impl<V: Entity> Default for Collection<V> {
    fn default() -> Self {
        Self {
            items: Arc::new(BTreeMap::new()),
        }
    }
}

impl<V: Entity> fmt::Debug for Collection<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.items.iter()).finish()
    }
}

impl<V: Entity> PartialEq for Collection<V> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.items, &other.items) || self.items == other.items
    }
}

impl<V: Entity> FromIterator<V> for Collection<V> {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self {
            items: Arc::new(iter.into_iter().map(|v| (v.id().clone(), v)).collect()),
        }
    }
}

impl<V: Entity> Collection<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &V::Id) -> Option<&V> {
        self.items.get(id)
    }

    pub fn contains(&self, id: &V::Id) -> bool {
        self.items.contains_key(id)
    }

    /// Entities in id order.
    pub fn iter(&self) -> btree_map::Values<'_, V::Id, V> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn draft(&self) -> Draft<V> {
        Draft {
            base: self.clone(),
            working: BTreeMap::clone(&self.items),
            touched: BTreeSet::new(),
        }
    }
}

impl<'a, V: Entity> IntoIterator for &'a Collection<V> {
    type Item = &'a V;
    type IntoIter = btree_map::Values<'a, V::Id, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Mutable working copy of a [`Collection`] inside a transaction.
///
/// Writes go to a private copy. The base collection is untouched until the
/// transaction commits, and is simply kept if it aborts.
pub struct Draft<V: Entity> {
    base: Collection<V>,
    working: BTreeMap<V::Id, V>,
    touched: BTreeSet<V::Id>,
}

impl<V: Entity> fmt::Debug for Draft<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Draft")
            .field("len", &self.working.len())
            .field("touched", &self.touched)
            .finish()
    }
}

impl<V: Entity> Draft<V> {
    pub fn get(&self, id: &V::Id) -> Option<&V> {
        self.working.get(id)
    }

    /// Mutable access to one entity.
    ///
    /// Its id must not be changed; the transaction aborts with
    /// [`StoreError::IdChanged`](super::StoreError::IdChanged) if it is.
    pub fn get_mut(&mut self, id: &V::Id) -> Option<&mut V> {
        let entity = self.working.get_mut(id)?;
        self.touched.insert(id.clone());
        Some(entity)
    }

    pub fn contains(&self, id: &V::Id) -> bool {
        self.working.contains_key(id)
    }

    /// Insert or replace an entity, returning the previous one.
    pub fn upsert(&mut self, entity: V) -> Option<V> {
        let id = entity.id().clone();
        self.touched.insert(id.clone());
        self.working.insert(id, entity)
    }

    pub fn remove(&mut self, id: &V::Id) -> Option<V> {
        let removed = self.working.remove(id)?;
        self.touched.insert(id.clone());
        Some(removed)
    }

    /// Entities in id order, including uncommitted writes.
    pub fn iter(&self) -> btree_map::Values<'_, V::Id, V> {
        self.working.values()
    }

    pub fn len(&self) -> usize {
        self.working.len()
    }

    pub fn is_empty(&self) -> bool {
        self.working.is_empty()
    }

    /// Net changes against the base, in id order. Entities written back
    /// unchanged are not reported.
    pub(crate) fn deltas(&self) -> Vec<Delta<V>> {
        self.touched
            .iter()
            .filter_map(|id| {
                let before = self.base.get(id);
                let after = self.working.get(id);
                (before != after).then(|| Delta {
                    before: before.cloned(),
                    after: after.cloned(),
                })
            })
            .collect()
    }

    /// First touched key whose entity no longer carries that id.
    pub(crate) fn rekeyed(&self) -> Option<&V::Id> {
        self.touched.iter().find(|id| {
            self.working
                .get(*id)
                .is_some_and(|entity| entity.id() != *id)
        })
    }

    pub(crate) fn into_collection(self) -> Collection<V> {
        Collection {
            items: Arc::new(self.working),
        }
    }
}
