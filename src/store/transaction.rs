//! Transactions: scoped mutable drafts and the commit record they produce.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::collection::{Collection, Draft};
use super::error::StoreError;
use super::model::{Entity, Prop, Resource, Variable};

/// The collections a transaction may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionName {
    Variables,
    Resources,
    Props,
}

impl CollectionName {
    pub const ALL: [CollectionName; 3] = [
        CollectionName::Variables,
        CollectionName::Resources,
        CollectionName::Props,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CollectionName::Variables => "variables",
            CollectionName::Resources => "resources",
            CollectionName::Props => "props",
        }
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Before and after state of one entity. `None` on either side means the
/// entity did not exist (insert or delete).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delta<V> {
    pub before: Option<V>,
    pub after: Option<V>,
}

/// One entity change, tagged with its collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "collection", rename_all = "lowercase")]
pub enum Change {
    #[serde(rename = "variables")]
    Variable(Delta<Variable>),
    #[serde(rename = "resources")]
    Resource(Delta<Resource>),
    #[serde(rename = "props")]
    Prop(Delta<Prop>),
}

impl Change {
    pub fn collection(&self) -> CollectionName {
        match self {
            Change::Variable(_) => CollectionName::Variables,
            Change::Resource(_) => CollectionName::Resources,
            Change::Prop(_) => CollectionName::Props,
        }
    }
}

/// The published record of a successful transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    /// Store revision after this commit.
    pub revision: u64,
    pub changes: Vec<Change>,
}

impl Commit {
    /// Whether any change touched `collection`.
    pub fn touches(&self, collection: CollectionName) -> bool {
        self.changes.iter().any(|c| c.collection() == collection)
    }
}

/// Mutable view handed to a transaction mutator.
///
/// Only the collections named when the transaction was opened are
/// available; asking for any other is [`StoreError::CollectionNotInScope`].
#[derive(Debug)]
pub struct Transaction {
    variables: Option<Draft<Variable>>,
    resources: Option<Draft<Resource>>,
    props: Option<Draft<Prop>>,
}

impl Transaction {
    pub(crate) fn open(
        names: &[CollectionName],
        variables: &Collection<Variable>,
        resources: &Collection<Resource>,
        props: &Collection<Prop>,
    ) -> Self {
        Self {
            variables: names
                .contains(&CollectionName::Variables)
                .then(|| variables.draft()),
            resources: names
                .contains(&CollectionName::Resources)
                .then(|| resources.draft()),
            props: names.contains(&CollectionName::Props).then(|| props.draft()),
        }
    }

    pub fn variables(&mut self) -> Result<&mut Draft<Variable>, StoreError> {
        self.variables
            .as_mut()
            .ok_or(StoreError::CollectionNotInScope(CollectionName::Variables))
    }

    pub fn resources(&mut self) -> Result<&mut Draft<Resource>, StoreError> {
        self.resources
            .as_mut()
            .ok_or(StoreError::CollectionNotInScope(CollectionName::Resources))
    }

    pub fn props(&mut self) -> Result<&mut Draft<Prop>, StoreError> {
        self.props
            .as_mut()
            .ok_or(StoreError::CollectionNotInScope(CollectionName::Props))
    }

    /// Fails if a mutator overwrote the id of an entity it edited in place.
    pub(crate) fn verify(&self) -> Result<(), StoreError> {
        fn check<V: Entity>(
            draft: Option<&Draft<V>>,
            collection: CollectionName,
        ) -> Result<(), StoreError> {
            match draft.and_then(Draft::rekeyed) {
                Some(id) => Err(StoreError::IdChanged {
                    collection,
                    id: id.to_string(),
                }),
                None => Ok(()),
            }
        }
        check(self.variables.as_ref(), CollectionName::Variables)?;
        check(self.resources.as_ref(), CollectionName::Resources)?;
        check(self.props.as_ref(), CollectionName::Props)
    }

    /// Net changes in collection order (variables, resources, props).
    pub(crate) fn changes(&self) -> Vec<Change> {
        let mut changes = Vec::new();
        if let Some(draft) = &self.variables {
            changes.extend(draft.deltas().into_iter().map(Change::Variable));
        }
        if let Some(draft) = &self.resources {
            changes.extend(draft.deltas().into_iter().map(Change::Resource));
        }
        if let Some(draft) = &self.props {
            changes.extend(draft.deltas().into_iter().map(Change::Prop));
        }
        changes
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        Option<Draft<Variable>>,
        Option<Draft<Resource>>,
        Option<Draft<Prop>>,
    ) {
        (self.variables, self.resources, self.props)
    }
}
