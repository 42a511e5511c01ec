//! Store and operation errors.

use thiserror::Error;

use super::transaction::CollectionName;
use crate::ids::{InstanceId, PropId, ResourceId, VariableId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A transaction touched a collection it did not name up front.
    #[error("collection `{0}` is not part of this transaction")]
    CollectionNotInScope(CollectionName),
    #[error("variable `{0}` does not exist")]
    VariableNotFound(VariableId),
    #[error("resource `{0}` does not exist")]
    ResourceNotFound(ResourceId),
    #[error("instance `{instance}` has no prop `{name}`")]
    PropNotFound { instance: InstanceId, name: String },
    /// A value or resource variable is still referenced by props.
    #[error("cannot delete `{name}`: it is used by {} prop(s)", usages.len())]
    DeletionBlocked { name: String, usages: Vec<PropId> },
    #[error("variable name must not be empty")]
    InvalidName,
    #[error("variable `{0}` is not a parameter")]
    NotAParameter(VariableId),
    /// Parameters can be renamed but never become values or resources, and
    /// the reverse.
    #[error("variable `{0}` cannot change to or from a parameter")]
    ParameterKindChange(VariableId),
    #[error("a selector must name at least one instance")]
    EmptySelector,
    /// An entity's id was overwritten through [`Draft::get_mut`].
    ///
    /// [`Draft::get_mut`]: super::Draft::get_mut
    #[error("{collection} entry `{id}` changed its id")]
    IdChanged { collection: CollectionName, id: String },
}
