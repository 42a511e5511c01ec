//! Instance tree: the hierarchy variables are scoped to.
//!
//! The engine only ever reads a tree. [`InstanceKinds`] is all scope
//! resolution needs from it; [`Instances`] is an in-memory tree for
//! embedders that don't bring their own.

pub mod instances;
pub mod node;

pub use instances::{Instances, TreeError};
pub use node::{InstanceData, NodeKey};

use std::collections::HashMap;
use std::hash::BuildHasher;

use crate::ids::InstanceId;

/// Structural kind ("component") of an instance, by id.
pub trait InstanceKinds {
    fn kind(&self, id: &InstanceId) -> Option<&str>;
}

impl<S: BuildHasher> InstanceKinds for HashMap<InstanceId, String, S> {
    fn kind(&self, id: &InstanceId) -> Option<&str> {
        self.get(id).map(String::as_str)
    }
}
