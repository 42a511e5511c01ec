//! Canonical collections and the transaction coordinator.

pub mod collection;
pub mod error;
pub mod model;
#[allow(clippy::module_inception)]
pub mod store;
pub mod transaction;

pub use collection::{Collection, Draft};
pub use error::StoreError;
pub use model::{Entity, Prop, PropValue, Resource, Variable, VariableKind};
pub use store::{Persistence, Snapshot, Store};
pub use transaction::{Change, CollectionName, Commit, Delta, Transaction};
