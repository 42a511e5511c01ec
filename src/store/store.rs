//! The coordinator that owns every collection.

use std::fmt;

use super::collection::Collection;
use super::model::{Prop, Resource, Variable};
use super::transaction::{CollectionName, Commit, Transaction};
use crate::error::{Error, Result};
use crate::ids::{InstanceId, VariableId};
use crate::reactive::{SubscriptionId, Subscribers};

/// Receives every commit, e.g. to ship it to a backend. Not awaited.
pub trait Persistence {
    fn commit(&mut self, commit: &Commit);
}

impl<F: FnMut(&Commit)> Persistence for F {
    fn commit(&mut self, commit: &Commit) {
        self(commit)
    }
}

/// Immutable view of all collections at one revision.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub revision: u64,
    pub variables: Collection<Variable>,
    pub resources: Collection<Resource>,
    pub props: Collection<Prop>,
}

impl Snapshot {
    /// The prop named `name` on `instance`, if any.
    pub fn prop(&self, instance: &InstanceId, name: &str) -> Option<&Prop> {
        find_prop(&self.props, instance, name)
    }

    pub fn variable(&self, id: &VariableId) -> Option<&Variable> {
        self.variables.get(id)
    }
}

pub(crate) fn find_prop<'a>(
    props: impl IntoIterator<Item = &'a Prop>,
    instance: &InstanceId,
    name: &str,
) -> Option<&'a Prop> {
    props
        .into_iter()
        .find(|prop| prop.instance_id == *instance && prop.name == name)
}

/// Owner of the variables, resources and props collections.
///
/// Reads go through [`snapshot`](Self::snapshot) or the collection
/// accessors. Writes only happen inside [`transact`](Self::transact).
#[derive(Default)]
pub struct Store {
    state: Snapshot,
    subscribers: Subscribers<Commit>,
    persistence: Option<Box<dyn Persistence>>,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("revision", &self.state.revision)
            .field("variables", &self.state.variables.len())
            .field("resources", &self.state.resources.len())
            .field("props", &self.state.props.len())
            .field("subscribers", &self.subscribers.len())
            .field("persistence", &self.persistence.is_some())
            .finish()
    }
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load previously persisted state.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            state: snapshot,
            ..Self::default()
        }
    }

    /// Attach the persistence collaborator (builder).
    pub fn with_persistence(mut self, persistence: impl Persistence + 'static) -> Self {
        self.persistence = Some(Box::new(persistence));
        self
    }

    /// Cheap immutable copy of the current state.
    pub fn snapshot(&self) -> Snapshot {
        self.state.clone()
    }

    pub fn revision(&self) -> u64 {
        self.state.revision
    }

    pub fn variables(&self) -> &Collection<Variable> {
        &self.state.variables
    }

    pub fn resources(&self) -> &Collection<Resource> {
        &self.state.resources
    }

    pub fn props(&self) -> &Collection<Prop> {
        &self.state.props
    }

    /// Subscribe to commits. Callbacks run after the new state is in place.
    pub fn subscribe(&mut self, callback: impl FnMut(&Commit) + 'static) -> SubscriptionId {
        self.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// Run `mutator` against drafts of the named collections and commit all
    /// of its writes at once.
    ///
    /// If the mutator fails, every draft is dropped and the error comes back
    /// wrapped in [`Error::TransactionAborted`]. A transaction whose writes
    /// net out to nothing commits silently: no revision bump, no
    /// notification.
    pub fn transact<T>(
        &mut self,
        collections: &[CollectionName],
        mutator: impl FnOnce(&mut Transaction) -> Result<T>,
    ) -> Result<T> {
        let span = tracing::debug_span!("store.transact", collections = ?collections);
        let _guard = span.enter();

        let mut tx = Transaction::open(
            collections,
            &self.state.variables,
            &self.state.resources,
            &self.state.props,
        );

        let result = mutator(&mut tx).and_then(|output| {
            tx.verify()?;
            Ok(output)
        });
        let output = match result {
            Ok(output) => output,
            Err(err) => {
                tracing::warn!(message = "store.abort", error = %err);
                return Err(Error::TransactionAborted {
                    source: Box::new(err),
                });
            }
        };

        let changes = tx.changes();
        if changes.is_empty() {
            tracing::trace!(message = "store.noop");
            return Ok(output);
        }

        let (variables, resources, props) = tx.into_parts();
        if let Some(draft) = variables {
            self.state.variables = draft.into_collection();
        }
        if let Some(draft) = resources {
            self.state.resources = draft.into_collection();
        }
        if let Some(draft) = props {
            self.state.props = draft.into_collection();
        }
        self.state.revision += 1;

        let commit = Commit {
            revision: self.state.revision,
            changes,
        };
        tracing::debug!(
            message = "store.commit",
            revision = commit.revision,
            changes = commit.changes.len()
        );
        if let Some(persistence) = self.persistence.as_mut() {
            persistence.commit(&commit);
        }
        self.subscribers.notify(&commit);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::VariableValue;
    use crate::store::{Change, PropValue, StoreError};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn number(n: f64) -> VariableValue {
        VariableValue::Number(n)
    }

    #[test]
    fn commit_bumps_revision_and_applies_writes() {
        let mut store = Store::new();
        let id = store
            .transact(&[CollectionName::Variables], |tx| {
                let var = Variable::value("count", "body", number(0.0));
                let id = var.id.clone();
                tx.variables()?.upsert(var);
                Ok(id)
            })
            .unwrap();

        assert_eq!(store.revision(), 1);
        assert_eq!(store.variables().get(&id).map(|v| v.name.as_str()), Some("count"));
    }

    #[test]
    fn failed_mutator_leaves_state_untouched() {
        let mut store = Store::new();
        let before = store.snapshot();

        let err = store
            .transact(&[CollectionName::Variables, CollectionName::Props], |tx| {
                tx.variables()?
                    .upsert(Variable::value("a", "body", number(1.0)));
                tx.props()?
                    .upsert(Prop::new("body", "x", PropValue::Expression("a".into())));
                Err::<(), _>(StoreError::InvalidName.into())
            })
            .unwrap_err();

        assert!(matches!(err, Error::TransactionAborted { .. }));
        assert_eq!(err.as_store(), Some(&StoreError::InvalidName));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn out_of_scope_collection_aborts() {
        let mut store = Store::new();
        let err = store
            .transact(&[CollectionName::Props], |tx| {
                tx.variables()?;
                Ok(())
            })
            .unwrap_err();
        assert_eq!(
            err.as_store(),
            Some(&StoreError::CollectionNotInScope(CollectionName::Variables))
        );
    }

    #[test]
    fn overwriting_an_id_aborts() {
        let mut store = Store::new();
        let id = store
            .transact(&[CollectionName::Variables], |tx| {
                let var = Variable::value("count", "body", number(0.0));
                let id = var.id.clone();
                tx.variables()?.upsert(var);
                Ok(id)
            })
            .unwrap();
        let before = store.snapshot();

        let err = store
            .transact(&[CollectionName::Variables], |tx| {
                if let Some(var) = tx.variables()?.get_mut(&id) {
                    var.id = "other".into();
                }
                Ok(())
            })
            .unwrap_err();

        assert!(matches!(err, Error::TransactionAborted { .. }));
        assert_eq!(
            err.as_store(),
            Some(&StoreError::IdChanged {
                collection: CollectionName::Variables,
                id: id.to_string(),
            })
        );
        assert_eq!(store.snapshot(), before);
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn subscribers_and_persistence_see_each_commit() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let persisted = Rc::new(RefCell::new(Vec::new()));
        let sink = persisted.clone();
        let mut store = Store::new().with_persistence(move |commit: &Commit| {
            sink.borrow_mut().push(commit.clone());
        });
        let log = seen.clone();
        store.subscribe(move |commit| log.borrow_mut().push(commit.revision));

        store
            .transact(&[CollectionName::Resources], |tx| {
                tx.resources()?
                    .upsert(Resource::new("posts", serde_json::json!({})));
                Ok(())
            })
            .unwrap();

        assert_eq!(*seen.borrow(), vec![1]);
        let persisted = persisted.borrow();
        assert_eq!(persisted.len(), 1);
        assert!(matches!(
            &persisted[0].changes[..],
            [Change::Resource(delta)] if delta.before.is_none() && delta.after.is_some()
        ));
    }

    #[test]
    fn no_op_transaction_publishes_nothing() {
        let count = Rc::new(RefCell::new(0));
        let mut store = Store::new();
        let c = count.clone();
        store.subscribe(move |_| *c.borrow_mut() += 1);

        store.transact(&[CollectionName::Props], |_| Ok(())).unwrap();
        assert_eq!(store.revision(), 0);
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn unsubscribed_callbacks_stop() {
        let count = Rc::new(RefCell::new(0));
        let mut store = Store::new();
        let c = count.clone();
        let id = store.subscribe(move |_| *c.borrow_mut() += 1);
        assert!(store.unsubscribe(id));

        store
            .transact(&[CollectionName::Variables], |tx| {
                tx.variables()?.upsert(Variable::parameter("item", "list"));
                Ok(())
            })
            .unwrap();
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn snapshots_are_isolated_from_later_commits() {
        let mut store = Store::new();
        let old = store.snapshot();
        store
            .transact(&[CollectionName::Variables], |tx| {
                tx.variables()?.upsert(Variable::parameter("item", "list"));
                Ok(())
            })
            .unwrap();
        assert!(old.variables.is_empty());
        assert_eq!(store.variables().len(), 1);

        let reloaded = Store::from_snapshot(store.snapshot());
        assert_eq!(reloaded.revision(), 1);
        assert_eq!(reloaded.variables().len(), 1);
    }

    #[test]
    fn prop_lookup() {
        let prop = Prop::new("box", "title", PropValue::Expression("1".into()));
        let snapshot = Snapshot {
            props: [prop.clone()].into_iter().collect(),
            ..Snapshot::default()
        };
        assert_eq!(snapshot.prop(&"box".into(), "title"), Some(&prop));
        assert_eq!(snapshot.prop(&"box".into(), "other"), None);
    }
}
