//! Dependency tracking: which variables props currently reference.
//!
//! Everything here is recomputed from the props it is given. A prop whose
//! text no longer parses contributes no references; the scan never fails.

use std::collections::{BTreeMap, BTreeSet};

use crate::expr::{validate, ValidateOptions};
use crate::ident;
use crate::ids::{PropId, VariableId};
use crate::reactive::Memo;
use crate::store::{Prop, PropValue, Store, StoreError, Variable, VariableKind};

/// Every variable id referenced by any expression or action prop.
pub fn referenced_variable_ids<'a>(props: impl IntoIterator<Item = &'a Prop>) -> BTreeSet<VariableId> {
    props.into_iter().flat_map(prop_references).collect()
}

/// For each referenced variable, the props referencing it (in prop order).
pub fn variable_usages<'a>(
    props: impl IntoIterator<Item = &'a Prop>,
) -> BTreeMap<VariableId, Vec<PropId>> {
    let mut usages: BTreeMap<VariableId, Vec<PropId>> = BTreeMap::new();
    for prop in props {
        for id in prop_references(prop) {
            usages.entry(id).or_default().push(prop.id.clone());
        }
    }
    usages
}

/// Refuse to delete a value or resource variable that props still use.
///
/// Parameters are never blocked: their visibility is structural.
pub fn ensure_deletable<'a>(
    variable: &Variable,
    props: impl IntoIterator<Item = &'a Prop>,
) -> Result<(), StoreError> {
    if matches!(variable.kind, VariableKind::Parameter) {
        return Ok(());
    }
    let usages: Vec<PropId> = props
        .into_iter()
        .filter(|prop| prop_references(prop).contains(&variable.id))
        .map(|prop| prop.id.clone())
        .collect();
    if usages.is_empty() {
        Ok(())
    } else {
        tracing::debug!(
            message = "ops.delete_blocked",
            variable = %variable.id,
            usages = usages.len()
        );
        Err(StoreError::DeletionBlocked {
            name: variable.name.clone(),
            usages,
        })
    }
}

/// Variable ids one prop references.
pub fn prop_references(prop: &Prop) -> BTreeSet<VariableId> {
    let mut ids = BTreeSet::new();
    match &prop.value {
        PropValue::Literal(_) => {}
        PropValue::Expression(text) => collect(prop, text, false, &mut ids),
        PropValue::Action(steps) => {
            for step in steps {
                collect(prop, step, true, &mut ids);
            }
        }
    }
    ids
}

/// [`referenced_variable_ids`] of a store, cached per store revision.
#[derive(Debug, Clone, Default)]
pub struct ReferencedIds {
    memo: Memo<BTreeSet<VariableId>>,
}

impl ReferencedIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Referenced ids at the store's current revision.
    pub fn get(&mut self, store: &Store) -> &BTreeSet<VariableId> {
        self.memo
            .get_or_compute(store.revision(), || referenced_variable_ids(store.props()))
    }

    pub fn is_referenced(&mut self, store: &Store, id: &VariableId) -> bool {
        self.get(store).contains(id)
    }
}

fn collect(prop: &Prop, text: &str, effectful: bool, ids: &mut BTreeSet<VariableId>) {
    let result = validate(
        text,
        ValidateOptions::new()
            .optional(true)
            .effectful(effectful)
            // Stored text is scanned whatever its length.
            .max_length(usize::MAX)
            .with_identifiers(|name| {
                if let Some(id) = ident::decode(name) {
                    ids.insert(id);
                }
                Ok(name.to_owned())
            }),
    );
    if let Err(err) = result {
        tracing::trace!(message = "deps.unparsable", prop = %prop.id, error = %err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::VariableValue;
    use pretty_assertions::assert_eq;

    fn var_ref(id: &str) -> String {
        ident::encode(&VariableId::new(id))
    }

    fn expression(id: &str, text: String) -> Prop {
        Prop {
            id: id.into(),
            instance_id: "box".into(),
            name: id.into(),
            value: PropValue::Expression(text),
        }
    }

    fn action(id: &str, steps: Vec<String>) -> Prop {
        Prop {
            id: id.into(),
            instance_id: "box".into(),
            name: id.into(),
            value: PropValue::Action(steps),
        }
    }

    fn ids(items: &[&str]) -> BTreeSet<VariableId> {
        items.iter().map(|s| VariableId::new(*s)).collect()
    }

    // ------------------------------------------------------------------
    // Scanning
    // ------------------------------------------------------------------

    #[test]
    fn collects_from_expressions_and_actions() {
        let props = vec![
            expression("p1", format!("{} + {}", var_ref("a"), var_ref("b"))),
            action("p2", vec![format!("{}.set(1)", var_ref("c")), "notify()".into()]),
            Prop {
                value: PropValue::Literal(VariableValue::Number(1.0)),
                ..expression("p3", String::new())
            },
        ];
        assert_eq!(referenced_variable_ids(&props), ids(&["a", "b", "c"]));
    }

    #[test]
    fn plain_names_are_not_references() {
        let props = vec![expression("p1", "count + 1".into())];
        assert!(referenced_variable_ids(&props).is_empty());
    }

    #[test]
    fn malformed_props_contribute_nothing() {
        let props = vec![
            expression("bad", format!("{} +", var_ref("a"))),
            expression("good", var_ref("b")),
        ];
        assert_eq!(referenced_variable_ids(&props), ids(&["b"]));
    }

    #[test]
    fn oversized_stored_chains_contribute_nothing() {
        let props = vec![
            expression("long", format!("{}{}", var_ref("a"), "+1".repeat(20_000))),
            action("steps", vec![format!("{}{}", var_ref("b"), ".x".repeat(30_000))]),
            expression("good", var_ref("c")),
        ];
        assert_eq!(referenced_variable_ids(&props), ids(&["c"]));

        let a = Variable::value("a", "body", VariableValue::Number(0.0)).with_id("a");
        assert!(ensure_deletable(&a, &props).is_ok());
    }

    #[test]
    fn calls_outside_actions_are_malformed() {
        let props = vec![expression("p1", format!("{}()", var_ref("a")))];
        assert!(referenced_variable_ids(&props).is_empty());
    }

    #[test]
    fn usages_map_variables_to_props() {
        let props = vec![
            expression("p1", var_ref("a")),
            expression("p2", format!("[{0}, {0}, {1}]", var_ref("a"), var_ref("b"))),
        ];
        let usages = variable_usages(&props);
        assert_eq!(usages[&VariableId::new("a")], vec![PropId::new("p1"), PropId::new("p2")]);
        assert_eq!(usages[&VariableId::new("b")], vec![PropId::new("p2")]);
    }

    // ------------------------------------------------------------------
    // Deletion guard
    // ------------------------------------------------------------------

    #[test]
    fn referenced_values_are_blocked() {
        let count = Variable::value("count", "body", VariableValue::Number(0.0)).with_id("a");
        let props = vec![expression("p1", var_ref("a"))];
        let err = ensure_deletable(&count, &props).unwrap_err();
        assert_eq!(
            err,
            StoreError::DeletionBlocked {
                name: "count".into(),
                usages: vec!["p1".into()],
            }
        );
        assert!(ensure_deletable(&count, std::iter::empty()).is_ok());
    }

    #[test]
    fn cache_follows_store_revision() {
        use crate::store::CollectionName;

        let mut store = Store::new();
        let mut cache = ReferencedIds::new();
        assert!(cache.get(&store).is_empty());

        store
            .transact(&[CollectionName::Props], |tx| {
                tx.props()?.upsert(expression("p1", var_ref("a")));
                Ok(())
            })
            .unwrap();
        assert!(cache.is_referenced(&store, &VariableId::new("a")));
        assert_eq!(cache.get(&store), &ids(&["a"]));
    }

    #[test]
    fn parameters_are_exempt() {
        let item = Variable::parameter("item", "list").with_id("a");
        let props = vec![expression("p1", var_ref("a"))];
        assert!(ensure_deletable(&item, &props).is_ok());
    }
}
