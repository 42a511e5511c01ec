//! Variable and prop operations.
//!
//! Each operation reads what it needs from the store, then writes through a
//! single transaction naming only the collections it touches.

use crate::config::EngineConfig;
use crate::deps;
use crate::error::Result;
use crate::expr::{evaluate_literal, VariableValue};
use crate::ident;
use crate::ids::{InstanceId, PropId, ResourceId, VariableId};
use crate::scope::ScopeView;
use crate::store::{
    CollectionName, Draft, Prop, PropValue, Resource, Store, StoreError, Variable, VariableKind,
};
use crate::tree::InstanceKinds;

// ---------------------------------------------------------------------------
// Variables
// ---------------------------------------------------------------------------

/// What a saved variable should hold.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableSource {
    /// Literal expression text. It must not reference any variable.
    Value(String),
    /// Descriptor of the resource the variable reads from.
    Resource(serde_json::Value),
    Parameter,
}

/// Input of [`save_variable`].
#[derive(Debug, Clone, PartialEq)]
pub struct VariableForm {
    /// Variable being edited; `None` creates a new one.
    pub id: Option<VariableId>,
    pub name: String,
    /// Declaring instance for new variables. Ignored when editing: a
    /// variable's scope never changes.
    pub scope_instance_id: InstanceId,
    pub source: VariableSource,
}

impl VariableForm {
    /// A form creating a new variable.
    pub fn new(
        name: impl Into<String>,
        scope: impl Into<InstanceId>,
        source: VariableSource,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            scope_instance_id: scope.into(),
            source,
        }
    }

    /// Edit an existing variable instead (builder).
    pub fn editing(mut self, id: impl Into<VariableId>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Create or update a variable.
///
/// Value text is evaluated into a typed literal. Converting a resource
/// variable into a value variable deletes its resource in the same
/// transaction; converting the other way creates one. Returns the
/// variable's id.
pub fn save_variable(store: &mut Store, config: &EngineConfig, form: VariableForm) -> Result<VariableId> {
    let VariableForm {
        id,
        name,
        scope_instance_id,
        source,
    } = form;

    let saved = store.transact(
        &[CollectionName::Variables, CollectionName::Resources],
        |tx| {
            let existing = match &id {
                Some(id) => Some(
                    tx.variables()?
                        .get(id)
                        .cloned()
                        .ok_or_else(|| StoreError::VariableNotFound(id.clone()))?,
                ),
                None => None,
            };
            let id = existing
                .as_ref()
                .map_or_else(VariableId::generate, |var| var.id.clone());
            let scope = existing
                .as_ref()
                .map_or(scope_instance_id, |var| var.scope_instance_id.clone());
            let old_resource = existing.as_ref().and_then(|var| var.resource_id().cloned());

            let was_parameter = existing.as_ref().map(Variable::is_parameter);
            let is_parameter = matches!(source, VariableSource::Parameter);
            if was_parameter.is_some_and(|was| was != is_parameter) {
                return Err(StoreError::ParameterKindChange(id).into());
            }

            let kind = match source {
                VariableSource::Value(text) => {
                    if let Some(resource_id) = &old_resource {
                        tx.resources()?.remove(resource_id);
                    }
                    let value = evaluate_literal(&text, config.max_expression_length)?;
                    VariableKind::Value { value }
                }
                VariableSource::Resource(descriptor) => {
                    let resource_id = old_resource.unwrap_or_else(ResourceId::generate);
                    tx.resources()?.upsert(Resource {
                        id: resource_id.clone(),
                        name: name.clone(),
                        descriptor,
                    });
                    VariableKind::Resource { resource_id }
                }
                VariableSource::Parameter => VariableKind::Parameter,
            };

            if name.trim().is_empty() {
                return Err(StoreError::InvalidName.into());
            }
            tx.variables()?.upsert(Variable {
                id: id.clone(),
                name,
                scope_instance_id: scope,
                kind,
            });
            Ok(id)
        },
    )?;

    tracing::debug!(message = "ops.save_variable", variable = %saved);
    Ok(saved)
}

/// Rename a parameter. Touches only the variables collection.
pub fn rename_parameter(store: &mut Store, id: &VariableId, name: &str) -> Result<()> {
    store.transact(&[CollectionName::Variables], |tx| {
        let var = tx
            .variables()?
            .get_mut(id)
            .ok_or_else(|| StoreError::VariableNotFound(id.clone()))?;
        if !var.is_parameter() {
            return Err(StoreError::NotAParameter(id.clone()).into());
        }
        if name.trim().is_empty() {
            return Err(StoreError::InvalidName.into());
        }
        var.name = name.to_owned();
        Ok(())
    })
}

/// Delete a variable unless props still reference it.
///
/// Parameters are never blocked. Touches only the variables collection.
pub fn delete_variable(store: &mut Store, id: &VariableId) -> Result<()> {
    let variable = store
        .variables()
        .get(id)
        .ok_or_else(|| StoreError::VariableNotFound(id.clone()))?;
    deps::ensure_deletable(variable, store.props())?;

    store.transact(&[CollectionName::Variables], |tx| {
        tx.variables()?
            .remove(id)
            .map(drop)
            .ok_or_else(|| StoreError::VariableNotFound(id.clone()).into())
    })
}

// ---------------------------------------------------------------------------
// Props
// ---------------------------------------------------------------------------

/// How [`clear_prop_binding`] left the prop.
#[derive(Debug, Clone, PartialEq)]
pub enum Cleared {
    /// The prop now holds this literal.
    Literal(VariableValue),
    /// The prop was deleted.
    Removed,
    /// There was no such prop.
    NotBound,
}

/// Bind a prop of `selector[0]` to expression `text`.
///
/// The text may only reference variables visible at that instance. The prop
/// is created on first binding. Empty text clears the binding instead.
pub fn bind_prop(
    store: &mut Store,
    instances: &dyn InstanceKinds,
    config: &EngineConfig,
    selector: &[InstanceId],
    name: &str,
    text: &str,
) -> Result<Option<PropId>> {
    let instance = selector.first().ok_or(StoreError::EmptySelector)?.clone();
    let normalized = ScopeView::resolve(selector, store.variables(), instances, config)
        .validate(text, false, config)?;

    if normalized.is_empty() {
        clear_prop_binding(store, &instance, name, None)?;
        return Ok(None);
    }
    let id = upsert_prop(store, instance, name, PropValue::Expression(normalized))?;
    Ok(Some(id))
}

/// Bind a prop to exactly one variable, by selecting it.
pub fn select_variable(
    store: &mut Store,
    instances: &dyn InstanceKinds,
    config: &EngineConfig,
    selector: &[InstanceId],
    name: &str,
    variable: &VariableId,
) -> Result<PropId> {
    let text = ident::encode(variable);
    let id = bind_prop(store, instances, config, selector, name, &text)?;
    // Encoded identifiers are never empty, so the prop was written.
    id.ok_or_else(|| StoreError::VariableNotFound(variable.clone()).into())
}

/// Set the effect steps of an action prop. Empty steps are dropped.
pub fn set_prop_actions(
    store: &mut Store,
    instances: &dyn InstanceKinds,
    config: &EngineConfig,
    selector: &[InstanceId],
    name: &str,
    steps: &[&str],
) -> Result<PropId> {
    let instance = selector.first().ok_or(StoreError::EmptySelector)?.clone();
    let view = ScopeView::resolve(selector, store.variables(), instances, config);
    let mut normalized = Vec::with_capacity(steps.len());
    for step in steps {
        let step = view.validate(step, true, config)?;
        if !step.is_empty() {
            normalized.push(step);
        }
    }
    upsert_prop(store, instance, name, PropValue::Action(normalized))
}

/// Remove the binding of a prop.
///
/// The prop falls back to `default` when given, otherwise to the value of its
/// expression when that is self-contained. Failing both, it is deleted.
pub fn clear_prop_binding(
    store: &mut Store,
    instance: &InstanceId,
    name: &str,
    default: Option<VariableValue>,
) -> Result<Cleared> {
    let Some(prop) = crate::store::store::find_prop(store.props(), instance, name) else {
        return Ok(Cleared::NotBound);
    };
    let prop_id = prop.id.clone();
    let fallback = default.or_else(|| match &prop.value {
        PropValue::Literal(value) => Some(value.clone()),
        PropValue::Expression(text) => evaluate_literal(text, usize::MAX).ok(),
        PropValue::Action(_) => None,
    });

    store.transact(&[CollectionName::Props], |tx| {
        let props = tx.props()?;
        match fallback {
            Some(value) => {
                if let Some(prop) = props.get_mut(&prop_id) {
                    prop.value = PropValue::Literal(value.clone());
                }
                Ok(Cleared::Literal(value))
            }
            None => {
                props.remove(&prop_id);
                Ok(Cleared::Removed)
            }
        }
    })
}

fn upsert_prop(store: &mut Store, instance: InstanceId, name: &str, value: PropValue) -> Result<PropId> {
    store.transact(&[CollectionName::Props], |tx| {
        let props: &mut Draft<Prop> = tx.props()?;
        let existing = crate::store::store::find_prop(props.iter(), &instance, name)
            .map(|prop| prop.id.clone());
        let id = match existing {
            Some(id) => {
                if let Some(prop) = props.get_mut(&id) {
                    prop.value = value;
                }
                id
            }
            None => {
                let prop = Prop::new(instance, name, value);
                let id = prop.id.clone();
                props.upsert(prop);
                id
            }
        };
        tracing::debug!(message = "ops.bind_prop", prop = %id, name);
        Ok(id)
    })
}
