//! Runtime value previews.
//!
//! Value variables carry their own literal. Resource and parameter values
//! only exist at runtime, so the caller passes them in as [`RuntimeValues`]
//! (computed by whatever executes resources). Nothing here fetches data.

use std::collections::{BTreeMap, HashMap};

use crate::config::EngineConfig;
use crate::expr::{evaluate_with, Environment, ExpressionError, Value};
use crate::ident;
use crate::ids::{InstanceId, VariableId};
use crate::scope::ScopeView;
use crate::store::{PropValue, Snapshot, Variable, VariableKind};
use crate::tree::InstanceKinds;

/// Runtime values of resource and parameter variables, keyed by id.
pub type RuntimeValues = HashMap<VariableId, serde_json::Value>;

/// Current value of one variable. Unknown runtime values are `undefined`.
pub fn variable_value(variable: &Variable, runtime: &RuntimeValues) -> Value {
    match &variable.kind {
        VariableKind::Value { value } => Value::from(value),
        VariableKind::Resource { .. } | VariableKind::Parameter => runtime
            .get(&variable.id)
            .map_or(Value::Undefined, Value::from_json),
    }
}

/// Resolves encoded identifiers against one instance's scope.
#[derive(Debug, Clone)]
pub struct ScopeEnvironment<'a> {
    view: &'a ScopeView<'a>,
    runtime: &'a RuntimeValues,
}

impl<'a> ScopeEnvironment<'a> {
    pub fn new(view: &'a ScopeView<'a>, runtime: &'a RuntimeValues) -> Self {
        Self { view, runtime }
    }
}

impl Environment for ScopeEnvironment<'_> {
    fn lookup(&self, identifier: &str) -> Option<Value> {
        let id = ident::decode(identifier)?;
        let variable = self.view.get(&id)?;
        Some(variable_value(variable, self.runtime))
    }
}

/// Evaluate expression text as it would render at `selector[0]`.
pub fn preview_expression(
    text: &str,
    view: &ScopeView<'_>,
    runtime: &RuntimeValues,
) -> Result<Value, ExpressionError> {
    evaluate_with(text, &ScopeEnvironment::new(view, runtime))
}

/// Values of every variable visible at `selector[0]`, as JSON.
///
/// Values without a JSON form (`undefined`) are left out.
pub fn preview_variables(
    snapshot: &Snapshot,
    instances: &dyn InstanceKinds,
    config: &EngineConfig,
    selector: &[InstanceId],
    runtime: &RuntimeValues,
) -> BTreeMap<VariableId, serde_json::Value> {
    ScopeView::resolve(selector, &snapshot.variables, instances, config)
        .variables()
        .iter()
        .filter_map(|var| {
            let json = variable_value(var, runtime).to_json()?;
            Some((var.id.clone(), json))
        })
        .collect()
}

/// Value a prop of `selector[0]` would render with.
///
/// Literal props yield their literal; expression props are evaluated in the
/// instance's scope. Action props and missing props have no value.
pub fn preview_prop(
    snapshot: &Snapshot,
    instances: &dyn InstanceKinds,
    config: &EngineConfig,
    selector: &[InstanceId],
    name: &str,
    runtime: &RuntimeValues,
) -> Result<Option<Value>, ExpressionError> {
    let Some(prop) = selector
        .first()
        .and_then(|instance| snapshot.prop(instance, name))
    else {
        return Ok(None);
    };
    match &prop.value {
        PropValue::Literal(value) => Ok(Some(Value::from(value))),
        PropValue::Expression(text) => {
            let view = ScopeView::resolve(selector, &snapshot.variables, instances, config);
            preview_expression(text, &view, runtime).map(Some)
        }
        PropValue::Action(_) => Ok(None),
    }
}
