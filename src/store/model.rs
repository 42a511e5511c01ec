//! Entity types held by the store: variables, resources and props.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::expr::VariableValue;
use crate::ids::{InstanceId, PropId, ResourceId, VariableId};

/// An entity that lives in a store collection, keyed by its id.
pub trait Entity: Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned {
    type Id: Clone + Ord + fmt::Debug + fmt::Display + Serialize + DeserializeOwned;

    fn id(&self) -> &Self::Id;
}

// ---------------------------------------------------------------------------
// Variable
// ---------------------------------------------------------------------------

/// What a variable holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum VariableKind {
    /// A self-contained typed literal.
    Value { value: VariableValue },
    /// The result of an external resource, referenced by id.
    Resource {
        #[serde(rename = "resourceId")]
        resource_id: ResourceId,
    },
    /// Supplied at render time (e.g. the current item of a collection).
    Parameter,
}

impl VariableKind {
    pub fn name(&self) -> &'static str {
        match self {
            VariableKind::Value { .. } => "value",
            VariableKind::Resource { .. } => "resource",
            VariableKind::Parameter => "parameter",
        }
    }
}

/// A named variable scoped to one instance and its descendants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub id: VariableId,
    pub name: String,
    /// Declaring instance. Fixed at creation.
    pub scope_instance_id: InstanceId,
    #[serde(flatten)]
    pub kind: VariableKind,
}

impl Variable {
    /// A new value variable with a fresh id.
    pub fn value(name: impl Into<String>, scope: impl Into<InstanceId>, value: VariableValue) -> Self {
        Self::with_kind(name, scope, VariableKind::Value { value })
    }

    /// A new resource variable with a fresh id.
    pub fn resource(
        name: impl Into<String>,
        scope: impl Into<InstanceId>,
        resource_id: ResourceId,
    ) -> Self {
        Self::with_kind(name, scope, VariableKind::Resource { resource_id })
    }

    /// A new parameter variable with a fresh id.
    pub fn parameter(name: impl Into<String>, scope: impl Into<InstanceId>) -> Self {
        Self::with_kind(name, scope, VariableKind::Parameter)
    }

    fn with_kind(name: impl Into<String>, scope: impl Into<InstanceId>, kind: VariableKind) -> Self {
        Self {
            id: VariableId::generate(),
            name: name.into(),
            scope_instance_id: scope.into(),
            kind,
        }
    }

    /// Replace the generated id (builder).
    pub fn with_id(mut self, id: impl Into<VariableId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn is_parameter(&self) -> bool {
        matches!(self.kind, VariableKind::Parameter)
    }

    /// Resource this variable points at, if it is a resource variable.
    pub fn resource_id(&self) -> Option<&ResourceId> {
        match &self.kind {
            VariableKind::Resource { resource_id } => Some(resource_id),
            _ => None,
        }
    }
}

impl Entity for Variable {
    type Id = VariableId;

    fn id(&self) -> &VariableId {
        &self.id
    }
}

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

/// An external data source. The descriptor is opaque to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub name: String,
    pub descriptor: serde_json::Value,
}

impl Resource {
    pub fn new(name: impl Into<String>, descriptor: serde_json::Value) -> Self {
        Self {
            id: ResourceId::generate(),
            name: name.into(),
            descriptor,
        }
    }
}

impl Entity for Resource {
    type Id = ResourceId;

    fn id(&self) -> &ResourceId {
        &self.id
    }
}

// ---------------------------------------------------------------------------
// Prop
// ---------------------------------------------------------------------------

/// What a prop is bound to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum PropValue {
    Literal(VariableValue),
    /// A single expression that may reference visible variables.
    Expression(String),
    /// Ordered effect expressions.
    Action(Vec<String>),
}

/// A named binding on one instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prop {
    pub id: PropId,
    pub instance_id: InstanceId,
    pub name: String,
    pub value: PropValue,
}

impl Prop {
    /// A new prop with a fresh id.
    pub fn new(instance: impl Into<InstanceId>, name: impl Into<String>, value: PropValue) -> Self {
        Self {
            id: PropId::generate(),
            instance_id: instance.into(),
            name: name.into(),
            value,
        }
    }

    /// The expression text, for expression props.
    pub fn expression(&self) -> Option<&str> {
        match &self.value {
            PropValue::Expression(text) => Some(text),
            _ => None,
        }
    }
}

impl Entity for Prop {
    type Id = PropId;

    fn id(&self) -> &PropId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn variable_constructors_generate_ids() {
        let a = Variable::parameter("item", "list");
        let b = Variable::parameter("item", "list");
        assert_ne!(a.id, b.id);
        assert!(a.is_parameter());
        assert_eq!(a.kind.name(), "parameter");
    }

    #[test]
    fn variable_serializes_with_flat_kind() {
        let var = Variable::value("count", "body", VariableValue::Number(0.0)).with_id("v1");
        assert_eq!(
            serde_json::to_value(&var).unwrap(),
            json!({
                "id": "v1",
                "name": "count",
                "scopeInstanceId": "body",
                "kind": "value",
                "value": { "type": "number", "value": 0.0 }
            })
        );
    }

    #[test]
    fn resource_variable_round_trips() {
        let var = Variable::resource("posts", "body", ResourceId::new("r1")).with_id("v2");
        let json = serde_json::to_string(&var).unwrap();
        let back: Variable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, var);
        assert_eq!(back.resource_id(), Some(&ResourceId::new("r1")));
    }

    #[test]
    fn prop_value_serialization() {
        let prop = Prop::new("box", "title", PropValue::Expression("a".into()));
        let json = serde_json::to_value(&prop).unwrap();
        assert_eq!(json["value"], json!({ "type": "expression", "value": "a" }));
        assert_eq!(json["instanceId"], json!("box"));
        assert_eq!(prop.expression(), Some("a"));
    }
}
