//! Scope resolution: which variables an instance can see.
//!
//! A variable is visible at an instance when the instance that declares it
//! appears in the instance's selector (the instance itself followed by its
//! ancestors). The one exception is structural: a collection's own
//! parameters are hidden from the collection instance itself, since the
//! parameter only has a value inside an iteration.

use std::collections::BTreeSet;

use crate::config::EngineConfig;
use crate::expr::{validate, ExpressionError, ValidateOptions};
use crate::ident;
use crate::ids::{InstanceId, VariableId};
use crate::store::Variable;
use crate::tree::InstanceKinds;

/// Variables visible at `selector[0]`, nearest scope first.
///
/// Within one scope, variables keep collection (creation) order.
pub fn visible_variables<'a>(
    selector: &[InstanceId],
    variables: impl IntoIterator<Item = &'a Variable>,
    instances: &dyn InstanceKinds,
    config: &EngineConfig,
) -> Vec<&'a Variable> {
    let Some(target) = selector.first() else {
        return Vec::new();
    };
    let hides_own_parameters = instances
        .kind(target)
        .is_some_and(|kind| config.is_collection(kind));

    let mut visible: Vec<(usize, &'a Variable)> = variables
        .into_iter()
        .filter_map(|var| {
            let depth = selector
                .iter()
                .position(|instance| *instance == var.scope_instance_id)?;
            let excluded = depth == 0 && hides_own_parameters && var.is_parameter();
            (!excluded).then_some((depth, var))
        })
        .collect();
    // Stable, so collection order survives within a scope.
    visible.sort_by_key(|(depth, _)| *depth);
    visible.into_iter().map(|(_, var)| var).collect()
}

/// The resolved scope of one instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeView<'a> {
    variables: Vec<&'a Variable>,
}

impl<'a> ScopeView<'a> {
    pub fn resolve(
        selector: &[InstanceId],
        variables: impl IntoIterator<Item = &'a Variable>,
        instances: &dyn InstanceKinds,
        config: &EngineConfig,
    ) -> Self {
        Self {
            variables: visible_variables(selector, variables, instances, config),
        }
    }

    /// Visible variables, nearest scope first.
    pub fn variables(&self) -> &[&'a Variable] {
        &self.variables
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn contains(&self, id: &VariableId) -> bool {
        self.variables.iter().any(|var| var.id == *id)
    }

    pub fn get(&self, id: &VariableId) -> Option<&'a Variable> {
        self.variables.iter().copied().find(|var| var.id == *id)
    }

    /// The variable a human-readable name refers to. When names shadow each
    /// other the nearest declaration wins.
    pub fn by_name(&self, name: &str) -> Option<&'a Variable> {
        self.variables.iter().copied().find(|var| var.name == name)
    }

    /// Encoded identifiers of every visible variable.
    pub fn allowed_identifiers(&self) -> BTreeSet<String> {
        self.variables.iter().map(|var| ident::encode(&var.id)).collect()
    }

    /// Allow-list check for one identifier: visible variable identifiers
    /// pass through unchanged, anything else is unknown.
    pub fn check_identifier(&self, identifier: &str) -> Result<String, ExpressionError> {
        match ident::decode(identifier) {
            Some(id) if self.contains(&id) => Ok(identifier.to_owned()),
            _ => Err(ExpressionError::unknown_identifier(identifier)),
        }
    }

    /// Validate `text` so that it only references variables in this scope.
    pub fn validate(
        &self,
        text: &str,
        effectful: bool,
        config: &EngineConfig,
    ) -> Result<String, ExpressionError> {
        validate(
            text,
            ValidateOptions::new()
                .optional(true)
                .effectful(effectful)
                .max_length(config.max_expression_length)
                .with_identifiers(|name| self.check_identifier(name)),
        )
    }

    /// Rewrite human variable names into encoded identifiers.
    ///
    /// Identifiers that already encode a visible variable are kept. Names
    /// that match no visible variable are unknown.
    pub fn encode_names(&self, text: &str, config: &EngineConfig) -> Result<String, ExpressionError> {
        validate(
            text,
            ValidateOptions::new()
                .optional(true)
                .max_length(config.max_expression_length)
                .with_identifiers(|name| match self.by_name(name) {
                    Some(var) => Ok(ident::encode(&var.id)),
                    None => self.check_identifier(name),
                }),
        )
    }

    /// Rewrite encoded identifiers of visible variables into their names.
    ///
    /// Anything else is left as written. The result is for display; it is
    /// only valid expression text when every name is itself an identifier.
    pub fn decode_names(&self, text: &str, config: &EngineConfig) -> Result<String, ExpressionError> {
        validate(
            text,
            ValidateOptions::new()
                .optional(true)
                .max_length(config.max_expression_length)
                .with_identifiers(|identifier| {
                    let name = ident::decode(identifier)
                        .and_then(|id| self.get(&id))
                        .map_or(identifier, |var| var.name.as_str());
                    Ok(name.to_owned())
                }),
        )
    }
}
