//! Variable edit session.
//!
//! ```text
//! Closed ──open_list──▶ EditingList ──open_new / open_existing──▶ EditingOne
//!   ▲                     │   ▲                                      │
//!   └───────cancel────────┘   └──────────────cancel──────────────────┤
//!   ▲                                                                │
//!   └──────────────────────────save (success)────────────────────────┘
//! ```
//!
//! Only `save` and `delete` touch the store. A failed save keeps the session
//! in `EditingOne` so the user can correct the form.

use std::fmt;

use thiserror::Error;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::ids::{InstanceId, VariableId};
use crate::ops::{self, VariableForm, VariableSource};
use crate::store::{Store, StoreError, VariableKind};

/// Which form the single-variable editor shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Value,
    Resource,
}

/// The variable being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditTarget {
    New,
    Existing(VariableId),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditState {
    #[default]
    Closed,
    EditingList,
    EditingOne { target: EditTarget, kind: FormKind },
}

impl EditState {
    pub fn name(&self) -> &'static str {
        match self {
            EditState::Closed => "closed",
            EditState::EditingList => "editingList",
            EditState::EditingOne { .. } => "editingOne",
        }
    }
}

impl fmt::Display for EditState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the user typed into the single-variable form.
#[derive(Debug, Clone, PartialEq)]
pub enum FormInput {
    /// Literal expression text.
    Value(String),
    /// Resource descriptor.
    Resource(serde_json::Value),
}

impl FormInput {
    fn kind(&self) -> FormKind {
        match self {
            FormInput::Value(_) => FormKind::Value,
            FormInput::Resource(_) => FormKind::Resource,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },
    #[error("parameters are renamed from the list, not edited")]
    ParameterNotEditable(VariableId),
    #[error("form shows a {expected:?} variable but got {found:?} input")]
    KindMismatch { expected: FormKind, found: FormKind },
}

/// One edit session over the variables declared at an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    scope_instance_id: InstanceId,
    state: EditState,
}

impl EditSession {
    /// A closed session for variables declared at `scope`.
    pub fn new(scope: impl Into<InstanceId>) -> Self {
        Self {
            scope_instance_id: scope.into(),
            state: EditState::Closed,
        }
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn scope_instance_id(&self) -> &InstanceId {
        &self.scope_instance_id
    }

    fn transition(&mut self, next: EditState) {
        tracing::debug!(
            message = "session.transition",
            from = self.state.name(),
            to = next.name()
        );
        self.state = next;
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            state: self.state.name(),
            action,
        }
    }

    pub fn open_list(&mut self) -> Result<()> {
        match self.state {
            EditState::Closed => {
                self.transition(EditState::EditingList);
                Ok(())
            }
            _ => Err(self.invalid("open the list").into()),
        }
    }

    pub fn open_new(&mut self, kind: FormKind) -> Result<()> {
        match self.state {
            EditState::EditingList => {
                self.transition(EditState::EditingOne {
                    target: EditTarget::New,
                    kind,
                });
                Ok(())
            }
            _ => Err(self.invalid("open a new variable").into()),
        }
    }

    /// Open an existing value or resource variable in its matching form.
    pub fn open_existing(&mut self, store: &Store, id: &VariableId) -> Result<()> {
        if self.state != EditState::EditingList {
            return Err(self.invalid("open a variable").into());
        }
        let variable = store
            .variables()
            .get(id)
            .ok_or_else(|| StoreError::VariableNotFound(id.clone()))?;
        let kind = match variable.kind {
            VariableKind::Value { .. } => FormKind::Value,
            VariableKind::Resource { .. } => FormKind::Resource,
            VariableKind::Parameter => {
                return Err(SessionError::ParameterNotEditable(id.clone()).into())
            }
        };
        self.transition(EditState::EditingOne {
            target: EditTarget::Existing(id.clone()),
            kind,
        });
        Ok(())
    }

    /// Switch the open form between value and resource.
    pub fn switch_kind(&mut self, kind: FormKind) -> Result<()> {
        match &mut self.state {
            EditState::EditingOne { kind: current, .. } => {
                *current = kind;
                Ok(())
            }
            _ => Err(self.invalid("switch the form").into()),
        }
    }

    /// Back out one level without touching the store.
    pub fn cancel(&mut self) {
        let next = match self.state {
            EditState::Closed | EditState::EditingList => EditState::Closed,
            EditState::EditingOne { .. } => EditState::EditingList,
        };
        if next != self.state {
            self.transition(next);
        }
    }

    /// Save the open form.
    ///
    /// Closes the session on success. On failure the session stays on the
    /// form and the error is returned.
    pub fn save(
        &mut self,
        store: &mut Store,
        config: &EngineConfig,
        name: &str,
        input: FormInput,
    ) -> Result<VariableId> {
        let EditState::EditingOne { target, kind } = &self.state else {
            return Err(self.invalid("save").into());
        };
        if input.kind() != *kind {
            return Err(SessionError::KindMismatch {
                expected: *kind,
                found: input.kind(),
            }
            .into());
        }

        let source = match input {
            FormInput::Value(text) => VariableSource::Value(text),
            FormInput::Resource(descriptor) => VariableSource::Resource(descriptor),
        };
        let mut form = VariableForm::new(name, self.scope_instance_id.clone(), source);
        if let EditTarget::Existing(id) = target {
            form = form.editing(id.clone());
        }

        let id = ops::save_variable(store, config, form)?;
        self.transition(EditState::Closed);
        Ok(id)
    }

    /// Delete a variable from the list view.
    pub fn delete(&mut self, store: &mut Store, id: &VariableId) -> Result<()> {
        if self.state != EditState::EditingList {
            return Err(self.invalid("delete").into());
        }
        ops::delete_variable(store, id)
    }

    /// Rename a parameter from the list view.
    pub fn rename_parameter(&mut self, store: &mut Store, id: &VariableId, name: &str) -> Result<()> {
        if self.state != EditState::EditingList {
            return Err(self.invalid("rename").into());
        }
        ops::rename_parameter(store, id, name)
    }
}
