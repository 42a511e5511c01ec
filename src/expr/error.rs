//! Errors produced while validating or evaluating expressions.

/// Errors from expression validation and evaluation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExpressionError {
    /// Malformed or disallowed syntax.
    #[error("{message} (at {offset})")]
    Parse { offset: usize, message: String },
    /// An identifier rejected by the caller's identifier policy.
    #[error("unknown identifier `{name}`")]
    UnknownIdentifier { name: String },
    /// A value literal referenced other identifiers.
    #[error("value cannot depend on variables: {}", .identifiers.join(", "))]
    ValueDependsOnVariables { identifiers: Vec<String> },
    /// The expression parsed but could not be evaluated.
    #[error("evaluation failed: {0}")]
    Eval(String),
}

impl ExpressionError {
    pub(crate) fn parse(offset: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            offset,
            message: message.into(),
        }
    }

    pub(crate) fn unknown_identifier(name: impl Into<String>) -> Self {
        Self::UnknownIdentifier { name: name.into() }
    }
}
