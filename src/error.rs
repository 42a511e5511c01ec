//! Crate-level error type.

use thiserror::Error;

use crate::expr::ExpressionError;
use crate::session::SessionError;
use crate::store::StoreError;
use crate::tree::TreeError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Expression(#[from] ExpressionError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Session(#[from] SessionError),
    /// A transaction mutator failed; nothing it wrote was applied.
    #[error("transaction aborted: {source}")]
    TransactionAborted { source: Box<Error> },
}

impl Error {
    /// The innermost error, looking through aborted transactions.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::TransactionAborted { source } => source.root_cause(),
            other => other,
        }
    }

    pub fn as_expression(&self) -> Option<&ExpressionError> {
        match self.root_cause() {
            Error::Expression(err) => Some(err),
            _ => None,
        }
    }

    pub fn as_store(&self) -> Option<&StoreError> {
        match self.root_cause() {
            Error::Store(err) => Some(err),
            _ => None,
        }
    }
}
