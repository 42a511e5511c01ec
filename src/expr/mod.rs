//! Restricted expression language: tokenizer, parser, validator, evaluator.

pub mod ast;
pub mod error;
pub mod eval;
pub mod parser;
pub mod tokenizer;
pub mod validate;
pub mod value;

pub use error::ExpressionError;
pub use eval::{evaluate, evaluate_literal, evaluate_with, Environment, NoBindings};
pub use validate::{referenced_identifiers, validate, IdentifierTransform, ValidateOptions};
pub use value::{Value, VariableValue};
