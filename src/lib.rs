//! # bindscope
//!
//! Scoped variables, a restricted expression language, and transactional
//! prop bindings over an instance tree.
//!
//! Instances declare named variables (plain values, external resources, or
//! parameters supplied at render time). Props of descendant instances bind
//! to those variables through expressions that can only reference what is
//! in scope. Every write goes through one coordinator that applies
//! multi-collection changes atomically.
//!
//! ## Core Systems
//!
//! - **[`ident`]**: reversible mapping between variable ids and expression identifiers
//! - **[`expr`]**: tokenizer, parser, validator and pure evaluator for the expression grammar
//! - **[`scope`]**: variables visible at an instance, with the collection self-reference rule
//! - **[`deps`]**: which variables props reference, and the deletion guard
//! - **[`store`]**: collections, snapshots and all-or-nothing transactions
//! - **[`ops`]**: save, rename and delete variables; bind and clear props
//! - **[`session`]**: the variable edit-session state machine
//! - **[`preview`]**: runtime value previews for variables and props
//! - **[`reactive`]**: commit subscribers and revision-keyed memos
//! - **[`tree`]**: instance tree trait and an in-memory implementation

// Foundation
pub mod config;
pub mod error;
pub mod ids;

// Expressions
pub mod expr;
pub mod ident;

// Scoping and dependencies
pub mod deps;
pub mod scope;
pub mod tree;

// State
pub mod reactive;
pub mod store;

// Operations
pub mod ops;
pub mod preview;
pub mod session;

pub use config::EngineConfig;
pub use error::{Error, Result};
pub use ids::{InstanceId, PropId, ResourceId, VariableId};
