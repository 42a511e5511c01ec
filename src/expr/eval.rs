//! Pure expression evaluation.
//!
//! The evaluator walks the restricted AST directly. It has no access to any
//! runtime scope of its own: identifiers resolve only through the
//! [`Environment`] the caller provides, and [`evaluate`] refuses expressions
//! that reference any identifier at all.

use std::collections::{BTreeSet, HashMap};
use std::hash::BuildHasher;

use super::ast::{BinaryOp, Expr, Literal, LogicalOp, MemberProperty, PropertyKey, UnaryOp};
use super::error::ExpressionError;
use super::validate::{validate_expr, ValidateOptions};
use super::value::{number_to_string, to_int32, to_uint32, Value, VariableValue};

/// Source of identifier values for [`evaluate_with`].
pub trait Environment {
    /// Value bound to `identifier`, or `None` if it is unknown.
    fn lookup(&self, identifier: &str) -> Option<Value>;
}

impl<S: BuildHasher> Environment for HashMap<String, Value, S> {
    fn lookup(&self, identifier: &str) -> Option<Value> {
        self.get(identifier).cloned()
    }
}

/// An environment with no bindings.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBindings;

impl Environment for NoBindings {
    fn lookup(&self, _identifier: &str) -> Option<Value> {
        None
    }
}

/// Evaluate a self-contained literal expression.
///
/// Fails with [`ExpressionError::ValueDependsOnVariables`] naming every
/// identifier when the text references any.
pub fn evaluate(text: &str) -> Result<VariableValue, ExpressionError> {
    evaluate_literal(text, crate::config::DEFAULT_MAX_EXPRESSION_LENGTH)
}

/// [`evaluate`] with an explicit input length limit.
pub fn evaluate_literal(text: &str, max_length: usize) -> Result<VariableValue, ExpressionError> {
    let mut identifiers = BTreeSet::new();
    let validated = validate_expr(
        text,
        ValidateOptions::new()
            .max_length(max_length)
            .with_identifiers(|name| {
                identifiers.insert(name.to_owned());
                Ok(name.to_owned())
            }),
    )?;

    if !identifiers.is_empty() {
        return Err(ExpressionError::ValueDependsOnVariables {
            identifiers: identifiers.into_iter().collect(),
        });
    }
    let Some(expr) = validated.expr else {
        return Err(ExpressionError::parse(0, "Expression is empty"));
    };

    let value = Evaluator { env: &NoBindings }
        .eval(&expr)?
        .into_variable_value()
        .ok_or_else(|| ExpressionError::Eval("expression evaluated to undefined".to_owned()))?;
    // Stored numbers must survive a JSON round trip.
    if let VariableValue::Number(n) = value {
        if !n.is_finite() {
            return Err(ExpressionError::Eval(format!(
                "expression evaluated to {}",
                number_to_string(n)
            )));
        }
    }
    Ok(value)
}

/// Evaluate `text` resolving identifiers through `env`.
///
/// Empty text evaluates to `undefined`.
pub fn evaluate_with(text: &str, env: &dyn Environment) -> Result<Value, ExpressionError> {
    let validated = validate_expr(text, ValidateOptions::new().optional(true))?;
    match validated.expr {
        Some(expr) => Evaluator { env }.eval(&expr),
        None => Ok(Value::Undefined),
    }
}

struct Evaluator<'e> {
    env: &'e dyn Environment,
}

impl Evaluator<'_> {
    fn eval(&self, expr: &Expr) -> Result<Value, ExpressionError> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                Literal::Undefined => Value::Undefined,
                Literal::Null => Value::Null,
                Literal::Boolean(b) => Value::Boolean(*b),
                Literal::Number(n) => Value::Number(*n),
                Literal::String(s) => Value::String(s.clone()),
            }),
            Expr::Identifier(identifier) => self
                .env
                .lookup(&identifier.name)
                .ok_or_else(|| ExpressionError::unknown_identifier(&identifier.name)),
            Expr::Array(items) => items
                .iter()
                .map(|item| self.eval(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Expr::Object(properties) => {
                let mut entries: Vec<(String, Value)> = Vec::with_capacity(properties.len());
                for property in properties {
                    let key = match &property.key {
                        PropertyKey::Named(name) => name.clone(),
                        PropertyKey::Computed(key) => property_key(&self.eval(key)?),
                    };
                    let value = self.eval(&property.value)?;
                    match entries.iter_mut().find(|(k, _)| *k == key) {
                        Some(entry) => entry.1 = value,
                        None => entries.push((key, value)),
                    }
                }
                Ok(Value::Object(entries))
            }
            Expr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                Ok(match op {
                    UnaryOp::Not => Value::Boolean(!value.truthy()),
                    UnaryOp::Negate => Value::Number(-value.to_number()),
                    UnaryOp::Plus => Value::Number(value.to_number()),
                    UnaryOp::BitNot => Value::Number(f64::from(!to_int32(value.to_number()))),
                    UnaryOp::TypeOf => Value::String(value.type_of().to_owned()),
                })
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                Ok(binary(*op, &left, &right))
            }
            Expr::Logical { op, left, right } => {
                let left = self.eval(left)?;
                let short_circuit = match op {
                    LogicalOp::And => !left.truthy(),
                    LogicalOp::Or => left.truthy(),
                    LogicalOp::Coalesce => !left.is_nullish(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.eval(right)
                }
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test)?.truthy() {
                    self.eval(consequent)
                } else {
                    self.eval(alternate)
                }
            }
            Expr::Member { .. } | Expr::EffectCall { .. } => {
                Ok(self.eval_chain(expr)?.unwrap_or(Value::Undefined))
            }
            Expr::Paren(inner) => self.eval(inner),
        }
    }

    /// Evaluate one link of an optional chain. `None` means the chain
    /// short-circuited on a nullish `?.` base.
    fn eval_chain(&self, expr: &Expr) -> Result<Option<Value>, ExpressionError> {
        match expr {
            Expr::Member {
                object,
                property,
                optional,
            } => {
                let Some(base) = self.eval_chain(object)? else {
                    return Ok(None);
                };
                if *optional && base.is_nullish() {
                    return Ok(None);
                }
                let key = match property {
                    MemberProperty::Named(name) => name.clone(),
                    MemberProperty::Computed(key) => property_key(&self.eval(key)?),
                };
                match base.get_property(&key) {
                    Some(value) => Ok(Some(value)),
                    None => Err(ExpressionError::Eval(format!(
                        "cannot read properties of {} (reading '{key}')",
                        base.to_display_string()
                    ))),
                }
            }
            Expr::EffectCall { .. } => Err(ExpressionError::Eval(
                "effects cannot be evaluated".to_owned(),
            )),
            other => self.eval(other).map(Some),
        }
    }
}

fn property_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => number_to_string(*n),
        other => other.to_display_string(),
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    use std::cmp::Ordering::{Equal, Greater, Less};

    let num = |f: fn(f64, f64) -> f64| Value::Number(f(left.to_number(), right.to_number()));
    let int = |f: fn(i32, i32) -> i32| {
        Value::Number(f64::from(f(
            to_int32(left.to_number()),
            to_int32(right.to_number()),
        )))
    };
    let shift = to_uint32(right.to_number()) & 31;

    match op {
        BinaryOp::Add => match (left.to_primitive(), right.to_primitive()) {
            (a @ Value::String(_), b) | (a, b @ Value::String(_)) => {
                Value::String(a.to_display_string() + &b.to_display_string())
            }
            (a, b) => Value::Number(a.to_number() + b.to_number()),
        },
        BinaryOp::Subtract => num(|a, b| a - b),
        BinaryOp::Multiply => num(|a, b| a * b),
        BinaryOp::Divide => num(|a, b| a / b),
        BinaryOp::Remainder => num(|a, b| a % b),
        BinaryOp::Exponent => num(|base, exponent| {
            if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
                f64::NAN
            } else {
                base.powf(exponent)
            }
        }),
        BinaryOp::ShiftLeft => {
            Value::Number(f64::from(to_int32(left.to_number()).wrapping_shl(shift)))
        }
        BinaryOp::ShiftRight => Value::Number(f64::from(to_int32(left.to_number()) >> shift)),
        BinaryOp::UnsignedShiftRight => {
            Value::Number(f64::from(to_uint32(left.to_number()) >> shift))
        }
        BinaryOp::Less => Value::Boolean(left.compare(right) == Some(Less)),
        BinaryOp::LessEq => Value::Boolean(matches!(left.compare(right), Some(Less | Equal))),
        BinaryOp::Greater => Value::Boolean(left.compare(right) == Some(Greater)),
        BinaryOp::GreaterEq => {
            Value::Boolean(matches!(left.compare(right), Some(Greater | Equal)))
        }
        BinaryOp::LooseEq => Value::Boolean(left.loose_equals(right)),
        BinaryOp::LooseNotEq => Value::Boolean(!left.loose_equals(right)),
        BinaryOp::StrictEq => Value::Boolean(left.strict_equals(right)),
        BinaryOp::StrictNotEq => Value::Boolean(!left.strict_equals(right)),
        BinaryOp::BitAnd => int(|a, b| a & b),
        BinaryOp::BitXor => int(|a, b| a ^ b),
        BinaryOp::BitOr => int(|a, b| a | b),
    }
}
