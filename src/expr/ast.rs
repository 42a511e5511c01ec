//! Expression AST.
//!
//! The tree only has nodes for constructs the grammar accepts. There is no
//! assignment, statement, function or loop node, so an evaluator walking it
//! cannot be asked to do any of those things.

use std::ops::Range;

/// Byte span into the source text.
pub type Span = Range<usize>;

/// A literal value written directly in the source.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
}

/// A bare identifier reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `-`
    Negate,
    /// `+`
    Plus,
    /// `~`
    BitNot,
    /// `typeof`
    TypeOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Exponent,
    ShiftLeft,
    ShiftRight,
    UnsignedShiftRight,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    LooseEq,
    LooseNotEq,
    StrictEq,
    StrictNotEq,
    BitAnd,
    BitXor,
    BitOr,
}

/// Short-circuiting operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Coalesce,
}

/// Key of an object literal property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    /// `name`, `"name"` or `1` written as a key.
    Named(String),
    /// `[expr]`
    Computed(Box<Expr>),
}

/// A `key: value` pair in an object literal.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: PropertyKey,
    pub value: Expr,
    /// `{ a }` rather than `{ a: a }`.
    pub shorthand: bool,
}

/// Property part of a member access.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberProperty {
    /// `.name`
    Named(String),
    /// `[expr]`
    Computed(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Identifier(Identifier),
    Array(Vec<Expr>),
    Object(Vec<Property>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Member {
        object: Box<Expr>,
        property: MemberProperty,
        /// `?.`
        optional: bool,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    /// Effect invocation, only produced in effectful mode. Never evaluated.
    EffectCall {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
        optional: bool,
    },
    /// Parenthesized expression. Ends an optional chain.
    Paren(Box<Expr>),
}

/// One occurrence of a bare identifier, in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierRef<'a> {
    pub identifier: &'a Identifier,
    /// Written as an object shorthand property.
    pub shorthand: bool,
}

impl Expr {
    /// Collect every bare identifier occurrence in source order.
    ///
    /// Member property names and object keys are not references and are
    /// skipped.
    pub fn identifiers(&self) -> Vec<IdentifierRef<'_>> {
        let mut out = Vec::new();
        self.collect_identifiers(&mut out);
        out
    }

    fn collect_identifiers<'a>(&'a self, out: &mut Vec<IdentifierRef<'a>>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Identifier(identifier) => out.push(IdentifierRef {
                identifier,
                shorthand: false,
            }),
            Expr::Array(items) => {
                for item in items {
                    item.collect_identifiers(out);
                }
            }
            Expr::Object(properties) => {
                for property in properties {
                    if let PropertyKey::Computed(key) = &property.key {
                        key.collect_identifiers(out);
                    }
                    match (&property.value, property.shorthand) {
                        (Expr::Identifier(identifier), true) => out.push(IdentifierRef {
                            identifier,
                            shorthand: true,
                        }),
                        (value, _) => value.collect_identifiers(out),
                    }
                }
            }
            Expr::Unary { operand, .. } => operand.collect_identifiers(out),
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                left.collect_identifiers(out);
                right.collect_identifiers(out);
            }
            Expr::Member {
                object, property, ..
            } => {
                object.collect_identifiers(out);
                if let MemberProperty::Computed(key) = property {
                    key.collect_identifiers(out);
                }
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                test.collect_identifiers(out);
                consequent.collect_identifiers(out);
                alternate.collect_identifiers(out);
            }
            Expr::EffectCall {
                callee, arguments, ..
            } => {
                callee.collect_identifiers(out);
                for argument in arguments {
                    argument.collect_identifiers(out);
                }
            }
            Expr::Paren(inner) => inner.collect_identifiers(out),
        }
    }
}
