//! Validation and identifier normalisation.
//!
//! [`validate`] parses the text, hands every bare identifier to the caller's
//! transform, and splices the returned names back into the original text.
//! The same pass serves both collecting references (transform records the
//! name and returns it unchanged) and enforcing an allow-list (transform
//! returns an error), so the two can never disagree about what counts as a
//! reference.

use std::collections::BTreeSet;
use std::fmt;

use super::ast::{Expr, Span};
use super::error::ExpressionError;
use super::parser::{parse, ParseOptions};

/// Maps one identifier occurrence to the identifier to write in its place.
pub type IdentifierTransform<'a> = Box<dyn FnMut(&str) -> Result<String, ExpressionError> + 'a>;

/// Options for [`validate`].
pub struct ValidateOptions<'a> {
    /// Empty text is valid and denotes "no expression".
    pub optional: bool,
    /// Accept the effect-call form used by action props.
    pub effectful: bool,
    /// Reject input longer than this many bytes.
    pub max_length: usize,
    transform: Option<IdentifierTransform<'a>>,
}

impl Default for ValidateOptions<'_> {
    fn default() -> Self {
        Self {
            optional: false,
            effectful: false,
            max_length: crate::config::DEFAULT_MAX_EXPRESSION_LENGTH,
            transform: None,
        }
    }
}

impl fmt::Debug for ValidateOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidateOptions")
            .field("optional", &self.optional)
            .field("effectful", &self.effectful)
            .field("max_length", &self.max_length)
            .field("transform", &self.transform.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl<'a> ValidateOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether empty text is accepted (builder).
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Set whether effect calls are accepted (builder).
    pub fn effectful(mut self, effectful: bool) -> Self {
        self.effectful = effectful;
        self
    }

    /// Set the maximum accepted length in bytes (builder).
    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Install the identifier transform (builder).
    ///
    /// Called once per bare identifier occurrence, in source order.
    pub fn with_identifiers(
        mut self,
        transform: impl FnMut(&str) -> Result<String, ExpressionError> + 'a,
    ) -> Self {
        self.transform = Some(Box::new(transform));
        self
    }
}

/// Result of a validation pass that keeps the parsed tree.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Validated {
    pub text: String,
    /// `None` for accepted empty text.
    pub expr: Option<Expr>,
}

/// Validate `text` and return it with identifiers substituted.
///
/// Formatting is preserved; only substituted identifiers change. A
/// shorthand property `{ a }` whose identifier is substituted becomes
/// `{ a: b }` so its key survives.
pub fn validate(text: &str, options: ValidateOptions<'_>) -> Result<String, ExpressionError> {
    validate_expr(text, options).map(|validated| validated.text)
}

pub(crate) fn validate_expr(
    text: &str,
    mut options: ValidateOptions<'_>,
) -> Result<Validated, ExpressionError> {
    if options.optional && text.trim().is_empty() {
        return Ok(Validated {
            text: String::new(),
            expr: None,
        });
    }

    let expr = parse(
        text,
        &ParseOptions {
            effectful: options.effectful,
            max_length: options.max_length,
        },
    )?;

    let mut edits: Vec<(Span, String)> = Vec::new();
    if let Some(transform) = options.transform.as_mut() {
        for reference in expr.identifiers() {
            let name = reference.identifier.name.as_str();
            let replacement = transform(name)?;
            if replacement != name {
                let written = if reference.shorthand {
                    format!("{name}: {replacement}")
                } else {
                    replacement
                };
                edits.push((reference.identifier.span.clone(), written));
            }
        }
    }

    Ok(Validated {
        text: splice(text, &edits),
        expr: Some(expr),
    })
}

/// Every distinct identifier `text` references, sorted.
pub fn referenced_identifiers(
    text: &str,
    effectful: bool,
) -> Result<BTreeSet<String>, ExpressionError> {
    let mut names = BTreeSet::new();
    validate(
        text,
        ValidateOptions::new()
            .optional(true)
            .effectful(effectful)
            .with_identifiers(|name| {
                names.insert(name.to_owned());
                Ok(name.to_owned())
            }),
    )?;
    Ok(names)
}

/// Apply non-overlapping edits given in ascending span order.
fn splice(text: &str, edits: &[(Span, String)]) -> String {
    if edits.is_empty() {
        return text.to_owned();
    }
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (span, replacement) in edits {
        out.push_str(&text[last..span.start]);
        out.push_str(replacement);
        last = span.end;
    }
    out.push_str(&text[last..]);
    out
}
