//! Identifier codec: maps a [`VariableId`] to a bare expression identifier
//! and back.
//!
//! Encoded identifiers start with the reserved prefix `$ws$var$`. The id
//! follows with ASCII letters and digits kept as-is and every other char
//! written as `_<lowercase hex code point>_` (so `_` itself becomes `_5f_`).
//! The result always matches the grammar's identifier rule
//! `[$A-Za-z_][$A-Za-z0-9_]*`.
//!
//! Only the canonical spelling decodes. Anything else (missing prefix,
//! broken escape, uppercase hex, leading zeros, an escaped alphanumeric) is
//! an ordinary identifier and [`decode`] returns `None` for it.

use std::fmt::Write;

use crate::ids::VariableId;

/// Prefix reserved for encoded variable identifiers.
pub const VARIABLE_PREFIX: &str = "$ws$var$";

/// Encode a variable id as an expression identifier.
pub fn encode(id: &VariableId) -> String {
    let raw = id.as_str();
    let mut out = String::with_capacity(VARIABLE_PREFIX.len() + raw.len());
    out.push_str(VARIABLE_PREFIX);
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
        } else {
            // Writing into a String cannot fail.
            let _ = write!(out, "_{:x}_", ch as u32);
        }
    }
    out
}

/// Decode an expression identifier into a variable id.
///
/// Returns `None` for any identifier that is not a canonical encoding.
pub fn decode(identifier: &str) -> Option<VariableId> {
    let payload = identifier.strip_prefix(VARIABLE_PREFIX)?;
    let mut raw = String::with_capacity(payload.len());
    let mut chars = payload.chars();

    while let Some(ch) = chars.next() {
        if ch.is_ascii_alphanumeric() {
            raw.push(ch);
            continue;
        }
        if ch != '_' {
            return None;
        }
        let mut hex = String::new();
        loop {
            match chars.next()? {
                '_' => break,
                digit if digit.is_ascii_hexdigit() => hex.push(digit),
                _ => return None,
            }
        }
        let code = u32::from_str_radix(&hex, 16).ok()?;
        raw.push(char::from_u32(code)?);
    }

    let id = VariableId::new(raw);
    // Rejects every non-canonical spelling in one place.
    (encode(&id) == identifier).then_some(id)
}

/// Whether `identifier` is an encoded variable reference.
pub fn is_variable_identifier(identifier: &str) -> bool {
    decode(identifier).is_some()
}
