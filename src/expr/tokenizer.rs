//! logos-based expression tokenizer.
//!
//! The lexer recognises the full punctuation set of the host language,
//! including the operators the grammar forbids (`=`, `++`, `=>`, `...`), so
//! the parser can reject them with a precise message instead of a generic
//! "unexpected character".
//!
//! Token priority follows logos rules: the longest match wins, so `===`
//! lexes as [`Token::StrictEq`] and `**=` as [`Token::CompoundAssign`].

use std::ops::Range;

use logos::Logos;

use super::error::ExpressionError;

/// Expression token produced by the lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\n\r\f\v]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
pub enum Token {
    // ── Literals and names ───────────────────────────────────────────

    /// Decimal or hexadecimal number: `1`, `1.5`, `.5`, `2e10`, `0xff`.
    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?")]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?")]
    #[regex(r"0[xX][0-9a-fA-F]+")]
    Number,

    /// Double-quoted string with escapes.
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    DoubleQuoted,

    /// Single-quoted string with escapes.
    #[regex(r"'([^'\\\n]|\\.)*'")]
    SingleQuoted,

    /// Identifier or keyword. Keywords are told apart by the parser.
    #[regex(r"[$A-Za-z_][$A-Za-z0-9_]*")]
    Ident,

    // ── Brackets and separators ──────────────────────────────────────

    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,
    #[token("{")]
    BraceOpen,
    #[token("}")]
    BraceClose,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token("?")]
    Question,
    #[token("?.")]
    QuestionDot,
    #[token(".")]
    Dot,
    #[token("...")]
    Spread,

    // ── Operators ────────────────────────────────────────────────────

    #[token("??")]
    Coalesce,
    #[token("||")]
    Or,
    #[token("&&")]
    And,
    #[token("|")]
    BitOr,
    #[token("^")]
    BitXor,
    #[token("&")]
    BitAnd,
    #[token("==")]
    LooseEq,
    #[token("!=")]
    LooseNotEq,
    #[token("===")]
    StrictEq,
    #[token("!==")]
    StrictNotEq,
    #[token("<")]
    Less,
    #[token("<=")]
    LessEq,
    #[token(">")]
    Greater,
    #[token(">=")]
    GreaterEq,
    #[token("<<")]
    ShiftLeft,
    #[token(">>")]
    ShiftRight,
    #[token(">>>")]
    UnsignedShiftRight,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("**")]
    StarStar,
    #[token("!")]
    Bang,
    #[token("~")]
    Tilde,

    // ── Forbidden forms (lexed only to be rejected) ──────────────────

    /// `=`
    #[token("=")]
    Assign,
    /// `+=`, `**=`, `>>>=`, `??=` and friends.
    #[regex(r"(\*\*|<<|>>>|>>|&&|\|\||\?\?|[-+*/%&|^])=")]
    CompoundAssign,
    #[token("++")]
    Increment,
    #[token("--")]
    Decrement,
    #[token("=>")]
    Arrow,
    #[token("`")]
    Backtick,
}

/// A token together with its source text and byte span.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<'src> {
    pub token: Token,
    pub text: &'src str,
    pub span: Range<usize>,
}

/// Tokenize an expression.
///
/// Unlike a lenient stylesheet lexer, an unknown character is an error:
/// nothing the grammar cannot name may slip through.
pub fn tokenize(input: &str) -> Result<Vec<Spanned<'_>>, ExpressionError> {
    let mut lexer = Token::lexer(input);
    let mut tokens: Vec<Spanned<'_>> = Vec::new();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(Token::Number) => {
                let mut start = span.start;
                // `?.` before a digit is `?` and a fraction: `a?.5:1`.
                if let Some(prev) = tokens.last_mut() {
                    if prev.token == Token::QuestionDot && prev.span.end == start {
                        start = prev.span.start + 1;
                        prev.token = Token::Question;
                        prev.span.end = start;
                        prev.text = &input[prev.span.clone()];
                    }
                }
                let span = start..span.end;
                tokens.push(Spanned {
                    token: Token::Number,
                    text: &input[span.clone()],
                    span,
                });
            }
            Ok(token) => tokens.push(Spanned {
                token,
                text: &input[span.clone()],
                span,
            }),
            Err(()) => {
                let found = &input[span.clone()];
                let message = match found.chars().next() {
                    Some('"') | Some('\'') => "Unterminated string literal".to_owned(),
                    Some(ch) => format!("Unexpected character '{ch}'"),
                    None => "Unexpected end of input".to_owned(),
                };
                return Err(ExpressionError::parse(span.start, message));
            }
        }
    }

    Ok(tokens)
}
