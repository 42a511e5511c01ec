//! Recursive descent expression parser.
//!
//! Parses restricted expression text into an [`Expr`] using the logos-based
//! tokenizer from [`crate::expr::tokenizer`]. The parser always starts in
//! expression position, so `{}` is an object literal and never a block.
//!
//! Binary operators use precedence climbing with the host language's
//! precedence table; `**` is right associative and mixing `??` with `&&`
//! or `||` requires parentheses.

use super::ast::*;
use super::error::ExpressionError;
use super::tokenizer::{tokenize, Spanned, Token};

/// Guard against stack exhaustion on pathological nesting.
const MAX_DEPTH: usize = 128;

/// Operators and member links folded onto a left operand, per expression.
///
/// Folding builds the tree iteratively, so [`MAX_DEPTH`] never sees it. The
/// tree's height is bounded by `MAX_DEPTH + MAX_LINKS`.
const MAX_LINKS: usize = 512;

/// Options controlling what the parser accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Accept the effect-call form `callee(args)`.
    pub effectful: bool,
    /// Reject input longer than this many bytes.
    pub max_length: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            effectful: false,
            max_length: crate::config::DEFAULT_MAX_EXPRESSION_LENGTH,
        }
    }
}

/// Parse an expression.
pub fn parse(input: &str, options: &ParseOptions) -> Result<Expr, ExpressionError> {
    if input.len() > options.max_length {
        return Err(ExpressionError::parse(
            0,
            format!("Expression exceeds {} bytes", options.max_length),
        ));
    }

    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ExpressionError::parse(0, "Expression is empty"));
    }

    let mut parser = Parser {
        tokens,
        cursor: 0,
        depth: 0,
        links: 0,
        effectful: options.effectful,
        source_len: input.len(),
    };

    let expr = parser.parse_expression()?;
    match parser.peek() {
        None => Ok(expr),
        Some(tok) if tok.token == Token::Comma => Err(ExpressionError::parse(
            tok.span.start,
            "Sequence expressions are not supported",
        )),
        Some(tok) => Err(unexpected(tok)),
    }
}

/// Recursive descent parser state.
struct Parser<'src> {
    tokens: Vec<Spanned<'src>>,
    cursor: usize,
    depth: usize,
    links: usize,
    effectful: bool,
    source_len: usize,
}

impl<'src> Parser<'src> {
    fn peek(&self) -> Option<&Spanned<'src>> {
        self.tokens.get(self.cursor)
    }

    fn peek_token(&self) -> Option<Token> {
        self.peek().map(|t| t.token)
    }

    fn advance(&mut self) -> Option<Spanned<'src>> {
        let tok = self.tokens.get(self.cursor).cloned();
        if tok.is_some() {
            self.cursor += 1;
        }
        tok
    }

    fn offset(&self) -> usize {
        self.peek().map(|t| t.span.start).unwrap_or(self.source_len)
    }

    fn end_of_input(&self) -> ExpressionError {
        ExpressionError::parse(self.source_len, "Unexpected end of expression")
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<Spanned<'src>, ExpressionError> {
        match self.advance() {
            Some(tok) if tok.token == expected => Ok(tok),
            Some(tok) => Err(ExpressionError::parse(
                tok.span.start,
                format!("Expected {what}, found '{}'", tok.text),
            )),
            None => Err(ExpressionError::parse(
                self.source_len,
                format!("Expected {what}"),
            )),
        }
    }

    /// Run `f` one nesting level deeper.
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ExpressionError>,
    ) -> Result<T, ExpressionError> {
        if self.depth >= MAX_DEPTH {
            return Err(ExpressionError::parse(
                self.offset(),
                "Expression is nested too deeply",
            ));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Count one more node folded onto an already parsed operand.
    fn link(&mut self, offset: usize) -> Result<(), ExpressionError> {
        if self.links >= MAX_LINKS {
            return Err(ExpressionError::parse(
                offset,
                "Expression has too many chained operators",
            ));
        }
        self.links += 1;
        Ok(())
    }

    // ── Expressions ──────────────────────────────────────────────────

    fn parse_expression(&mut self) -> Result<Expr, ExpressionError> {
        self.nested(Self::parse_conditional)
    }

    fn parse_conditional(&mut self) -> Result<Expr, ExpressionError> {
        let test = self.parse_binary(0)?;
        if self.peek_token() != Some(Token::Question) {
            return Ok(test);
        }
        self.advance();
        let consequent = self.parse_expression()?;
        self.expect(Token::Colon, "':'")?;
        let alternate = self.parse_expression()?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expr, ExpressionError> {
        let mut left = self.parse_unary()?;

        while let Some((precedence, op)) = self.peek_token().and_then(binary_operator) {
            if precedence < min_precedence {
                break;
            }
            let Some(op_token) = self.advance() else {
                break;
            };
            self.link(op_token.span.start)?;

            let right_assoc = matches!(op, Operator::Binary(BinaryOp::Exponent));
            if right_assoc && matches!(left, Expr::Unary { .. }) {
                return Err(ExpressionError::parse(
                    op_token.span.start,
                    "Unary operator before '**' requires parentheses",
                ));
            }
            let next_min = if right_assoc { precedence } else { precedence + 1 };
            let right = self.nested(|p| p.parse_binary(next_min))?;

            left = match op {
                Operator::Binary(op) => Expr::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                Operator::Logical(op) => {
                    if mixes_coalesce(op, &left, &right) {
                        return Err(ExpressionError::parse(
                            op_token.span.start,
                            "Mixing '??' with '&&' or '||' requires parentheses",
                        ));
                    }
                    Expr::Logical {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                    }
                }
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExpressionError> {
        let Some(tok) = self.peek() else {
            return Err(self.end_of_input());
        };
        let op = match (tok.token, tok.text) {
            (Token::Bang, _) => UnaryOp::Not,
            (Token::Minus, _) => UnaryOp::Negate,
            (Token::Plus, _) => UnaryOp::Plus,
            (Token::Tilde, _) => UnaryOp::BitNot,
            (Token::Ident, "typeof") => UnaryOp::TypeOf,
            (Token::Ident, word @ ("delete" | "void" | "await")) => {
                return Err(ExpressionError::parse(
                    tok.span.start,
                    format!("'{word}' is not supported"),
                ));
            }
            (Token::Increment | Token::Decrement, _) => return Err(unexpected(tok)),
            _ => return self.parse_postfix(),
        };
        self.advance();
        let operand = self.nested(Self::parse_unary)?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr, ExpressionError> {
        let mut expr = self.parse_primary()?;

        loop {
            if matches!(
                self.peek_token(),
                Some(Token::Dot | Token::QuestionDot | Token::BracketOpen | Token::ParenOpen)
            ) {
                self.link(self.offset())?;
            }
            match self.peek_token() {
                Some(Token::Dot) => {
                    self.advance();
                    let name = self.expect_property_name()?;
                    expr = member(expr, MemberProperty::Named(name), false);
                }
                Some(Token::QuestionDot) => {
                    self.advance();
                    expr = match self.peek_token() {
                        Some(Token::BracketOpen) => {
                            let key = self.parse_computed_key()?;
                            member(expr, MemberProperty::Computed(Box::new(key)), true)
                        }
                        Some(Token::ParenOpen) => self.parse_call(expr, true)?,
                        _ => {
                            let name = self.expect_property_name()?;
                            member(expr, MemberProperty::Named(name), true)
                        }
                    };
                }
                Some(Token::BracketOpen) => {
                    let key = self.parse_computed_key()?;
                    expr = member(expr, MemberProperty::Computed(Box::new(key)), false);
                }
                Some(Token::ParenOpen) => {
                    expr = self.parse_call(expr, false)?;
                }
                Some(Token::Increment | Token::Decrement | Token::Backtick) => {
                    return Err(self.peek().map(unexpected).unwrap_or_else(|| self.end_of_input()));
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn expect_property_name(&mut self) -> Result<String, ExpressionError> {
        match self.advance() {
            Some(tok) if tok.token == Token::Ident => Ok(tok.text.to_owned()),
            Some(tok) => Err(ExpressionError::parse(
                tok.span.start,
                format!("Expected property name, found '{}'", tok.text),
            )),
            None => Err(ExpressionError::parse(
                self.source_len,
                "Expected property name",
            )),
        }
    }

    /// Parse `[expr]`.
    fn parse_computed_key(&mut self) -> Result<Expr, ExpressionError> {
        self.expect(Token::BracketOpen, "'['")?;
        let key = self.parse_expression()?;
        self.expect(Token::BracketClose, "']'")?;
        Ok(key)
    }

    fn parse_call(&mut self, callee: Expr, optional: bool) -> Result<Expr, ExpressionError> {
        let open = self.expect(Token::ParenOpen, "'('")?;
        if !self.effectful {
            return Err(ExpressionError::parse(
                open.span.start,
                "Call expressions are not supported",
            ));
        }
        if !is_effect_callee(&callee) {
            return Err(ExpressionError::parse(
                open.span.start,
                "Only identifiers and their members can be called",
            ));
        }

        let mut arguments = Vec::new();
        loop {
            match self.peek_token() {
                Some(Token::ParenClose) => {
                    self.advance();
                    break;
                }
                Some(Token::Spread) => {
                    return Err(self.peek().map(unexpected).unwrap_or_else(|| self.end_of_input()));
                }
                _ => {}
            }
            arguments.push(self.parse_expression()?);
            match self.advance() {
                Some(tok) if tok.token == Token::Comma => {}
                Some(tok) if tok.token == Token::ParenClose => break,
                Some(tok) => return Err(unexpected(&tok)),
                None => return Err(self.end_of_input()),
            }
        }

        Ok(Expr::EffectCall {
            callee: Box::new(callee),
            arguments,
            optional,
        })
    }

    // ── Primary expressions ──────────────────────────────────────────

    fn parse_primary(&mut self) -> Result<Expr, ExpressionError> {
        let Some(tok) = self.advance() else {
            return Err(self.end_of_input());
        };

        match tok.token {
            Token::Number => parse_number(tok.text)
                .map(|n| Expr::Literal(Literal::Number(n)))
                .ok_or_else(|| {
                    ExpressionError::parse(tok.span.start, format!("Invalid number '{}'", tok.text))
                }),
            Token::DoubleQuoted | Token::SingleQuoted => {
                Ok(Expr::Literal(Literal::String(unescape(&tok)?)))
            }
            Token::Ident => self.parse_word(tok),
            Token::ParenOpen => {
                if self.peek_token() == Some(Token::ParenClose) {
                    return Err(ExpressionError::parse(
                        tok.span.start,
                        "Functions are not supported",
                    ));
                }
                let inner = self.parse_expression()?;
                if let Some(next) = self.peek() {
                    if next.token == Token::Comma {
                        return Err(ExpressionError::parse(
                            next.span.start,
                            "Sequence expressions are not supported",
                        ));
                    }
                }
                self.expect(Token::ParenClose, "')'")?;
                if let Some(next) = self.peek() {
                    if next.token == Token::Arrow {
                        return Err(unexpected(next));
                    }
                }
                Ok(Expr::Paren(Box::new(inner)))
            }
            Token::BracketOpen => self.parse_array(),
            Token::BraceOpen => self.parse_object(),
            _ => Err(unexpected(&tok)),
        }
    }

    /// Keywords, literal names and plain identifiers.
    fn parse_word(&mut self, tok: Spanned<'src>) -> Result<Expr, ExpressionError> {
        let literal = match tok.text {
            "true" => Literal::Boolean(true),
            "false" => Literal::Boolean(false),
            "null" => Literal::Null,
            "undefined" => Literal::Undefined,
            "NaN" => Literal::Number(f64::NAN),
            "Infinity" => Literal::Number(f64::INFINITY),
            word => {
                if let Some(message) = reserved_word_message(word) {
                    return Err(ExpressionError::parse(tok.span.start, message));
                }
                if self.peek_token() == Some(Token::Arrow) {
                    return Err(self.peek().map(unexpected).unwrap_or_else(|| self.end_of_input()));
                }
                return Ok(Expr::Identifier(Identifier {
                    name: word.to_owned(),
                    span: tok.span,
                }));
            }
        };
        Ok(Expr::Literal(literal))
    }

    fn parse_array(&mut self) -> Result<Expr, ExpressionError> {
        let mut items = Vec::new();
        loop {
            match self.peek() {
                Some(tok) if tok.token == Token::BracketClose => {
                    self.advance();
                    break;
                }
                Some(tok) if tok.token == Token::Comma => {
                    return Err(ExpressionError::parse(
                        tok.span.start,
                        "Array holes are not supported",
                    ));
                }
                Some(tok) if tok.token == Token::Spread => return Err(unexpected(tok)),
                Some(_) => {}
                None => return Err(self.end_of_input()),
            }
            items.push(self.parse_expression()?);
            match self.advance() {
                Some(tok) if tok.token == Token::Comma => {}
                Some(tok) if tok.token == Token::BracketClose => break,
                Some(tok) => return Err(unexpected(&tok)),
                None => return Err(self.end_of_input()),
            }
        }
        Ok(Expr::Array(items))
    }

    fn parse_object(&mut self) -> Result<Expr, ExpressionError> {
        let mut properties = Vec::new();
        loop {
            let Some(tok) = self.advance() else {
                return Err(self.end_of_input());
            };
            let key = match tok.token {
                Token::BraceClose => break,
                Token::Ident => PropertyKey::Named(tok.text.to_owned()),
                Token::DoubleQuoted | Token::SingleQuoted => PropertyKey::Named(unescape(&tok)?),
                Token::Number => {
                    let n = parse_number(tok.text).ok_or_else(|| {
                        ExpressionError::parse(tok.span.start, format!("Invalid number '{}'", tok.text))
                    })?;
                    PropertyKey::Named(super::value::number_to_string(n))
                }
                Token::BracketOpen => {
                    let key = self.parse_expression()?;
                    self.expect(Token::BracketClose, "']'")?;
                    PropertyKey::Computed(Box::new(key))
                }
                _ => return Err(unexpected(&tok)),
            };

            let property = match self.peek_token() {
                Some(Token::Colon) => {
                    self.advance();
                    Property {
                        key,
                        value: self.parse_expression()?,
                        shorthand: false,
                    }
                }
                Some(Token::Comma | Token::BraceClose)
                    if tok.token == Token::Ident && is_shorthand_name(tok.text) =>
                {
                    Property {
                        key,
                        value: Expr::Identifier(Identifier {
                            name: tok.text.to_owned(),
                            span: tok.span.clone(),
                        }),
                        shorthand: true,
                    }
                }
                Some(Token::ParenOpen) => {
                    return Err(ExpressionError::parse(
                        self.offset(),
                        "Functions are not supported",
                    ));
                }
                _ => {
                    let found = self.peek().map(|t| t.text).unwrap_or("end of expression");
                    return Err(ExpressionError::parse(
                        self.offset(),
                        format!("Expected ':', found '{found}'"),
                    ));
                }
            };
            properties.push(property);

            match self.advance() {
                Some(tok) if tok.token == Token::Comma => {}
                Some(tok) if tok.token == Token::BraceClose => break,
                Some(tok) => return Err(unexpected(&tok)),
                None => return Err(self.end_of_input()),
            }
        }
        Ok(Expr::Object(properties))
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

enum Operator {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

/// Precedence (higher binds tighter) and operator for a binary token.
fn binary_operator(token: Token) -> Option<(u8, Operator)> {
    use Operator::{Binary, Logical};
    let entry = match token {
        Token::Coalesce => (1, Logical(LogicalOp::Coalesce)),
        Token::Or => (1, Logical(LogicalOp::Or)),
        Token::And => (2, Logical(LogicalOp::And)),
        Token::BitOr => (3, Binary(BinaryOp::BitOr)),
        Token::BitXor => (4, Binary(BinaryOp::BitXor)),
        Token::BitAnd => (5, Binary(BinaryOp::BitAnd)),
        Token::LooseEq => (6, Binary(BinaryOp::LooseEq)),
        Token::LooseNotEq => (6, Binary(BinaryOp::LooseNotEq)),
        Token::StrictEq => (6, Binary(BinaryOp::StrictEq)),
        Token::StrictNotEq => (6, Binary(BinaryOp::StrictNotEq)),
        Token::Less => (7, Binary(BinaryOp::Less)),
        Token::LessEq => (7, Binary(BinaryOp::LessEq)),
        Token::Greater => (7, Binary(BinaryOp::Greater)),
        Token::GreaterEq => (7, Binary(BinaryOp::GreaterEq)),
        Token::ShiftLeft => (8, Binary(BinaryOp::ShiftLeft)),
        Token::ShiftRight => (8, Binary(BinaryOp::ShiftRight)),
        Token::UnsignedShiftRight => (8, Binary(BinaryOp::UnsignedShiftRight)),
        Token::Plus => (9, Binary(BinaryOp::Add)),
        Token::Minus => (9, Binary(BinaryOp::Subtract)),
        Token::Star => (10, Binary(BinaryOp::Multiply)),
        Token::Slash => (10, Binary(BinaryOp::Divide)),
        Token::Percent => (10, Binary(BinaryOp::Remainder)),
        Token::StarStar => (11, Binary(BinaryOp::Exponent)),
        _ => return None,
    };
    Some(entry)
}

fn mixes_coalesce(op: LogicalOp, left: &Expr, right: &Expr) -> bool {
    let is_logical = |expr: &Expr, wanted: &[LogicalOp]| {
        matches!(expr, Expr::Logical { op, .. } if wanted.contains(op))
    };
    match op {
        LogicalOp::Coalesce => {
            let others = [LogicalOp::And, LogicalOp::Or];
            is_logical(left, &others) || is_logical(right, &others)
        }
        LogicalOp::And | LogicalOp::Or => {
            let coalesce = [LogicalOp::Coalesce];
            is_logical(left, &coalesce) || is_logical(right, &coalesce)
        }
    }
}

fn member(object: Expr, property: MemberProperty, optional: bool) -> Expr {
    Expr::Member {
        object: Box::new(object),
        property,
        optional,
    }
}

/// Effects are addressed by name: `effect(..)` or `target.effect(..)`.
fn is_effect_callee(callee: &Expr) -> bool {
    match callee {
        Expr::Identifier(_) => true,
        Expr::Member { object, .. } => is_effect_callee(object),
        _ => false,
    }
}

fn is_shorthand_name(word: &str) -> bool {
    !matches!(
        word,
        "true" | "false" | "null" | "undefined" | "NaN" | "Infinity" | "typeof"
    ) && reserved_word_message(word).is_none()
}

fn reserved_word_message(word: &str) -> Option<&'static str> {
    let message = match word {
        "function" | "async" => "Functions are not supported",
        "class" => "Classes are not supported",
        "var" | "let" | "const" => "Declarations are not supported",
        "new" => "'new' is not supported",
        "this" => "'this' is not supported",
        "super" | "import" | "export" | "yield" => "Module and generator syntax is not supported",
        "if" | "else" | "for" | "while" | "do" | "return" | "switch" | "case" | "default"
        | "try" | "catch" | "finally" | "throw" | "break" | "continue" | "with"
        | "debugger" => "Statements are not supported",
        "in" | "instanceof" => "'in' and 'instanceof' are not supported",
        "delete" | "void" | "await" | "typeof" => "Unexpected operator",
        _ => return None,
    };
    Some(message)
}

/// Error for a token that cannot appear where it was found.
fn unexpected(tok: &Spanned<'_>) -> ExpressionError {
    let message = match tok.token {
        Token::Assign | Token::CompoundAssign => "Assignment is not supported".to_owned(),
        Token::Increment | Token::Decrement => {
            "Increment and decrement operators are not supported".to_owned()
        }
        Token::Arrow => "Functions are not supported".to_owned(),
        Token::Semicolon => "Statements are not supported".to_owned(),
        Token::Spread => "Spread syntax is not supported".to_owned(),
        Token::Backtick => "Template literals are not supported".to_owned(),
        Token::Ident => match reserved_word_message(tok.text) {
            Some(message) => message.to_owned(),
            None => format!("Unexpected identifier '{}'", tok.text),
        },
        _ => format!("Unexpected token '{}'", tok.text),
    };
    ExpressionError::parse(tok.span.start, message)
}

fn parse_number(text: &str) -> Option<f64> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return hex
            .chars()
            .try_fold(0f64, |acc, c| c.to_digit(16).map(|d| acc * 16.0 + f64::from(d)));
    }
    text.parse::<f64>().ok()
}

/// Decode the body of a quoted string token.
fn unescape(tok: &Spanned<'_>) -> Result<String, ExpressionError> {
    let inner = &tok.text[1..tok.text.len() - 1];
    let mut units: Vec<u16> = Vec::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    let bad_escape =
        || ExpressionError::parse(tok.span.start, "Invalid escape sequence in string literal");

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            let mut buf = [0u16; 2];
            units.extend_from_slice(ch.encode_utf16(&mut buf));
            continue;
        }
        let Some(escaped) = chars.next() else {
            return Err(bad_escape());
        };
        match escaped {
            'n' => units.push(u16::from(b'\n')),
            'r' => units.push(u16::from(b'\r')),
            't' => units.push(u16::from(b'\t')),
            'b' => units.push(0x08),
            'f' => units.push(0x0c),
            'v' => units.push(0x0b),
            '0' if !chars.peek().is_some_and(|c| c.is_ascii_digit()) => units.push(0),
            'x' => {
                let hex: String = (0..2).filter_map(|_| chars.next()).collect();
                let code = u16::from_str_radix(&hex, 16).map_err(|_| bad_escape())?;
                if hex.len() != 2 {
                    return Err(bad_escape());
                }
                units.push(code);
            }
            'u' if chars.peek() == Some(&'{') => {
                chars.next();
                let mut hex = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) if c.is_ascii_hexdigit() => hex.push(c),
                        _ => return Err(bad_escape()),
                    }
                }
                let code = u32::from_str_radix(&hex, 16).map_err(|_| bad_escape())?;
                let decoded = char::from_u32(code).ok_or_else(bad_escape)?;
                let mut buf = [0u16; 2];
                units.extend_from_slice(decoded.encode_utf16(&mut buf));
            }
            'u' => {
                let hex: String = (0..4).filter_map(|_| chars.next()).collect();
                if hex.len() != 4 {
                    return Err(bad_escape());
                }
                units.push(u16::from_str_radix(&hex, 16).map_err(|_| bad_escape())?);
            }
            other => {
                let mut buf = [0u16; 2];
                units.extend_from_slice(other.encode_utf16(&mut buf));
            }
        }
    }

    Ok(String::from_utf16_lossy(&units))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_ok(input: &str) -> Expr {
        parse(input, &ParseOptions::default()).unwrap()
    }

    fn parse_effect(input: &str) -> Result<Expr, ExpressionError> {
        parse(
            input,
            &ParseOptions {
                effectful: true,
                ..ParseOptions::default()
            },
        )
    }

    fn parse_err(input: &str) -> String {
        match parse(input, &ParseOptions::default()).unwrap_err() {
            ExpressionError::Parse { message, .. } => message,
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    fn ident(name: &str, start: usize) -> Expr {
        Expr::Identifier(Identifier {
            name: name.to_owned(),
            span: start..start + name.len(),
        })
    }

    fn num(n: f64) -> Expr {
        Expr::Literal(Literal::Number(n))
    }

    // ── Literals ─────────────────────────────────────────────────────

    #[test]
    fn literals() {
        assert_eq!(parse_ok("42"), num(42.0));
        assert_eq!(parse_ok("0x1F"), num(31.0));
        assert_eq!(parse_ok("true"), Expr::Literal(Literal::Boolean(true)));
        assert_eq!(parse_ok("null"), Expr::Literal(Literal::Null));
        assert_eq!(parse_ok("undefined"), Expr::Literal(Literal::Undefined));
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            parse_ok(r#""a\n\t\"bA\u{1F600}\x41""#),
            Expr::Literal(Literal::String("a\n\t\"bA\u{1F600}A".to_owned()))
        );
        assert_eq!(
            parse_ok(r"'😀'"),
            Expr::Literal(Literal::String("\u{1F600}".to_owned()))
        );
    }

    #[test]
    fn bad_escape_is_rejected() {
        assert_eq!(parse_err(r#""\u12""#), "Invalid escape sequence in string literal");
    }

    #[test]
    fn empty_braces_are_an_object() {
        assert_eq!(parse_ok("{}"), Expr::Object(vec![]));
        assert_eq!(parse_ok("  { }  "), Expr::Object(vec![]));
    }

    #[test]
    fn object_literal_keys() {
        let expr = parse_ok(r#"{a: 1, "b c": 2, 3: x, [k]: 4, y,}"#);
        let Expr::Object(props) = expr else {
            panic!("expected object");
        };
        assert_eq!(props.len(), 5);
        assert_eq!(props[0].key, PropertyKey::Named("a".to_owned()));
        assert_eq!(props[1].key, PropertyKey::Named("b c".to_owned()));
        assert_eq!(props[2].key, PropertyKey::Named("3".to_owned()));
        assert!(matches!(props[3].key, PropertyKey::Computed(_)));
        assert!(props[4].shorthand);
    }

    #[test]
    fn array_literal_with_trailing_comma() {
        assert_eq!(parse_ok("[1, 2,]"), Expr::Array(vec![num(1.0), num(2.0)]));
    }

    // ── Operators ────────────────────────────────────────────────────

    #[test]
    fn precedence_multiplication_over_addition() {
        assert_eq!(
            parse_ok("1 + 2 * 3"),
            Expr::Binary {
                op: BinaryOp::Add,
                left: Box::new(num(1.0)),
                right: Box::new(Expr::Binary {
                    op: BinaryOp::Multiply,
                    left: Box::new(num(2.0)),
                    right: Box::new(num(3.0)),
                }),
            }
        );
    }

    #[test]
    fn subtraction_is_left_associative() {
        let Expr::Binary { left, .. } = parse_ok("1 - 2 - 3") else {
            panic!("expected binary");
        };
        assert!(matches!(*left, Expr::Binary { op: BinaryOp::Subtract, .. }));
    }

    #[test]
    fn exponent_is_right_associative() {
        let Expr::Binary { right, .. } = parse_ok("2 ** 3 ** 2") else {
            panic!("expected binary");
        };
        assert!(matches!(*right, Expr::Binary { op: BinaryOp::Exponent, .. }));
    }

    #[test]
    fn unary_before_exponent_needs_parens() {
        assert_eq!(parse_err("-2 ** 2"), "Unary operator before '**' requires parentheses");
        assert!(parse(" (-2) ** 2", &ParseOptions::default()).is_ok());
    }

    #[test]
    fn coalesce_mixing_needs_parens() {
        assert_eq!(
            parse_err("a ?? b || c"),
            "Mixing '??' with '&&' or '||' requires parentheses"
        );
        assert!(parse("a ?? (b || c)", &ParseOptions::default()).is_ok());
    }

    #[test]
    fn conditional() {
        assert_eq!(
            parse_ok("a ? 1 : 2"),
            Expr::Conditional {
                test: Box::new(ident("a", 0)),
                consequent: Box::new(num(1.0)),
                alternate: Box::new(num(2.0)),
            }
        );
    }

    #[test]
    fn member_chains() {
        let expr = parse_ok("a.b?.[0].c");
        let Expr::Member { object, property, optional } = expr else {
            panic!("expected member");
        };
        assert_eq!(property, MemberProperty::Named("c".to_owned()));
        assert!(!optional);
        assert!(matches!(*object, Expr::Member { optional: true, .. }));
    }

    #[test]
    fn keywords_are_valid_property_names() {
        assert!(parse("a.default.class", &ParseOptions::default()).is_ok());
    }

    // ── Rejections ───────────────────────────────────────────────────

    #[test]
    fn rejects_assignment() {
        assert_eq!(parse_err("a = 1"), "Assignment is not supported");
        assert_eq!(parse_err("a += 1"), "Assignment is not supported");
        assert_eq!(parse_err("[a = 1]"), "Assignment is not supported");
    }

    #[test]
    fn rejects_update_operators() {
        assert_eq!(parse_err("a++"), "Increment and decrement operators are not supported");
        assert_eq!(parse_err("--a"), "Increment and decrement operators are not supported");
    }

    #[test]
    fn rejects_functions() {
        assert_eq!(parse_err("() => 1"), "Functions are not supported");
        assert_eq!(parse_err("x => x"), "Functions are not supported");
        assert_eq!(parse_err("(x) => x"), "Functions are not supported");
        assert_eq!(parse_err("function f() {}"), "Functions are not supported");
        assert_eq!(parse_err("{ m() {} }"), "Functions are not supported");
    }

    #[test]
    fn rejects_statements_and_declarations() {
        assert_eq!(parse_err("let a = 1"), "Declarations are not supported");
        assert_eq!(parse_err("1; 2"), "Statements are not supported");
        assert_eq!(parse_err("while (true) {}"), "Statements are not supported");
    }

    #[test]
    fn rejects_sequences() {
        assert_eq!(parse_err("1, 2"), "Sequence expressions are not supported");
        assert_eq!(parse_err("(1, 2)"), "Sequence expressions are not supported");
    }

    #[test]
    fn rejects_calls_outside_effects() {
        assert_eq!(parse_err("f()"), "Call expressions are not supported");
        assert_eq!(parse_err("a.b(1)"), "Call expressions are not supported");
    }

    #[test]
    fn rejects_misc() {
        assert_eq!(parse_err("new Date()"), "'new' is not supported");
        assert_eq!(parse_err("this.x"), "'this' is not supported");
        assert_eq!(parse_err("`a`"), "Template literals are not supported");
        assert_eq!(parse_err("[...a]"), "Spread syntax is not supported");
        assert_eq!(parse_err("[1,,2]"), "Array holes are not supported");
        assert_eq!(parse_err("a in b"), "'in' and 'instanceof' are not supported");
        assert_eq!(parse_err("delete a.b"), "'delete' is not supported");
    }

    #[test]
    fn reports_offsets() {
        let err = parse("1 + ", &ParseOptions::default()).unwrap_err();
        assert_eq!(
            err,
            ExpressionError::Parse {
                offset: 4,
                message: "Unexpected end of expression".to_owned()
            }
        );
    }

    #[test]
    fn empty_input_is_an_error() {
        assert_eq!(parse_err("   "), "Expression is empty");
    }

    #[test]
    fn max_length_is_enforced() {
        let options = ParseOptions {
            effectful: false,
            max_length: 3,
        };
        assert!(parse("1+2", &options).is_ok());
        assert!(parse("1 + 2", &options).is_err());
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let input = format!("{}1{}", "(".repeat(500), ")".repeat(500));
        assert_eq!(parse_err(&input), "Expression is nested too deeply");
    }

    #[test]
    fn long_operator_chains_are_rejected() {
        let input = format!("1{}", "+1".repeat(20_000));
        assert_eq!(parse_err(&input), "Expression has too many chained operators");

        let input = format!("a{}", ".b".repeat(30_000));
        assert_eq!(parse_err(&input), "Expression has too many chained operators");
    }

    #[test]
    fn chains_count_across_parentheses() {
        // Each group stays short, the whole expression does not.
        let group = format!("({})", format!("1{}", "+1".repeat(100)));
        let input = vec![group; 10].join("+");
        assert_eq!(parse_err(&input), "Expression has too many chained operators");
    }

    #[test]
    fn moderate_chains_parse() {
        assert!(parse(&format!("1{}", "+1".repeat(300)), &ParseOptions::default()).is_ok());
        assert!(parse(&format!("a{}", "?.b".repeat(300)), &ParseOptions::default()).is_ok());
    }

    // ── Effects ──────────────────────────────────────────────────────

    #[test]
    fn effect_calls_in_effectful_mode() {
        let expr = parse_effect("count.set(count + 1)").unwrap();
        let Expr::EffectCall { callee, arguments, optional } = expr else {
            panic!("expected effect call");
        };
        assert!(matches!(*callee, Expr::Member { .. }));
        assert_eq!(arguments.len(), 1);
        assert!(!optional);
    }

    #[test]
    fn effect_callee_must_be_named() {
        let err = parse_effect("(a ? b : c)(1)").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Only identifiers and their members can be called (at 11)"
        );
        assert!(parse_effect("f()(1)").is_err());
    }

    #[test]
    fn effectful_mode_still_rejects_assignment() {
        assert!(parse_effect("a = 1").is_err());
    }
}
