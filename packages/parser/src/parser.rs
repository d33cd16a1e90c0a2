use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::lexer::{tokenize, SpannedToken, Token};
use std::ops::Range;

/// Recursive-descent expression parser over a pre-lexed token slice.
///
/// The parser never sees a whole module: the scanner hands it the token range of
/// a call argument list or a JSX attribute value. List items it cannot model are
/// skipped by bracket matching and kept as [`Expr::Opaque`].
pub struct Parser<'t, 'src> {
    source: &'src str,
    tokens: &'t [SpannedToken<'src>],
    pos: usize,
    end: usize,
}

impl<'t, 'src> Parser<'t, 'src> {
    pub fn new(source: &'src str, tokens: &'t [SpannedToken<'src>]) -> Self {
        Self::with_range(source, tokens, 0..tokens.len())
    }

    pub fn with_range(
        source: &'src str,
        tokens: &'t [SpannedToken<'src>],
        range: Range<usize>,
    ) -> Self {
        Self {
            source,
            tokens,
            pos: range.start,
            end: range.end.min(tokens.len()),
        }
    }

    /// Parse one expression that must cover the whole range
    pub fn parse_expression(&mut self) -> ParseResult<Expr> {
        let expr = self.parse_assignment()?;
        if self.pos < self.end {
            let token = &self.tokens[self.pos];
            return Err(ParseError::unexpected_token(
                token.span,
                "end of expression",
                format!("{:?}", token.token),
            ));
        }
        Ok(expr)
    }

    /// Parse a comma separated list up to the end of the range
    pub fn parse_arguments(&mut self) -> ParseResult<Vec<ArrayElement>> {
        let end = self.end;
        self.parse_list_until(end, Self::parse_array_element, |span| {
            if span.start == span.end {
                ArrayElement::Hole(span)
            } else {
                ArrayElement::Expr(Expr::Opaque { span })
            }
        })
    }

    fn parse_assignment(&mut self) -> ParseResult<Expr> {
        self.parse_conditional()
    }

    fn parse_conditional(&mut self) -> ParseResult<Expr> {
        let test = self.parse_binary(1)?;
        if !self.eat(&Token::Question) {
            return Ok(test);
        }
        let consequent = self.parse_assignment()?;
        self.expect(&Token::Colon, "':'")?;
        let alternate = self.parse_assignment()?;
        let span = test.span().merge(alternate.span());
        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
            span,
        })
    }

    fn parse_binary(&mut self, min_prec: u8) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;

        while let Some(op) = self.peek().and_then(infix_operator) {
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            self.advance();
            let next_min = if op.is_right_associative() { prec } else { prec + 1 };
            let right = self.parse_binary(next_min)?;
            let span = left.span().merge(right.span());
            left = match op {
                Infix::Logical(op) => Expr::Logical {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                    span,
                },
                Infix::Binary(op) => Expr::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                    span,
                },
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOp::Minus,
            Some(Token::Plus) => UnaryOp::Plus,
            Some(Token::Bang) => UnaryOp::Not,
            Some(Token::Tilde) => UnaryOp::BitNot,
            Some(Token::Typeof) => UnaryOp::Typeof,
            _ => return self.parse_postfix(),
        };
        let start = self.current_span();
        self.advance();
        let argument = self.parse_unary()?;
        let span = start.merge(argument.span());
        Ok(Expr::Unary {
            op,
            argument: Box::new(argument),
            span,
        })
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.peek() {
                Some(Token::Dot) | Some(Token::OptionalChain) => {
                    self.advance();
                    match self.peek() {
                        Some(Token::LParen) | Some(Token::LBracket) => continue,
                        _ => {}
                    }
                    let name_span = self.current_span();
                    let name = self.expect_name()?;
                    let span = expr.span().merge(name_span);
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property: MemberProperty::Name(name),
                        span,
                    };
                }
                Some(Token::LBracket) => {
                    let close = self.matching_close(self.pos)?;
                    let inner = self.parse_nested(self.pos + 1..close)?;
                    let span = expr.span().merge(self.tokens[close].span);
                    self.pos = close + 1;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property: MemberProperty::Computed(Box::new(inner)),
                        span,
                    };
                }
                Some(Token::LParen) => {
                    let close = self.matching_close(self.pos)?;
                    self.advance();
                    let arguments =
                        self.parse_list_until(close, Self::parse_array_element, |span| {
                            ArrayElement::Expr(Expr::Opaque { span })
                        })?;
                    let span = expr.span().merge(self.tokens[close].span);
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        arguments,
                        span,
                    };
                }
                Some(Token::Template(_)) => {
                    // Tagged template: nothing static to learn from it
                    let span = expr.span().merge(self.current_span());
                    self.advance();
                    expr = Expr::Opaque { span };
                }
                Some(Token::Bang) if self.non_null_assertion_follows() => {
                    self.advance();
                }
                Some(Token::As) => {
                    self.advance();
                    self.skip_type()?;
                }
                Some(Token::Ident("satisfies")) => {
                    self.advance();
                    self.skip_type()?;
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let tokens = self.tokens;
        let Some(current) = tokens.get(self.pos).filter(|_| self.pos < self.end) else {
            return Err(ParseError::unexpected_eof(self.eof_pos(), "expression"));
        };
        let span = current.span;

        let expr = match &current.token {
            Token::String(raw) => Expr::Str {
                value: unescape(&raw[1..raw.len() - 1]),
                span,
            },
            Token::Template(raw) => {
                let body = &raw[1..raw.len() - 1];
                Expr::Template {
                    cooked: (!has_substitution(body)).then(|| unescape(body)),
                    span,
                }
            }
            Token::Number(raw) => Expr::Num {
                value: parse_number(raw).ok_or_else(|| {
                    ParseError::invalid_syntax(span, format!("Invalid number literal {}", raw))
                })?,
                span,
            },
            Token::True => Expr::Bool { value: true, span },
            Token::False => Expr::Bool { value: false, span },
            Token::Null => Expr::Null { span },
            Token::Regex(_) => Expr::Opaque { span },
            Token::Ident("undefined") => Expr::Undefined { span },
            Token::Ident(name) => Expr::Ident {
                name: name.to_string(),
                span,
            },
            Token::LParen => {
                let close = self.matching_close(self.pos)?;
                let inner = self.parse_nested(self.pos + 1..close)?;
                let span = span.merge(tokens[close].span);
                self.pos = close + 1;
                return Ok(Expr::Paren {
                    expression: Box::new(inner),
                    span,
                });
            }
            Token::LBracket => {
                let close = self.matching_close(self.pos)?;
                self.advance();
                let elements = self.parse_list_until(close, Self::parse_array_element, |span| {
                    if span.start == span.end {
                        ArrayElement::Hole(span)
                    } else {
                        ArrayElement::Expr(Expr::Opaque { span })
                    }
                })?;
                return Ok(Expr::Array {
                    elements,
                    span: span.merge(tokens[close].span),
                });
            }
            Token::LBrace => {
                let close = self.matching_close(self.pos)?;
                self.advance();
                let properties = self.parse_list_until(close, Self::parse_property, |span| {
                    Property::Opaque { span }
                })?;
                return Ok(Expr::Object {
                    properties,
                    span: span.merge(tokens[close].span),
                });
            }
            other => {
                return Err(ParseError::unexpected_token(
                    span,
                    "expression",
                    format!("{:?}", other),
                ));
            }
        };

        self.advance();
        Ok(expr)
    }

    fn parse_array_element(&mut self) -> ParseResult<ArrayElement> {
        if self.eat(&Token::Ellipsis) {
            return Ok(ArrayElement::Spread(self.parse_assignment()?));
        }
        Ok(ArrayElement::Expr(self.parse_assignment()?))
    }

    fn parse_property(&mut self) -> ParseResult<Property> {
        let start = self.current_span();

        if self.eat(&Token::Ellipsis) {
            let argument = self.parse_assignment()?;
            let span = start.merge(argument.span());
            return Ok(Property::Spread { argument, span });
        }

        let key = match self.peek() {
            Some(Token::String(raw)) => {
                let key = PropertyKey::Str(unescape(&raw[1..raw.len() - 1]));
                self.advance();
                key
            }
            Some(Token::Number(raw)) => {
                let value = parse_number(raw).ok_or_else(|| {
                    ParseError::invalid_syntax(start, "Invalid numeric key")
                })?;
                self.advance();
                PropertyKey::Num(value)
            }
            Some(Token::LBracket) => {
                let close = self.matching_close(self.pos)?;
                let inner = self.parse_nested(self.pos + 1..close)?;
                self.pos = close + 1;
                PropertyKey::Computed(Box::new(inner))
            }
            Some(token) => match token.name() {
                Some(name) => {
                    let name = name.to_string();
                    self.advance();
                    if self.at_item_end() {
                        return Ok(Property::Shorthand { name, span: start });
                    }
                    PropertyKey::Name(name)
                }
                None => {
                    return Err(ParseError::unexpected_token(
                        start,
                        "property key",
                        format!("{:?}", token),
                    ))
                }
            },
            None => return Err(ParseError::unexpected_eof(self.eof_pos(), "property key")),
        };

        self.expect(&Token::Colon, "':'")?;
        let value = self.parse_assignment()?;
        let span = start.merge(value.span());
        Ok(Property::KeyValue { key, value, span })
    }

    /// Parse items separated by commas up to token index `close`.
    ///
    /// An item that fails to parse, or that parses but is followed by something
    /// other than a comma, is re-scanned by bracket matching and handed to
    /// `opaque` with its extent.
    fn parse_list_until<T>(
        &mut self,
        close: usize,
        mut item: impl FnMut(&mut Self) -> ParseResult<T>,
        opaque: impl Fn(Span) -> T,
    ) -> ParseResult<Vec<T>> {
        let saved_end = self.end;
        self.end = close;
        let result = self.parse_items(close, &mut item, &opaque);
        self.end = saved_end;
        let items = result?;
        if self.pos != close {
            return Err(ParseError::unexpected_token(
                self.current_span(),
                "',' or closing bracket",
                format!("{:?}", self.tokens[self.pos].token),
            ));
        }
        self.pos = close + 1;
        Ok(items)
    }

    fn parse_items<T>(
        &mut self,
        close: usize,
        item: &mut impl FnMut(&mut Self) -> ParseResult<T>,
        opaque: &impl Fn(Span) -> T,
    ) -> ParseResult<Vec<T>> {
        let mut items = Vec::new();
        while self.pos < close {
            let start = self.pos;
            match item(self) {
                Ok(value) if self.at_item_end() => items.push(value),
                _ => {
                    self.pos = start;
                    let span = self.skip_item()?;
                    items.push(opaque(span));
                }
            }
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        Ok(items)
    }

    /// Parse an expression spanning exactly `range`
    fn parse_nested(&mut self, range: Range<usize>) -> ParseResult<Expr> {
        let mut nested = Parser::with_range(self.source, self.tokens, range);
        nested.parse_expression()
    }

    /// Advance to the next top-level comma or the end of the range
    fn skip_item(&mut self) -> ParseResult<Span> {
        let start = self.pos;
        while self.pos < self.end {
            let token = &self.tokens[self.pos].token;
            if *token == Token::Comma {
                break;
            }
            if token.is_open() {
                self.pos = self.matching_close(self.pos)? + 1;
            } else {
                self.pos += 1;
            }
        }
        if self.pos == start {
            let at = self.tokens.get(start).map(|t| t.span.start).unwrap_or(self.eof_pos());
            return Ok(Span::new(at, at));
        }
        Ok(self.tokens[start].span.merge(self.tokens[self.pos - 1].span))
    }

    fn skip_type(&mut self) -> ParseResult<()> {
        self.expect_name()?;
        while self.eat(&Token::Dot) {
            self.expect_name()?;
        }
        if self.check(&Token::Lt) {
            let mut depth = 0usize;
            while let Some(token) = self.peek() {
                match token {
                    Token::Lt => depth += 1,
                    Token::Gt => depth -= 1,
                    _ => {}
                }
                self.advance();
                if depth == 0 {
                    break;
                }
            }
        }
        while self.check(&Token::LBracket)
            && matches!(self.tokens.get(self.pos + 1).map(|t| &t.token), Some(Token::RBracket))
        {
            self.pos += 2;
        }
        Ok(())
    }

    fn non_null_assertion_follows(&self) -> bool {
        match self.tokens.get(self.pos + 1).filter(|_| self.pos + 1 < self.end) {
            None => true,
            Some(next) => matches!(
                next.token,
                Token::Dot
                    | Token::LBracket
                    | Token::RParen
                    | Token::RBracket
                    | Token::RBrace
                    | Token::Comma
                    | Token::Semi
                    | Token::Question
                    | Token::Colon
            ),
        }
    }

    fn matching_close(&self, open: usize) -> ParseResult<usize> {
        matching_close(self.tokens, open)
    }

    fn at_item_end(&self) -> bool {
        self.pos >= self.end || self.tokens[self.pos].token == Token::Comma
    }

    fn peek(&self) -> Option<&Token<'src>> {
        if self.pos < self.end {
            self.tokens.get(self.pos).map(|t| &t.token)
        } else {
            None
        }
    }

    fn check(&self, token: &Token<'_>) -> bool {
        self.peek() == Some(token)
    }

    fn eat(&mut self, token: &Token<'_>) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn advance(&mut self) {
        if self.pos < self.end {
            self.pos += 1;
        }
    }

    fn expect(&mut self, token: &Token<'_>, expected: &str) -> ParseResult<()> {
        if self.eat(token) {
            return Ok(());
        }
        match self.peek() {
            Some(found) => Err(ParseError::unexpected_token(
                self.current_span(),
                expected,
                format!("{:?}", found),
            )),
            None => Err(ParseError::unexpected_eof(self.eof_pos(), expected)),
        }
    }

    fn expect_name(&mut self) -> ParseResult<String> {
        match self.peek().and_then(|t| t.name()) {
            Some(name) => {
                let name = name.to_string();
                self.advance();
                Ok(name)
            }
            None => match self.peek() {
                Some(found) => Err(ParseError::unexpected_token(
                    self.current_span(),
                    "identifier",
                    format!("{:?}", found),
                )),
                None => Err(ParseError::unexpected_eof(self.eof_pos(), "identifier")),
            },
        }
    }

    fn current_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map(|t| t.span)
            .unwrap_or_else(|| Span::new(self.eof_pos(), self.eof_pos()))
    }

    fn eof_pos(&self) -> usize {
        self.tokens
            .get(self.end.saturating_sub(1))
            .map(|t| t.span.end)
            .unwrap_or(self.source.len())
    }
}

/// Index of the bracket closing the one at `open`
pub fn matching_close(tokens: &[SpannedToken<'_>], open: usize) -> ParseResult<usize> {
    let mut stack: Vec<(&'static str, Token<'static>)> = Vec::new();
    for (index, spanned) in tokens.iter().enumerate().skip(open) {
        match spanned.token {
            Token::LBrace => stack.push(("{", Token::RBrace)),
            Token::LParen => stack.push(("(", Token::RParen)),
            Token::LBracket => stack.push(("[", Token::RBracket)),
            ref token if token.is_close() => {
                let Some((open_text, expected)) = stack.pop() else {
                    return Err(ParseError::unexpected_token(spanned.span, "expression", "closing bracket"));
                };
                if *token != expected {
                    return Err(ParseError::Unbalanced {
                        span: tokens[open].span,
                        open: open_text,
                    });
                }
                if stack.is_empty() {
                    return Ok(index);
                }
            }
            _ => {}
        }
        if stack.is_empty() {
            break;
        }
    }
    let open_text = match tokens.get(open).map(|t| &t.token) {
        Some(Token::LBrace) => "{",
        Some(Token::LBracket) => "[",
        _ => "(",
    };
    Err(ParseError::Unbalanced {
        span: tokens.get(open).map(|t| t.span).unwrap_or_default(),
        open: open_text,
    })
}

/// Parse a standalone expression from source text
pub fn parse(source: &str) -> ParseResult<Expr> {
    let tokens = tokenize(source);
    Parser::new(source, &tokens).parse_expression()
}

#[derive(Debug, Clone, Copy)]
enum Infix {
    Logical(LogicalOp),
    Binary(BinaryOp),
}

impl Infix {
    fn precedence(self) -> u8 {
        match self {
            Infix::Logical(LogicalOp::Nullish) => 1,
            Infix::Logical(LogicalOp::Or) => 2,
            Infix::Logical(LogicalOp::And) => 3,
            Infix::Binary(op) => match op {
                BinaryOp::BitOr => 4,
                BinaryOp::BitXor => 5,
                BinaryOp::BitAnd => 6,
                BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::StrictEq | BinaryOp::StrictNotEq => 7,
                BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Lte | BinaryOp::Gte => 8,
                BinaryOp::Add | BinaryOp::Sub => 9,
                BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 10,
                BinaryOp::Pow => 11,
            },
        }
    }

    fn is_right_associative(self) -> bool {
        matches!(self, Infix::Binary(BinaryOp::Pow))
    }
}

fn infix_operator(token: &Token<'_>) -> Option<Infix> {
    let op = match token {
        Token::Nullish => Infix::Logical(LogicalOp::Nullish),
        Token::Or => Infix::Logical(LogicalOp::Or),
        Token::And => Infix::Logical(LogicalOp::And),
        Token::Pipe => Infix::Binary(BinaryOp::BitOr),
        Token::Caret => Infix::Binary(BinaryOp::BitXor),
        Token::Amp => Infix::Binary(BinaryOp::BitAnd),
        Token::EqEq => Infix::Binary(BinaryOp::Eq),
        Token::NotEq => Infix::Binary(BinaryOp::NotEq),
        Token::StrictEq => Infix::Binary(BinaryOp::StrictEq),
        Token::StrictNotEq => Infix::Binary(BinaryOp::StrictNotEq),
        Token::Lt => Infix::Binary(BinaryOp::Lt),
        Token::Gt => Infix::Binary(BinaryOp::Gt),
        Token::Lte => Infix::Binary(BinaryOp::Lte),
        Token::Gte => Infix::Binary(BinaryOp::Gte),
        Token::Plus => Infix::Binary(BinaryOp::Add),
        Token::Minus => Infix::Binary(BinaryOp::Sub),
        Token::Star => Infix::Binary(BinaryOp::Mul),
        Token::Slash => Infix::Binary(BinaryOp::Div),
        Token::Percent => Infix::Binary(BinaryOp::Rem),
        Token::StarStar => Infix::Binary(BinaryOp::Pow),
        _ => return None,
    };
    Some(op)
}

fn parse_number(raw: &str) -> Option<f64> {
    let cleaned = raw.replace('_', "");
    if let Some(hex) = cleaned.strip_prefix("0x").or_else(|| cleaned.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok().map(|n| n as f64);
    }
    cleaned.parse().ok()
}

fn has_substitution(body: &str) -> bool {
    let bytes = body.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'$' if bytes.get(i + 1) == Some(&b'{') => return true,
            _ => i += 1,
        }
    }
    false
}

/// Decode JS string escapes
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some('\n') => {}
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                if let Some(c) = u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    out.push(c);
                }
            }
            Some('u') => {
                let hex: String = if chars.peek() == Some(&'{') {
                    chars.next();
                    chars.by_ref().take_while(|c| *c != '}').collect()
                } else {
                    chars.by_ref().take(4).collect()
                };
                if let Some(c) = u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    out.push(c);
                }
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object_literal() {
        let expr = parse(r#"{ color: "red", fontSize: 12, "&:hover": { bg: 'blue' } }"#).unwrap();
        let Expr::Object { properties, .. } = expr else {
            panic!("expected object");
        };
        assert_eq!(properties.len(), 3);
        match &properties[0] {
            Property::KeyValue { key, value, .. } => {
                assert_eq!(key.as_static().as_deref(), Some("color"));
                assert!(matches!(value, Expr::Str { value, .. } if value == "red"));
            }
            other => panic!("unexpected property {:?}", other),
        }
        match &properties[2] {
            Property::KeyValue { key, value, .. } => {
                assert_eq!(key.as_static().as_deref(), Some("&:hover"));
                assert!(matches!(value, Expr::Object { .. }));
            }
            other => panic!("unexpected property {:?}", other),
        }
    }

    #[test]
    fn test_parse_conditional_and_logical() {
        let expr = parse(r#"a && b ? "x" : c ?? "y""#).unwrap();
        let Expr::Conditional { test, alternate, .. } = expr else {
            panic!("expected conditional");
        };
        assert!(matches!(*test, Expr::Logical { op: LogicalOp::And, .. }));
        assert!(matches!(*alternate, Expr::Logical { op: LogicalOp::Nullish, .. }));
    }

    #[test]
    fn test_nested_ternary() {
        let expr = parse(r#"a ? 1 : b ? 2 : 3"#).unwrap();
        let Expr::Conditional { alternate, .. } = expr else {
            panic!("expected conditional");
        };
        assert!(matches!(*alternate, Expr::Conditional { .. }));
    }

    #[test]
    fn test_arrow_function_item_is_opaque() {
        let expr = parse(r#"[() => x, 2]"#).unwrap();
        let Expr::Array { elements, .. } = expr else {
            panic!("expected array");
        };
        assert_eq!(elements.len(), 2);
        assert!(matches!(elements[0], ArrayElement::Expr(Expr::Opaque { .. })));
        assert!(matches!(elements[1], ArrayElement::Expr(Expr::Num { value, .. }) if value == 2.0));
    }

    #[test]
    fn test_method_property_is_opaque() {
        let expr = parse(r#"{ a: 1, b() { return 2 }, c: 3 }"#).unwrap();
        let Expr::Object { properties, .. } = expr else {
            panic!("expected object");
        };
        assert_eq!(properties.len(), 3);
        assert!(matches!(properties[1], Property::Opaque { .. }));
    }

    #[test]
    fn test_array_holes_and_null() {
        let expr = parse(r#"[12, null, 32]"#).unwrap();
        let Expr::Array { elements, .. } = expr else {
            panic!("expected array");
        };
        assert!(matches!(elements[1], ArrayElement::Expr(Expr::Null { .. })));

        let expr = parse(r#"[1, , 3]"#).unwrap();
        let Expr::Array { elements, .. } = expr else {
            panic!("expected array");
        };
        assert!(matches!(elements[1], ArrayElement::Hole(_)));
    }

    #[test]
    fn test_member_call_and_as_const() {
        let expr = parse(r#"theme.colors["primary"]"#).unwrap();
        assert!(matches!(expr, Expr::Member { .. }));

        let expr = parse(r#"["a", "b"] as const"#).unwrap();
        assert!(matches!(expr, Expr::Array { .. }));

        let expr = parse(r#"getColor(a, ...rest)"#).unwrap();
        let Expr::Call { arguments, .. } = expr else {
            panic!("expected call");
        };
        assert!(matches!(arguments[1], ArrayElement::Spread(_)));
    }

    #[test]
    fn test_regex_value_is_opaque() {
        let expr = parse(r#"{ test: /"}/u, color: "red" }"#).unwrap();
        let Expr::Object { properties, .. } = expr else {
            panic!("expected object");
        };
        assert_eq!(properties.len(), 2);
        assert!(matches!(
            &properties[0],
            Property::KeyValue { value: Expr::Opaque { .. }, .. }
        ));
    }

    #[test]
    fn test_unbalanced_is_error() {
        assert!(matches!(parse("{ a: [1, 2 }"), Err(ParseError::Unbalanced { .. })));
    }

    #[test]
    fn test_trailing_garbage_is_error() {
        assert!(parse("a => b").is_err());
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r#"a\"b\nA\u{42}"#), "a\"b\nAB");
    }

    #[test]
    fn test_template_cooked_only_without_substitution() {
        assert!(matches!(parse("`plain`").unwrap(), Expr::Template { cooked: Some(ref s), .. } if s == "plain"));
        assert!(matches!(parse("`a ${b}`").unwrap(), Expr::Template { cooked: None, .. }));
    }
}
