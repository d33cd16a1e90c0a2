//! Lexer for JS/TS/JSX source using logos
//!
//! Only the tokens the scanner needs to locate style sites are modelled. Anything
//! else (decorators, private names) falls out as a lex error and is skipped by
//! [`lex`]'s callers. A `/` where an expression may start begins a regex literal.

use crate::ast::Span;
use logos::{Lexer, Logos};

/// Token types for JS/TSX source
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f\u{feff}]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*[^*]*\*+(?:[^/*][^*]*\*+)*/")]
pub enum Token<'src> {
    // Keywords the scanner cares about
    #[token("import")]
    Import,
    #[token("from")]
    From,
    #[token("as")]
    As,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,
    #[token("typeof")]
    Typeof,

    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*", |lex| lex.slice())]
    Ident(&'src str),

    /// String literal, quotes included
    #[token("\"", |lex| lex_string(lex, b'"'))]
    #[token("'", |lex| lex_string(lex, b'\''))]
    String(&'src str),

    /// Template literal, backticks included
    #[token("`", lex_template)]
    Template(&'src str),

    /// Regex literal with its flags; produced by [`lex`], never by logos itself
    Regex(&'src str),

    #[regex(r"[0-9][0-9_]*(\.[0-9_]*)?([eE][+-]?[0-9]+)?", |lex| lex.slice())]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9]+)?", |lex| lex.slice())]
    #[regex(r"0[xX][0-9a-fA-F_]+", |lex| lex.slice())]
    Number(&'src str),

    // Operators
    #[token("...")]
    Ellipsis,
    #[token("=>")]
    Arrow,
    #[token("?.")]
    OptionalChain,
    #[token("??")]
    Nullish,
    #[token("||")]
    Or,
    #[token("&&")]
    And,
    #[token("===")]
    StrictEq,
    #[token("!==")]
    StrictNotEq,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    Lte,
    #[token(">=")]
    Gte,
    #[token("**")]
    StarStar,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
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
    #[token("!")]
    Bang,
    #[token("?")]
    Question,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,

    // Punctuation
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,
    #[token(".")]
    Dot,
}

impl<'src> Token<'src> {
    /// Text usable as an object key or member name, including keywords
    pub fn name(&self) -> Option<&'src str> {
        match self {
            Token::Ident(name) => Some(name),
            Token::Import => Some("import"),
            Token::From => Some("from"),
            Token::As => Some("as"),
            Token::True => Some("true"),
            Token::False => Some("false"),
            Token::Null => Some("null"),
            Token::Typeof => Some("typeof"),
            _ => None,
        }
    }

    /// Opening bracket paired with `closer`
    pub fn is_open(&self) -> bool {
        matches!(self, Token::LBrace | Token::LParen | Token::LBracket)
    }

    pub fn is_close(&self) -> bool {
        matches!(self, Token::RBrace | Token::RParen | Token::RBracket)
    }

    /// Whether an expression may start right after this token, so that a `/`
    /// opens a regex instead of dividing. `<` and `>` are excluded for JSX
    /// closing tags and text; `}` for `/>` after an attribute expression.
    pub fn starts_expression(&self) -> bool {
        match self {
            Token::Ident(name) => EXPRESSION_KEYWORDS.contains(name),
            Token::Typeof
            | Token::Ellipsis
            | Token::Arrow
            | Token::Nullish
            | Token::Or
            | Token::And
            | Token::StrictEq
            | Token::StrictNotEq
            | Token::EqEq
            | Token::NotEq
            | Token::Lte
            | Token::Gte
            | Token::StarStar
            | Token::Eq
            | Token::Plus
            | Token::Minus
            | Token::Star
            | Token::Percent
            | Token::Bang
            | Token::Question
            | Token::Amp
            | Token::Pipe
            | Token::Caret
            | Token::Tilde
            | Token::LBrace
            | Token::LParen
            | Token::LBracket
            | Token::Comma
            | Token::Colon
            | Token::Semi => true,
            _ => false,
        }
    }
}

/// Keywords after which an operand is expected
pub const EXPRESSION_KEYWORDS: &[&str] = &[
    "return", "case", "do", "else", "in", "instanceof", "new", "of", "delete", "void", "throw",
    "yield", "await", "default",
];

/// A token with its byte span in the source
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken<'src> {
    pub token: Token<'src>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct LexError {
    pub span: Span,
    pub message: String,
}

/// Lex source code into tokens with spans
pub fn lex(source: &str) -> impl Iterator<Item = Result<SpannedToken<'_>, LexError>> + '_ {
    let mut lexer = Token::lexer(source);
    let mut operand_expected = true;
    std::iter::from_fn(move || {
        let result = match lexer.next()? {
            Ok(Token::Slash) if operand_expected => {
                match regex_end(lexer.remainder().as_bytes()) {
                    Some(len) => {
                        lexer.bump(len);
                        Ok(Token::Regex(lexer.slice()))
                    }
                    None => Ok(Token::Slash),
                }
            }
            other => other,
        };
        let span = Span::new(lexer.span().start, lexer.span().end);
        Some(match result {
            Ok(token) => {
                operand_expected = token.starts_expression();
                Ok(SpannedToken { token, span })
            }
            Err(_) => Err(LexError {
                span,
                message: "Unexpected character".to_string(),
            }),
        })
    })
}

/// Lex and drop anything the lexer does not understand
pub fn tokenize(source: &str) -> Vec<SpannedToken<'_>> {
    let mut skipped = 0usize;
    let tokens = lex(source)
        .filter_map(|result| match result {
            Ok(token) => Some(token),
            Err(_) => {
                skipped += 1;
                None
            }
        })
        .collect();
    if skipped > 0 {
        tracing::trace!(skipped, "Skipped unrecognized input while lexing");
    }
    tokens
}

fn lex_string<'src>(lex: &mut Lexer<'src, Token<'src>>, quote: u8) -> Option<&'src str> {
    let rest = lex.remainder().as_bytes();
    let mut i = 0;
    while i < rest.len() {
        match rest[i] {
            b'\\' => i += 2,
            b'\n' => return None,
            c if c == quote => {
                lex.bump(i + 1);
                return Some(lex.slice());
            }
            _ => i += 1,
        }
    }
    None
}

/// Length of a regex body after the opening `/`, through its flags
fn regex_end(bytes: &[u8]) -> Option<usize> {
    let mut i = 0;
    let mut in_class = false;
    loop {
        match *bytes.get(i)? {
            b'\\' => i += 2,
            b'\n' | b'\r' => return None,
            b'[' => {
                in_class = true;
                i += 1;
            }
            b']' => {
                in_class = false;
                i += 1;
            }
            b'/' if !in_class => break,
            _ => i += 1,
        }
    }
    if i == 0 {
        return None;
    }
    i += 1;
    while bytes.get(i).is_some_and(u8::is_ascii_alphanumeric) {
        i += 1;
    }
    Some(i)
}

fn lex_template<'src>(lex: &mut Lexer<'src, Token<'src>>) -> Option<&'src str> {
    let end = template_end(lex.remainder().as_bytes())?;
    lex.bump(end);
    Some(lex.slice())
}

/// Length of a template body up to and including the closing backtick.
/// Substitutions may nest braces, strings and further templates.
fn template_end(bytes: &[u8]) -> Option<usize> {
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => return Some(i + 1),
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                i += 2;
                let mut depth = 1usize;
                while depth > 0 {
                    match *bytes.get(i)? {
                        b'{' => depth += 1,
                        b'}' => depth -= 1,
                        b'`' => {
                            i += 1;
                            i += template_end(&bytes[i..])?;
                            continue;
                        }
                        q @ (b'"' | b'\'') => {
                            i += 1;
                            while *bytes.get(i)? != q {
                                if bytes[i] == b'\\' {
                                    i += 1;
                                }
                                i += 1;
                            }
                        }
                        _ => {}
                    }
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token<'_>> {
        tokenize(source).into_iter().map(|t| t.token).collect()
    }

    #[test]
    fn test_lex_import() {
        let toks = tokens(r#"import { css as B } from "@devup-ui/react";"#);
        assert_eq!(
            toks,
            vec![
                Token::Import,
                Token::LBrace,
                Token::Ident("css"),
                Token::As,
                Token::Ident("B"),
                Token::RBrace,
                Token::From,
                Token::String("\"@devup-ui/react\""),
                Token::Semi,
            ]
        );
    }

    #[test]
    fn test_lex_numbers() {
        let toks = tokens("12 1.5 .5 0xff 1e3");
        assert_eq!(
            toks,
            vec![
                Token::Number("12"),
                Token::Number("1.5"),
                Token::Number(".5"),
                Token::Number("0xff"),
                Token::Number("1e3"),
            ]
        );
    }

    #[test]
    fn test_lex_template_with_substitution() {
        let toks = tokens("`a ${b ? `c` : '}'} d` x");
        assert_eq!(toks.len(), 2);
        assert_eq!(toks[0], Token::Template("`a ${b ? `c` : '}'} d`"));
        assert_eq!(toks[1], Token::Ident("x"));
    }

    #[test]
    fn test_unterminated_quote_skips_only_the_quote() {
        // Apostrophes in JSX text must not swallow the rest of the line
        let toks = tokens("<p>Don't</p><Box bg=\"red\" />");
        assert!(toks.contains(&Token::Ident("Box")));
        assert!(toks.contains(&Token::String("\"red\"")));
    }

    #[test]
    fn test_regex_literal_with_quote() {
        let toks = tokens(r#"const r = /"[a/b]\//gi; x"#);
        assert_eq!(
            toks,
            vec![
                Token::Ident("const"),
                Token::Ident("r"),
                Token::Eq,
                Token::Regex(r#"/"[a/b]\//gi"#),
                Token::Semi,
                Token::Ident("x"),
            ]
        );
    }

    #[test]
    fn test_slash_after_operand_divides() {
        let toks = tokens("a / b / c; (x) / 2");
        assert_eq!(toks.iter().filter(|t| **t == Token::Slash).count(), 3);
        assert!(!toks.iter().any(|t| matches!(t, Token::Regex(_))));
    }

    #[test]
    fn test_jsx_closing_slashes_are_not_regexes() {
        let toks = tokens(r#"<a href={u}/><b>x</b>"#);
        assert!(!toks.iter().any(|t| matches!(t, Token::Regex(_))));
        assert_eq!(toks.iter().filter(|t| **t == Token::Slash).count(), 2);
    }

    #[test]
    fn test_comments_are_skipped() {
        let toks = tokens("a /* b */ // c\n d");
        assert_eq!(toks, vec![Token::Ident("a"), Token::Ident("d")]);
    }

    #[test]
    fn test_spans() {
        let toks = tokenize("css({})");
        assert_eq!(toks[0].span, Span::new(0, 3));
        assert_eq!(toks[1].span, Span::new(3, 4));
    }
}
