//! Error types for the scanner

use crate::ast::Span;
use thiserror::Error;

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Parse error with location and context
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Unexpected token at {span:?}: expected {expected}, found {found}")]
    UnexpectedToken {
        span: Span,
        expected: String,
        found: String,
    },

    #[error("Unexpected end of input: expected {expected}")]
    UnexpectedEof { expected: String, pos: usize },

    #[error("Unbalanced '{open}' at {span:?}")]
    Unbalanced { span: Span, open: &'static str },

    #[error("Invalid syntax at {span:?}: {message}")]
    InvalidSyntax { span: Span, message: String },
}

impl ParseError {
    pub fn unexpected_token(span: Span, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::UnexpectedToken {
            span,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn unexpected_eof(pos: usize, expected: impl Into<String>) -> Self {
        Self::UnexpectedEof {
            expected: expected.into(),
            pos,
        }
    }

    pub fn invalid_syntax(span: Span, message: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            span,
            message: message.into(),
        }
    }

    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::Unbalanced { span, .. }
            | ParseError::InvalidSyntax { span, .. } => *span,
            ParseError::UnexpectedEof { pos, .. } => Span::new(*pos, *pos),
        }
    }
}

/// Pretty-print diagnostics with source context using ariadne
#[cfg(feature = "pretty-errors")]
pub mod pretty {
    use super::ParseError;
    use crate::ast::Span;
    use ariadne::{Color, Label, Report, ReportKind, Source};

    /// Render one labelled diagnostic against its source
    pub fn format_diagnostic(
        filename: &str,
        source: &str,
        span: Span,
        message: &str,
        label: &str,
    ) -> String {
        let start = span.start.min(source.len());
        let end = span.end.clamp(start, source.len());
        let mut output = Vec::new();

        let report = Report::build(ReportKind::Error, filename, start)
            .with_message(message)
            .with_label(
                Label::new((filename, start..end))
                    .with_color(Color::Red)
                    .with_message(label),
            )
            .finish();

        if report
            .write((filename, Source::from(source)), &mut output)
            .is_err()
        {
            return message.to_string();
        }

        String::from_utf8(output).unwrap_or_else(|_| message.to_string())
    }

    pub fn format_error(error: &ParseError, filename: &str, source: &str) -> String {
        let label = match error {
            ParseError::UnexpectedToken { expected, .. } => format!("expected {}", expected),
            ParseError::UnexpectedEof { expected, .. } => format!("expected {}", expected),
            ParseError::Unbalanced { open, .. } => format!("'{}' is never closed", open),
            ParseError::InvalidSyntax { message, .. } => message.clone(),
        };
        format_diagnostic(filename, source, error.span(), &error.to_string(), &label)
    }
}
