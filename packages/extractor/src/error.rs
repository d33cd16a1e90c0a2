use devup_ui_parser::{ParseError, Span};
use devup_ui_sheet::SheetError;
use devup_ui_sourcemap::{LineIndex, SourceMapError};
use thiserror::Error;

pub type ExtractResult<T> = Result<T, ExtractError>;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("{file}:{line}:{column}: `{callee}` only accepts literal values")]
    NonLiteral {
        file: String,
        line: usize,
        column: usize,
        callee: String,
        span: Span,
    },

    #[error("{file}:{line}:{column}: undefined theme token `${token}`")]
    UndefinedToken {
        file: String,
        line: usize,
        column: usize,
        token: String,
        span: Span,
    },

    #[error("{file}:{line}:{column}: no breakpoint for responsive slot {level}; the theme defines {breakpoints}")]
    BreakpointOverflow {
        file: String,
        line: usize,
        column: usize,
        level: usize,
        breakpoints: usize,
        span: Span,
    },

    #[error("{file}:{line}:{column}: dynamic style values need a `style` object literal to merge into")]
    StyleNotObject {
        file: String,
        line: usize,
        column: usize,
        span: Span,
    },

    #[error("{file}:{line}:{column}: `{callee}` cannot be nested in a style prop")]
    NestedStyleCall {
        file: String,
        line: usize,
        column: usize,
        callee: String,
        span: Span,
    },

    #[error("Theme is not registered; call register_theme before extracting")]
    ThemeNotRegistered,

    #[error("Theme is already registered")]
    ThemeAlreadyRegistered,

    #[error("Style sheet lock poisoned by a panicked extraction")]
    LockPoisoned,

    #[error("{file}:{line}:{column}: {source}")]
    Parse {
        file: String,
        line: usize,
        column: usize,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    Sheet(#[from] SheetError),

    #[error(transparent)]
    SourceMap(#[from] SourceMapError),
}

/// Failure inside one site, before it is tied to a file location
#[derive(Debug, Clone, PartialEq)]
pub enum SiteError {
    NonLiteral { span: Span, callee: String },
    UndefinedToken { span: Span, token: String },
    /// A responsive slot past the theme's last breakpoint
    BreakpointOverflow { span: Span, level: usize, breakpoints: usize },
    /// Dynamic props on an element whose `style` is not an object literal
    StyleNotObject { span: Span },
    /// `css()` written inside a style prop that is removed from the element
    NestedStyleCall { span: Span, callee: String },
}

impl SiteError {
    pub fn span(&self) -> Span {
        match self {
            SiteError::NonLiteral { span, .. }
            | SiteError::UndefinedToken { span, .. }
            | SiteError::BreakpointOverflow { span, .. }
            | SiteError::StyleNotObject { span }
            | SiteError::NestedStyleCall { span, .. } => *span,
        }
    }

    pub fn into_extract_error(self, file: &str, index: &LineIndex<'_>) -> ExtractError {
        let (line, column) = index.location(self.span().start);
        let file = file.to_string();
        match self {
            SiteError::NonLiteral { span, callee } => ExtractError::NonLiteral {
                file,
                line,
                column,
                callee,
                span,
            },
            SiteError::UndefinedToken { span, token } => ExtractError::UndefinedToken {
                file,
                line,
                column,
                token,
                span,
            },
            SiteError::BreakpointOverflow {
                span,
                level,
                breakpoints,
            } => ExtractError::BreakpointOverflow {
                file,
                line,
                column,
                level,
                breakpoints,
                span,
            },
            SiteError::StyleNotObject { span } => ExtractError::StyleNotObject {
                file,
                line,
                column,
                span,
            },
            SiteError::NestedStyleCall { span, callee } => ExtractError::NestedStyleCall {
                file,
                line,
                column,
                callee,
                span,
            },
        }
    }
}

impl ExtractError {
    pub fn parse(file: &str, index: &LineIndex<'_>, source: ParseError) -> Self {
        let (line, column) = index.location(source.span().start);
        ExtractError::Parse {
            file: file.to_string(),
            line,
            column,
            source,
        }
    }

    /// Source range the error points at, when it has one
    pub fn span(&self) -> Option<Span> {
        match self {
            ExtractError::NonLiteral { span, .. }
            | ExtractError::UndefinedToken { span, .. }
            | ExtractError::BreakpointOverflow { span, .. }
            | ExtractError::StyleNotObject { span, .. }
            | ExtractError::NestedStyleCall { span, .. } => Some(*span),
            ExtractError::Parse { source, .. } => Some(source.span()),
            _ => None,
        }
    }

    /// Labelled source excerpt for bundler overlays and the CLI
    #[cfg(feature = "pretty-errors")]
    pub fn pretty(&self, source: &str) -> String {
        let Some(span) = self.span() else {
            return self.to_string();
        };
        let (file, label) = match self {
            ExtractError::NonLiteral { file, callee, .. } => {
                (file.as_str(), format!("not a literal; `{}` runs at build time", callee))
            }
            ExtractError::UndefinedToken { file, token, .. } => {
                (file.as_str(), format!("`${}` is not defined in the theme", token))
            }
            ExtractError::BreakpointOverflow { file, .. } => {
                (file.as_str(), "add a breakpoint or drop this slot".to_string())
            }
            ExtractError::StyleNotObject { file, .. } => {
                (file.as_str(), "write `style={{ ... }}` or make these props static".to_string())
            }
            ExtractError::NestedStyleCall { file, .. } => {
                (file.as_str(), "pass the style object to the prop directly".to_string())
            }
            ExtractError::Parse { file, source, .. } => (file.as_str(), source.to_string()),
            _ => return self.to_string(),
        };
        devup_ui_parser::pretty::format_diagnostic(file, source, span, &self.to_string(), &label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_is_one_based() {
        let source = "import x;\nconst a = css({ color: v });";
        let index = LineIndex::new(source);
        let start = source.find('v').unwrap();
        let err = SiteError::NonLiteral {
            span: Span::new(start, start + 1),
            callee: "css".into(),
        }
        .into_extract_error("a.tsx", &index);
        assert_eq!(err.to_string(), "a.tsx:2:24: `css` only accepts literal values");
    }

    #[cfg(feature = "pretty-errors")]
    #[test]
    fn test_pretty_contains_label() {
        let source = "css({ color: v })";
        let index = LineIndex::new(source);
        let err = SiteError::UndefinedToken {
            span: Span::new(13, 14),
            token: "brand".into(),
        }
        .into_extract_error("a.tsx", &index);
        let rendered = err.pretty(source);
        assert!(rendered.contains("is not defined in the theme"));
    }
}
