//! Source scanner for devup-ui
//!
//! Lexes JS/TS/JSX with `logos`, resolves imports from the styling package and
//! reports the style sites the extractor rewrites.

pub mod ast;
pub mod classify;
pub mod error;
pub mod imports;
pub mod lexer;
pub mod parser;
pub mod scanner;

pub use ast::{Expr, Span};
pub use classify::{classify, Classified, Condition, ConditionKind, Literal};
pub use error::{ParseError, ParseResult};
pub use imports::{ImportBinding, ImportTable, Imported};
pub use lexer::{tokenize, SpannedToken, Token};
pub use parser::{parse, Parser};
pub use scanner::{
    scan, AttrKind, AttrValue, CallSite, ElementSite, JsxAttr, ScanResult, StyleApi, StyleSite,
};

#[cfg(feature = "pretty-errors")]
pub use error::pretty;
