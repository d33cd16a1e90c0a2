//! Lint rules for devup-ui style sites
//!
//! Runs over the same scan the extractor uses, so anything reported as an
//! error here would also fail extraction.

mod diagnostic;
mod linter;
mod rules;

pub use diagnostic::{Diagnostic, DiagnosticLevel};
pub use linter::{lint_source, LintContext, LintOptions};
pub use rules::{
    BreakpointOverflowRule, LintRule, LiteralOnlyRule, NoImportantRule, RuleRegistry,
    UnknownTokenRule,
};
