use devup_ui_parser::{CallSite, Classified, ElementSite, Literal};

use crate::diagnostic::Diagnostic;
use crate::linter::LintContext;
use crate::rules::{style_props, walk, LintRule};

/// Lint rule that prevents use of !important in style values
pub struct NoImportantRule;

impl LintRule for NoImportantRule {
    fn name(&self) -> &'static str {
        "no-important"
    }

    fn description(&self) -> &'static str {
        "Disallow !important in style values"
    }

    fn check_call(&self, _ctx: &LintContext<'_>, call: &CallSite) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for arg in &call.args {
            check_value(None, arg, &mut diagnostics);
        }
        diagnostics
    }

    fn check_element(&self, _ctx: &LintContext<'_>, element: &ElementSite) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for (name, value) in &style_props(element) {
            check_value(Some(*name), value, &mut diagnostics);
        }
        diagnostics
    }
}

fn check_value(key: Option<&str>, value: &Classified, diagnostics: &mut Vec<Diagnostic>) {
    walk(key, value, &mut |key, value| {
        let Classified::Literal(Literal::Str(text), span) = value else {
            return;
        };
        if !text.contains("!important") {
            return;
        }
        let property = key.unwrap_or("value");
        diagnostics.push(
            Diagnostic::warning(
                "no-important",
                format!(
                    "Avoid using !important in '{}'. Atomic classes already apply in a fixed order.",
                    property
                ),
                *span,
            )
            .with_suggestion(format!(
                "Remove !important from '{}' and raise `styleOrder` instead",
                property
            )),
        );
    });
}
