use devup_ui_parser::{CallSite, Classified, ElementSite, StyleApi};
use devup_ui_sheet::theme::DEFAULT_BREAKPOINTS;

use crate::diagnostic::Diagnostic;
use crate::linter::LintContext;
use crate::rules::{style_props, walk, LintRule};

/// Responsive arrays longer than the breakpoint list lose their tail
pub struct BreakpointOverflowRule;

const NAME: &str = "breakpoint-overflow";

impl LintRule for BreakpointOverflowRule {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Warn when a responsive array has more entries than there are breakpoints"
    }

    fn check_call(&self, ctx: &LintContext<'_>, call: &CallSite) -> Vec<Diagnostic> {
        if call.api == StyleApi::Keyframes {
            return Vec::new();
        }
        let limit = breakpoint_count(ctx);
        let mut diagnostics = Vec::new();
        for arg in &call.args {
            walk(None, arg, &mut |key, value| {
                // only arrays sitting directly under a style key are responsive
                if matches!(key, None | Some("imports") | Some("fontFaces")) {
                    return;
                }
                check(key, value, limit, &mut diagnostics);
            });
        }
        diagnostics
    }

    fn check_element(&self, ctx: &LintContext<'_>, element: &ElementSite) -> Vec<Diagnostic> {
        let limit = breakpoint_count(ctx);
        let mut diagnostics = Vec::new();
        for (name, value) in &style_props(element) {
            walk(Some(*name), value, &mut |key, value| {
                check(key, value, limit, &mut diagnostics)
            });
        }
        diagnostics
    }
}

fn breakpoint_count(ctx: &LintContext<'_>) -> usize {
    ctx.theme
        .map(|theme| theme.breakpoints.len())
        .unwrap_or(DEFAULT_BREAKPOINTS.len())
}

fn check(key: Option<&str>, value: &Classified, limit: usize, diagnostics: &mut Vec<Diagnostic>) {
    let Classified::Array(items, span) = value else {
        return;
    };
    if items.len() <= limit {
        return;
    }
    diagnostics.push(
        Diagnostic::warning(
            NAME,
            format!(
                "'{}' has {} responsive values but only {} breakpoints exist; the rest are dropped",
                key.unwrap_or("value"),
                items.len(),
                limit
            ),
            *span,
        )
        .with_suggestion("Register more breakpoints in devup.json or shorten the array"),
    );
}
