use devup_ui_parser::{AttrKind, CallSite, Classified, ElementSite};

use crate::diagnostic::Diagnostic;
use crate::linter::LintContext;
use crate::rules::{style_props, LintRule};

/// `css`, `globalCss` and `keyframes` run at build time; so do selector and
/// ordering props
pub struct LiteralOnlyRule;

const NAME: &str = "literal-only";

impl LintRule for LiteralOnlyRule {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Disallow runtime values where styles are computed at build time"
    }

    fn check_call(&self, _ctx: &LintContext<'_>, call: &CallSite) -> Vec<Diagnostic> {
        call.args
            .iter()
            .filter_map(Classified::first_dynamic)
            .map(|span| {
                Diagnostic::error(
                    NAME,
                    format!("`{}` only accepts literal values", call.api.name()),
                    span,
                )
                .with_suggestion("Pass runtime values through component props or `styleVars`")
            })
            .collect()
    }

    fn check_element(&self, _ctx: &LintContext<'_>, element: &ElementSite) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for (name, value) in style_props(element) {
            if !(name.starts_with('_') || name == "selectors") {
                continue;
            }
            if let Classified::Dynamic(span) = value {
                diagnostics.push(
                    Diagnostic::error(
                        NAME,
                        format!("`{}` needs an object literal", name),
                        span,
                    )
                    .with_suggestion(format!("Write the `{}` styles inline", name)),
                );
            }
        }

        let style_order = element
            .attrs
            .iter()
            .find(|attr| attr.name() == Some("styleOrder"));
        if let Some(attr) = style_order {
            if let AttrKind::Named { value, .. } = &attr.kind {
                if value.classified(attr.span).as_number().is_none() {
                    diagnostics.push(Diagnostic::error(
                        NAME,
                        "`styleOrder` must be a number literal",
                        attr.span,
                    ));
                }
            }
        }
        diagnostics
    }
}
