use std::sync::OnceLock;

use devup_ui_parser::{CallSite, Classified, ElementSite, Literal, Span};
use devup_ui_sheet::Theme;
use regex::Regex;

use crate::diagnostic::Diagnostic;
use crate::linter::LintContext;
use crate::rules::{style_props, walk, LintRule};

/// `$name` references and typography names must exist in the theme
pub struct UnknownTokenRule;

const NAME: &str = "unknown-token";

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$([A-Za-z0-9_.\-]+)").expect("token pattern compiles"))
}

impl LintRule for UnknownTokenRule {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Disallow theme references the registered theme does not define"
    }

    fn check_call(&self, ctx: &LintContext<'_>, call: &CallSite) -> Vec<Diagnostic> {
        let Some(theme) = ctx.theme else {
            return Vec::new();
        };
        let mut diagnostics = Vec::new();
        for arg in &call.args {
            check_value(theme, None, arg, &mut diagnostics);
        }
        diagnostics
    }

    fn check_element(&self, ctx: &LintContext<'_>, element: &ElementSite) -> Vec<Diagnostic> {
        let Some(theme) = ctx.theme else {
            return Vec::new();
        };
        let mut diagnostics = Vec::new();
        for (name, value) in &style_props(element) {
            check_value(theme, Some(*name), value, &mut diagnostics);
        }
        diagnostics
    }
}

fn check_value(theme: &Theme, key: Option<&str>, value: &Classified, diagnostics: &mut Vec<Diagnostic>) {
    walk(key, value, &mut |key, value| {
        let Classified::Literal(Literal::Str(text), span) = value else {
            return;
        };

        if key == Some("typography") {
            let name = text.strip_prefix('$').unwrap_or(text);
            if theme.typography(name).is_none() {
                diagnostics.push(missing(&format!("typography `{}`", name), *span));
            }
            return;
        }

        for capture in token_pattern().captures_iter(text) {
            let name = capture[1].trim_end_matches('.');
            if !name.is_empty() && theme.resolve_token(name).is_none() {
                diagnostics.push(missing(&format!("`${}`", name), *span));
            }
        }
    });
}

fn missing(what: &str, span: Span) -> Diagnostic {
    Diagnostic::error(NAME, format!("{} is not defined in the theme", what), span)
        .with_suggestion("Add it to devup.json or fix the spelling")
}
