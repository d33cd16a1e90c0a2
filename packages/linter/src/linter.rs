use devup_ui_extractor::DEFAULT_PACKAGE;
use devup_ui_parser::{scan, StyleSite};
use devup_ui_sheet::Theme;
use tracing::debug;

use crate::diagnostic::Diagnostic;
use crate::rules::RuleRegistry;

/// Options for configuring the linter
#[derive(Debug)]
pub struct LintOptions<'a> {
    /// Custom rule registry (uses default if None)
    pub registry: Option<RuleRegistry>,

    /// Module the styling API is imported from
    pub package: &'a str,

    /// Theme for token checks; token rules stay quiet without one
    pub theme: Option<&'a Theme>,
}

impl Default for LintOptions<'_> {
    fn default() -> Self {
        Self {
            registry: None,
            package: DEFAULT_PACKAGE,
            theme: None,
        }
    }
}

/// What every rule sees besides the site itself
#[derive(Debug, Clone, Copy)]
pub struct LintContext<'a> {
    pub source: &'a str,
    pub theme: Option<&'a Theme>,
}

/// Lint one module and return diagnostics in source order
pub fn lint_source(source: &str, options: &LintOptions<'_>) -> Vec<Diagnostic> {
    let default_registry;
    let registry = match &options.registry {
        Some(registry) => registry,
        None => {
            default_registry = RuleRegistry::new();
            &default_registry
        }
    };

    let scanned = match scan(source, options.package) {
        Ok(scanned) => scanned,
        Err(err) => return vec![Diagnostic::error("parse", err.to_string(), err.span())],
    };

    let ctx = LintContext {
        source,
        theme: options.theme,
    };
    let mut diagnostics = Vec::new();

    for site in &scanned.sites {
        for rule in registry.rules() {
            match site {
                StyleSite::Call(call) => diagnostics.extend(rule.check_call(&ctx, call)),
                StyleSite::Element(element) => {
                    diagnostics.extend(rule.check_element(&ctx, element))
                }
            }
        }
    }

    diagnostics.sort_by_key(|d| (d.span.start, d.level));
    debug!(sites = scanned.sites.len(), diagnostics = diagnostics.len(), "Linted module");
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::LiteralOnlyRule;

    #[test]
    fn test_parse_failure_is_a_diagnostic() {
        let source = r#"import { css } from "@devup-ui/react";
css({ color: "red" );"#;
        let diagnostics = lint_source(source, &LintOptions::default());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].rule, "parse");
    }

    #[test]
    fn test_custom_registry() {
        let mut registry = RuleRegistry::empty();
        registry.add_rule(Box::new(LiteralOnlyRule));
        let options = LintOptions {
            registry: Some(registry),
            ..LintOptions::default()
        };
        let source = r#"import { css } from "@devup-ui/react";
css({ color: "red !important", bg: v });"#;
        let diagnostics = lint_source(source, &options);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].rule, "literal-only");
    }

    #[test]
    fn test_other_packages_are_ignored() {
        let source = r#"import { css } from "@emotion/css";
css({ color: v });"#;
        assert!(lint_source(source, &LintOptions::default()).is_empty());
    }
}
