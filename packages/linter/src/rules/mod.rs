mod breakpoint_overflow;
mod literal_only;
mod no_important;
mod unknown_token;

pub use breakpoint_overflow::BreakpointOverflowRule;
pub use literal_only::LiteralOnlyRule;
pub use no_important::NoImportantRule;
pub use unknown_token::UnknownTokenRule;

use devup_ui_extractor::properties::is_style_prop;
use devup_ui_parser::{AttrKind, CallSite, Classified, ElementSite};

use crate::diagnostic::Diagnostic;
use crate::linter::LintContext;

/// Trait for implementing lint rules
pub trait LintRule: Send + Sync {
    /// Unique identifier for this rule
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// Check a `css`, `globalCss` or `keyframes` call
    fn check_call(&self, _ctx: &LintContext<'_>, _call: &CallSite) -> Vec<Diagnostic> {
        Vec::new()
    }

    /// Check the props of a themed component
    fn check_element(&self, _ctx: &LintContext<'_>, _element: &ElementSite) -> Vec<Diagnostic> {
        Vec::new()
    }
}

/// Registry of all available lint rules
pub struct RuleRegistry {
    rules: Vec<Box<dyn LintRule>>,
}

impl RuleRegistry {
    /// Create a new registry with all built-in rules
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(LiteralOnlyRule),
                Box::new(UnknownTokenRule),
                Box::new(NoImportantRule),
                Box::new(BreakpointOverflowRule),
            ],
        }
    }

    /// Get all registered rules
    pub fn rules(&self) -> &[Box<dyn LintRule>] {
        &self.rules
    }

    /// Create an empty registry
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Add a custom rule to the registry
    pub fn add_rule(&mut self, rule: Box<dyn LintRule>) {
        self.rules.push(rule);
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &format!("{} rules", self.rules.len()))
            .finish()
    }
}

/// `(prop, value)` for every style prop of an element
pub(crate) fn style_props(element: &ElementSite) -> Vec<(&str, Classified)> {
    element
        .attrs
        .iter()
        .filter_map(|attr| match &attr.kind {
            AttrKind::Named { name, value } if is_style_prop(name) => {
                Some((name.as_str(), value.classified(attr.span)))
            }
            _ => None,
        })
        .collect()
}

/// Visit every value of a style tree together with the key it sits under
pub(crate) fn walk<'c>(
    key: Option<&'c str>,
    value: &'c Classified,
    visit: &mut dyn FnMut(Option<&'c str>, &'c Classified),
) {
    visit(key, value);
    match value {
        Classified::Array(items, _) => {
            for item in items {
                walk(key, item, visit);
            }
        }
        Classified::Object(entries, _) => {
            for (key, value) in entries {
                walk(Some(key), value, visit);
            }
        }
        Classified::Conditional {
            consequent,
            alternate,
            ..
        } => {
            walk(key, consequent, visit);
            walk(key, alternate, visit);
        }
        Classified::Literal(..) | Classified::Dynamic(_) => {}
    }
}
