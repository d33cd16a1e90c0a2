//! Site planning
//!
//! Works out, for every scanned site, what it adds to the sheet and which
//! parts of the element survive. Nothing here touches the sheet, so files are
//! planned in parallel without a lock.

use std::collections::HashSet;

use devup_ui_parser::ast::format_number;
use devup_ui_parser::{
    AttrKind, AttrValue, CallSite, Classified, ElementSite, JsxAttr, Literal, ScanResult, Span,
    StyleApi, StyleSite,
};
use devup_ui_sheet::{GlobalRule, KeyframeStep, Properties, StyleDeclaration, StyleValue, Theme};
use tracing::{debug, warn};

use crate::error::SiteError;
use crate::normalizer::{Context, Normalizer, StylePart};
use crate::properties::{component, is_style_prop};

#[derive(Debug, Clone, PartialEq)]
pub enum SitePlan<'s> {
    /// `css(...)`
    Class { span: Span, parts: Vec<StylePart> },
    Keyframes { span: Span, steps: Vec<KeyframeStep> },
    Global { span: Span, content: BaseContent },
    Element(ElementPlan<'s>),
}

impl SitePlan<'_> {
    /// Whether the site adds to the base stylesheet rather than a file's rules
    pub fn is_base(&self) -> bool {
        matches!(self, SitePlan::Keyframes { .. } | SitePlan::Global { .. })
    }
}

/// What one `globalCss` call adds
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaseContent {
    pub rules: Vec<GlobalRule>,
    pub imports: Vec<String>,
    pub font_faces: Vec<Properties>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementPlan<'s> {
    pub site: &'s ElementSite,
    /// Intrinsic tag replacing the component name; `None` keeps the component
    pub tag: Option<String>,
    pub parts: Vec<StylePart>,
    /// Attributes to delete, each starting at the end of the previous token
    pub removed: Vec<Span>,
    pub class_name: Option<&'s JsxAttr>,
    pub style: Option<&'s JsxAttr>,
    /// `--name` and the JS expression supplying it
    pub style_vars: Vec<(String, String)>,
}

/// Plan every site of a scanned module, in source order
pub fn plan_sites<'s>(
    scanned: &'s ScanResult,
    source: &str,
    theme: &Theme,
) -> Result<Vec<SitePlan<'s>>, SiteError> {
    let calls: Vec<&CallSite> = scanned
        .sites
        .iter()
        .filter_map(|site| match site {
            StyleSite::Call(call) => Some(call),
            StyleSite::Element(_) => None,
        })
        .collect();

    let mut plans = Vec::with_capacity(scanned.sites.len());
    for site in &scanned.sites {
        match site {
            StyleSite::Call(call) => plans.push(plan_call(call, theme)?),
            StyleSite::Element(element) => {
                if let Some(plan) = plan_element(element, source, theme)? {
                    // a call inside a removed prop would vanish with it
                    let nested = calls
                        .iter()
                        .find(|call| plan.removed.iter().any(|removed| removed.contains(call.span)));
                    if let Some(call) = nested {
                        return Err(SiteError::NestedStyleCall {
                            span: call.callee_span,
                            callee: call.api.name().to_string(),
                        });
                    }
                    plans.push(SitePlan::Element(plan));
                }
            }
        }
    }
    Ok(plans)
}

fn plan_call<'s>(call: &CallSite, theme: &Theme) -> Result<SitePlan<'s>, SiteError> {
    let normalizer = Normalizer::literal_only(theme, call.api.name());
    if let Some(span) = call.args.iter().find_map(Classified::first_dynamic) {
        return Err(normalizer.non_literal(span));
    }

    match call.api {
        StyleApi::Css => {
            let mut parts = Vec::new();
            for arg in &call.args {
                parts.extend(normalizer.normalize_style(arg, &Context::default())?);
            }
            Ok(SitePlan::Class {
                span: call.span,
                parts,
            })
        }
        StyleApi::Keyframes => {
            let mut steps = Vec::new();
            if let Some(arg) = call.args.first() {
                let Classified::Object(entries, _) = arg else {
                    return Err(normalizer.non_literal(arg.span()));
                };
                for (key, body) in entries {
                    steps.push(KeyframeStep {
                        selector: keyframe_selector(key),
                        properties: static_properties(&normalizer, body)?,
                    });
                }
            }
            Ok(SitePlan::Keyframes {
                span: call.span,
                steps,
            })
        }
        StyleApi::GlobalCss => {
            let mut content = BaseContent::default();
            for arg in &call.args {
                let Classified::Object(entries, _) = arg else {
                    return Err(normalizer.non_literal(arg.span()));
                };
                for (key, value) in entries {
                    global_entry(&normalizer, key, value, &mut content)?;
                }
            }
            Ok(SitePlan::Global {
                span: call.span,
                content,
            })
        }
    }
}

/// `50` -> `50%`; `from`, `to` and `25%` stay as written
fn keyframe_selector(key: &str) -> String {
    match key.parse::<f64>() {
        Ok(n) => format!("{}%", format_number(n)),
        Err(_) => key.to_string(),
    }
}

/// A flat object of plain declarations (keyframe steps, font faces)
fn static_properties(normalizer: &Normalizer<'_>, body: &Classified) -> Result<Properties, SiteError> {
    let parts = normalizer.normalize_style(body, &Context::default())?;
    let mut properties = Vec::with_capacity(parts.len());
    for part in &parts {
        match part {
            StylePart::Static(StyleDeclaration {
                property,
                value: StyleValue::Static(value),
                level: 0,
                selector: None,
                ..
            }) => properties.push((property.clone(), value.clone())),
            _ => return Err(normalizer.non_literal(body.span())),
        }
    }
    Ok(properties)
}

fn global_entry(
    normalizer: &Normalizer<'_>,
    key: &str,
    value: &Classified,
    content: &mut BaseContent,
) -> Result<(), SiteError> {
    match key {
        "imports" => {
            for item in list_items(value) {
                match item.as_str() {
                    Some(url) => content.imports.push(url.to_string()),
                    None => return Err(normalizer.non_literal(item.span())),
                }
            }
        }
        "fontFaces" => {
            for item in list_items(value) {
                content.font_faces.push(static_properties(normalizer, item)?);
            }
        }
        selector => {
            let ctx = Context {
                selector: Some("&".to_string()),
                ..Context::default()
            };
            let parts = normalizer.normalize_style(value, &ctx)?;
            for part in &parts {
                let StylePart::Static(declaration) = part else {
                    let span = match part {
                        StylePart::Conditional { condition, .. } => condition.span,
                        StylePart::Dynamic { value, .. } => *value,
                        StylePart::Static(_) => value.span(),
                    };
                    return Err(normalizer.non_literal(span));
                };
                push_global(&mut content.rules, selector, declaration);
            }
        }
    }
    Ok(())
}

/// Consecutive declarations for the same selector and level share a rule
fn push_global(rules: &mut Vec<GlobalRule>, selector: &str, declaration: &StyleDeclaration) {
    let StyleValue::Static(value) = &declaration.value else {
        return;
    };
    let selector = declaration
        .selector
        .as_deref()
        .unwrap_or("&")
        .replace('&', selector);
    let property = (declaration.property.clone(), value.clone());

    match rules.last_mut() {
        Some(last) if last.selector == selector && last.level == declaration.level => {
            last.properties.push(property)
        }
        _ => rules.push(GlobalRule {
            selector,
            level: declaration.level,
            properties: vec![property],
        }),
    }
}

fn list_items(value: &Classified) -> Vec<&Classified> {
    match value {
        Classified::Array(items, _) => items.iter().collect(),
        other => vec![other],
    }
}

fn plan_element<'s>(
    site: &'s ElementSite,
    source: &str,
    theme: &Theme,
) -> Result<Option<ElementPlan<'s>>, SiteError> {
    let Some(spec) = component(&site.component) else {
        debug!(component = %site.component, "Not a themed component");
        return Ok(None);
    };

    let mut plan = ElementPlan {
        site,
        tag: Some(spec.tag.to_string()),
        parts: Vec::new(),
        removed: Vec::new(),
        class_name: None,
        style: None,
        style_vars: Vec::new(),
    };

    let ctx = Context::with_order(style_order(site)?);

    for attr in &site.attrs {
        let AttrKind::Named { name, value } = &attr.kind else {
            continue;
        };
        let removal = Span::new(attr.prev_end, attr.span.end);
        match name.as_str() {
            "className" => plan.class_name = Some(attr),
            "style" => plan.style = Some(attr),
            "styleOrder" => plan.removed.push(removal),
            "as" => match as_tag(value, source) {
                Some(tag) => {
                    plan.tag = Some(tag);
                    plan.removed.push(removal);
                }
                None => {
                    warn!(component = %site.component, "`as` is not a tag name; keeping the component");
                    plan.tag = None;
                }
            },
            "styleVars" => {
                plan.style_vars.extend(style_vars(value, attr.span, source)?);
                plan.removed.push(removal);
            }
            _ if is_style_prop(name) => {
                let normalizer = Normalizer::for_props(theme, name);
                normalizer.entry_into(name, &value.classified(attr.span), &ctx, &mut plan.parts)?;
                plan.removed.push(removal);
            }
            _ => {}
        }
    }

    let mut parts: Vec<StylePart> = {
        let explicit: HashSet<&str> = plan
            .parts
            .iter()
            .flat_map(StylePart::declarations)
            .map(|d| d.property.as_str())
            .collect();
        spec.defaults
            .iter()
            .filter(|(property, _)| !explicit.contains(property))
            .map(|(property, value)| {
                StylePart::Static(StyleDeclaration::new(*property, StyleValue::Static(value.to_string())))
            })
            .collect()
    };
    parts.append(&mut plan.parts);
    plan.parts = parts;

    // dynamic values are spread into `style`, so it must be an expression
    if let Some(style) = plan.style {
        let is_expr = matches!(
            &style.kind,
            AttrKind::Named {
                value: AttrValue::Expr { .. },
                ..
            }
        );
        if !is_expr && (has_dynamic(&plan.parts) || !plan.style_vars.is_empty()) {
            return Err(SiteError::StyleNotObject { span: style.span });
        }
    }

    Ok(Some(plan))
}

fn has_dynamic(parts: &[StylePart]) -> bool {
    parts.iter().any(|part| match part {
        StylePart::Static(_) => false,
        StylePart::Dynamic { .. } => true,
        StylePart::Conditional {
            consequent,
            alternate,
            ..
        } => has_dynamic(consequent) || has_dynamic(alternate),
    })
}

fn style_order(site: &ElementSite) -> Result<i32, SiteError> {
    let Some(attr) = site.attrs.iter().find(|a| a.name() == Some("styleOrder")) else {
        return Ok(0);
    };
    let AttrKind::Named { value, .. } = &attr.kind else {
        return Ok(0);
    };
    match value.classified(attr.span) {
        Classified::Literal(Literal::Num(n), _) => Ok(n as i32),
        other => Err(SiteError::NonLiteral {
            span: other.span(),
            callee: "styleOrder".to_string(),
        }),
    }
}

/// Tag named by `as`: a string, or a component reference such as `Link`
fn as_tag(value: &AttrValue, source: &str) -> Option<String> {
    let tag = match value {
        AttrValue::Str { value, .. } => value.as_str(),
        AttrValue::Expr {
            value: Classified::Literal(Literal::Str(value), _),
            ..
        } => value.as_str(),
        AttrValue::Expr {
            value: Classified::Dynamic(span),
            ..
        } => span.text(source).trim(),
        _ => return None,
    };
    let valid = !tag.is_empty()
        && !tag.starts_with(|c: char| c.is_ascii_digit() || c == '.')
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.' | '-'));
    valid.then(|| tag.to_string())
}

/// `styleVars={{ primary: color }}` -> `("--primary", "(color)")`
fn style_vars(value: &AttrValue, attr_span: Span, source: &str) -> Result<Vec<(String, String)>, SiteError> {
    let AttrValue::Expr {
        value: Classified::Object(entries, _),
        ..
    } = value
    else {
        return Err(SiteError::NonLiteral {
            span: attr_span,
            callee: "styleVars".to_string(),
        });
    };

    Ok(entries
        .iter()
        .filter_map(|(key, value)| {
            let js = match value {
                Classified::Literal(Literal::Null | Literal::Bool(_), _) => return None,
                Classified::Literal(Literal::Str(text), _) => js_string(text),
                Classified::Literal(Literal::Num(n), _) => format_number(*n),
                other => format!("({})", other.span().text(source)),
            };
            let name = if key.starts_with("--") {
                key.clone()
            } else {
                format!("--{}", key)
            };
            Some((name, js))
        })
        .collect())
}

/// A double-quoted JS string literal
pub fn js_string(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use devup_ui_parser::scan;

    const PKG: &str = "@devup-ui/react";

    fn theme() -> Theme {
        Theme::from_json(r##"{ "colors": { "light": { "primary": "#000" } } }"##).unwrap()
    }

    fn with_plans<R>(source: &str, f: impl FnOnce(Result<Vec<SitePlan<'_>>, SiteError>) -> R) -> R {
        let scanned = scan(source, PKG).unwrap();
        let theme = theme();
        f(plan_sites(&scanned, source, &theme))
    }

    fn properties(parts: &[StylePart]) -> Vec<String> {
        parts
            .iter()
            .flat_map(StylePart::declarations)
            .map(|d| d.property.clone())
            .collect()
    }

    #[test]
    fn test_component_defaults_yield_to_explicit_props() {
        let source = r#"import { Center } from "@devup-ui/react";
<Center flexDirection="column" alignItems="start" />"#;
        with_plans(source, |plans| {
            let plans = plans.unwrap();
            let SitePlan::Element(plan) = &plans[0] else {
                panic!("expected element");
            };
            assert_eq!(plan.tag.as_deref(), Some("div"));
            assert_eq!(
                properties(&plan.parts),
                vec!["display", "justify-content", "flex-direction", "align-items"]
            );
            assert_eq!(plan.removed.len(), 2);
        });
    }

    #[test]
    fn test_as_and_style_vars() {
        let source = r#"import { Box } from "@devup-ui/react";
<Box as="section" styleVars={{ primary: color, "--gap": 4 }} onClick={go} />"#;
        with_plans(source, |plans| {
            let plans = plans.unwrap();
            let SitePlan::Element(plan) = &plans[0] else {
                panic!("expected element");
            };
            assert_eq!(plan.tag.as_deref(), Some("section"));
            assert_eq!(
                plan.style_vars,
                vec![
                    ("--primary".to_string(), "(color)".to_string()),
                    ("--gap".to_string(), "4".to_string()),
                ]
            );
            // onClick stays
            assert_eq!(plan.removed.len(), 2);
        });
    }

    #[test]
    fn test_unknown_component_is_skipped() {
        let source = r#"import { ThemeScript } from "@devup-ui/react";
<ThemeScript auto />"#;
        with_plans(source, |plans| assert!(plans.unwrap().is_empty()));
    }

    #[test]
    fn test_keyframes_steps() {
        let source = r#"import { keyframes } from "@devup-ui/react";
const spin = keyframes({ from: { opacity: 0 }, 50: { opacity: 0.5 }, to: { opacity: 1 } });"#;
        with_plans(source, |plans| {
            let plans = plans.unwrap();
            let SitePlan::Keyframes { steps, .. } = &plans[0] else {
                panic!("expected keyframes");
            };
            let selectors: Vec<_> = steps.iter().map(|s| s.selector.as_str()).collect();
            assert_eq!(selectors, vec!["from", "50%", "to"]);
            assert_eq!(steps[1].properties, vec![("opacity".to_string(), "0.5".to_string())]);
        });
    }

    #[test]
    fn test_global_css_groups_rules() {
        let source = r#"import { globalCss } from "@devup-ui/react";
globalCss({
  imports: ["https://fonts.example/a.css"],
  fontFaces: [{ fontFamily: "Inter", src: "url(/inter.woff2)" }],
  body: { m: 0, bg: "$primary", _hover: { color: "red" } },
});"#;
        with_plans(source, |plans| {
            let plans = plans.unwrap();
            let SitePlan::Global { content, .. } = &plans[0] else {
                panic!("expected globalCss");
            };
            assert_eq!(content.imports, vec!["https://fonts.example/a.css"]);
            assert_eq!(content.font_faces[0][0].0, "font-family");
            assert_eq!(content.rules.len(), 2);
            assert_eq!(content.rules[0].selector, "body");
            assert_eq!(content.rules[0].properties.len(), 2);
            assert_eq!(content.rules[1].selector, "body:hover");
        });
    }

    #[test]
    fn test_global_css_rejects_conditionals() {
        let source = r#"import { globalCss } from "@devup-ui/react";
globalCss({ body: { color: dark ? "white" : "black" } });"#;
        with_plans(source, |plans| {
            assert!(matches!(plans, Err(SiteError::NonLiteral { ref callee, .. }) if callee == "globalCss"));
        });
    }

    #[test]
    fn test_dynamic_prop_needs_style_expression() {
        let source = r#"import { Box } from "@devup-ui/react";
<Box style="color:red" w={width} />"#;
        with_plans(source, |plans| {
            assert!(matches!(plans, Err(SiteError::StyleNotObject { .. })));
        });

        let source = r#"import { Box } from "@devup-ui/react";
<Box style="color:red" w={4} />"#;
        with_plans(source, |plans| assert_eq!(plans.unwrap().len(), 1));
    }

    #[test]
    fn test_css_call_inside_style_prop_is_rejected() {
        let source = r#"import { Box, css } from "@devup-ui/react";
<Box bg={css({ color: "red" })} />"#;
        with_plans(source, |plans| {
            assert!(matches!(plans, Err(SiteError::NestedStyleCall { ref callee, .. }) if callee == "css"));
        });

        let source = r#"import { Box, css } from "@devup-ui/react";
<Box className={css({ color: "red" })} p={1} />"#;
        with_plans(source, |plans| assert_eq!(plans.unwrap().len(), 2));
    }

    #[test]
    fn test_dynamic_style_order_is_rejected() {
        let source = r#"import { Box } from "@devup-ui/react";
<Box styleOrder={order} color="red" />"#;
        with_plans(source, |plans| {
            assert!(matches!(plans, Err(SiteError::NonLiteral { ref callee, .. }) if callee == "styleOrder"));
        });
    }
}
