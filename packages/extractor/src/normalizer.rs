//! Style normalizer
//!
//! Turns classified style objects and props into canonical declarations.
//! The output is a tree of [`StylePart`]s: conditionals keep their runtime
//! test, dynamic values keep the source range of the expression.

use devup_ui_parser::ast::format_number;
use devup_ui_parser::{Classified, Condition, Literal, Span};
use devup_ui_sheet::{StyleDeclaration, StyleValue, Theme};
use serde_json::Value;
use tracing::warn;

use crate::error::SiteError;
use crate::properties::{compose_selector, expand_property, is_unitless, pseudo_selector};

#[derive(Debug, Clone, PartialEq)]
pub enum StylePart {
    Static(StyleDeclaration),
    /// Rendered as `var(--<class>)`; the element supplies the value
    Dynamic {
        declaration: StyleDeclaration,
        value: Span,
        unitless: bool,
    },
    Conditional {
        condition: Condition,
        consequent: Vec<StylePart>,
        alternate: Vec<StylePart>,
    },
}

impl StylePart {
    /// Every declaration in the tree, depth first
    pub fn declarations(&self) -> Vec<&StyleDeclaration> {
        match self {
            StylePart::Static(declaration) | StylePart::Dynamic { declaration, .. } => {
                vec![declaration]
            }
            StylePart::Conditional {
                consequent,
                alternate,
                ..
            } => consequent
                .iter()
                .chain(alternate)
                .flat_map(StylePart::declarations)
                .collect(),
        }
    }
}

/// Where the normalized declarations sit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    pub level: u8,
    pub selector: Option<String>,
    pub style_order: i32,
}

impl Context {
    pub fn with_order(style_order: i32) -> Self {
        Self {
            style_order,
            ..Self::default()
        }
    }

    fn nested(&self, selector: &str) -> Self {
        Self {
            selector: Some(compose_selector(self.selector.as_deref(), selector)),
            ..self.clone()
        }
    }

    fn at_level(&self, level: u8) -> Self {
        Self {
            level,
            ..self.clone()
        }
    }
}

/// Turns style values into declarations against one theme
pub struct Normalizer<'a> {
    theme: &'a Theme,
    /// Reported when a value cannot be reduced
    callee: &'a str,
    allow_dynamic: bool,
}

impl<'a> Normalizer<'a> {
    /// Component props: dynamic values become CSS variables
    pub fn for_props(theme: &'a Theme, prop: &'a str) -> Self {
        Self {
            theme,
            callee: prop,
            allow_dynamic: true,
        }
    }

    /// `css`, `globalCss` and `keyframes`: every value must be static
    pub fn literal_only(theme: &'a Theme, callee: &'a str) -> Self {
        Self {
            theme,
            callee,
            allow_dynamic: false,
        }
    }

    pub fn theme(&self) -> &Theme {
        self.theme
    }

    /// A whole style object (`css({...})`, `_hover={{...}}`) or a
    /// conditional choosing between objects
    pub fn normalize_style(&self, style: &Classified, ctx: &Context) -> Result<Vec<StylePart>, SiteError> {
        let mut out = Vec::new();
        self.style_into(style, ctx, &mut out)?;
        Ok(out)
    }

    fn style_into(
        &self,
        style: &Classified,
        ctx: &Context,
        out: &mut Vec<StylePart>,
    ) -> Result<(), SiteError> {
        match style {
            Classified::Object(entries, _) => self.object_into(entries, ctx, out),
            Classified::Conditional {
                condition,
                consequent,
                alternate,
                ..
            } => {
                let consequent = self.normalize_style(consequent, ctx)?;
                let alternate = self.normalize_style(alternate, ctx)?;
                if !consequent.is_empty() || !alternate.is_empty() {
                    out.push(StylePart::Conditional {
                        condition: *condition,
                        consequent,
                        alternate,
                    });
                }
                Ok(())
            }
            // `cond && {...}` leaves null or false on the other side
            Classified::Literal(Literal::Null | Literal::Bool(false), _) => Ok(()),
            Classified::Array(items, _) => {
                for (level, item) in items.iter().enumerate() {
                    if !is_empty_slot(item) {
                        self.style_into(item, &self.level_ctx(ctx, level, item.span())?, out)?;
                    }
                }
                Ok(())
            }
            other => Err(self.non_literal(other.span())),
        }
    }

    fn object_into(
        &self,
        entries: &[(String, Classified)],
        ctx: &Context,
        out: &mut Vec<StylePart>,
    ) -> Result<(), SiteError> {
        let mut ctx = ctx.clone();
        if let Some((_, order)) = entries.iter().find(|(key, _)| key == "styleOrder") {
            match order.as_number() {
                Some(n) => ctx.style_order = n as i32,
                None => return Err(self.non_literal(order.span())),
            }
        }

        for (key, value) in entries {
            self.entry_into(key, value, &ctx, out)?;
        }
        Ok(())
    }

    /// One `key: value` pair of a style object or one style prop
    pub fn entry_into(
        &self,
        key: &str,
        value: &Classified,
        ctx: &Context,
        out: &mut Vec<StylePart>,
    ) -> Result<(), SiteError> {
        match key {
            "styleOrder" => Ok(()),
            "selectors" => {
                let Classified::Object(selectors, _) = value else {
                    return Err(self.non_literal(value.span()));
                };
                for (selector, style) in selectors {
                    self.style_into(style, &ctx.nested(selector), out)?;
                }
                Ok(())
            }
            "typography" => self.typography_into(value, ctx, out),
            _ => {
                if let Some(selector) = pseudo_selector(key) {
                    return self.style_into(value, &ctx.nested(&selector), out);
                }
                // `"&:hover": {...}` and `"& th": {...}` written directly
                if key.contains('&') {
                    return self.style_into(value, &ctx.nested(key), out);
                }
                self.value_into(&expand_property(key), value, ctx, out)
            }
        }
    }

    /// Value of one (possibly shorthand) property
    pub fn value_into(
        &self,
        properties: &[String],
        value: &Classified,
        ctx: &Context,
        out: &mut Vec<StylePart>,
    ) -> Result<(), SiteError> {
        match value {
            Classified::Literal(Literal::Null, _) => Ok(()),
            Classified::Literal(Literal::Bool(_), span) => {
                warn!(properties = ?properties, start = span.start, "Boolean style value ignored");
                Ok(())
            }
            Classified::Literal(literal, span) => {
                for property in properties {
                    let text = self.render_literal(property, literal, *span)?;
                    out.push(StylePart::Static(declaration(property, StyleValue::Static(text), ctx)));
                }
                Ok(())
            }
            Classified::Array(items, _) => {
                // A null slot inherits the previous breakpoint
                for (level, item) in items.iter().enumerate() {
                    if !is_empty_slot(item) {
                        let ctx = self.level_ctx(ctx, level, item.span())?;
                        self.value_into(properties, item, &ctx, out)?;
                    }
                }
                Ok(())
            }
            Classified::Conditional {
                condition,
                consequent,
                alternate,
                ..
            } => {
                let mut then_parts = Vec::new();
                let mut else_parts = Vec::new();
                self.value_into(properties, consequent, ctx, &mut then_parts)?;
                self.value_into(properties, alternate, ctx, &mut else_parts)?;
                if !then_parts.is_empty() || !else_parts.is_empty() {
                    out.push(StylePart::Conditional {
                        condition: *condition,
                        consequent: then_parts,
                        alternate: else_parts,
                    });
                }
                Ok(())
            }
            Classified::Dynamic(span) => {
                if !self.allow_dynamic {
                    return Err(self.non_literal(*span));
                }
                for property in properties {
                    out.push(StylePart::Dynamic {
                        declaration: declaration(property, StyleValue::Dynamic, ctx),
                        value: *span,
                        unitless: is_unitless(property),
                    });
                }
                Ok(())
            }
            Classified::Object(_, span) => {
                warn!(properties = ?properties, start = span.start, "Object is not a property value");
                Err(self.non_literal(*span))
            }
        }
    }

    /// Static text for a literal: token references resolved, numbers given
    /// `px` unless the property is unitless
    pub fn render_literal(&self, property: &str, literal: &Literal, span: Span) -> Result<String, SiteError> {
        match literal {
            Literal::Num(n) if *n == 0.0 => Ok("0".to_string()),
            Literal::Num(n) if is_unitless(property) || property.starts_with("--") => {
                Ok(format_number(*n))
            }
            Literal::Num(n) => Ok(format!("{}px", format_number(*n))),
            Literal::Str(text) => self.resolve(text, span),
            Literal::Bool(b) => Ok(b.to_string()),
            Literal::Null => Ok(String::new()),
        }
    }

    pub fn resolve(&self, text: &str, span: Span) -> Result<String, SiteError> {
        let resolved = self
            .theme
            .resolve_references(text)
            .map_err(|token| SiteError::UndefinedToken { span, token })?;
        Ok(collapse_whitespace(&resolved))
    }

    fn typography_into(
        &self,
        value: &Classified,
        ctx: &Context,
        out: &mut Vec<StylePart>,
    ) -> Result<(), SiteError> {
        match value {
            Classified::Literal(Literal::Str(name), span) => {
                let name = name.strip_prefix('$').unwrap_or(name);
                let Some(entry) = self.theme.typography(name) else {
                    return Err(SiteError::UndefinedToken {
                        span: *span,
                        token: name.to_string(),
                    });
                };
                let style = classify_json(entry, *span);
                match style {
                    // one style object per breakpoint
                    Classified::Array(levels, _) => {
                        for (level, item) in levels.iter().enumerate() {
                            if is_empty_slot(item) {
                                continue;
                            }
                            let level = (ctx.level as usize).max(level);
                            self.style_into(item, &self.level_ctx(ctx, level, *span)?, out)?;
                        }
                        Ok(())
                    }
                    other => self.style_into(&other, ctx, out),
                }
            }
            Classified::Literal(Literal::Null, _) => Ok(()),
            Classified::Conditional {
                condition,
                consequent,
                alternate,
                ..
            } => {
                let mut then_parts = Vec::new();
                let mut else_parts = Vec::new();
                self.typography_into(consequent, ctx, &mut then_parts)?;
                self.typography_into(alternate, ctx, &mut else_parts)?;
                out.push(StylePart::Conditional {
                    condition: *condition,
                    consequent: then_parts,
                    alternate: else_parts,
                });
                Ok(())
            }
            other => Err(self.non_literal(other.span())),
        }
    }

    /// Context for slot `level` of a responsive value; the theme must define
    /// a breakpoint for it
    fn level_ctx(&self, ctx: &Context, level: usize, span: Span) -> Result<Context, SiteError> {
        let breakpoints = self.theme.breakpoints.len();
        if level >= breakpoints {
            return Err(SiteError::BreakpointOverflow {
                span,
                level,
                breakpoints,
            });
        }
        Ok(ctx.at_level(level as u8))
    }

    pub fn non_literal(&self, span: Span) -> SiteError {
        SiteError::NonLiteral {
            span,
            callee: self.callee.to_string(),
        }
    }
}

fn is_empty_slot(item: &Classified) -> bool {
    matches!(item, Classified::Literal(Literal::Null, _))
}

fn declaration(property: &str, value: StyleValue, ctx: &Context) -> StyleDeclaration {
    StyleDeclaration::new(property, value)
        .at_level(ctx.level)
        .with_selector(ctx.selector.clone())
        .with_order(ctx.style_order)
}

/// Theme JSON as a classified value; every node points at `span`
pub fn classify_json(value: &Value, span: Span) -> Classified {
    match value {
        Value::Null => Classified::Literal(Literal::Null, span),
        Value::Bool(b) => Classified::Literal(Literal::Bool(*b), span),
        Value::Number(n) => Classified::Literal(Literal::Num(n.as_f64().unwrap_or(0.0)), span),
        Value::String(s) => Classified::Literal(Literal::Str(s.clone()), span),
        Value::Array(items) => {
            Classified::Array(items.iter().map(|item| classify_json(item, span)).collect(), span)
        }
        Value::Object(map) => Classified::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), classify_json(value, span)))
                .collect(),
            span,
        ),
    }
}

/// Collapse whitespace runs so equivalent values share one declaration
pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
