//! Code rewriter
//!
//! Every site becomes a set of edits over the original text: replacements for
//! `css()` calls and component tags, deletions for style props, insertions for
//! `className`/`style`. Edits are applied in one pass that also records the
//! source map.

use devup_ui_parser::{AttrValue, Condition, Span};
use devup_ui_sheet::ClassToken;
use devup_ui_sourcemap::{LineIndex, SourceMapBuilder};
use tracing::{debug, instrument, warn};

use crate::error::ExtractResult;
use crate::site::{js_string, ElementPlan, SitePlan};

/// A declaration after allocation
#[derive(Debug, Clone, PartialEq)]
pub enum ClassPart {
    Token {
        token: ClassToken,
        style_order: i32,
        /// Source of a dynamic value, fed through `--<class>`
        var: Option<DynamicVar>,
    },
    Conditional {
        condition: Condition,
        consequent: Vec<ClassPart>,
        alternate: Vec<ClassPart>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DynamicVar {
    pub value: Span,
    pub unitless: bool,
}

/// What the sheet handed back for one site
#[derive(Debug, Clone, PartialEq)]
pub enum Allocation {
    Classes(Vec<ClassPart>),
    Keyframes(ClassToken),
    Base,
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Name(String),
    /// `${...}` inside a template
    Expr(String),
}

/// Class list of one site: static names, then runtime selections
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassExpr {
    segments: Vec<Segment>,
}

impl ClassExpr {
    /// Static names keep encounter order, stable-sorted by style order
    pub fn build(parts: &[ClassPart], prefix: &str, source: &str) -> Self {
        let mut names: Vec<(i32, ClassToken)> = Vec::new();
        let mut selections = Vec::new();

        for part in parts {
            match part {
                ClassPart::Token {
                    token, style_order, ..
                } => {
                    if !names.iter().any(|(_, t)| t == token) {
                        names.push((*style_order, *token));
                    }
                }
                ClassPart::Conditional {
                    condition,
                    consequent,
                    alternate,
                } => {
                    let then = ClassExpr::build(consequent, prefix, source);
                    let otherwise = ClassExpr::build(alternate, prefix, source);
                    if then.is_empty() && otherwise.is_empty() {
                        continue;
                    }
                    selections.push(Segment::Expr(format!(
                        "{} ? {} : {}",
                        condition.to_js(source),
                        then.to_js(),
                        otherwise.to_js()
                    )));
                }
            }
        }

        names.sort_by_key(|(order, _)| *order);
        let mut segments: Vec<Segment> = names
            .into_iter()
            .map(|(_, token)| Segment::Name(token.with_prefix(prefix)))
            .collect();
        segments.extend(selections);
        Self { segments }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    fn is_static(&self) -> bool {
        self.segments.iter().all(|s| matches!(s, Segment::Name(_)))
    }

    /// Existing class names go first
    pub fn with_leading(mut self, existing: &str) -> Self {
        let existing = existing.trim();
        if !existing.is_empty() {
            self.segments.insert(0, Segment::Name(existing.to_string()));
        }
        self
    }

    /// A string literal, or a template literal when a selection is involved
    pub fn to_js(&self) -> String {
        if self.is_static() {
            js_string(&self.static_text())
        } else {
            format!("`{}`", self.template_body())
        }
    }

    /// Right-hand side of a JSX `className=` attribute
    pub fn to_attr(&self) -> String {
        if self.is_static() {
            js_string(&self.static_text())
        } else {
            format!("{{`{}`}}", self.template_body())
        }
    }

    fn static_text(&self) -> String {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Name(name) => Some(name.as_str()),
                Segment::Expr(_) => None,
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn template_body(&self) -> String {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Name(name) => escape_template(name),
                Segment::Expr(expr) => format!("${{{}}}", expr),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn escape_template(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${")
}

/// `--<class>` entries for every dynamic value in the tree
fn dynamic_vars(parts: &[ClassPart], prefix: &str, source: &str, out: &mut Vec<(String, String)>) {
    for part in parts {
        match part {
            ClassPart::Token {
                token,
                var: Some(var),
                ..
            } => {
                let name = format!("--{}", token.with_prefix(prefix));
                if out.iter().any(|(n, _)| *n == name) {
                    continue;
                }
                let value = var.value.text(source);
                let js = if var.unitless {
                    format!("({})", value)
                } else {
                    format!("typeof ({0}) === \"number\" ? ({0}) + \"px\" : ({0})", value)
                };
                out.push((name, js));
            }
            ClassPart::Token { .. } => {}
            ClassPart::Conditional {
                consequent,
                alternate,
                ..
            } => {
                dynamic_vars(consequent, prefix, source, out);
                dynamic_vars(alternate, prefix, source, out);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Edit {
    start: usize,
    end: usize,
    text: String,
    /// Original identifier, recorded in the source map
    name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub code: String,
    pub map: Option<String>,
}

/// Rewrites one module against the tokens the sheet allocated
pub struct Rewriter<'a> {
    path: &'a str,
    source: &'a str,
    prefix: &'a str,
    edits: Vec<Edit>,
}

impl<'a> Rewriter<'a> {
    pub fn new(path: &'a str, source: &'a str, prefix: &'a str) -> Self {
        Self {
            path,
            source,
            prefix,
            edits: Vec::new(),
        }
    }

    /// Queue the edits for each planned site
    pub fn sites(&mut self, plans: &[SitePlan<'_>], allocations: &[Allocation]) {
        for (plan, allocation) in plans.iter().zip(allocations) {
            match (plan, allocation) {
                (SitePlan::Class { span, .. }, Allocation::Classes(parts)) => {
                    let class = ClassExpr::build(parts, self.prefix, self.source);
                    let text = if class.is_empty() {
                        "\"\"".to_string()
                    } else {
                        class.to_js()
                    };
                    self.replace(*span, text, Some("css"));
                }
                (SitePlan::Keyframes { span, .. }, Allocation::Keyframes(token)) => {
                    let name = js_string(&token.with_prefix(self.prefix));
                    self.replace(*span, name, Some("keyframes"));
                }
                (SitePlan::Global { span, .. }, _) => {
                    self.replace(*span, "void 0".to_string(), Some("globalCss"));
                }
                (SitePlan::Element(element), Allocation::Classes(parts)) => {
                    self.element(element, parts);
                }
                (plan, allocation) => {
                    warn!(?allocation, span = ?plan_span(plan), "Allocation does not match site");
                }
            }
        }
    }

    fn element(&mut self, plan: &ElementPlan<'_>, parts: &[ClassPart]) {
        let site = plan.site;
        if let Some(tag) = &plan.tag {
            let component = site.component.clone();
            self.replace(site.tag_span, tag.clone(), Some(&component));
            if let Some(closing) = site.closing {
                self.replace(closing, tag.clone(), Some(&component));
            }
        }
        for span in &plan.removed {
            self.replace(*span, String::new(), None);
        }

        let class = ClassExpr::build(parts, self.prefix, self.source);
        if !class.is_empty() {
            match plan.class_name.map(|attr| (attr, attr_value(attr))) {
                None => {
                    let class = match self.last_spread(site) {
                        // `{...props}` may carry a className; keep it
                        Some(spread) => format!(
                            "{{`{} ${{({})?.className ?? \"\"}}`}}",
                            class.template_body(),
                            spread
                        ),
                        None => class.to_attr(),
                    };
                    self.insert(site.insert_at, format!(" className={}", class));
                }
                Some((_, Some(AttrValue::Str { value, span }))) => {
                    let merged = class.with_leading(value).to_attr();
                    self.replace(*span, merged, None);
                }
                Some((_, Some(AttrValue::Expr { span, .. }))) => {
                    self.insert(span.start, format!("`{} ${{(", class.template_body()));
                    self.insert(span.end, ") ?? \"\"}`".to_string());
                }
                Some((attr, _)) => {
                    warn!(start = attr.span.start, "className has no value to merge into");
                }
            }
        }

        let mut entries = Vec::new();
        dynamic_vars(parts, self.prefix, self.source, &mut entries);
        entries.extend(plan.style_vars.iter().cloned());
        if entries.is_empty() {
            return;
        }
        let body = entries
            .iter()
            .map(|(name, js)| format!("{}: {}", js_string(name), js))
            .collect::<Vec<_>>()
            .join(", ");
        match plan.style.map(|attr| (attr, attr_value(attr))) {
            None => self.insert(site.insert_at, format!(" style={{{{{}}}}}", body)),
            Some((_, Some(AttrValue::Expr { span, .. }))) => {
                self.insert(span.start, "{...(".to_string());
                self.insert(span.end, format!("), {}}}", body));
            }
            // rejected while planning
            Some(_) => {}
        }
    }

    /// Expression of the last `{...expr}` attribute
    fn last_spread(&self, site: &devup_ui_parser::ElementSite) -> Option<&'a str> {
        let attr = site
            .attrs
            .iter()
            .rev()
            .find(|attr| attr.kind == devup_ui_parser::AttrKind::Spread)?;
        let text = attr.span.text(self.source);
        let inner = text.strip_prefix('{')?.strip_suffix('}')?.trim();
        inner.strip_prefix("...").map(str::trim)
    }

    /// Put the stylesheet import at the top, after any directive prologue
    pub fn import_css(&mut self, css_file: &str) {
        let statement = format!("import {};", js_string(css_file));
        match directive_end(self.source) {
            Some(end) => self.insert(end, format!("\n{}", statement)),
            None => self.insert(0, format!("{}\n", statement)),
        }
    }

    fn replace(&mut self, span: Span, text: String, name: Option<&str>) {
        self.edits.push(Edit {
            start: span.start,
            end: span.end,
            text,
            name: name.map(str::to_string),
        });
    }

    fn insert(&mut self, at: usize, text: String) {
        self.replace(Span::new(at, at), text, None);
    }

    /// Apply the queued edits and build the source map
    #[instrument(skip(self), fields(path = %self.path, edits = self.edits.len()))]
    pub fn finish(mut self) -> ExtractResult<Rewritten> {
        if self.edits.is_empty() {
            return Ok(Rewritten {
                code: self.source.to_string(),
                map: None,
            });
        }

        // stable: insertions at one offset keep their queue order
        self.edits.sort_by_key(|e| (e.start, e.end));

        let index = LineIndex::new(self.source);
        let mut map = SourceMapBuilder::new(self.path, self.source);
        let mut code = String::with_capacity(self.source.len() + self.edits.len() * 8);
        let mut cursor = 0;

        for edit in &self.edits {
            if edit.start < cursor {
                debug!(start = edit.start, cursor, "Dropping edit inside a replaced range");
                continue;
            }
            let copied = &self.source[cursor..edit.start];
            map.copy_segment(copied, cursor, &index);
            code.push_str(copied);

            map.replace_segment(&edit.text, edit.start, &index, edit.name.as_deref());
            code.push_str(&edit.text);
            cursor = edit.end;
        }
        let tail = &self.source[cursor..];
        map.copy_segment(tail, cursor, &index);
        code.push_str(tail);

        Ok(Rewritten {
            code,
            map: Some(map.to_json()?),
        })
    }
}

fn attr_value(attr: &devup_ui_parser::JsxAttr) -> Option<&AttrValue> {
    match &attr.kind {
        devup_ui_parser::AttrKind::Named { value, .. } => Some(value),
        devup_ui_parser::AttrKind::Spread => None,
    }
}

fn plan_span(plan: &SitePlan<'_>) -> Span {
    match plan {
        SitePlan::Class { span, .. }
        | SitePlan::Keyframes { span, .. }
        | SitePlan::Global { span, .. } => *span,
        SitePlan::Element(element) => element.site.span,
    }
}

/// End of a leading `"use client"` / `'use strict'` prologue
fn directive_end(source: &str) -> Option<usize> {
    let mut end = None;
    let mut offset = 0;
    loop {
        let rest = &source[offset..];
        let trimmed = rest.trim_start();
        let start = offset + (rest.len() - trimmed.len());
        let quote = trimmed.chars().next().filter(|c| matches!(c, '"' | '\''))?;
        if !trimmed[1..].starts_with("use ") {
            return end;
        }
        let Some(close) = trimmed[1..].find(quote) else {
            return end;
        };
        let mut stop = start + close + 2;
        if source[stop..].starts_with(';') {
            stop += 1;
        }
        end = Some(stop);
        offset = stop;
        if !source[offset..].trim_start().starts_with(['"', '\'']) {
            return end;
        }
    }
}
