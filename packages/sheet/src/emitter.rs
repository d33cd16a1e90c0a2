//! CSS emitter
//!
//! Output is minified and deterministic: rules are grouped by breakpoint
//! level, and ordered by `(style_order, token index)` inside a level.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, instrument, warn};

use crate::error::{SheetError, SheetResult};
use crate::sheet::{render_keyframe_steps, render_properties, StyleSheet};
use crate::snapshot::GlobalRule;
use crate::theme::{Theme, DEFAULT_BREAKPOINTS};
use crate::token::ClassToken;

/// Render the base stylesheet (`chunk == None`) or one chunk's class rules.
///
/// In watch mode the base sheet also carries every rule no chunked file
/// references, so styles removed from a file stay applied until reload.
#[instrument(skip(sheet, theme))]
pub fn render(
    sheet: &StyleSheet,
    theme: Option<&Theme>,
    chunk: Option<usize>,
    watch: bool,
) -> SheetResult<String> {
    let breakpoints = theme
        .map(|t| t.breakpoints.as_slice())
        .unwrap_or(&DEFAULT_BREAKPOINTS);

    let Some(chunk) = chunk else {
        let mut css = render_base(sheet, theme, breakpoints);
        let tokens = base_tokens(sheet, watch);
        css.push_str(&render_rules(sheet, &tokens, breakpoints)?);
        debug!(rules = tokens.len(), bytes = css.len(), "Rendered base stylesheet");
        return Ok(css);
    };

    let tokens: BTreeSet<ClassToken> = sheet
        .file_map()
        .files
        .values()
        .filter(|entry| entry.chunk == Some(chunk))
        .flat_map(|entry| entry.tokens.iter().copied())
        .collect();
    let css = render_rules(sheet, &tokens, breakpoints)?;
    debug!(chunk, rules = tokens.len(), "Rendered chunk stylesheet");
    Ok(css)
}

/// Imports, theme variables, font faces, globals and keyframes
fn render_base(sheet: &StyleSheet, theme: Option<&Theme>, breakpoints: &[u32]) -> String {
    let content = sheet.content();
    let mut css = String::new();

    for url in &content.imports {
        if url.starts_with("url(") {
            css.push_str(&format!("@import {};", url));
        } else {
            css.push_str(&format!("@import \"{}\";", url));
        }
    }

    if let Some(theme) = theme {
        css.push_str(&theme.to_css());
    }

    for properties in &content.font_faces {
        css.push_str(&format!("@font-face{{{}}}", render_properties(properties)));
    }

    css.push_str(&render_globals(&content.globals, breakpoints));

    for (token, steps) in &content.keyframes {
        css.push_str(&format!(
            "@keyframes {}{{{}}}",
            sheet.class_name(*token),
            render_keyframe_steps(steps)
        ));
    }

    css
}

fn render_globals(globals: &[GlobalRule], breakpoints: &[u32]) -> String {
    let mut by_level: BTreeMap<u8, String> = BTreeMap::new();
    for rule in globals {
        by_level.entry(rule.level).or_default().push_str(&format!(
            "{}{{{}}}",
            rule.selector,
            render_properties(&rule.properties)
        ));
    }
    wrap_levels(by_level, breakpoints)
}

/// Tokens whose rules belong in the base stylesheet
fn base_tokens(sheet: &StyleSheet, watch: bool) -> BTreeSet<ClassToken> {
    let files = &sheet.file_map().files;
    let mut tokens: BTreeSet<ClassToken> = files
        .values()
        .filter(|entry| entry.chunk.is_none())
        .flat_map(|entry| entry.tokens.iter().copied())
        .collect();

    if watch {
        let chunked: BTreeSet<ClassToken> = files
            .values()
            .filter(|entry| entry.chunk.is_some())
            .flat_map(|entry| entry.tokens.iter().copied())
            .collect();
        tokens.extend(
            sheet
                .content()
                .rules
                .keys()
                .filter(|token| !chunked.contains(token)),
        );
    }
    tokens
}

fn render_rules(
    sheet: &StyleSheet,
    tokens: &BTreeSet<ClassToken>,
    breakpoints: &[u32],
) -> SheetResult<String> {
    let mut by_level: BTreeMap<u8, Vec<(i32, ClassToken)>> = BTreeMap::new();
    for token in tokens {
        let declaration = sheet
            .declaration(*token)
            .ok_or_else(|| SheetError::MissingToken(token.to_string()))?;
        by_level
            .entry(declaration.level)
            .or_default()
            .push((declaration.style_order, *token));
    }

    let mut rendered = BTreeMap::new();
    for (level, mut entries) in by_level {
        entries.sort();
        let mut css = String::new();
        for (_, token) in entries {
            if let Some(declaration) = sheet.declaration(token) {
                css.push_str(&declaration.render_rule(&sheet.class_name(token)));
            }
        }
        rendered.insert(level, css);
    }
    Ok(wrap_levels(rendered, breakpoints))
}

/// Level 0 bare, level n inside `@media (min-width:<bp>px)`
fn wrap_levels(levels: BTreeMap<u8, String>, breakpoints: &[u32]) -> String {
    let mut css = String::new();
    for (level, body) in levels {
        if body.is_empty() {
            continue;
        }
        if level == 0 {
            css.push_str(&body);
            continue;
        }
        match breakpoints.get(level as usize) {
            Some(bp) => css.push_str(&format!("@media (min-width:{}px){{{}}}", bp, body)),
            None => warn!(level, "No breakpoint registered for level; rules skipped"),
        }
    }
    css
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::{StyleDeclaration, StyleValue};
    use crate::snapshot::KeyframeStep;

    fn decl(property: &str, value: &str) -> StyleDeclaration {
        StyleDeclaration::new(property, StyleValue::Static(value.to_string()))
    }

    #[test]
    fn test_single_mode_base_sheet() {
        let mut sheet = StyleSheet::new();
        let (a, _) = sheet.insert(decl("color", "red"));
        let (b, _) = sheet.insert(decl("padding", "8px").at_level(2));
        let (c, _) = sheet.insert(decl("color", "blue").with_selector(Some("&:hover".into())));
        sheet.record_file_contribution("a.tsx", vec![a, b, c], None);

        let css = render(&sheet, None, None, false).unwrap();
        assert_eq!(
            css,
            ".a{color:red}.c:hover{color:blue}@media (min-width:768px){.b{padding:8px}}"
        );
    }

    #[test]
    fn test_style_order_sorts_within_level() {
        let mut sheet = StyleSheet::new();
        let (late, _) = sheet.insert(decl("color", "red").with_order(5));
        let (early, _) = sheet.insert(decl("color", "blue"));
        sheet.record_file_contribution("a.tsx", vec![late, early], None);

        let css = render(&sheet, None, None, false).unwrap();
        assert_eq!(css, ".b{color:blue}.a{color:red}");
    }

    #[test]
    fn test_base_order_and_theme() {
        let theme = Theme::from_json(r##"{"colors": {"light": {"primary": "#000"}}}"##).unwrap();
        let mut sheet = StyleSheet::new();
        sheet.insert_keyframes(vec![KeyframeStep {
            selector: "from".into(),
            properties: vec![("opacity".into(), "0".into())],
        }]);
        sheet.add_global(GlobalRule {
            selector: "body".into(),
            level: 0,
            properties: vec![("margin".into(), "0".into())],
        });
        sheet.add_font_face(vec![("font-family".into(), "Inter".into())]);
        sheet.add_import("reset.css");
        sheet.set_prefix("d-");

        let css = render(&sheet, Some(&theme), None, false).unwrap();
        assert_eq!(
            css,
            "@import \"reset.css\";:root{--primary:#000}@font-face{font-family:Inter}body{margin:0}@keyframes d-a{from{opacity:0}}"
        );
    }

    #[test]
    fn test_chunks_and_watch_mode() {
        let mut sheet = StyleSheet::new();
        let (a, _) = sheet.insert(decl("color", "red"));
        let (b, _) = sheet.insert(decl("color", "blue"));
        let (stale, _) = sheet.insert(decl("color", "green"));
        let chunk = sheet.chunk_for("a.tsx");
        sheet.record_file_contribution("a.tsx", vec![a], Some(chunk));
        let chunk_b = sheet.chunk_for("b.tsx");
        sheet.record_file_contribution("b.tsx", vec![b], Some(chunk_b));

        assert_eq!(render(&sheet, None, Some(chunk), false).unwrap(), ".a{color:red}");
        assert_eq!(render(&sheet, None, Some(chunk_b), false).unwrap(), ".b{color:blue}");
        assert_eq!(render(&sheet, None, None, false).unwrap(), "");

        let watch = render(&sheet, None, None, true).unwrap();
        assert_eq!(watch, format!(".{}{{color:green}}", stale));
    }

    #[test]
    fn test_dynamic_rule_uses_prefixed_var() {
        let mut sheet = StyleSheet::new();
        sheet.set_prefix("x");
        let (a, _) = sheet.insert(StyleDeclaration::new("width", StyleValue::Dynamic));
        sheet.record_file_contribution("a.tsx", vec![a], None);
        assert_eq!(render(&sheet, None, None, false).unwrap(), ".xa{width:var(--xa)}");
    }

    #[test]
    fn test_missing_token_is_error() {
        let mut sheet = StyleSheet::new();
        sheet.record_file_contribution("a.tsx", vec![ClassToken::from_index(9)], None);
        assert_eq!(
            render(&sheet, None, None, false),
            Err(SheetError::MissingToken("j".into()))
        );
    }

    #[test]
    fn test_render_is_deterministic() {
        let build = || {
            let mut sheet = StyleSheet::new();
            let tokens: Vec<_> = ["a", "b", "c"]
                .iter()
                .map(|v| sheet.insert(decl("content", v).at_level(1)).0)
                .collect();
            sheet.record_file_contribution("x.tsx", tokens, None);
            render(&sheet, None, None, false).unwrap()
        };
        assert_eq!(build(), build());
    }
}
