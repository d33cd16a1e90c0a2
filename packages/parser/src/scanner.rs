//! Style site scanner
//!
//! Walks the token stream once and reports every `css`/`globalCss`/`keyframes`
//! call and every JSX element whose tag was imported from the styling package.
//! Sites come out in source order; nested sites (a `css()` inside a `className`
//! attribute) are reported separately.

use std::collections::HashMap;

use tracing::{debug, instrument};

use crate::ast::{ArrayElement, Span};
use crate::classify::{classify, Classified, Literal};
use crate::error::ParseResult;
use crate::imports::{ImportTable, Imported};
use crate::lexer::{tokenize, SpannedToken, Token, EXPRESSION_KEYWORDS};
use crate::parser::{matching_close, unescape, Parser};

/// Build-time styling function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleApi {
    Css,
    GlobalCss,
    Keyframes,
}

impl StyleApi {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "css" => Some(StyleApi::Css),
            "globalCss" => Some(StyleApi::GlobalCss),
            "keyframes" => Some(StyleApi::Keyframes),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StyleApi::Css => "css",
            StyleApi::GlobalCss => "globalCss",
            StyleApi::Keyframes => "keyframes",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallSite {
    pub api: StyleApi,
    /// `css`, `B` or `D.css` as written
    pub callee_span: Span,
    pub args: Vec<Classified>,
    /// Callee through the closing parenthesis
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// `<Box disabled />`
    Implicit,
    /// `bg="red"`; `span` includes the quotes
    Str { value: String, span: Span },
    /// `bg={expr}`; `span` covers the expression without braces
    Expr { value: Classified, span: Span },
}

impl AttrValue {
    /// The attribute value as the classifier sees it
    pub fn classified(&self, attr_span: Span) -> Classified {
        match self {
            AttrValue::Implicit => Classified::Literal(Literal::Bool(true), attr_span),
            AttrValue::Str { value, span } => Classified::Literal(Literal::Str(value.clone()), *span),
            AttrValue::Expr { value, .. } => value.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttrKind {
    Named { name: String, value: AttrValue },
    /// `{...props}`
    Spread,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsxAttr {
    pub kind: AttrKind,
    pub span: Span,
    /// End of the token before this attribute; removal starts here
    pub prev_end: usize,
}

impl JsxAttr {
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            AttrKind::Named { name, .. } => Some(name),
            AttrKind::Spread => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementSite {
    /// Exported component name (`Box` for `<B>` imported as `{ Box as B }`)
    pub component: String,
    pub tag_span: Span,
    pub attrs: Vec<JsxAttr>,
    pub self_closing: bool,
    /// Where new attributes are inserted: the end of the last token before `>` or `/>`
    pub insert_at: usize,
    /// Name span inside the matching `</...>`
    pub closing: Option<Span>,
    /// `<` through the end of the opening tag
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StyleSite {
    Call(CallSite),
    Element(ElementSite),
}

impl StyleSite {
    pub fn span(&self) -> Span {
        match self {
            StyleSite::Call(call) => call.span,
            StyleSite::Element(element) => element.span,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub sites: Vec<StyleSite>,
    pub imports: ImportTable,
}

/// Scan a module for style sites belonging to `package`
#[instrument(skip(source), fields(len = source.len()))]
pub fn scan(source: &str, package: &str) -> ParseResult<ScanResult> {
    let tokens = tokenize(source);
    let imports = ImportTable::build(&tokens);

    if !imports.imports_module(package) {
        return Ok(ScanResult {
            sites: Vec::new(),
            imports,
        });
    }

    let mut scanner = Scanner::new(source, &tokens, &imports, package);
    scanner.run()?;
    debug!(sites = scanner.sites.len(), "Scanned style sites");

    Ok(ScanResult {
        sites: scanner.sites,
        imports,
    })
}

struct Scanner<'a, 'src> {
    source: &'src str,
    tokens: &'a [SpannedToken<'src>],
    /// local alias -> exported name
    named: HashMap<&'a str, &'a str>,
    namespaces: Vec<&'a str>,
    sites: Vec<StyleSite>,
    /// tag text -> indices of unclosed element sites
    open: HashMap<String, Vec<usize>>,
}

impl<'a, 'src> Scanner<'a, 'src> {
    fn new(
        source: &'src str,
        tokens: &'a [SpannedToken<'src>],
        imports: &'a ImportTable,
        package: &str,
    ) -> Self {
        let mut named = HashMap::new();
        let mut namespaces = Vec::new();
        for binding in imports.bindings().iter().filter(|b| b.module == package) {
            match &binding.imported {
                Imported::Named(name) => {
                    named.insert(binding.local.as_str(), name.as_str());
                }
                Imported::Namespace => namespaces.push(binding.local.as_str()),
                Imported::Default => {}
            }
        }

        Self {
            source,
            tokens,
            named,
            namespaces,
            sites: Vec::new(),
            open: HashMap::new(),
        }
    }

    fn run(&mut self) -> ParseResult<()> {
        let tokens = self.tokens;
        let mut i = 0;
        while i < tokens.len() {
            if self.prev_is_dot(i) {
                i += 1;
                continue;
            }
            match tokens[i].token {
                Token::Ident(_) => {
                    if let Some((api, name_end)) = self.call_callee(i) {
                        self.scan_call(api, i, name_end)?;
                    }
                }
                Token::Lt if self.opens_type_arguments(i) => {}
                Token::Lt => {
                    if self.token(i + 1) == Some(&Token::Slash) {
                        self.scan_closing(i + 2);
                    } else if let Some(site) = self.scan_element(i)? {
                        let index = self.sites.len();
                        if !site.self_closing {
                            let tag = site.tag_span.text(self.source).to_string();
                            self.open.entry(tag).or_default().push(index);
                        }
                        self.sites.push(StyleSite::Element(site));
                    }
                }
                _ => {}
            }
            i += 1;
        }
        Ok(())
    }

    /// Resolve `name(` or `NS.name(` at `i`; returns the API and the index of
    /// the last callee token
    fn call_callee(&self, i: usize) -> Option<(StyleApi, usize)> {
        let (exported, last) = self.resolve_reference(i)?;
        let api = StyleApi::from_name(exported)?;
        (self.token(last + 1) == Some(&Token::LParen)).then_some((api, last))
    }

    /// `Alias` or `NS.Name` at `i`, mapped to its exported name
    fn resolve_reference(&self, i: usize) -> Option<(&'a str, usize)> {
        let Token::Ident(name) = self.tokens.get(i)?.token else {
            return None;
        };
        if let Some(exported) = self.named.get(name) {
            return Some((*exported, i));
        }
        if self.namespaces.contains(&name) && self.token(i + 1) == Some(&Token::Dot) {
            let member = self.tokens.get(i + 2)?.token.name()?;
            return Some((member, i + 2));
        }
        None
    }

    fn scan_call(&mut self, api: StyleApi, start: usize, name_end: usize) -> ParseResult<()> {
        let open = name_end + 1;
        let close = matching_close(self.tokens, open)?;
        let mut parser = Parser::with_range(self.source, self.tokens, open + 1..close);
        let args = parser
            .parse_arguments()?
            .iter()
            .map(|arg| match arg {
                ArrayElement::Expr(expr) => classify(expr),
                ArrayElement::Spread(expr) => Classified::Dynamic(expr.span()),
                ArrayElement::Hole(span) => Classified::Literal(Literal::Null, *span),
            })
            .collect();

        let callee_span = self.tokens[start].span.merge(self.tokens[name_end].span);
        self.sites.push(StyleSite::Call(CallSite {
            api,
            callee_span,
            args,
            span: callee_span.merge(self.tokens[close].span),
        }));
        Ok(())
    }

    /// Try to read an opening tag at `lt`. Anything that does not look like a
    /// component element (a comparison, a type argument) yields `None`.
    fn scan_element(&self, lt: usize) -> ParseResult<Option<ElementSite>> {
        let Some((exported, name_end)) = self.resolve_reference(lt + 1) else {
            return Ok(None);
        };
        if StyleApi::from_name(exported).is_some() {
            return Ok(None);
        }
        let tag_span = self.tokens[lt + 1].span.merge(self.tokens[name_end].span);

        let mut attrs = Vec::new();
        let mut j = name_end + 1;
        let (self_closing, end) = loop {
            match self.token(j) {
                Some(Token::Gt) => break (false, j),
                Some(Token::Slash) if self.token(j + 1) == Some(&Token::Gt) => break (true, j + 1),
                Some(_) => match self.scan_attribute(j)? {
                    Some((attr, next)) => {
                        attrs.push(attr);
                        j = next;
                    }
                    None => return Ok(None),
                },
                None => return Ok(None),
            }
        };

        // `<Box>(x)` reads as a type assertion or comparison, not markup
        if attrs.is_empty() && !self_closing && self.token(end + 1) == Some(&Token::LParen) {
            return Ok(None);
        }

        let before_close = if self_closing { end - 2 } else { end - 1 };
        Ok(Some(ElementSite {
            component: exported.to_string(),
            tag_span,
            attrs,
            self_closing,
            insert_at: self.tokens[before_close].span.end,
            closing: None,
            span: self.tokens[lt].span.merge(self.tokens[end].span),
        }))
    }

    /// One attribute starting at `j`; returns it with the index after it
    fn scan_attribute(&self, j: usize) -> ParseResult<Option<(JsxAttr, usize)>> {
        let prev_end = self.tokens[j - 1].span.end;
        let start = self.tokens[j].span;

        if self.tokens[j].token == Token::LBrace {
            if self.token(j + 1) != Some(&Token::Ellipsis) {
                return Ok(None);
            }
            let Ok(close) = matching_close(self.tokens, j) else {
                return Ok(None);
            };
            let attr = JsxAttr {
                kind: AttrKind::Spread,
                span: start.merge(self.tokens[close].span),
                prev_end,
            };
            return Ok(Some((attr, close + 1)));
        }

        let Some(first) = self.tokens[j].token.name() else {
            return Ok(None);
        };
        let mut name = first.to_string();
        let mut last = j;
        // `aria-label`, `xlink:href`: parts are written without whitespace
        while let (Some(sep), Some(next)) = (self.tokens.get(last + 1), self.tokens.get(last + 2)) {
            let joined = matches!(sep.token, Token::Minus | Token::Colon)
                && sep.span.start == self.tokens[last].span.end
                && next.span.start == sep.span.end;
            let Some(part) = next.token.name().filter(|_| joined) else {
                break;
            };
            name.push_str(&self.source[sep.span.start..sep.span.end]);
            name.push_str(part);
            last += 2;
        }

        if self.token(last + 1) != Some(&Token::Eq) {
            let attr = JsxAttr {
                kind: AttrKind::Named {
                    name,
                    value: AttrValue::Implicit,
                },
                span: start.merge(self.tokens[last].span),
                prev_end,
            };
            return Ok(Some((attr, last + 1)));
        }

        let value_index = last + 2;
        let Some(value_token) = self.tokens.get(value_index) else {
            return Ok(None);
        };
        let (value, end) = match value_token.token {
            Token::String(raw) => (
                AttrValue::Str {
                    value: unescape(&raw[1..raw.len() - 1]),
                    span: value_token.span,
                },
                value_index,
            ),
            Token::LBrace => {
                let Ok(close) = matching_close(self.tokens, value_index) else {
                    return Ok(None);
                };
                if close == value_index + 1 {
                    (AttrValue::Implicit, close)
                } else {
                    let inner = self.tokens[value_index + 1]
                        .span
                        .merge(self.tokens[close - 1].span);
                    let mut parser =
                        Parser::with_range(self.source, self.tokens, value_index + 1..close);
                    let value = match parser.parse_expression() {
                        Ok(expr) => classify(&expr),
                        Err(_) => Classified::Dynamic(inner),
                    };
                    (AttrValue::Expr { value, span: inner }, close)
                }
            }
            _ => return Ok(None),
        };

        let attr = JsxAttr {
            kind: AttrKind::Named { name, value },
            span: start.merge(self.tokens[end].span),
            prev_end,
        };
        Ok(Some((attr, end + 1)))
    }

    /// `</Name>` whose name starts at `j`
    fn scan_closing(&mut self, j: usize) {
        let Some((_, name_end)) = self.resolve_reference(j) else {
            return;
        };
        if self.token(name_end + 1) != Some(&Token::Gt) {
            return;
        }
        let span = self.tokens[j].span.merge(self.tokens[name_end].span);
        let tag = span.text(self.source);
        let Some(index) = self.open.get_mut(tag).and_then(Vec::pop) else {
            return;
        };
        if let Some(StyleSite::Element(site)) = self.sites.get_mut(index) {
            site.closing = Some(span);
        }
    }

    /// `Array<Box>`, `useState<Box>()`: a `<` written right after a name
    /// opens type arguments. JSX text before an element is separated by a space.
    fn opens_type_arguments(&self, lt: usize) -> bool {
        let Some(prev) = lt.checked_sub(1).and_then(|p| self.tokens.get(p)) else {
            return false;
        };
        prev.span.end == self.tokens[lt].span.start
            && prev
                .token
                .name()
                .is_some_and(|name| !EXPRESSION_KEYWORDS.contains(&name))
    }

    fn token(&self, i: usize) -> Option<&Token<'src>> {
        self.tokens.get(i).map(|t| &t.token)
    }

    fn prev_is_dot(&self, i: usize) -> bool {
        i > 0 && matches!(self.tokens[i - 1].token, Token::Dot | Token::OptionalChain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PKG: &str = "@devup-ui/react";

    fn sites(source: &str) -> Vec<StyleSite> {
        scan(source, PKG).unwrap().sites
    }

    fn element(site: &StyleSite) -> &ElementSite {
        match site {
            StyleSite::Element(element) => element,
            other => panic!("expected element, got {:?}", other),
        }
    }

    #[test]
    fn test_no_package_import_means_no_sites() {
        assert!(sites(r#"const a = css({ color: "red" });"#).is_empty());
    }

    #[test]
    fn test_aliased_css_call() {
        let source = r#"import { css as B } from "@devup-ui/react";
const a = B({ color: "red" });
const b = css({ color: "blue" });"#;
        let found = sites(source);
        assert_eq!(found.len(), 1);
        let StyleSite::Call(call) = &found[0] else {
            panic!("expected call");
        };
        assert_eq!(call.api, StyleApi::Css);
        assert_eq!(call.callee_span.text(source), "B");
        assert_eq!(call.span.text(source), r#"B({ color: "red" })"#);
        assert!(call.args[0].is_static());
    }

    #[test]
    fn test_namespace_call_and_element() {
        let source = r#"import * as D from "@devup-ui/react";
const k = D.keyframes({ from: { opacity: 0 } });
const x = <D.Box bg="red">hi</D.Box>;"#;
        let found = sites(source);
        assert_eq!(found.len(), 2);
        let StyleSite::Call(call) = &found[0] else {
            panic!("expected call");
        };
        assert_eq!(call.api, StyleApi::Keyframes);
        let el = element(&found[1]);
        assert_eq!(el.component, "Box");
        assert_eq!(el.tag_span.text(source), "D.Box");
        assert_eq!(el.closing.map(|s| s.text(source)), Some("D.Box"));
    }

    #[test]
    fn test_member_access_is_not_a_call() {
        let source = r#"import { css } from "@devup-ui/react";
const a = styles.css({ color: "red" });"#;
        assert!(sites(source).is_empty());
    }

    #[test]
    fn test_element_attributes() {
        let source = r#"import { Box } from "@devup-ui/react";
const x = <Box bg="red" p={4} aria-label="x" disabled {...rest} onClick={() => go()} />;"#;
        let found = sites(source);
        let el = element(&found[0]);
        assert!(el.self_closing);
        assert!(el.closing.is_none());
        let names: Vec<_> = el.attrs.iter().map(|a| a.name()).collect();
        assert_eq!(
            names,
            vec![Some("bg"), Some("p"), Some("aria-label"), Some("disabled"), None, Some("onClick")]
        );
        assert_eq!(el.attrs[0].span.text(source), r#"bg="red""#);
        assert_eq!(&source[el.attrs[0].prev_end..el.attrs[0].span.start], " ");
        assert_eq!(&source[el.insert_at..el.insert_at + 3], " />");
        match &el.attrs[5].kind {
            AttrKind::Named {
                value: AttrValue::Expr { value, span },
                ..
            } => {
                assert!(matches!(value, Classified::Dynamic(_)));
                assert_eq!(span.text(source), "() => go()");
            }
            other => panic!("unexpected attribute {:?}", other),
        }
    }

    #[test]
    fn test_nested_elements_pair_closing_tags() {
        let source = r#"import { Flex as F, Box } from "@devup-ui/react";
<F gap={2}><Box><Box color="red">a</Box></Box></F>"#;
        let found = sites(source);
        assert_eq!(found.len(), 3);
        let outer = element(&found[1]);
        let inner = element(&found[2]);
        assert_eq!(element(&found[0]).component, "Flex");
        let outer_close = outer.closing.unwrap();
        let inner_close = inner.closing.unwrap();
        assert!(inner_close.start < outer_close.start);
        assert_eq!(&source[outer_close.end..outer_close.end + 1], ">");
    }

    #[test]
    fn test_comparison_is_not_an_element() {
        let source = r#"import { Box } from "@devup-ui/react";
const ok = a < Box && Box > b;"#;
        assert!(sites(source).is_empty());
    }

    #[test]
    fn test_type_arguments_are_not_elements() {
        let source = r#"import { Box } from "@devup-ui/react";
const f = (x: Array<Box>, y: Map<string, Box>) => <Box color="red" />;
const [b] = useState<Box | null>(null);"#;
        let found = sites(source);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].span().text(source), r#"<Box color="red" />"#);
    }

    #[test]
    fn test_regex_literal_does_not_hide_later_sites() {
        let source = r#"import { Box } from "@devup-ui/react";
const quote = /"/;
const apostrophe = /'/g;
const x = <Box bg="red" />;"#;
        let found = sites(source);
        assert_eq!(found.len(), 1);
        let el = element(&found[0]);
        assert_eq!(el.attrs[0].span.text(source), r#"bg="red""#);
    }

    #[test]
    fn test_css_inside_class_name_is_reported() {
        let source = r#"import { Box, css } from "@devup-ui/react";
<Box className={css({ color: "red" })} />"#;
        let found = sites(source);
        assert_eq!(found.len(), 2);
        assert!(matches!(found[0], StyleSite::Element(_)));
        assert!(matches!(found[1], StyleSite::Call(_)));
    }

    #[test]
    fn test_unbalanced_call_is_error() {
        let source = r#"import { css } from "@devup-ui/react";
css({ color: "red" );"#;
        assert!(scan(source, PKG).is_err());
    }

    #[test]
    fn test_jsx_text_with_apostrophe() {
        let source = r#"import { Text } from "@devup-ui/react";
<p>Don't <Text color="red">stop</Text></p>"#;
        let found = sites(source);
        assert_eq!(found.len(), 1);
        assert_eq!(element(&found[0]).component, "Text");
    }
}
