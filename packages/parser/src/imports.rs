//! Import-alias symbol table
//!
//! Built in one pass over a module's `import` declarations. The scanner consults
//! it to decide whether `B(...)` or `<D.Box>` refers to a styling API.

use crate::ast::Span;
use crate::lexer::{SpannedToken, Token};
use crate::parser::unescape;

/// One imported binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    pub module: String,
    pub imported: Imported,
    pub local: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Imported {
    Named(String),
    Default,
    Namespace,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportTable {
    bindings: Vec<ImportBinding>,
}

impl ImportTable {
    /// Collect every static import in the token stream
    pub fn build(tokens: &[SpannedToken<'_>]) -> Self {
        let mut bindings = Vec::new();
        let mut i = 0;

        while i < tokens.len() {
            let starts_import = tokens[i].token == Token::Import
                && !matches!(
                    tokens.get(i + 1).map(|t| &t.token),
                    Some(Token::LParen) | Some(Token::Dot)
                )
                && !matches!(i.checked_sub(1).map(|p| &tokens[p].token), Some(Token::Dot));
            if starts_import {
                i = parse_import(tokens, i, &mut bindings);
            } else {
                i += 1;
            }
        }

        Self { bindings }
    }

    pub fn bindings(&self) -> &[ImportBinding] {
        &self.bindings
    }

    /// Local alias bound to `imported` from `module`
    pub fn resolve(&self, module: &str, imported: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|b| b.module == module && b.imported == Imported::Named(imported.to_string()))
            .map(|b| b.local.as_str())
    }

    /// Exported name that `local` refers to, if it was imported from `module`
    pub fn imported_name(&self, module: &str, local: &str) -> Option<&str> {
        self.bindings.iter().find_map(|b| match &b.imported {
            Imported::Named(name) if b.module == module && b.local == local => Some(name.as_str()),
            _ => None,
        })
    }

    /// Whether `local` is `import * as local from module`
    pub fn is_namespace(&self, module: &str, local: &str) -> bool {
        self.bindings
            .iter()
            .any(|b| b.module == module && b.local == local && b.imported == Imported::Namespace)
    }

    pub fn imports_module(&self, module: &str) -> bool {
        self.bindings.iter().any(|b| b.module == module)
    }
}

/// Parse one import declaration starting at `start`; returns the index after it.
/// Malformed declarations are skipped token by token.
fn parse_import(tokens: &[SpannedToken<'_>], start: usize, out: &mut Vec<ImportBinding>) -> usize {
    let mut i = start + 1;
    let mut pending: Vec<(Imported, String)> = Vec::new();
    let peek = |i: usize| tokens.get(i).map(|t| &t.token);

    // `import "side-effect"`
    if let Some(Token::String(_)) = peek(i) {
        return i + 1;
    }

    // `import type { X } from "..."` carries no runtime bindings
    let type_only = matches!(peek(i), Some(Token::Ident("type")))
        && !matches!(peek(i + 1), Some(Token::From) | Some(Token::Comma));
    if type_only {
        i += 1;
    }

    loop {
        match peek(i) {
            Some(Token::Star) => {
                if peek(i + 1) != Some(&Token::As) {
                    return i + 1;
                }
                let Some(local) = peek(i + 2).and_then(|t| t.name()) else {
                    return i + 1;
                };
                pending.push((Imported::Namespace, local.to_string()));
                i += 3;
            }
            Some(Token::LBrace) => {
                i += 1;
                while let Some(token) = peek(i) {
                    if *token == Token::RBrace {
                        break;
                    }
                    if *token == Token::Comma {
                        i += 1;
                        continue;
                    }
                    // `type X` inside braces is erased at runtime
                    let inline_type = matches!(token, Token::Ident("type"))
                        && peek(i + 1).and_then(|t| t.name()).is_some();
                    if inline_type {
                        i += 1;
                    }
                    let imported = match peek(i) {
                        Some(Token::String(raw)) => unescape(&raw[1..raw.len() - 1]),
                        Some(t) => match t.name() {
                            Some(name) => name.to_string(),
                            None => return i + 1,
                        },
                        None => return i,
                    };
                    i += 1;
                    let local = if peek(i) == Some(&Token::As) {
                        let Some(local) = peek(i + 1).and_then(|t| t.name()) else {
                            return i + 1;
                        };
                        i += 2;
                        local.to_string()
                    } else {
                        imported.clone()
                    };
                    if !inline_type {
                        let imported = if imported == "default" {
                            Imported::Default
                        } else {
                            Imported::Named(imported)
                        };
                        pending.push((imported, local));
                    }
                }
                i += 1;
            }
            Some(token) if token.name().is_some() && *token != Token::From => {
                let local = token.name().unwrap_or_default().to_string();
                pending.push((Imported::Default, local));
                i += 1;
            }
            _ => return i.max(start + 1),
        }

        match peek(i) {
            Some(Token::Comma) => i += 1,
            Some(Token::From) => break,
            _ => return i,
        }
    }

    let Some(module_token) = tokens.get(i + 1) else {
        return i + 1;
    };
    let Token::String(raw) = module_token.token else {
        return i + 1;
    };
    let module = unescape(&raw[1..raw.len() - 1]);
    let span = tokens[start].span.merge(module_token.span);

    if !type_only {
        out.extend(pending.into_iter().map(|(imported, local)| ImportBinding {
            module: module.clone(),
            imported,
            local,
            span,
        }));
    }

    i + 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    const PKG: &str = "@devup-ui/react";

    fn table(source: &str) -> ImportTable {
        ImportTable::build(&tokenize(source))
    }

    #[test]
    fn test_named_and_aliased_imports() {
        let t = table(r#"import { css as B, Box, keyframes } from "@devup-ui/react";"#);
        assert_eq!(t.resolve(PKG, "css"), Some("B"));
        assert_eq!(t.resolve(PKG, "Box"), Some("Box"));
        assert_eq!(t.imported_name(PKG, "B"), Some("css"));
        assert_eq!(t.imported_name(PKG, "css"), None);
    }

    #[test]
    fn test_default_and_namespace_imports() {
        let t = table(
            r#"
            import React, { useState } from "react";
            import * as D from '@devup-ui/react'
            "#,
        );
        assert!(t.is_namespace(PKG, "D"));
        assert_eq!(t.resolve("react", "useState"), Some("useState"));
        assert_eq!(t.bindings().len(), 3);
    }

    #[test]
    fn test_type_imports_are_ignored() {
        let t = table(
            r#"
            import type { Theme } from "@devup-ui/react";
            import { type DevupProps, css } from "@devup-ui/react";
            "#,
        );
        assert_eq!(t.resolve(PKG, "Theme"), None);
        assert_eq!(t.resolve(PKG, "DevupProps"), None);
        assert_eq!(t.resolve(PKG, "css"), Some("css"));
    }

    #[test]
    fn test_dynamic_import_and_side_effects_are_skipped() {
        let t = table(
            r#"
            import "./global.css";
            const mod = import("@devup-ui/react");
            import { Box } from "@devup-ui/react";
            "#,
        );
        assert_eq!(t.bindings().len(), 1);
        assert_eq!(t.resolve(PKG, "Box"), Some("Box"));
    }

    #[test]
    fn test_other_packages_do_not_resolve() {
        let t = table(r#"import { css } from "@emotion/css";"#);
        assert_eq!(t.resolve(PKG, "css"), None);
        assert!(!t.imports_module(PKG));
    }
}
