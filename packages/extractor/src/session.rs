//! Extraction session
//!
//! One theme, one sheet. Files are scanned, planned and rewritten without the
//! lock; only the insertions for a file run under the write lock, so the
//! insert-if-absent step is atomic across threads.

use std::collections::HashSet;
use std::sync::{OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

use devup_ui_parser::scan;
use devup_ui_sheet::{render, ClassToken, StyleSheet, Theme};
use devup_ui_sourcemap::LineIndex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{ExtractError, ExtractResult};
use crate::normalizer::StylePart;
use crate::rewriter::{Allocation, ClassPart, DynamicVar, Rewriter};
use crate::site::{plan_sites, SitePlan};

pub const DEFAULT_PACKAGE: &str = "@devup-ui/react";
pub const DEFAULT_CSS_DIR: &str = "df/devup-ui";
pub const BASE_CSS_FILE: &str = "devup-ui.css";

/// Per-call extraction settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractOptions {
    /// Module the styling API is imported from
    pub package: String,
    /// Directory the stylesheets are written to, as seen from the bundler
    pub css_dir: String,
    /// One stylesheet for every file instead of one per file
    pub single_css: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            package: DEFAULT_PACKAGE.to_string(),
            css_dir: DEFAULT_CSS_DIR.to_string(),
            single_css: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractOutput {
    pub code: String,
    /// v3 source map; `None` when the module was left untouched
    pub map: Option<String>,
    /// Stylesheet the rewritten module imports
    pub css_file: Option<String>,
    pub updated_base_style: bool,
}

/// `devup-ui-<n>.css`
pub fn chunk_file_name(chunk: usize) -> String {
    format!("devup-ui-{}.css", chunk)
}

/// Theme plus the session-wide sheet
#[derive(Debug, Default)]
pub struct Session {
    theme: OnceLock<Theme>,
    sheet: RwLock<StyleSheet>,
}

/// Sheet-side outcome of one file
struct Committed {
    allocations: Vec<Allocation>,
    has_tokens: bool,
    chunk: Option<usize>,
    prefix: String,
    updated_base_style: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the theme; a second call fails
    pub fn register_theme(&self, theme: Theme) -> ExtractResult<()> {
        self.theme
            .set(theme)
            .map_err(|_| ExtractError::ThemeAlreadyRegistered)?;
        info!("Theme registered");
        Ok(())
    }

    pub fn theme(&self) -> Option<&Theme> {
        self.theme.get()
    }

    fn read(&self) -> ExtractResult<RwLockReadGuard<'_, StyleSheet>> {
        self.sheet.read().map_err(|_| ExtractError::LockPoisoned)
    }

    fn write(&self) -> ExtractResult<RwLockWriteGuard<'_, StyleSheet>> {
        self.sheet.write().map_err(|_| ExtractError::LockPoisoned)
    }

    /// Extract the styles of one module and rewrite it
    #[instrument(skip(self, source, options), fields(len = source.len(), single = options.single_css))]
    pub fn code_extract(
        &self,
        path: &str,
        source: &str,
        options: &ExtractOptions,
    ) -> ExtractResult<ExtractOutput> {
        let theme = self.theme.get().ok_or(ExtractError::ThemeNotRegistered)?;
        let file_key = path.replace('\\', "/");
        let index = LineIndex::new(source);

        let scanned =
            scan(source, &options.package).map_err(|e| ExtractError::parse(path, &index, e))?;
        let plans = plan_sites(&scanned, source, theme)
            .map_err(|e| e.into_extract_error(path, &index))?;

        if plans.is_empty() {
            let removed = self.write()?.remove_file(&file_key);
            if removed {
                debug!(path = %file_key, "File no longer uses the styling package");
            }
            return Ok(ExtractOutput {
                code: source.to_string(),
                map: None,
                css_file: None,
                updated_base_style: removed && options.single_css,
            });
        }

        let committed = self.commit(&file_key, &plans, options.single_css)?;

        let css_file = if committed.has_tokens {
            let name = match committed.chunk {
                Some(chunk) => chunk_file_name(chunk),
                None => BASE_CSS_FILE.to_string(),
            };
            Some(css_path(&options.css_dir, &name))
        } else if plans.iter().any(SitePlan::is_base) {
            Some(css_path(&options.css_dir, BASE_CSS_FILE))
        } else {
            None
        };

        let mut rewriter = Rewriter::new(path, source, &committed.prefix);
        rewriter.sites(&plans, &committed.allocations);
        if let Some(css_file) = &css_file {
            rewriter.import_css(css_file);
        }
        let rewritten = rewriter.finish()?;

        debug!(
            path = %file_key,
            sites = plans.len(),
            chunk = ?committed.chunk,
            updated = committed.updated_base_style,
            "Extracted"
        );
        Ok(ExtractOutput {
            code: rewritten.code,
            map: rewritten.map,
            css_file,
            updated_base_style: committed.updated_base_style,
        })
    }

    /// Every sheet mutation for one file, under a single write lock
    fn commit(&self, path: &str, plans: &[SitePlan<'_>], single_css: bool) -> ExtractResult<Committed> {
        let mut sheet = self.write()?;
        let mut rules_changed = false;
        let mut base_changed = false;
        let mut tokens = FileTokens::default();

        let mut allocations = Vec::with_capacity(plans.len());
        for plan in plans {
            let allocation = match plan {
                SitePlan::Class { parts, .. } => Allocation::Classes(allocate(
                    &mut sheet,
                    parts,
                    &mut tokens,
                    &mut rules_changed,
                )),
                SitePlan::Element(element) => Allocation::Classes(allocate(
                    &mut sheet,
                    &element.parts,
                    &mut tokens,
                    &mut rules_changed,
                )),
                SitePlan::Keyframes { steps, .. } => {
                    let (token, changed) = sheet.insert_keyframes(steps.clone());
                    base_changed |= changed;
                    Allocation::Keyframes(token)
                }
                SitePlan::Global { content, .. } => {
                    for rule in &content.rules {
                        base_changed |= sheet.add_global(rule.clone());
                    }
                    for url in &content.imports {
                        base_changed |= sheet.add_import(url.clone());
                    }
                    for font_face in &content.font_faces {
                        base_changed |= sheet.add_font_face(font_face.clone());
                    }
                    Allocation::Base
                }
            };
            allocations.push(allocation);
        }

        let has_tokens = !tokens.order.is_empty();
        let known = sheet.file(path).is_some();
        let chunk = match single_css {
            false if has_tokens || known => Some(sheet.chunk_for(path)),
            _ => None,
        };
        let file_changed = if has_tokens || known {
            sheet.record_file_contribution(path, tokens.order, chunk)
        } else {
            false
        };

        let updated_base_style = if single_css {
            rules_changed || base_changed || file_changed
        } else {
            base_changed
        };

        Ok(Committed {
            allocations,
            has_tokens,
            chunk,
            prefix: sheet.prefix().to_string(),
            updated_base_style,
        })
    }

    /// Base stylesheet (`None`) or one file's chunk
    pub fn get_css(&self, chunk: Option<usize>, watch: bool) -> ExtractResult<String> {
        let sheet = self.read()?;
        Ok(render(&sheet, self.theme.get(), chunk, watch)?)
    }

    pub fn set_prefix(&self, prefix: impl Into<String>) -> ExtractResult<()> {
        self.write()?.set_prefix(prefix);
        Ok(())
    }

    pub fn export_sheet(&self) -> ExtractResult<String> {
        Ok(self.read()?.export_sheet()?)
    }

    pub fn import_sheet(&self, json: &str) -> ExtractResult<()> {
        Ok(self.write()?.import_sheet(json)?)
    }

    pub fn export_class_map(&self) -> ExtractResult<String> {
        Ok(self.read()?.export_class_map()?)
    }

    pub fn import_class_map(&self, json: &str) -> ExtractResult<()> {
        Ok(self.write()?.import_class_map(json)?)
    }

    pub fn export_file_map(&self) -> ExtractResult<String> {
        Ok(self.read()?.export_file_map()?)
    }

    pub fn import_file_map(&self, json: &str) -> ExtractResult<()> {
        Ok(self.write()?.import_file_map(json)?)
    }

    /// Chunk assigned to `path`, if any
    pub fn chunk_of(&self, path: &str) -> ExtractResult<Option<usize>> {
        let path = path.replace('\\', "/");
        Ok(self.read()?.file(&path).and_then(|entry| entry.chunk))
    }

    /// Chunks in use, ascending
    pub fn chunks(&self) -> ExtractResult<Vec<usize>> {
        let sheet = self.read()?;
        let mut chunks: Vec<usize> = sheet
            .file_map()
            .files
            .values()
            .filter_map(|entry| entry.chunk)
            .collect();
        chunks.sort_unstable();
        chunks.dedup();
        Ok(chunks)
    }
}

/// Tokens a file references, first-seen order
#[derive(Default)]
struct FileTokens {
    order: Vec<ClassToken>,
    seen: HashSet<ClassToken>,
}

impl FileTokens {
    fn push(&mut self, token: ClassToken) {
        if self.seen.insert(token) {
            self.order.push(token);
        }
    }
}

fn allocate(
    sheet: &mut StyleSheet,
    parts: &[StylePart],
    tokens: &mut FileTokens,
    changed: &mut bool,
) -> Vec<ClassPart> {
    parts
        .iter()
        .map(|part| match part {
            StylePart::Static(declaration) => {
                let (token, inserted) = sheet.insert(declaration.clone());
                *changed |= inserted;
                tokens.push(token);
                ClassPart::Token {
                    token,
                    style_order: declaration.style_order,
                    var: None,
                }
            }
            StylePart::Dynamic {
                declaration,
                value,
                unitless,
            } => {
                let (token, inserted) = sheet.insert(declaration.clone());
                *changed |= inserted;
                tokens.push(token);
                ClassPart::Token {
                    token,
                    style_order: declaration.style_order,
                    var: Some(DynamicVar {
                        value: *value,
                        unitless: *unitless,
                    }),
                }
            }
            StylePart::Conditional {
                condition,
                consequent,
                alternate,
            } => ClassPart::Conditional {
                condition: *condition,
                consequent: allocate(sheet, consequent, tokens, changed),
                alternate: allocate(sheet, alternate, tokens, changed),
            },
        })
        .collect()
}

fn css_path(css_dir: &str, file: &str) -> String {
    let dir = css_dir.replace('\\', "/");
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        file.to_string()
    } else {
        format!("{}/{}", dir, file)
    }
}
