//! JSON snapshots of the three session maps
//!
//! Every import is parsed and validated in full before the live state is
//! touched, so a rejected snapshot leaves the sheet as it was.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::declaration::StyleDeclaration;
use crate::error::{SheetError, SheetResult};
use crate::sheet::StyleSheet;
use crate::token::ClassToken;

/// Ordered `(property, value)` pairs
pub type Properties = Vec<(String, String)>;

/// Canonical key -> token, plus the allocation counter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassMap {
    #[serde(default)]
    pub entries: BTreeMap<String, ClassToken>,
    #[serde(default)]
    pub next: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyframeStep {
    /// `from`, `to` or a percentage
    pub selector: String,
    pub properties: Properties,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalRule {
    pub selector: String,
    #[serde(default)]
    pub level: u8,
    pub properties: Properties,
}

/// Everything the sheet renders
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetContent {
    #[serde(default)]
    pub rules: BTreeMap<ClassToken, StyleDeclaration>,
    #[serde(default)]
    pub keyframes: BTreeMap<ClassToken, Vec<KeyframeStep>>,
    #[serde(default)]
    pub globals: Vec<GlobalRule>,
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub font_faces: Vec<Properties>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    /// `None` in single-CSS mode
    #[serde(default)]
    pub chunk: Option<usize>,
    #[serde(default)]
    pub tokens: Vec<ClassToken>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMap {
    #[serde(default)]
    pub files: BTreeMap<String, FileEntry>,
    #[serde(default)]
    pub next_chunk: usize,
}

impl ClassMap {
    fn validate(&self) -> SheetResult<()> {
        let mut seen = HashSet::new();
        for (key, token) in &self.entries {
            if !seen.insert(*token) {
                return Err(SheetError::snapshot(
                    "class map",
                    format!("token '{}' is assigned twice (at '{}')", token, key),
                ));
            }
            if token.index() >= self.next {
                return Err(SheetError::snapshot(
                    "class map",
                    format!("token '{}' is not below the next index {}", token, self.next),
                ));
            }
        }
        Ok(())
    }
}

impl SheetContent {
    fn validate(&self) -> SheetResult<()> {
        if let Some(token) = self.keyframes.keys().find(|t| self.rules.contains_key(t)) {
            return Err(SheetError::snapshot(
                "sheet",
                format!("token '{}' is both a rule and keyframes", token),
            ));
        }
        if let Some((token, _)) = self.rules.iter().find(|(_, d)| d.property.is_empty()) {
            return Err(SheetError::snapshot(
                "sheet",
                format!("rule '{}' has an empty property", token),
            ));
        }
        Ok(())
    }
}

impl FileMap {
    fn validate(&self) -> SheetResult<()> {
        for (path, entry) in &self.files {
            if let Some(chunk) = entry.chunk.filter(|c| *c >= self.next_chunk) {
                return Err(SheetError::snapshot(
                    "file map",
                    format!(
                        "'{}' uses chunk {} but the next chunk is {}",
                        path, chunk, self.next_chunk
                    ),
                ));
            }
        }
        Ok(())
    }
}

fn parse<T: for<'de> Deserialize<'de>>(kind: &'static str, json: &str) -> SheetResult<T> {
    serde_json::from_str(json).map_err(|e| SheetError::snapshot(kind, e.to_string()))
}

fn to_json<T: Serialize>(kind: &'static str, value: &T) -> SheetResult<String> {
    serde_json::to_string(value).map_err(|e| SheetError::snapshot(kind, e.to_string()))
}

impl StyleSheet {
    pub fn export_sheet(&self) -> SheetResult<String> {
        to_json("sheet", self.content())
    }

    #[instrument(skip_all, fields(len = json.len()))]
    pub fn import_sheet(&mut self, json: &str) -> SheetResult<()> {
        let content: SheetContent = parse("sheet", json)?;
        content.validate()?;
        debug!(rules = content.rules.len(), "Imported sheet");
        self.replace_content(content);
        Ok(())
    }

    pub fn export_class_map(&self) -> SheetResult<String> {
        to_json("class map", self.class_map())
    }

    #[instrument(skip_all, fields(len = json.len()))]
    pub fn import_class_map(&mut self, json: &str) -> SheetResult<()> {
        let class_map: ClassMap = parse("class map", json)?;
        class_map.validate()?;
        debug!(entries = class_map.entries.len(), "Imported class map");
        self.replace_class_map(class_map);
        Ok(())
    }

    pub fn export_file_map(&self) -> SheetResult<String> {
        to_json("file map", self.file_map())
    }

    #[instrument(skip_all, fields(len = json.len()))]
    pub fn import_file_map(&mut self, json: &str) -> SheetResult<()> {
        let file_map: FileMap = parse("file map", json)?;
        file_map.validate()?;
        debug!(files = file_map.files.len(), "Imported file map");
        self.replace_file_map(file_map);
        Ok(())
    }
}
