//! Session-wide atomic style sheet

use tracing::{debug, trace};

use crate::declaration::StyleDeclaration;
use crate::snapshot::{ClassMap, FileEntry, FileMap, GlobalRule, KeyframeStep, Properties, SheetContent};
use crate::token::ClassToken;

/// Class map, rules and file map for one session.
///
/// Tokens are allocated monotonically in first-seen order and never reused;
/// nothing is ever evicted.
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    class_map: ClassMap,
    content: SheetContent,
    files: FileMap,
    prefix: String,
}

impl StyleSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn set_prefix(&mut self, prefix: impl Into<String>) {
        self.prefix = prefix.into();
    }

    /// Rendered class (or keyframes) name including the prefix
    pub fn class_name(&self, token: ClassToken) -> String {
        token.with_prefix(&self.prefix)
    }

    fn allocate(&mut self, key: String) -> ClassToken {
        if let Some(token) = self.class_map.entries.get(&key) {
            return *token;
        }
        let token = ClassToken::from_index(self.class_map.next);
        self.class_map.next += 1;
        trace!(%token, %key, "Allocated class token");
        self.class_map.entries.insert(key, token);
        token
    }

    /// Insert-if-absent. Returns the token and whether the sheet changed.
    pub fn insert(&mut self, declaration: StyleDeclaration) -> (ClassToken, bool) {
        let token = self.allocate(declaration.canonical_key());
        if self.content.rules.contains_key(&token) {
            return (token, false);
        }
        self.content.rules.insert(token, declaration);
        (token, true)
    }

    /// Deduplicated keyframes; the name comes from the class allocator
    pub fn insert_keyframes(&mut self, steps: Vec<KeyframeStep>) -> (ClassToken, bool) {
        let token = self.allocate(format!("@keyframes {}", render_keyframe_steps(&steps)));
        if self.content.keyframes.contains_key(&token) {
            return (token, false);
        }
        self.content.keyframes.insert(token, steps);
        (token, true)
    }

    pub fn add_global(&mut self, rule: GlobalRule) -> bool {
        if self.content.globals.contains(&rule) {
            return false;
        }
        self.content.globals.push(rule);
        true
    }

    pub fn add_import(&mut self, url: impl Into<String>) -> bool {
        let url = url.into();
        if self.content.imports.contains(&url) {
            return false;
        }
        self.content.imports.push(url);
        true
    }

    pub fn add_font_face(&mut self, properties: Properties) -> bool {
        if self.content.font_faces.contains(&properties) {
            return false;
        }
        self.content.font_faces.push(properties);
        true
    }

    /// Chunk number of `path`, allocating the next one on first sight
    pub fn chunk_for(&mut self, path: &str) -> usize {
        if let Some(chunk) = self.files.files.get(path).and_then(|entry| entry.chunk) {
            return chunk;
        }
        let chunk = self.files.next_chunk;
        self.files.next_chunk += 1;
        chunk
    }

    /// Replace the file's contribution wholesale. Returns whether it changed.
    pub fn record_file_contribution(
        &mut self,
        path: &str,
        tokens: Vec<ClassToken>,
        chunk: Option<usize>,
    ) -> bool {
        let entry = FileEntry { chunk, tokens };
        if self.files.files.get(path) == Some(&entry) {
            return false;
        }
        debug!(path, tokens = entry.tokens.len(), ?chunk, "Recorded file contribution");
        self.files.files.insert(path.to_string(), entry);
        true
    }

    /// Forget a file that no longer uses the styling package
    pub fn remove_file(&mut self, path: &str) -> bool {
        self.files.files.remove(path).is_some()
    }

    pub fn declaration(&self, token: ClassToken) -> Option<&StyleDeclaration> {
        self.content.rules.get(&token)
    }

    pub fn file(&self, path: &str) -> Option<&FileEntry> {
        self.files.files.get(path)
    }

    pub fn len(&self) -> usize {
        self.content.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.rules.is_empty()
    }

    pub fn content(&self) -> &SheetContent {
        &self.content
    }

    pub fn class_map(&self) -> &ClassMap {
        &self.class_map
    }

    pub fn file_map(&self) -> &FileMap {
        &self.files
    }

    pub(crate) fn replace_content(&mut self, content: SheetContent) {
        self.content = content;
    }

    pub(crate) fn replace_class_map(&mut self, class_map: ClassMap) {
        self.class_map = class_map;
    }

    pub(crate) fn replace_file_map(&mut self, files: FileMap) {
        self.files = files;
    }
}

/// `from{opacity:0}to{opacity:1}`
pub fn render_keyframe_steps(steps: &[KeyframeStep]) -> String {
    steps
        .iter()
        .map(|step| format!("{}{{{}}}", step.selector, render_properties(&step.properties)))
        .collect()
}

/// `a:b;c:d`
pub fn render_properties(properties: &[(String, String)]) -> String {
    properties
        .iter()
        .map(|(property, value)| format!("{}:{}", property, value))
        .collect::<Vec<_>>()
        .join(";")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::StyleValue;

    fn decl(property: &str, value: &str) -> StyleDeclaration {
        StyleDeclaration::new(property, StyleValue::Static(value.to_string()))
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut sheet = StyleSheet::new();
        let (first, changed) = sheet.insert(decl("color", "red"));
        assert!(changed);
        let (again, changed) = sheet.insert(decl("color", "red"));
        assert!(!changed);
        assert_eq!(first, again);
        assert_eq!(sheet.len(), 1);
    }

    #[test]
    fn test_distinct_declarations_get_consecutive_tokens() {
        let mut sheet = StyleSheet::new();
        let tokens: Vec<String> = ["red", "blue", "green"]
            .iter()
            .map(|v| sheet.insert(decl("color", v)).0.to_string())
            .collect();
        assert_eq!(tokens, vec!["a", "b", "c"]);
        assert_eq!(sheet.class_map().next, 3);
    }

    #[test]
    fn test_keyframes_share_the_allocator() {
        let mut sheet = StyleSheet::new();
        sheet.insert(decl("color", "red"));
        let steps = vec![KeyframeStep {
            selector: "to".into(),
            properties: vec![("opacity".into(), "1".into())],
        }];
        let (name, changed) = sheet.insert_keyframes(steps.clone());
        assert!(changed);
        assert_eq!(name.to_string(), "b");
        assert_eq!(sheet.insert_keyframes(steps), (name, false));
    }

    #[test]
    fn test_base_content_dedup() {
        let mut sheet = StyleSheet::new();
        assert!(sheet.add_import("a.css"));
        assert!(!sheet.add_import("a.css"));
        let rule = GlobalRule {
            selector: "body".into(),
            level: 0,
            properties: vec![("margin".into(), "0".into())],
        };
        assert!(sheet.add_global(rule.clone()));
        assert!(!sheet.add_global(rule));
    }

    #[test]
    fn test_file_contribution_replaced_wholesale() {
        let mut sheet = StyleSheet::new();
        let (a, _) = sheet.insert(decl("color", "red"));
        let (b, _) = sheet.insert(decl("color", "blue"));
        assert!(sheet.record_file_contribution("x.tsx", vec![a, b], None));
        assert!(!sheet.record_file_contribution("x.tsx", vec![a, b], None));
        assert!(sheet.record_file_contribution("x.tsx", vec![b], None));
        assert_eq!(sheet.file("x.tsx").unwrap().tokens, vec![b]);
        // nothing is evicted
        assert_eq!(sheet.len(), 2);
        assert!(sheet.remove_file("x.tsx"));
        assert!(!sheet.remove_file("x.tsx"));
        assert_eq!(sheet.len(), 2);
    }

    #[test]
    fn test_chunks_are_stable_per_file() {
        let mut sheet = StyleSheet::new();
        let first = sheet.chunk_for("a.tsx");
        sheet.record_file_contribution("a.tsx", vec![], Some(first));
        let second = sheet.chunk_for("b.tsx");
        assert_eq!((first, second), (0, 1));
        assert_eq!(sheet.chunk_for("a.tsx"), 0);
    }

    #[test]
    fn test_stale_class_map_entry_is_refilled() {
        let mut sheet = StyleSheet::new();
        sheet
            .import_class_map(r#"{"entries": {"color|s:red|0|0|": "a"}, "next": 1}"#)
            .unwrap();
        let (token, changed) = sheet.insert(decl("color", "red"));
        assert_eq!(token.to_string(), "a");
        assert!(changed);
        assert!(sheet.declaration(token).is_some());
    }
}
