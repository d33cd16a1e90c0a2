use sourcemap::{SourceMap as ExternalSourceMap, SourceMapBuilder as ExternalBuilder};
use thiserror::Error;

use crate::line_index::LineIndex;

#[derive(Debug, Error)]
pub enum SourceMapError {
    #[error("Failed to serialize source map: {0}")]
    Serialize(#[from] sourcemap::Error),

    #[error("Source map is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Builder for the map from a rewritten module back to its original source
pub struct SourceMapBuilder {
    builder: ExternalBuilder,
    current_line: u32,
    current_col: u32,
}

impl SourceMapBuilder {
    /// Create a builder for one source file
    ///
    /// # Arguments
    /// * `source_file` - Path of the original module
    /// * `source_content` - The original module text, embedded as `sourcesContent`
    pub fn new(source_file: &str, source_content: &str) -> Self {
        let mut builder = ExternalBuilder::new(None);

        let source_id = builder.add_source(source_file);
        builder.set_source_contents(source_id, Some(source_content));

        Self {
            builder,
            current_line: 0,
            current_col: 0,
        }
    }

    /// Add a mapping from generated position to source position (all 0-indexed)
    pub fn add_mapping(
        &mut self,
        gen_line: u32,
        gen_col: u32,
        src_line: u32,
        src_col: u32,
        name: Option<&str>,
    ) {
        let name_id = name.map(|n| self.builder.add_name(n));

        self.builder.add_raw(
            gen_line,
            gen_col,
            src_line,
            src_col,
            Some(0), // single source per map
            name_id,
            false,
        );
    }

    /// Emit `text` copied verbatim from `source_offset`.
    ///
    /// Maps the segment start and every line start inside it, then advances.
    pub fn copy_segment(&mut self, text: &str, source_offset: usize, index: &LineIndex<'_>) {
        if text.is_empty() {
            return;
        }
        let (src_line, src_col) = index.line_col(source_offset);
        self.add_mapping(self.current_line, self.current_col, src_line, src_col, None);

        for (i, _) in text.match_indices('\n') {
            let next = i + 1;
            if next < text.len() {
                let (src_line, src_col) = index.line_col(source_offset + next);
                self.add_mapping(self.current_line + 1, 0, src_line, src_col, None);
            }
            // advance line by line so later mappings see the right row
            self.current_line += 1;
            self.current_col = 0;
        }
        let tail = text.rfind('\n').map(|i| &text[i + 1..]).unwrap_or(text);
        self.current_col += utf16_len(tail);
    }

    /// Emit generated `text` that replaces the source at `source_offset`
    pub fn replace_segment(
        &mut self,
        text: &str,
        source_offset: usize,
        index: &LineIndex<'_>,
        name: Option<&str>,
    ) {
        if text.is_empty() {
            return;
        }
        let (src_line, src_col) = index.line_col(source_offset);
        self.add_mapping(self.current_line, self.current_col, src_line, src_col, name);
        self.advance(text);
    }

    /// Track position advancement for text appended to the output
    pub fn advance(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.current_line += 1;
                self.current_col = 0;
            } else {
                self.current_col += ch.len_utf16() as u32;
            }
        }
    }

    /// Current position in the generated output
    pub fn current_position(&self) -> (u32, u32) {
        (self.current_line, self.current_col)
    }

    pub fn build(self) -> ExternalSourceMap {
        self.builder.into_sourcemap()
    }

    /// Serialize as a v3 source map
    pub fn to_json(self) -> Result<String, SourceMapError> {
        let map = self.build();
        let mut buf = Vec::new();
        map.to_writer(&mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}

fn utf16_len(text: &str) -> u32 {
    text.chars().map(|c| c.len_utf16() as u32).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_creation() {
        let builder = SourceMapBuilder::new("button.tsx", "<Box />");
        assert_eq!(builder.current_position(), (0, 0));
    }

    #[test]
    fn test_advance_tracking() {
        let mut builder = SourceMapBuilder::new("button.tsx", "");

        builder.advance("const Button = () => {");
        assert_eq!(builder.current_position(), (0, 22));

        builder.advance("\n");
        assert_eq!(builder.current_position(), (1, 0));
    }

    #[test]
    fn test_copy_segment_maps_each_line() {
        let source = "import a;\nconst b = 1;\nexport c;";
        let index = LineIndex::new(source);
        let mut builder = SourceMapBuilder::new("a.ts", source);

        builder.advance("import \"x.css\";\n");
        builder.copy_segment(source, 0, &index);
        assert_eq!(builder.current_position(), (3, 9));

        let map = builder.build();
        let token = map.lookup_token(2, 0).unwrap();
        assert_eq!(token.get_src_line(), 1);
        assert_eq!(token.get_src_col(), 0);
    }

    #[test]
    fn test_replace_segment_maps_to_span_start() {
        let source = "const a = css({ color: \"red\" });";
        let index = LineIndex::new(source);
        let mut builder = SourceMapBuilder::new("a.ts", source);

        builder.copy_segment(&source[..10], 0, &index);
        builder.replace_segment("\"a\"", 10, &index, Some("css"));
        builder.copy_segment(&source[31..], 31, &index);

        let map = builder.build();
        let token = map.lookup_token(0, 11).unwrap();
        assert_eq!(token.get_src_col(), 10);
        assert_eq!(token.get_name(), Some("css"));
    }

    #[test]
    fn test_json_output() {
        let mut builder = SourceMapBuilder::new("button.tsx", "<Box />");
        builder.add_mapping(0, 0, 0, 0, None);

        let json = builder.to_json().unwrap();

        assert!(json.contains("\"version\":3"));
        assert!(json.contains("\"sources\""));
        assert!(json.contains("button.tsx"));
    }
}
