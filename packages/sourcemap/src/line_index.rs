/// Precomputed line starts for offset to line/column conversion.
///
/// Columns count UTF-16 code units, which is what JS tooling expects in
/// source maps and error overlays.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            source,
            line_starts,
        }
    }

    /// 0-indexed line and column for a byte offset; offsets past the end clamp
    pub fn line_col(&self, offset: usize) -> (u32, u32) {
        let offset = offset.min(self.source.len());
        let line = self.line_starts.partition_point(|start| *start <= offset) - 1;
        let start = self.line_starts[line];
        let column: usize = self
            .source
            .get(start..offset)
            .map(|text| text.chars().map(char::len_utf16).sum())
            .unwrap_or(offset - start);
        (line as u32, column as u32)
    }

    /// 1-indexed line and column, as shown in diagnostics
    pub fn location(&self, offset: usize) -> (usize, usize) {
        let (line, column) = self.line_col(offset);
        (line as usize + 1, column as usize + 1)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col() {
        let index = LineIndex::new("line 1\nline 2\nline 3");

        assert_eq!(index.line_col(0), (0, 0));
        assert_eq!(index.line_col(7), (1, 0));
        assert_eq!(index.line_col(10), (1, 3));
        assert_eq!(index.line_col(14), (2, 0));
        assert_eq!(index.line_count(), 3);
    }

    #[test]
    fn test_unicode_columns_are_utf16() {
        let index = LineIndex::new("const a = \"日本\"; b\nc");
        // "日本" is 6 bytes but 2 UTF-16 units
        assert_eq!(index.line_col(19), (0, 15));
        assert_eq!(index.line_col(22), (1, 0));
    }

    #[test]
    fn test_empty_source() {
        let index = LineIndex::new("");
        assert_eq!(index.line_col(0), (0, 0));
        assert_eq!(index.location(0), (1, 1));
    }

    #[test]
    fn test_out_of_bounds_clamps() {
        let index = LineIndex::new("short");
        assert_eq!(index.line_col(1000), (0, 5));
    }
}
