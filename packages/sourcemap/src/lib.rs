//! Source map utilities for the devup-ui code rewriter
//!
//! The rewriter copies most of a module verbatim and splices in class names;
//! this crate turns those copy/replace steps into a v3 source map.

pub mod builder;
pub mod line_index;

pub use builder::{SourceMapBuilder, SourceMapError};
pub use line_index::LineIndex;
