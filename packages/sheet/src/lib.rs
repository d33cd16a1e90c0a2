//! Atomic style sheet for devup-ui
//!
//! Owns class-token allocation, the theme model, CSS emission and the JSON
//! snapshots loaders use to persist state between builds.

pub mod declaration;
pub mod emitter;
pub mod error;
pub mod sheet;
pub mod snapshot;
pub mod theme;
pub mod token;

pub use declaration::{StyleDeclaration, StyleValue};
pub use emitter::render;
pub use error::{SheetError, SheetResult};
pub use sheet::StyleSheet;
pub use snapshot::{ClassMap, FileEntry, FileMap, GlobalRule, KeyframeStep, Properties, SheetContent};
pub use theme::Theme;
pub use token::ClassToken;
