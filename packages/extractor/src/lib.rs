//! devup-ui style extraction
//!
//! A [`Session`] turns modules that use `css`, `globalCss`, `keyframes` and the
//! themed components into plain JSX with class names, and accumulates the
//! atomic stylesheet they reference.
//!
//! ```no_run
//! use devup_ui_extractor::{ExtractOptions, Session};
//! use devup_ui_sheet::Theme;
//!
//! let session = Session::new();
//! session.register_theme(Theme::default())?;
//! let out = session.code_extract(
//!     "src/App.tsx",
//!     r#"import { Box } from "@devup-ui/react"; <Box bg="red" />"#,
//!     &ExtractOptions::default(),
//! )?;
//! let css = session.get_css(None, false)?;
//! # Ok::<(), devup_ui_extractor::ExtractError>(())
//! ```

pub mod error;
pub mod normalizer;
pub mod properties;
pub mod rewriter;
pub mod session;
pub mod site;

pub use error::{ExtractError, ExtractResult, SiteError};
pub use normalizer::{Context, Normalizer, StylePart};
pub use rewriter::{Allocation, ClassExpr, ClassPart, Rewriter};
pub use session::{
    chunk_file_name, ExtractOptions, ExtractOutput, Session, BASE_CSS_FILE, DEFAULT_CSS_DIR,
    DEFAULT_PACKAGE,
};
pub use site::{plan_sites, SitePlan};
