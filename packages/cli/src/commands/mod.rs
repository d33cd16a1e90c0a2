pub mod extract;
pub mod init;
pub mod lint;

pub use extract::{extract, ExtractArgs};
pub use init::{init, InitArgs};
pub use lint::{lint, LintArgs};
