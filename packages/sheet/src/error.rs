use thiserror::Error;

pub type SheetResult<T> = Result<T, SheetError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SheetError {
    /// A snapshot failed validation; nothing was imported
    #[error("Invalid {kind} snapshot: {message}")]
    Snapshot { kind: &'static str, message: String },

    /// A file references a token the sheet never allocated
    #[error("Class token '{0}' is referenced but missing from the sheet")]
    MissingToken(String),

    #[error("Invalid theme: {0}")]
    Theme(String),
}

impl SheetError {
    pub fn snapshot(kind: &'static str, message: impl Into<String>) -> Self {
        Self::Snapshot {
            kind,
            message: message.into(),
        }
    }
}
