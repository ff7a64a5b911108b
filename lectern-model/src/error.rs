use std::fmt::{self, Display};

/// Errors produced by model constructors and validation routines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A draft or patch failed field validation.
    Validation(String),
    /// An identifier or enum value could not be parsed.
    Parse(String),
    /// Pagination parameters were out of range.
    InvalidPage(String),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Validation(msg) => write!(f, "validation failed: {msg}"),
            ModelError::Parse(msg) => write!(f, "parse error: {msg}"),
            ModelError::InvalidPage(msg) => write!(f, "invalid page: {msg}"),
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;

/// Reject blank strings, naming the offending field.
pub(crate) fn require_non_blank(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ModelError::Validation(format!(
            "{field} must not be empty"
        )));
    }
    Ok(())
}
