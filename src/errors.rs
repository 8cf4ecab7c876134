use std::path::PathBuf;

use thiserror::Error;

// Everything that can stop a render. Missing environment bindings are not in
// here: they become sentinel values instead.
#[derive(Debug, Error)]
pub enum TemplateError {
    // The `-s` template path does not exist
    #[error("source template file does not exist: {}", .0.display())]
    SourceNotFound(PathBuf),

    // Malformed delimiters, unknown functions, unbalanced control flow
    #[error("parse error: {0}")]
    Parse(String),

    // A value of the wrong shape reached a pipeline step at execution time
    #[error("render error: {0}")]
    Render(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TemplateError {
    pub(crate) fn render(msg: impl Into<String>) -> Self {
        TemplateError::Render(msg.into())
    }

    /// Process exit status for this error: 1 missing source, 2 parse, 3 the rest.
    pub fn exit_code(&self) -> u8 {
        match self {
            TemplateError::SourceNotFound(_) => 1,
            TemplateError::Parse(_) => 2,
            _ => 3,
        }
    }
}

// Type alias for results that use `TemplateError` as the error type
pub type Result<T> = std::result::Result<T, TemplateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_per_variant() {
        assert_eq!(TemplateError::SourceNotFound(PathBuf::from("x")).exit_code(), 1);
        assert_eq!(TemplateError::Parse("bad".into()).exit_code(), 2);
        assert_eq!(TemplateError::render("boom").exit_code(), 3);
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(TemplateError::from(io).exit_code(), 3);
    }
}
