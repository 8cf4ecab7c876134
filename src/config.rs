use std::path::PathBuf;

use crate::errors::{Result, TemplateError};
use crate::naming::DEFAULT_PREFIX;

/// What to render, where to, and which environment namespace to read.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub source: PathBuf,
    /// `None` writes to stdout.
    pub target: Option<PathBuf>,
    pub prefix: String,
    /// Print the field bindings instead of rendering.
    pub explain: bool,
}

impl RenderConfig {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: None,
            prefix: DEFAULT_PREFIX.to_string(),
            explain: false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.source.is_file() {
            return Err(TemplateError::SourceNotFound(self.source.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_missing_source() {
        let config = RenderConfig::new("/no/such/template.tpl");
        assert_eq!(config.prefix, "APPCONF");
        assert!(config.target.is_none());
        assert!(matches!(config.validate(), Err(TemplateError::SourceNotFound(_))));
    }
}
