//! Error types for i18n operations

use std::path::Path;
use thiserror::Error;

/// Placeholder path used for catalogs decoded from memory.
pub(crate) const MEMORY_SOURCE: &str = "<memory>";

/// Errors that can occur while building the i18n subsystem.
///
/// Lookups never fail: only catalog loading, configuration and
/// translation string construction report errors.
#[derive(Debug, Error)]
pub enum I18nError {
    /// A compiled catalog file was unreadable or malformed.
    #[error("Failed to load catalog {path}: {reason}")]
    CatalogLoad { path: String, reason: String },

    /// Translation string constructed with an empty message id
    #[error("Message id must not be empty")]
    InvalidMessageId,

    /// Plural-Forms expression could not be parsed
    #[error("Invalid plural expression: {0}")]
    InvalidPluralExpression(String),

    /// Configuration document could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl I18nError {
    /// Build a catalog load error for a file on disk.
    pub fn catalog_load(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        I18nError::CatalogLoad {
            path: path.as_ref().display().to_string(),
            reason: reason.into(),
        }
    }

    /// Re-label a decode error with the path it was read from.
    pub(crate) fn at_path(self, path: impl AsRef<Path>) -> Self {
        match self {
            I18nError::CatalogLoad { reason, .. } => I18nError::catalog_load(path, reason),
            I18nError::InvalidPluralExpression(expr) => {
                I18nError::catalog_load(path, format!("invalid plural expression: {}", expr))
            }
            I18nError::IoError(e) => I18nError::catalog_load(path, e.to_string()),
            other => other,
        }
    }

    /// Whether this error was raised while loading a catalog.
    pub fn is_catalog_error(&self) -> bool {
        matches!(self, I18nError::CatalogLoad { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_path_relabels() {
        let err = I18nError::catalog_load(MEMORY_SOURCE, "bad magic").at_path("/tmp/de.mo");
        match err {
            I18nError::CatalogLoad { path, reason } => {
                assert_eq!(path, "/tmp/de.mo");
                assert_eq!(reason, "bad magic");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_plural_error_becomes_catalog_error() {
        let err = I18nError::InvalidPluralExpression("n ==".into()).at_path("x.mo");
        assert!(err.is_catalog_error());
        assert!(err.to_string().contains("n =="));
    }
}
