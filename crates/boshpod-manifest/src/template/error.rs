//! Template error types

use std::fmt;
use std::path::PathBuf;

/// Errors that can occur during template operations
#[derive(Debug)]
pub enum TemplateError {
    /// Template rendering failed
    Render(minijinja::Error),
    /// Template file could not be read
    Read {
        /// Path of the template file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

impl TemplateError {
    /// Create a read error for a template file
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Render(e) => write!(f, "template render error: {}", e),
            Self::Read { path, source } => {
                write!(f, "failed to read template {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for TemplateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Render(e) => Some(e),
            Self::Read { source, .. } => Some(source),
        }
    }
}

impl From<minijinja::Error> for TemplateError {
    fn from(err: minijinja::Error) -> Self {
        Self::Render(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_error_names_the_file() {
        let err = TemplateError::read(
            "/base/jobs-src/r/j/templates/bpm.yml.erb",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(err.to_string().contains("bpm.yml.erb"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn render_error_keeps_source() {
        let err = TemplateError::from(minijinja::Error::new(
            minijinja::ErrorKind::UndefinedError,
            "undefined value",
        ));
        assert!(err.to_string().contains("template render error"));
    }
}
