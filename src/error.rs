//! Error types for content filtering

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by construction or by a build pass.
#[derive(Debug, Error)]
pub enum FunnelError {
    /// Invalid filter configuration (rejected before any build runs).
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Filesystem failure while walking, classifying or writing the output tree.
    #[error("IO error at {}: {source}", path.display())]
    Io {
        /// Path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Walker failure that carries no usable path.
    #[error("Walk error: {0}")]
    Walk(String),

    /// A predicate function failed, or its pending result was rejected.
    #[error("Predicate failed for {}: {source}", path.display())]
    Predicate {
        /// Entry the predicate was evaluating.
        path: PathBuf,
        /// Error returned by the predicate.
        #[source]
        source: anyhow::Error,
    },

    /// A classification task panicked or was cancelled.
    #[error("Classification task failed: {0}")]
    Join(String),
}

impl FunnelError {
    /// Create an Io error from std::io::Error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a Config error from any displayable message.
    pub fn config(message: impl std::fmt::Display) -> Self {
        Self::Config(message.to_string())
    }
}

impl From<ignore::Error> for FunnelError {
    fn from(err: ignore::Error) -> Self {
        match err.io_error() {
            // Keep the path when the walker attached one
            Some(io) => match walk_error_path(&err) {
                Some(path) => Self::io(path, std::io::Error::new(io.kind(), io.to_string())),
                None => Self::Walk(err.to_string()),
            },
            None => Self::Walk(err.to_string()),
        }
    }
}

fn walk_error_path(err: &ignore::Error) -> Option<PathBuf> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.clone()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            walk_error_path(err)
        }
        ignore::Error::Loop { child, .. } => Some(child.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_message_includes_path() {
        let err = FunnelError::io(
            "lib/amd.js",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let message = err.to_string();
        assert!(message.contains("lib/amd.js"));
        assert!(message.contains("denied"));
    }

    #[test]
    fn test_predicate_error_keeps_source() {
        let err = FunnelError::Predicate {
            path: PathBuf::from("/tmp/es6.js"),
            source: anyhow::anyhow!("boom"),
        };
        assert!(err.to_string().contains("boom"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_walk_error_with_path_becomes_io() {
        let inner = ignore::Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "gone",
        ));
        let err: FunnelError = ignore::Error::WithPath {
            path: PathBuf::from("/tmp/vanished"),
            err: Box::new(inner),
        }
        .into();
        assert!(matches!(err, FunnelError::Io { ref path, .. } if path.ends_with("vanished")));
    }
}
