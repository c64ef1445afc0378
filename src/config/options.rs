//! Programmatic filter options

use crate::error::FunnelError;
use crate::filter::{FilterMode, Predicate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Zero-argument notification fired once per pass that found a match
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// How symlinked entries are treated before classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymlinkPolicy {
    /// Canonicalize to the real target and use the target's metadata.
    /// A link to a directory is skipped, a link to a file is read as that file.
    #[default]
    Resolve,
    /// Use the link's own metadata. A link is never treated as a directory
    /// and its content is read through the link.
    Preserve,
}

/// Options accepted when constructing a content filter.
///
/// Exactly one of `include` or `exclude` must be set.
#[derive(Clone, Default)]
pub struct FilterOptions {
    /// Keep files whose content matches
    pub include: Option<Predicate>,
    /// Drop files whose content matches
    pub exclude: Option<Predicate>,
    /// Diagnostic label attached to log output
    pub annotation: Option<String>,
    /// Fired once per pass with at least one match
    pub callback: Option<Callback>,
    pub symlinks: SymlinkPolicy,
}

impl FilterOptions {
    /// Options keeping files that match `predicate`
    pub fn include(predicate: impl Into<Predicate>) -> Self {
        Self {
            include: Some(predicate.into()),
            ..Self::default()
        }
    }

    /// Options dropping files that match `predicate`
    pub fn exclude(predicate: impl Into<Predicate>) -> Self {
        Self {
            exclude: Some(predicate.into()),
            ..Self::default()
        }
    }

    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }

    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }

    pub fn with_symlinks(mut self, policy: SymlinkPolicy) -> Self {
        self.symlinks = policy;
        self
    }

    /// Resolve which predicate is active and how its matches are used
    pub fn resolve_mode(&self) -> Result<(FilterMode, &Predicate), FunnelError> {
        match (&self.include, &self.exclude) {
            (Some(predicate), None) => Ok((FilterMode::Include, predicate)),
            (None, Some(predicate)) => Ok((FilterMode::Exclude, predicate)),
            (Some(_), Some(_)) => Err(FunnelError::config(
                "`include` and `exclude` are mutually exclusive",
            )),
            (None, None) => Err(FunnelError::config(
                "one of `include` or `exclude` must be set",
            )),
        }
    }
}

impl fmt::Debug for FilterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterOptions")
            .field("include", &self.include)
            .field("exclude", &self.exclude)
            .field("annotation", &self.annotation)
            .field("callback", &self.callback.as_ref().map(|_| ".."))
            .field("symlinks", &self.symlinks)
            .finish()
    }
}
