//! Content predicates
//!
//! A predicate is resolved into one of three variants when the filter is
//! configured. Evaluation then dispatches on the variant instead of inspecting
//! the configured value for every file.

use anyhow::Result;
use regex::Regex;
use std::fmt;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by asynchronous predicate functions
pub type PredicateFuture = Pin<Box<dyn Future<Output = Result<bool>> + Send + 'static>>;

/// Callable form of a predicate function
pub type PredicateFn = Arc<dyn Fn(&Path) -> PredicateOutcome + Send + Sync>;

/// What a predicate function hands back: an answer now or an answer later
pub enum PredicateOutcome {
    /// The function decided synchronously
    Ready(Result<bool>),
    /// The function returned work that must be awaited
    Pending(PredicateFuture),
}

impl PredicateOutcome {
    /// Wait for the outcome to settle
    pub async fn settle(self) -> Result<bool> {
        match self {
            PredicateOutcome::Ready(result) => result,
            PredicateOutcome::Pending(future) => future.await,
        }
    }
}

impl From<bool> for PredicateOutcome {
    fn from(value: bool) -> Self {
        PredicateOutcome::Ready(Ok(value))
    }
}

impl From<Result<bool>> for PredicateOutcome {
    fn from(value: Result<bool>) -> Self {
        PredicateOutcome::Ready(value)
    }
}

/// The content test applied to every file in a build pass
#[derive(Clone)]
pub enum Predicate {
    /// Match iff the file content contains this substring
    Literal(String),
    /// Match iff the pattern finds a match anywhere in the file content
    Pattern(Regex),
    /// Match iff the function returns true for the file's absolute path
    Function(PredicateFn),
}

impl Predicate {
    /// Substring predicate
    pub fn literal(needle: impl Into<String>) -> Self {
        Predicate::Literal(needle.into())
    }

    /// Compile a regular expression predicate
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Predicate::Pattern(Regex::new(pattern)?))
    }

    /// Synchronous function predicate
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&Path) -> Result<bool> + Send + Sync + 'static,
    {
        Predicate::Function(Arc::new(move |path: &Path| PredicateOutcome::Ready(f(path))))
    }

    /// Asynchronous function predicate
    ///
    /// The closure receives an owned path so the returned future can be `'static`.
    pub fn async_function<F, Fut>(f: F) -> Self
    where
        F: Fn(std::path::PathBuf) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool>> + Send + 'static,
    {
        Predicate::Function(Arc::new(move |path: &Path| {
            PredicateOutcome::Pending(Box::pin(f(path.to_path_buf())))
        }))
    }

    /// Short name of the variant, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Predicate::Literal(_) => "literal",
            Predicate::Pattern(_) => "pattern",
            Predicate::Function(_) => "function",
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Literal(needle) => f.debug_tuple("Literal").field(needle).finish(),
            Predicate::Pattern(regex) => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
            Predicate::Function(_) => f.write_str("Function(..)"),
        }
    }
}

impl From<&str> for Predicate {
    fn from(needle: &str) -> Self {
        Predicate::literal(needle)
    }
}

impl From<String> for Predicate {
    fn from(needle: String) -> Self {
        Predicate::Literal(needle)
    }
}

impl From<Regex> for Predicate {
    fn from(regex: Regex) -> Self {
        Predicate::Pattern(regex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pattern_is_rejected() {
        assert!(Predicate::pattern("define(").is_err());
    }

    #[tokio::test]
    async fn test_sync_function_settles_immediately() {
        let predicate = Predicate::function(|path| Ok(path.ends_with("amd.js")));
        let Predicate::Function(f) = predicate else {
            panic!("expected function predicate");
        };
        assert!(matches!(f(Path::new("/x/amd.js")), PredicateOutcome::Ready(_)));
        assert!(f(Path::new("/x/amd.js")).settle().await.unwrap());
        assert!(!f(Path::new("/x/es6.js")).settle().await.unwrap());
    }

    #[tokio::test]
    async fn test_async_function_settles_after_await() {
        let predicate = Predicate::async_function(|path| async move {
            tokio::task::yield_now().await;
            Ok::<_, anyhow::Error>(path.extension().is_some_and(|ext| ext == "js"))
        });
        let Predicate::Function(f) = predicate else {
            panic!("expected function predicate");
        };
        let outcome = f(Path::new("/x/amd.js"));
        assert!(matches!(outcome, PredicateOutcome::Pending(_)));
        assert!(outcome.settle().await.unwrap());
    }

    #[tokio::test]
    async fn test_rejected_outcome_surfaces_error() {
        let outcome = PredicateOutcome::Pending(Box::pin(async {
            Err::<bool, _>(anyhow::anyhow!("rejected"))
        }));
        let err = outcome.settle().await.unwrap_err();
        assert_eq!(err.to_string(), "rejected");
    }

    #[test]
    fn test_debug_hides_function_body() {
        assert_eq!(
            format!("{:?}", Predicate::function(|_| Ok(false))),
            "Function(..)"
        );
        assert_eq!(format!("{:?}", Predicate::from("a")), "Literal(\"a\")");
    }
}
