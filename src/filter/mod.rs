//! Content filter core
//!
//! Classifies every file of an input tree against a single [`Predicate`] and
//! hands the resulting match list to a tree differ as an include-list or an
//! exclude-list.
//!
//! ## Build pass
//!
//! 1. The walker streams entries from a blocking thread
//! 2. Every non-directory entry is resolved and classified in its own task
//! 3. The join restores encounter order and yields a [`MatchList`]
//! 4. The callback fires if the list is non-empty
//! 5. The list goes to the differ wrapped in a [`Selection`](crate::tree::Selection)

mod core;
mod entry;
mod predicate;
mod types;

pub use self::core::ContentFilter;
pub use entry::{display_path, relative_path, resolve, ResolvedEntry};
pub use predicate::{Predicate, PredicateFn, PredicateFuture, PredicateOutcome};
pub use types::{BuildState, FilterMode, MatchList};
