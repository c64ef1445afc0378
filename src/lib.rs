//! # content-funnel - Content-based file tree filtering
//!
//! A build-pipeline stage that takes an input directory tree and keeps an
//! output tree holding only the files whose *contents* match (or do not
//! match) a predicate.
//!
//! - **Three predicate kinds**: substring, regular expression, or a function
//!   (synchronous or asynchronous) receiving the file's absolute path
//! - **Concurrent classification**: every file is classified in its own tokio
//!   task; a pass completes when all of them have settled
//! - **Incremental output**: the bundled [`Funnel`] diffs against the previous
//!   pass and only touches what changed
//! - **One-shot notification**: an optional callback fires once per pass that
//!   found at least one match
//!
//! ## Library Usage
//!
//! ```rust,no_run
//! use content_funnel::{ContentFilter, FilterOptions, FunnelError, Predicate};
//!
//! # async fn run() -> content_funnel::Result<()> {
//! let mut filter = ContentFilter::new(
//!     "src/",
//!     "dist/amd/",
//!     FilterOptions::include("define(").with_annotation("amd modules"),
//! )?;
//!
//! let patch = filter.build().await?;
//! for change in &patch {
//!     println!("{}", change);
//! }
//!
//! // Drop ES modules instead
//! let mut es5_only = ContentFilter::new(
//!     "src/",
//!     "dist/es5/",
//!     FilterOptions::exclude(Predicate::pattern("^export ").map_err(FunnelError::config)?),
//! )?;
//! es5_only.build().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration Files
//!
//! ```toml
//! # content-funnel.toml
//! include = { literal = "define(" }
//! annotation = "amd modules"
//! symlinks = "resolve"
//! ```
//!
//! Load it with [`FunnelConfig::load`] and turn it into options with
//! [`FunnelConfig::into_options`].

pub mod config;
pub mod error;
pub mod filter;
pub mod logging;
pub mod tree;
pub mod walk;

pub use config::{FilterOptions, FunnelConfig, PredicateSpec, SymlinkPolicy};
pub use error::FunnelError;
pub use filter::{BuildState, ContentFilter, FilterMode, MatchList, Predicate, PredicateOutcome};
pub use tree::{Change, ChangeOp, Funnel, Patch, Selection, TreeDiffer};
pub use walk::{FsWalker, WalkEntry, Walker};

/// Result type alias for content-funnel operations
pub type Result<T> = std::result::Result<T, FunnelError>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
