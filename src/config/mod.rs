//! Filter configuration
//!
//! [`FilterOptions`] is the programmatic surface and the only one that can
//! carry function predicates and callbacks. [`FunnelConfig`] is the layered
//! file/environment surface, compiled into `FilterOptions` on demand.

pub mod core;
pub mod options;

pub use self::core::{ConfigFormat, FunnelConfig, PredicateSpec, ENV_PREFIX, REPO_CONFIG_NAME};
pub use options::{Callback, FilterOptions, SymlinkPolicy};
