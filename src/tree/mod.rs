//! Output tree maintenance
//!
//! The filter decides *which* files belong in the output; a [`TreeDiffer`]
//! decides *what to do* to the output directory so it holds exactly those
//! files. The bundled [`Funnel`] keeps a snapshot of the previous pass and
//! emits an ordered [`Patch`] of filesystem operations.

mod funnel;
mod snapshot;

pub use funnel::Funnel;
pub use snapshot::{EntryMeta, NodeKind, Snapshot};

use crate::error::FunnelError;
use crate::filter::{display_path, FilterMode, MatchList};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};

/// The per-pass allow-list or deny-list handed to a differ
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Only these relative paths belong in the output
    Include(MatchList),
    /// Every file except these relative paths belongs in the output
    Exclude(MatchList),
}

impl Selection {
    pub fn new(mode: FilterMode, paths: MatchList) -> Self {
        match mode {
            FilterMode::Include => Selection::Include(paths),
            FilterMode::Exclude => Selection::Exclude(paths),
        }
    }

    pub fn mode(&self) -> FilterMode {
        match self {
            Selection::Include(_) => FilterMode::Include,
            Selection::Exclude(_) => FilterMode::Exclude,
        }
    }

    pub fn paths(&self) -> &MatchList {
        match self {
            Selection::Include(paths) | Selection::Exclude(paths) => paths,
        }
    }

    /// Build a lookup answering whether a relative file path is admitted
    pub fn admission(&self) -> Admission<'_> {
        Admission {
            listed: self.paths().iter().collect(),
            include: matches!(self, Selection::Include(_)),
        }
    }
}

/// Hash-backed membership test for a [`Selection`]
pub struct Admission<'a> {
    listed: HashSet<&'a Path>,
    include: bool,
}

impl Admission<'_> {
    pub fn admits(&self, path: &Path) -> bool {
        self.listed.contains(path) == self.include
    }
}

/// One operation applied to the output tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChangeOp {
    Mkdir,
    Create,
    Update,
    Unlink,
    Rmdir,
}

impl ChangeOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeOp::Mkdir => "mkdir",
            ChangeOp::Create => "create",
            ChangeOp::Update => "update",
            ChangeOp::Unlink => "unlink",
            ChangeOp::Rmdir => "rmdir",
        }
    }
}

impl fmt::Display for ChangeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub op: ChangeOp,
    /// Root-relative, raw file name bytes preserved
    pub path: PathBuf,
}

impl Change {
    pub fn new(op: ChangeOp, path: impl Into<PathBuf>) -> Self {
        Self {
            op,
            path: path.into(),
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op, display_path(&self.path))
    }
}

/// Ordered operations produced by one pass: removals deepest-first, then
/// additions and updates shallowest-first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Patch {
    changes: Vec<Change>,
}

impl Patch {
    pub fn new(changes: Vec<Change>) -> Self {
        Self { changes }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Change> {
        self.changes.iter()
    }

    /// Number of operations of the given kind
    pub fn count(&self, op: ChangeOp) -> usize {
        self.changes.iter().filter(|c| c.op == op).count()
    }

    /// Operations keyed by path. A path removed and re-added keeps its last op.
    pub fn by_path(&self) -> BTreeMap<PathBuf, ChangeOp> {
        self.changes
            .iter()
            .map(|c| (c.path.clone(), c.op))
            .collect()
    }
}

impl<'a> IntoIterator for &'a Patch {
    type Item = &'a Change;
    type IntoIter = std::slice::Iter<'a, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

/// Collaborator that turns a selection into output tree changes
pub trait TreeDiffer: Send + Sync {
    /// Bring the output tree in line with `selection` applied to `input`
    fn build(
        &mut self,
        input: &Path,
        selection: &Selection,
    ) -> impl Future<Output = Result<Patch, FunnelError>> + Send;
}
