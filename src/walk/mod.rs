//! Recursive filesystem walking
//!
//! The filter never enumerates directories itself. It consumes a stream of
//! entries from a [`Walker`], which delivers every file and directory under a
//! root with symlinks left un-resolved. Resolution is the filter's job.

use crate::error::FunnelError;
use ignore::WalkBuilder;
use std::fs::FileType;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Bound on entries buffered between the walking thread and the classifier
const WALK_CHANNEL_CAPACITY: usize = 256;

/// Un-resolved kind of a walked entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Other,
}

impl From<FileType> for EntryKind {
    fn from(ft: FileType) -> Self {
        if ft.is_symlink() {
            EntryKind::Symlink
        } else if ft.is_dir() {
            EntryKind::Dir
        } else if ft.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        }
    }
}

/// One entry delivered by a walker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    /// Absolute (root-joined) path of the entry
    pub path: PathBuf,
    /// Kind as seen without following symlinks
    pub kind: EntryKind,
}

impl WalkEntry {
    pub fn new(path: impl Into<PathBuf>, kind: EntryKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Receiving half of a walk in progress
pub type WalkStream = mpsc::Receiver<Result<WalkEntry, FunnelError>>;

/// Enumerates every entry under a root.
///
/// The root itself is not yielded. Errors are delivered in-stream; the
/// consumer decides whether they abort the pass.
pub trait Walker: Send + Sync {
    fn walk(&self, root: &Path) -> WalkStream;
}

/// Walker backed by the `ignore` crate with every filter switched off
#[derive(Debug, Clone, Default)]
pub struct FsWalker;

impl FsWalker {
    pub fn new() -> Self {
        Self
    }

    fn builder(root: &Path) -> WalkBuilder {
        let mut builder = WalkBuilder::new(root);
        builder
            .standard_filters(false) // No gitignore, no hidden-file skipping
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b));
        builder
    }
}

impl Walker for FsWalker {
    fn walk(&self, root: &Path) -> WalkStream {
        let (tx, rx) = mpsc::channel(WALK_CHANNEL_CAPACITY);
        let root = root.to_path_buf();

        tokio::task::spawn_blocking(move || {
            tracing::trace!("Walking {}", root.display());
            for result in Self::builder(&root).build() {
                let item = match result {
                    Ok(entry) if entry.depth() == 0 => continue,
                    Ok(entry) => {
                        let kind = entry
                            .file_type()
                            .map(EntryKind::from)
                            .unwrap_or(EntryKind::Other);
                        tracing::trace!("Walked {} ({:?})", entry.path().display(), kind);
                        Ok(WalkEntry::new(entry.into_path(), kind))
                    }
                    Err(err) => Err(FunnelError::from(err)),
                };
                if tx.blocking_send(item).is_err() {
                    // Consumer gave up on this pass
                    break;
                }
            }
        });

        rx
    }
}
