//! Point-in-time view of the selected part of an input tree

use super::{Change, ChangeOp, Patch, Selection};
use crate::error::FunnelError;
use crate::filter::relative_path;
use ignore::WalkBuilder;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Dir,
}

/// Metadata used to decide whether a file changed between passes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMeta {
    pub kind: NodeKind,
    pub size: u64,
    pub mtime: Option<SystemTime>,
}

impl EntryMeta {
    pub fn dir() -> Self {
        Self {
            kind: NodeKind::Dir,
            size: 0,
            mtime: None,
        }
    }

    pub fn file(size: u64, mtime: Option<SystemTime>) -> Self {
        Self {
            kind: NodeKind::File,
            size,
            mtime,
        }
    }

    fn differs_from(&self, other: &EntryMeta) -> bool {
        self.kind == NodeKind::File && (self.size != other.size || self.mtime != other.mtime)
    }
}

/// Selected files and their ancestor directories, keyed by relative path.
///
/// Keys order component-wise, so a directory sorts directly before its
/// contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    entries: BTreeMap<PathBuf, EntryMeta>,
}

impl Snapshot {
    /// Walk `input` and keep the files `selection` admits.
    ///
    /// Symlinked directories are not descended into, matching the walker the
    /// filter classifies with. Symlinked files are recorded with their
    /// target's metadata.
    pub fn capture(input: &Path, selection: &Selection) -> Result<Self, FunnelError> {
        let admission = selection.admission();
        let mut snapshot = Snapshot::default();

        let walker = WalkBuilder::new(input)
            .standard_filters(false)
            .follow_links(false)
            .build();

        for result in walker {
            let entry = result?;
            if entry.depth() == 0 {
                continue;
            }
            let metadata = fs::metadata(entry.path()).map_err(|e| FunnelError::io(entry.path(), e))?;
            if !metadata.is_file() {
                continue;
            }
            let rel = relative_path(input, entry.path())?;
            if admission.admits(&rel) {
                snapshot.insert_file(rel, EntryMeta::file(metadata.len(), metadata.modified().ok()));
            }
        }

        Ok(snapshot)
    }

    /// Record a file and every directory above it
    pub fn insert_file(&mut self, rel: impl Into<PathBuf>, meta: EntryMeta) {
        let rel = rel.into();
        for ancestor in rel.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.entries
                .entry(ancestor.to_path_buf())
                .or_insert_with(EntryMeta::dir);
        }
        self.entries.insert(rel, meta);
    }

    pub fn get(&self, rel: impl AsRef<Path>) -> Option<&EntryMeta> {
        self.entries.get(rel.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Relative paths of the files (not directories) in this snapshot
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.entries
            .iter()
            .filter(|(_, meta)| meta.kind == NodeKind::File)
            .map(|(path, _)| path.as_path())
    }

    /// Operations turning a tree shaped like `self` into one shaped like `next`
    pub fn diff(&self, next: &Snapshot) -> Patch {
        let mut changes = Vec::new();

        // Removals run in reverse order so children go before their parents
        for (path, old) in self.entries.iter().rev() {
            let gone = match next.entries.get(path) {
                None => true,
                Some(new) => new.kind != old.kind,
            };
            if gone {
                let op = match old.kind {
                    NodeKind::File => ChangeOp::Unlink,
                    NodeKind::Dir => ChangeOp::Rmdir,
                };
                changes.push(Change::new(op, path.clone()));
            }
        }

        for (path, new) in &next.entries {
            let op = match self.entries.get(path) {
                Some(old) if old.kind == new.kind => {
                    if new.differs_from(old) {
                        ChangeOp::Update
                    } else {
                        continue;
                    }
                }
                _ => match new.kind {
                    NodeKind::File => ChangeOp::Create,
                    NodeKind::Dir => ChangeOp::Mkdir,
                },
            };
            changes.push(Change::new(op, path.clone()));
        }

        Patch::new(changes)
    }
}
