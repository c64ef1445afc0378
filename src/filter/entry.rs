//! Per-entry symlink resolution and classification

use crate::config::SymlinkPolicy;
use crate::error::FunnelError;
use crate::filter::Predicate;
use crate::walk::{EntryKind, WalkEntry};
use std::fs::Metadata;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// A walked entry after the symlink policy has been applied
#[derive(Debug)]
pub struct ResolvedEntry {
    /// Path as delivered by the walker
    pub path: PathBuf,
    /// Path whose content is read
    pub content_path: PathBuf,
    pub metadata: Metadata,
}

impl ResolvedEntry {
    /// Whether this entry's content should be classified
    pub fn is_classifiable(&self) -> bool {
        let file_type = self.metadata.file_type();
        file_type.is_file() || file_type.is_symlink()
    }
}

/// Apply the symlink policy and stat the entry
pub async fn resolve(entry: &WalkEntry, policy: SymlinkPolicy) -> Result<ResolvedEntry, FunnelError> {
    let path = entry.path.clone();
    let content_path = match (entry.kind, policy) {
        (EntryKind::Symlink, SymlinkPolicy::Resolve) => tokio::fs::canonicalize(&path)
            .await
            .map_err(|e| FunnelError::io(&path, e))?,
        _ => path.clone(),
    };

    let metadata = match policy {
        SymlinkPolicy::Resolve => tokio::fs::metadata(&content_path).await,
        SymlinkPolicy::Preserve => tokio::fs::symlink_metadata(&content_path).await,
    }
    .map_err(|e| FunnelError::io(&content_path, e))?;

    Ok(ResolvedEntry {
        path,
        content_path,
        metadata,
    })
}

/// Shared, immutable context for every classification task in a pass
#[derive(Debug)]
pub struct Classifier {
    pub root: PathBuf,
    pub predicate: Predicate,
    pub symlinks: SymlinkPolicy,
}

impl Classifier {
    /// Classify one walked entry.
    ///
    /// Returns the root-relative path when the predicate held, `None` when it
    /// did not or when the entry resolved to something other than a file.
    pub async fn classify(&self, entry: WalkEntry) -> Result<Option<PathBuf>, FunnelError> {
        let resolved = resolve(&entry, self.symlinks).await?;
        if resolved.metadata.is_dir() {
            tracing::trace!("Skipping directory {}", resolved.path.display());
            return Ok(None);
        }
        if !resolved.is_classifiable() {
            tracing::debug!("Skipping non-regular entry {}", resolved.path.display());
            return Ok(None);
        }

        let matched = self.evaluate(&resolved).await?;
        tracing::debug!(
            "{} {} ({})",
            if matched { "Matched" } else { "No match" },
            resolved.path.display(),
            self.predicate.kind()
        );

        if matched {
            relative_path(&self.root, &resolved.path).map(Some)
        } else {
            Ok(None)
        }
    }

    async fn evaluate(&self, entry: &ResolvedEntry) -> Result<bool, FunnelError> {
        match &self.predicate {
            Predicate::Literal(needle) => Ok(read_text(entry).await?.contains(needle.as_str())),
            Predicate::Pattern(regex) => Ok(regex.is_match(&read_text(entry).await?)),
            Predicate::Function(f) => {
                // The call itself may block, so it runs on the blocking pool
                let f = Arc::clone(f);
                let path = entry.path.clone();
                let outcome = tokio::task::spawn_blocking(move || f(&path))
                    .await
                    .map_err(|e| FunnelError::Join(e.to_string()))?;
                outcome.settle().await.map_err(|source| FunnelError::Predicate {
                    path: entry.path.clone(),
                    source,
                })
            }
        }
    }
}

/// File content as text, invalid UTF-8 replaced
async fn read_text(entry: &ResolvedEntry) -> Result<String, FunnelError> {
    let bytes = tokio::fs::read(&entry.content_path)
        .await
        .map_err(|e| FunnelError::io(&entry.content_path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// `path` relative to `root`, keeping the raw file name bytes
pub fn relative_path(root: &Path, path: &Path) -> Result<PathBuf, FunnelError> {
    let rel = path.strip_prefix(root).map_err(|_| {
        FunnelError::Walk(format!(
            "{} is not under {}",
            path.display(),
            root.display()
        ))
    })?;

    Ok(rel
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect())
}

/// Forward-slash form of a relative path, for logs and reports
pub fn display_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn classifier(root: &Path, predicate: Predicate, symlinks: SymlinkPolicy) -> Classifier {
        Classifier {
            root: root.to_path_buf(),
            predicate,
            symlinks,
        }
    }

    #[test]
    fn test_relative_path_display_uses_forward_slashes() {
        let root = Path::new("/input");
        let rel = relative_path(root, &root.join("lib").join("amd.js")).unwrap();
        assert_eq!(rel, Path::new("lib").join("amd.js"));
        assert_eq!(display_path(&rel), "lib/amd.js");
    }

    #[test]
    fn test_relative_path_outside_root_fails() {
        assert!(relative_path(Path::new("/input"), Path::new("/elsewhere/a.js")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_relative_path_keeps_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let root = Path::new("/input");
        let name = OsStr::from_bytes(b"caf\xe9.js");
        let rel = relative_path(root, &root.join("lib").join(name)).unwrap();

        assert_eq!(rel, Path::new("lib").join(name));
        assert_ne!(rel, Path::new("lib/caf\u{FFFD}.js"));
        assert_eq!(display_path(&rel), "lib/caf\u{FFFD}.js");
    }

    #[tokio::test]
    async fn test_literal_classification() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("amd.js"), "define(function() {})").unwrap();
        fs::write(root.join("es6.js"), "export default 1").unwrap();
        let c = classifier(root, "define(".into(), SymlinkPolicy::Resolve);

        let hit = c
            .classify(WalkEntry::new(root.join("amd.js"), EntryKind::File))
            .await
            .unwrap();
        let miss = c
            .classify(WalkEntry::new(root.join("es6.js"), EntryKind::File))
            .await
            .unwrap();

        assert_eq!(hit.as_deref(), Some(Path::new("amd.js")));
        assert_eq!(miss, None);
    }

    #[tokio::test]
    async fn test_pattern_anchors_at_content_start() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("amd.js"), "define(function() {})").unwrap();
        fs::write(root.join("wrapped.js"), "// header\ndefine(function() {})").unwrap();
        let c = classifier(
            root,
            Predicate::pattern(r"^define\(").unwrap(),
            SymlinkPolicy::Resolve,
        );

        let hit = c
            .classify(WalkEntry::new(root.join("amd.js"), EntryKind::File))
            .await
            .unwrap();
        let miss = c
            .classify(WalkEntry::new(root.join("wrapped.js"), EntryKind::File))
            .await
            .unwrap();

        assert_eq!(hit.as_deref(), Some(Path::new("amd.js")));
        assert_eq!(miss, None);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_read_lossily() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("blob.bin"), [0xff, 0xfe, b'd', b'e', b'f', b'i', b'n', b'e', b'(']).unwrap();
        let c = classifier(root, "define(".into(), SymlinkPolicy::Resolve);

        let hit = c
            .classify(WalkEntry::new(root.join("blob.bin"), EntryKind::File))
            .await
            .unwrap();
        assert_eq!(hit.as_deref(), Some(Path::new("blob.bin")));
    }

    #[tokio::test]
    async fn test_vanished_entry_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let c = classifier(root, "x".into(), SymlinkPolicy::Resolve);

        let err = c
            .classify(WalkEntry::new(root.join("gone.js"), EntryKind::File))
            .await
            .unwrap_err();
        assert!(matches!(err, FunnelError::Io { .. }));
    }

    #[tokio::test]
    async fn test_function_receives_walker_path() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();
        fs::write(root.join("amd.js"), "").unwrap();
        let expected = root.join("amd.js");
        let c = classifier(
            &root,
            Predicate::function(move |path| Ok(path == expected.as_path())),
            SymlinkPolicy::Resolve,
        );

        let hit = c
            .classify(WalkEntry::new(root.join("amd.js"), EntryKind::File))
            .await
            .unwrap();
        assert_eq!(hit.as_deref(), Some(Path::new("amd.js")));
    }

    #[tokio::test]
    async fn test_function_error_becomes_predicate_error() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("amd.js"), "").unwrap();
        let c = classifier(
            root,
            Predicate::function(|_| anyhow::bail!("nope")),
            SymlinkPolicy::Resolve,
        );

        let err = c
            .classify(WalkEntry::new(root.join("amd.js"), EntryKind::File))
            .await
            .unwrap_err();
        assert!(matches!(err, FunnelError::Predicate { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_resolve_policy_follows_links() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("dir")).unwrap();
        fs::write(root.join("target.js"), "define(1)").unwrap();
        std::os::unix::fs::symlink(root.join("target.js"), root.join("file-link.js")).unwrap();
        std::os::unix::fs::symlink(root.join("dir"), root.join("dir-link")).unwrap();
        let c = classifier(root, "define(".into(), SymlinkPolicy::Resolve);

        let file_hit = c
            .classify(WalkEntry::new(root.join("file-link.js"), EntryKind::Symlink))
            .await
            .unwrap();
        let dir_hit = c
            .classify(WalkEntry::new(root.join("dir-link"), EntryKind::Symlink))
            .await
            .unwrap();

        assert_eq!(file_hit.as_deref(), Some(Path::new("file-link.js")));
        assert_eq!(dir_hit, None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_preserve_policy_reads_through_link_to_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("dir")).unwrap();
        std::os::unix::fs::symlink(root.join("dir"), root.join("dir-link")).unwrap();
        let c = classifier(root, "x".into(), SymlinkPolicy::Preserve);

        // The link is not treated as a directory, so reading it fails
        let result = c
            .classify(WalkEntry::new(root.join("dir-link"), EntryKind::Symlink))
            .await;
        assert!(matches!(result, Err(FunnelError::Io { .. })));
    }
}
