use crate::config::{Callback, FilterOptions, SymlinkPolicy};
use crate::error::FunnelError;
use crate::filter::entry::Classifier;
use crate::filter::{BuildState, FilterMode, MatchList, Predicate};
use crate::tree::{Funnel, Patch, Selection, TreeDiffer};
use crate::walk::{EntryKind, FsWalker, Walker};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio::task::{JoinError, JoinSet};

type Classified = Result<(usize, Option<PathBuf>), FunnelError>;

/// Content-based filter over an input tree.
///
/// Each [`build`](ContentFilter::build) classifies every file under the input
/// root, turns the matches into a [`Selection`] and hands it to the owned
/// [`TreeDiffer`].
pub struct ContentFilter<D = Funnel, W = FsWalker> {
    input: PathBuf,
    mode: FilterMode,
    predicate: Predicate,
    annotation: Option<String>,
    callback: Option<Callback>,
    symlinks: SymlinkPolicy,
    differ: D,
    walker: W,
    building: Arc<AtomicBool>,
    last_matches: MatchList,
}

impl ContentFilter {
    /// Filter `input` into the directory at `output`
    pub fn new(
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        options: FilterOptions,
    ) -> Result<Self, FunnelError> {
        Self::with_parts(input, options, Funnel::new(output), FsWalker::new())
    }
}

impl<D: TreeDiffer, W: Walker> ContentFilter<D, W> {
    /// Assemble a filter around custom collaborators
    pub fn with_parts(
        input: impl Into<PathBuf>,
        options: FilterOptions,
        differ: D,
        walker: W,
    ) -> Result<Self, FunnelError> {
        let (mode, predicate) = options.resolve_mode()?;
        let predicate = predicate.clone();

        Ok(Self {
            input: input.into(),
            mode,
            predicate,
            annotation: options.annotation,
            callback: options.callback,
            symlinks: options.symlinks,
            differ,
            walker,
            building: Arc::new(AtomicBool::new(false)),
            last_matches: MatchList::new(),
        })
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn annotation(&self) -> Option<&str> {
        self.annotation.as_deref()
    }

    pub fn state(&self) -> BuildState {
        if self.building.load(Ordering::Acquire) {
            BuildState::Building
        } else {
            BuildState::Idle
        }
    }

    /// Matches found by the most recent pass that finished classifying
    pub fn last_matches(&self) -> &MatchList {
        &self.last_matches
    }

    pub fn differ(&self) -> &D {
        &self.differ
    }

    /// Run one build pass: classify, notify, then delegate to the differ.
    ///
    /// The filter is back to [`BuildState::Idle`] once the pass finishes, fails
    /// or its future is dropped.
    pub async fn build(&mut self) -> Result<Patch, FunnelError> {
        let guard = PassGuard::enter(&self.building);
        let result = self.run_pass().await;
        drop(guard);

        if let Err(ref err) = result {
            tracing::warn!(annotation = self.label(), "Build pass failed: {}", err);
        }
        result
    }

    async fn run_pass(&mut self) -> Result<Patch, FunnelError> {
        let start = Instant::now();
        let matches = self.evaluate(&self.input).await?;
        self.last_matches = matches.clone();

        if !matches.is_empty() {
            if let Some(callback) = &self.callback {
                tracing::debug!(annotation = self.label(), "Invoking match callback");
                callback();
            }
        }

        let match_count = matches.len();
        let selection = Selection::new(self.mode, matches);
        let patch = self.differ.build(&self.input, &selection).await?;

        tracing::info!(
            annotation = self.label(),
            mode = self.mode.as_str(),
            matches = match_count,
            changes = patch.len(),
            "Build pass finished in {}ms",
            start.elapsed().as_millis()
        );
        Ok(patch)
    }

    /// Classify every file under `root` and return the paths whose predicate held.
    ///
    /// Each file is classified in its own task. The first failure aborts the
    /// pass; outstanding tasks are dropped with the join set.
    pub async fn evaluate(&self, root: &Path) -> Result<MatchList, FunnelError> {
        let root = std::path::absolute(root).map_err(|e| FunnelError::io(root, e))?;
        let classifier = Arc::new(Classifier {
            root: root.clone(),
            predicate: self.predicate.clone(),
            symlinks: self.symlinks,
        });

        let mut stream = self.walker.walk(&root);
        let mut tasks: JoinSet<Classified> = JoinSet::new();
        let mut hits: Vec<(usize, PathBuf)> = Vec::new();
        let mut encountered = 0usize;

        while let Some(item) = stream.recv().await {
            let entry = item?;
            if entry.kind == EntryKind::Dir {
                continue;
            }

            let position = encountered;
            encountered += 1;
            let classifier = Arc::clone(&classifier);
            tasks.spawn(async move {
                let hit = classifier.classify(entry).await?;
                Ok((position, hit))
            });

            // Surface failures early instead of waiting for the walk to end
            while let Some(joined) = tasks.try_join_next() {
                absorb(joined, &mut hits)?;
            }
        }

        while let Some(joined) = tasks.join_next().await {
            absorb(joined, &mut hits)?;
        }

        hits.sort_unstable_by_key(|(position, _)| *position);
        tracing::debug!(
            annotation = self.label(),
            "Classified {} entries under {}, {} matched",
            encountered,
            root.display(),
            hits.len()
        );

        Ok(hits.into_iter().map(|(_, path)| path).collect())
    }

    fn label(&self) -> &str {
        self.annotation.as_deref().unwrap_or("ContentFilter")
    }
}

/// Marks a pass as running until dropped
struct PassGuard(Arc<AtomicBool>);

impl PassGuard {
    fn enter(flag: &Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::Release);
        Self(Arc::clone(flag))
    }
}

impl Drop for PassGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn absorb(
    joined: Result<Classified, JoinError>,
    hits: &mut Vec<(usize, PathBuf)>,
) -> Result<(), FunnelError> {
    let (position, hit) = joined.map_err(|e| FunnelError::Join(e.to_string()))??;
    if let Some(path) = hit {
        hits.push((position, path));
    }
    Ok(())
}
