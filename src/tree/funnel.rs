//! Output tree writer driven by a selection

use super::{ChangeOp, Patch, Selection, Snapshot, TreeDiffer};
use crate::error::FunnelError;
use std::fs;
use std::path::{Path, PathBuf};

/// Keeps an output directory mirroring the selected files of an input tree.
///
/// The snapshot of the previous pass is the only state carried between
/// passes. When it is empty (first pass, or after a failed apply) the output
/// directory is cleared before the patch is applied.
#[derive(Debug)]
pub struct Funnel {
    output: PathBuf,
    previous: Snapshot,
}

impl Funnel {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            previous: Snapshot::default(),
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// The selection applied by the last successful pass
    pub fn snapshot(&self) -> &Snapshot {
        &self.previous
    }
}

impl TreeDiffer for Funnel {
    async fn build(&mut self, input: &Path, selection: &Selection) -> Result<Patch, FunnelError> {
        let input = input.to_path_buf();
        let output = self.output.clone();
        let selection = selection.clone();
        // Taken, not cloned: a failed pass leaves an empty snapshot behind
        let previous = std::mem::take(&mut self.previous);

        let (patch, current) = tokio::task::spawn_blocking(move || {
            sync_tree(&input, &output, &selection, previous)
        })
        .await
        .map_err(|e| FunnelError::Join(e.to_string()))??;

        self.previous = current;
        Ok(patch)
    }
}

fn sync_tree(
    input: &Path,
    output: &Path,
    selection: &Selection,
    previous: Snapshot,
) -> Result<(Patch, Snapshot), FunnelError> {
    if previous.is_empty() {
        reset_output(output)?;
    }

    let current = Snapshot::capture(input, selection)?;
    let patch = previous.diff(&current);

    for change in &patch {
        let target = output.join(&change.path);
        tracing::debug!("{}", change);
        let result = match change.op {
            ChangeOp::Mkdir => fs::create_dir(&target),
            ChangeOp::Create | ChangeOp::Update => {
                fs::copy(input.join(&change.path), &target).map(|_| ())
            }
            ChangeOp::Unlink => fs::remove_file(&target),
            ChangeOp::Rmdir => fs::remove_dir(&target),
        };
        result.map_err(|e| FunnelError::io(&target, e))?;
    }

    Ok((patch, current))
}

fn reset_output(output: &Path) -> Result<(), FunnelError> {
    if output.exists() {
        fs::remove_dir_all(output).map_err(|e| FunnelError::io(output, e))?;
    }
    fs::create_dir_all(output).map_err(|e| FunnelError::io(output, e))
}
