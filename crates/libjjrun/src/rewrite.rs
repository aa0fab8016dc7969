use std::path::Path;

use tracing::{debug, info, warn};

use crate::{
    change::{self, Change},
    error::Result,
    jj::{Vcs, present},
    observer::RunObserver,
};

/// Splice the content of each non-empty snapshot into its parent.
///
/// For every snapshot, the parent is edited in the scratch workspace and the
/// snapshot's content is restored into it while descendants keep their
/// content. Snapshots that are empty or no longer exist are left alone.
/// Returns the number of parents that were rewritten.
pub fn rewrite(
    vcs: &dyn Vcs,
    workspace: &Path,
    snapshots: &[Change],
    observer: &dyn RunObserver,
) -> Result<usize> {
    let mut modified = 0;

    for snapshot in snapshots {
        let rewritten = match vcs.is_empty(&snapshot.change_id, workspace)? {
            Some(false) => splice(vcs, workspace, snapshot)?,
            Some(true) => {
                debug!(change = snapshot.short_id(), "snapshot is empty");
                false
            }
            None => {
                debug!(change = snapshot.short_id(), "snapshot no longer exists");
                false
            }
        };
        if rewritten {
            modified += 1;
        }
        observer.rewritten(snapshot, rewritten);
    }

    info!(modified, total = snapshots.len(), "rewrite finished");
    Ok(modified)
}

/// Restore `snapshot` into its first parent. Returns false if it has none.
fn splice(vcs: &dyn Vcs, workspace: &Path, snapshot: &Change) -> Result<bool> {
    // Earlier splices rewrite ancestors, so the recorded parent commit may be stale.
    let current = change::resolve(vcs, &present(&snapshot.change_id), workspace)?;
    let Some(parent) = current
        .into_iter()
        .next()
        .and_then(|c| c.parents.into_iter().next())
    else {
        warn!(change = snapshot.short_id(), "snapshot has no parent; skipping");
        return Ok(false);
    };

    vcs.edit(&parent, workspace)?;
    vcs.restore_descendants_from(&snapshot.change_id, workspace)?;
    info!(change = snapshot.short_id(), parent = %parent, "spliced snapshot into parent");
    Ok(true)
}
