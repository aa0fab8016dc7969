use std::path::Path;

use tracing::{debug, warn};

use crate::{
    error::{JjRunError, Result},
    jj::Vcs,
};

/// Tear down a scratch workspace and every change created through it.
///
/// Steps run in a fixed order and each one is attempted even if an earlier
/// step failed; the first error is returned. The workspace is only refreshed
/// and forgotten while it is still registered.
pub fn cleanup(
    vcs: &dyn Vcs,
    workspace_path: &Path,
    workspace_name: &str,
    change_ids: &[String],
) -> Result<()> {
    let mut first_error = None;

    for id in change_ids {
        record(&mut first_error, "abandon", vcs.abandon(id));
    }

    let registered = match vcs.list_workspaces() {
        Ok(names) => names.iter().any(|name| name == workspace_name),
        Err(e) => {
            record(&mut first_error, "list workspaces", Err(e));
            true
        }
    };

    if registered {
        record(
            &mut first_error,
            "refresh scratch workspace",
            vcs.update_stale(workspace_path),
        );
        record(
            &mut first_error,
            "forget workspace",
            vcs.forget_workspace(workspace_name),
        );
    } else {
        debug!(workspace = workspace_name, "workspace already forgotten");
    }

    record(
        &mut first_error,
        "refresh working copy",
        vcs.update_stale(vcs.repo_dir()),
    );

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Keep the first failure of a cleanup step, logging every one.
fn record(first_error: &mut Option<JjRunError>, step: &str, result: Result<()>) {
    if let Err(e) = result {
        warn!(step, error = %e, "cleanup step failed");
        first_error.get_or_insert(e);
    }
}
