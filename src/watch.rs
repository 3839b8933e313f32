//! Rebuild on change.
//!
//! Watches the directory of every manifest file and every asset, non-recursively,
//! and rebuilds all selected profiles whenever one of those inputs changes.
//! Events arrive over a channel and are handled on the calling thread.

use std::collections::BTreeSet;
use std::env;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use notify::{Event, EventKind, RecursiveMode, Watcher};
use tracing::{debug, warn};

use crate::build::{build_all, BuildReport, Project};
use crate::error::Result;
use crate::manifest::Profile;

/// Events closer together than this collapse into one rebuild.
const SETTLE: Duration = Duration::from_millis(150);

/// Absolute form of `path` comparable with the paths the watcher reports.
///
/// The parent directory is canonicalized when it exists; the file itself may
/// not. Otherwise a relative path is joined onto the working directory.
pub fn normalize(path: &Path) -> PathBuf {
    if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
        let parent = if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        };
        if let Ok(dir) = parent.canonicalize() {
            return dir.join(name);
        }
    }
    if path.is_relative() {
        if let Ok(cwd) = env::current_dir() {
            return cwd.join(path);
        }
    }
    path.to_path_buf()
}

/// Every file whose change should trigger a rebuild, normalized.
pub fn inputs(project: &Project, profiles: &[Profile]) -> BTreeSet<PathBuf> {
    let mut files = BTreeSet::new();
    for profile in profiles {
        files.extend(profile.files().map(|f| normalize(&project.root.join(f))));
        files.extend(profile.assets.iter().map(|a| normalize(&project.asset_dir.join(a))));
    }
    files
}

/// Directories to register with the watcher.
pub fn watched_dirs(inputs: &BTreeSet<PathBuf>) -> BTreeSet<PathBuf> {
    inputs
        .iter()
        .filter_map(|f| f.parent())
        .map(Path::to_path_buf)
        .collect()
}

fn touches_inputs(event: &Event, inputs: &BTreeSet<PathBuf>) -> bool {
    let relevant = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    );
    relevant
        && event
            .paths
            .iter()
            .any(|p| inputs.contains(p) || inputs.contains(&normalize(p)))
}

/// Build once, then rebuild after every change until the watcher goes away
/// or `on_build` breaks.
///
/// Build failures are handed to `on_build` and do not stop the loop.
pub fn watch<F>(project: &Project, profiles: &[Profile], mut on_build: F) -> Result<()>
where
    F: FnMut(Result<Vec<BuildReport>>) -> ControlFlow<()>,
{
    let inputs = inputs(project, profiles);
    let (tx, rx) = mpsc::channel();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        let _ = tx.send(res);
    })?;
    for dir in watched_dirs(&inputs) {
        if dir.is_dir() {
            watcher.watch(&dir, RecursiveMode::NonRecursive)?;
            debug!(dir = %dir.display(), "watching");
        } else {
            warn!(dir = %dir.display(), "input directory missing; not watched");
        }
    }

    if on_build(build_all(project, profiles)).is_break() {
        return Ok(());
    }

    while let Ok(res) = rx.recv() {
        let mut dirty = match res {
            Ok(event) => touches_inputs(&event, &inputs),
            Err(e) => {
                warn!(error = %e, "watch error");
                false
            }
        };
        // Drain the burst an editor save produces.
        while let Ok(res) = rx.recv_timeout(SETTLE) {
            if let Ok(event) = res {
                dirty |= touches_inputs(&event, &inputs);
            }
        }
        if dirty && on_build(build_all(project, profiles)).is_break() {
            break;
        }
    }

    Ok(())
}
