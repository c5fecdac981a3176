//! Project boundaries: upward search for manifests and child registration

use super::manifest::{manifest_path, register_child, MANIFEST_FILE_NAME};
use crate::error::{Error, IoResultExt, Result};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Nearest strict ancestor of `start` that holds a manifest
///
/// `start` itself is never returned. `exists` reports whether a path exists,
/// which keeps the search independent of the real filesystem.
pub fn find_ancestor_manifest<F>(start: &Path, exists: F) -> Option<PathBuf>
where
    F: Fn(&Path) -> bool,
{
    start
        .ancestors()
        .skip(1)
        .find(|dir| exists(&dir.join(MANIFEST_FILE_NAME)))
        .map(Path::to_path_buf)
}

/// Nearest directory at or above `start` that holds a manifest
pub fn find_project_root<F>(start: &Path, exists: F) -> Option<PathBuf>
where
    F: Fn(&Path) -> bool,
{
    start
        .ancestors()
        .find(|dir| exists(&dir.join(MANIFEST_FILE_NAME)))
        .map(Path::to_path_buf)
}

/// Filesystem-backed existence check for the searches above
pub fn path_exists(path: &Path) -> bool {
    path.exists()
}

/// Locate the project containing `start`, or fail with `ProjectNotFound`
pub fn locate_project_root(start: &Path) -> Result<PathBuf> {
    find_project_root(start, path_exists).ok_or_else(|| Error::project_not_found(start))
}

/// Register `project_dir` as a child of the nearest enclosing project
///
/// Returns the parent project root, or `None` when there is no enclosing project.
pub fn register_with_parent(project_dir: &Path) -> Result<Option<PathBuf>> {
    let project_dir = project_dir.canonicalize().at(project_dir)?;

    let Some(parent) = find_ancestor_manifest(&project_dir, path_exists) else {
        debug!(project = %project_dir.display(), "no enclosing project");
        return Ok(None);
    };

    let relative = relative_child_path(&parent, &project_dir)
        .ok_or_else(|| Error::project_not_found(&project_dir))?;
    register_child(&manifest_path(&parent), &relative)?;

    Ok(Some(parent))
}

/// `/`-separated path of `child` relative to `parent`
pub fn relative_child_path(parent: &Path, child: &Path) -> Option<String> {
    let relative = child.strip_prefix(parent).ok()?;
    let segments: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}
