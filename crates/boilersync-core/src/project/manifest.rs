//! The `.boilersync` manifest persisted at a project root

use crate::context::Scalar;
use crate::error::{Error, IoResultExt, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

/// File name marking a directory as a managed project root
pub const MANIFEST_FILE_NAME: &str = ".boilersync";

/// Template identity, resolved names, and collected variables of a project
///
/// Field names are the on-disk format shared with existing projects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Template id within the library
    pub template: String,

    pub name_snake: String,

    pub name_pretty: String,

    /// Collected variables, excluding the built-in names
    #[serde(default)]
    pub variables: BTreeMap<String, Scalar>,

    /// Nested projects, as paths relative to this project's root
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
}

/// Path of the manifest file inside `root`
pub fn manifest_path(root: &Path) -> PathBuf {
    root.join(MANIFEST_FILE_NAME)
}

impl Manifest {
    /// Read the manifest at `root`; `None` when the project has none
    ///
    /// A manifest that exists but cannot be parsed is an error, never `None`:
    /// treating it as absent would drop the project's names and variables on
    /// the next save.
    pub fn load(root: &Path) -> Result<Option<Self>> {
        Self::load_file(&manifest_path(root))
    }

    /// Read a manifest from an explicit file path
    pub fn load_file(path: &Path) -> Result<Option<Self>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Err(Error::manifest_corrupt(path, e))
            }
            Err(e) => return Err(Error::io(path, e)),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| Error::manifest_corrupt(path, e))
    }

    /// Write the manifest to `root`, replacing any existing one
    ///
    /// The content goes to a temporary file in the same directory which is then
    /// renamed over the manifest. There is no locking: concurrent pulls into
    /// the same root race, and the last writer wins.
    pub fn save(&self, root: &Path) -> Result<()> {
        self.save_file(&manifest_path(root))
    }

    /// Write the manifest to an explicit file path
    pub fn save_file(&self, path: &Path) -> Result<()> {
        let dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let mut json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::manifest_corrupt(path, e))?;
        json.push('\n');

        let mut tmp = NamedTempFile::new_in(dir).at(dir)?;
        tmp.write_all(json.as_bytes()).at(tmp.path())?;
        let permissions = match fs::metadata(path) {
            Ok(existing) => tmp.as_file().set_permissions(existing.permissions()),
            Err(_) => set_default_permissions(tmp.as_file()),
        };
        permissions.at(tmp.path())?;
        tmp.as_file().sync_all().at(tmp.path())?;
        tmp.persist(path).map_err(|e| Error::io(path, e.error))?;

        info!(path = %path.display(), template = %self.template, "wrote manifest");
        Ok(())
    }

    /// Add a child path unless it is already listed; insertion order is kept
    pub fn add_child(&mut self, child: impl Into<String>) -> bool {
        let child = child.into();
        if self.children.contains(&child) {
            false
        } else {
            self.children.push(child);
            true
        }
    }
}

// New manifests get 0644 instead of the temp file's 0600
#[cfg(unix)]
fn set_default_permissions(file: &fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_default_permissions(_file: &fs::File) -> std::io::Result<()> {
    Ok(())
}

/// Append `child` to the children of the manifest file at `parent_manifest`
pub fn register_child(parent_manifest: &Path, child: &str) -> Result<()> {
    let mut manifest = Manifest::load_file(parent_manifest)?
        .ok_or_else(|| Error::manifest_not_found(parent_manifest))?;

    if manifest.add_child(child) {
        manifest.save_file(parent_manifest)?;
        info!(parent = %parent_manifest.display(), child, "registered child project");
    }
    Ok(())
}
