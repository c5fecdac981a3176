//! Template library: a directory whose child directories are templates

use crate::error::{Error, IoResultExt, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Read-only view over the template library root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateLibrary {
    root: PathBuf,
}

impl TemplateLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Root directory of the template `id`
    ///
    /// An id must be a single plain path component naming an existing directory.
    pub fn template_path(&self, id: &str) -> Result<PathBuf> {
        let mut components = Path::new(id).components();
        let single = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );

        let path = self.root.join(id);
        if single && path.is_dir() {
            Ok(path)
        } else {
            Err(Error::template_not_found(id, &self.root))
        }
    }

    /// Available template ids, sorted; hidden directories are ignored
    pub fn list(&self) -> Result<Vec<String>> {
        let mut templates = Vec::new();

        for entry in fs::read_dir(&self.root).at(&self.root)? {
            let entry = entry.at(&self.root)?;
            if !entry.path().is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if !name.starts_with('.') {
                    templates.push(name.to_string());
                }
            }
        }

        templates.sort();
        Ok(templates)
    }
}
