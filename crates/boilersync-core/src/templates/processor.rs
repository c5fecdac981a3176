//! Recursive template expansion into a target directory
//!
//! Pull semantics are "stamp the template over the target": existing files
//! are overwritten, nothing is merged. Callers decide beforehand whether the
//! target may be written to (see `workflow`).

use super::collector::{collect_missing, extract_tokens};
use super::syntax::interpolate;
use crate::context::InterpolationContext;
use crate::error::{Error, IoResultExt, Result};
use crate::project::manifest::MANIFEST_FILE_NAME;
use crate::prompt::Prompter;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Template entries that are never copied into a project
const SKIPPED_NAMES: &[&str] = &[".git", ".DS_Store", MANIFEST_FILE_NAME];

/// What a single expansion wrote, as paths relative to the target root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessReport {
    pub directories: Vec<PathBuf>,
    /// Text files written after substitution
    pub files: Vec<PathBuf>,
    /// Files copied byte-for-byte
    pub binary_files: Vec<PathBuf>,
}

impl ProcessReport {
    pub fn file_count(&self) -> usize {
        self.files.len() + self.binary_files.len()
    }
}

/// Expand every entry under `template_root` into `target_root`
///
/// Path segments and text file contents are interpolated; tokens the context
/// cannot resolve are collected through `prompter` before each entry is written.
pub fn process_template_directory<P>(
    template_root: &Path,
    target_root: &Path,
    ctx: &mut InterpolationContext,
    prompter: &mut P,
) -> Result<ProcessReport>
where
    P: Prompter + ?Sized,
{
    if !template_root.is_dir() {
        let template = template_root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let library = template_root.parent().unwrap_or(template_root);
        return Err(Error::template_not_found(template, library));
    }

    fs::create_dir_all(target_root).at(target_root)?;

    let mut report = ProcessReport::default();
    let walker = WalkDir::new(template_root)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_skipped(entry));

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(template_root).to_path_buf();
            Error::io(path, e.into())
        })?;
        let Ok(relative) = entry.path().strip_prefix(template_root) else {
            continue;
        };

        if entry.file_type().is_dir() {
            collect_missing(&path_tokens(relative), ctx, prompter)?;
            let rendered = interpolate_path(relative, ctx)?;
            let target = target_root.join(&rendered);
            fs::create_dir_all(&target).at(&target)?;
            report.directories.push(rendered);
            continue;
        }

        let bytes = fs::read(entry.path()).at(entry.path())?;
        let text = as_text(&bytes);

        let mut tokens = path_tokens(relative);
        if let Some(text) = text {
            tokens.extend(extract_tokens(text));
        }
        collect_missing(&tokens, ctx, prompter)?;

        let rendered = interpolate_path(relative, ctx)?;
        let target = target_root.join(&rendered);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).at(parent)?;
        }

        match text {
            Some(text) => {
                let content = interpolate(text, ctx);
                fs::write(&target, content.as_bytes()).at(&target)?;
                debug!(path = %rendered.display(), "wrote text file");
                report.files.push(rendered);
            }
            None => {
                fs::write(&target, &bytes).at(&target)?;
                debug!(path = %rendered.display(), "copied binary file");
                report.binary_files.push(rendered);
            }
        }

        copy_executable_bit(entry.path(), &target)?;
    }

    Ok(report)
}

fn is_skipped(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| SKIPPED_NAMES.contains(&name))
}

/// Contents are text when they are valid UTF-8 without NUL bytes
fn as_text(bytes: &[u8]) -> Option<&str> {
    std::str::from_utf8(bytes)
        .ok()
        .filter(|text| !text.contains('\0'))
}

/// Tokens referenced by any segment of a relative path
fn path_tokens(relative: &Path) -> BTreeSet<String> {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => segment.to_str(),
            _ => None,
        })
        .flat_map(extract_tokens)
        .collect()
}

/// Interpolate each segment of a relative path independently
fn interpolate_path(relative: &Path, ctx: &InterpolationContext) -> Result<PathBuf> {
    let mut rendered = PathBuf::new();

    for component in relative.components() {
        let Component::Normal(segment) = component else {
            continue;
        };
        let Some(segment) = segment.to_str() else {
            rendered.push(segment);
            continue;
        };

        let expanded = interpolate(segment, ctx);
        let valid = !expanded.is_empty()
            && expanded != "."
            && expanded != ".."
            && !expanded.contains(['/', '\\']);
        if !valid {
            return Err(Error::InvalidPathSegment {
                template_segment: segment.to_string(),
                rendered: expanded.into_owned(),
            });
        }
        rendered.push(&*expanded);
    }

    Ok(rendered)
}

#[cfg(unix)]
fn copy_executable_bit(source: &Path, target: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = fs::metadata(source).at(source)?.permissions().mode();
    if mode & 0o111 != 0 {
        let mut permissions = fs::metadata(target).at(target)?.permissions();
        permissions.set_mode(permissions.mode() | (mode & 0o111));
        fs::set_permissions(target, permissions).at(target)?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn copy_executable_bit(_source: &Path, _target: &Path) -> Result<()> {
    Ok(())
}
