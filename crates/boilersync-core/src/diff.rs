//! Stage a fresh expansion next to a project for side-by-side review
//!
//! The staging directory is a git repository kept per project: each run
//! expands the template fresh and commits it, then copies the project's
//! current files over it. The working tree diff in that repository is
//! exactly what the project has changed relative to a clean pull, and its
//! history records how the template's output evolved between runs.

use crate::error::{Error, IoResultExt, Result};
use crate::names::ProjectNames;
use crate::project::{Manifest, MANIFEST_FILE_NAME};
use crate::prompt::Prompter;
use crate::templates::TemplateLibrary;
use crate::workflow::{pull, PullOptions};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};
use walkdir::WalkDir;

const STAGING_PREFIX: &str = "boilersync-diff-";
const COMMIT_CONFIG: &[&str] = &[
    "-c",
    "user.name=boilersync",
    "-c",
    "user.email=boilersync@localhost",
    "-c",
    "commit.gpgsign=false",
];

/// A staged comparison, ready to be opened in a diff tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffStage {
    /// Git repository holding the fresh expansion plus the project's files
    pub staging_dir: PathBuf,
    pub template: String,
    /// Files copied from the project over the fresh expansion
    pub copied: usize,
    /// Repository from an earlier run was reused
    pub reused: bool,
}

/// Staging location for `project_root`, stable across runs
///
/// The parent directory is keyed by a short hash of the canonical project
/// path so two projects never share a staging area.
pub fn staging_dir(project_root: &Path) -> Result<PathBuf> {
    let canonical = project_root.canonicalize().at(project_root)?;
    let digest = Sha256::digest(canonical.to_string_lossy().as_bytes());
    let short = &hex::encode(digest)[..8];

    Ok(std::env::temp_dir()
        .join(format!("{}{}", STAGING_PREFIX, short))
        .join("project"))
}

/// Expand the project's template fresh and overlay the project's current files
///
/// Names and variables come from the project's manifest, so `prompter` is
/// only consulted for tokens the template gained since the last pull.
pub fn stage<P>(library: &TemplateLibrary, project_root: &Path, prompter: &mut P) -> Result<DiffStage>
where
    P: Prompter + ?Sized,
{
    let manifest = Manifest::load(project_root)?
        .ok_or_else(|| Error::manifest_not_found(project_root.join(MANIFEST_FILE_NAME)))?;

    let staging = staging_dir(project_root)?;
    let reused = staging.join(".git").is_dir()
        && git(&staging, &["rev-parse", "--verify", "-q", "HEAD"]).is_ok();
    if reused {
        debug!(path = %staging.display(), "resetting previous staging repository");
        git(&staging, &["reset", "--hard", "-q"])?;
        git(&staging, &["clean", "-fdq"])?;
        clear_worktree(&staging)?;
    } else {
        if staging.exists() {
            fs::remove_dir_all(&staging).at(&staging)?;
        }
        fs::create_dir_all(&staging).at(&staging)?;
        git(&staging, &["init", "-q"])?;
    }

    let options = PullOptions::new(&staging)
        .template(&manifest.template)
        .names(ProjectNames::new(&manifest.name_snake, &manifest.name_pretty))
        .variables(manifest.variables.clone());
    pull(library, &options, prompter)?;

    git(&staging, &["add", "-A"])?;
    let message = if reused {
        format!("Updated template {}", manifest.template)
    } else {
        format!("Initial template {}", manifest.template)
    };
    let mut commit: Vec<&str> = COMMIT_CONFIG.to_vec();
    commit.extend(["commit", "-q", "--allow-empty", "-m", message.as_str()]);
    git(&staging, &commit)?;

    let copied = copy_project_files(project_root, &staging)?;
    info!(staging = %staging.display(), copied, reused, "staged diff");

    Ok(DiffStage {
        staging_dir: staging,
        template: manifest.template,
        copied,
        reused,
    })
}

/// Remove everything but `.git` so files dropped from the template show as deletions
fn clear_worktree(dir: &Path) -> Result<()> {
    for entry in fs::read_dir(dir).at(dir)? {
        let entry = entry.at(dir)?;
        if entry.file_name() == ".git" {
            continue;
        }
        let path = entry.path();
        if entry.file_type().at(&path)?.is_dir() {
            fs::remove_dir_all(&path).at(&path)?;
        } else {
            fs::remove_file(&path).at(&path)?;
        }
    }
    Ok(())
}

/// Copy the project's files over `staging`, leaving out `.git/` and manifests
fn copy_project_files(project_root: &Path, staging: &Path) -> Result<usize> {
    let mut copied = 0;
    let walker = WalkDir::new(project_root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.file_name() != ".git");

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(project_root).to_path_buf();
            Error::io(path, e.into())
        })?;
        if !entry.file_type().is_file() || entry.file_name() == MANIFEST_FILE_NAME {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(project_root) else {
            continue;
        };

        let target = staging.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).at(parent)?;
        }
        fs::copy(entry.path(), &target).at(&target)?;
        copied += 1;
    }

    Ok(copied)
}

fn git(dir: &Path, args: &[&str]) -> Result<()> {
    let output = Command::new("git")
        .current_dir(dir)
        .args(args)
        .output()
        .map_err(|e| Error::git(format!("failed to run git: {}", e)))?;

    if !output.status.success() {
        return Err(Error::git(format!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(())
}

/// Launch `tool` on the staging directory and wait for it to exit
///
/// `tool` is a command line split on whitespace; the directory is appended
/// as the final argument.
pub fn open_in_tool(tool: &str, dir: &Path) -> Result<()> {
    let mut parts = tool.split_whitespace();
    let program = parts.next().ok_or_else(|| Error::DiffTool {
        tool: tool.to_string(),
        message: "no command configured".to_string(),
    })?;

    let status = Command::new(program)
        .args(parts)
        .arg(dir)
        .status()
        .map_err(|e| Error::DiffTool {
            tool: tool.to_string(),
            message: e.to_string(),
        })?;

    if !status.success() {
        return Err(Error::DiffTool {
            tool: tool.to_string(),
            message: format!("exited with {}", status),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::NonInteractive;
    use crate::workflow::init;
    use tempfile::TempDir;

    fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .is_ok_and(|output| output.status.success())
    }

    #[test]
    fn test_staging_dir_is_stable_per_project() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();

        let first = staging_dir(a.path()).unwrap();
        assert_eq!(first, staging_dir(a.path()).unwrap());
        assert_ne!(first, staging_dir(b.path()).unwrap());
        assert!(first.ends_with("project"));

        let parent = first.parent().unwrap().file_name().unwrap().to_string_lossy();
        assert!(parent.starts_with(STAGING_PREFIX));
        assert_eq!(parent.len(), STAGING_PREFIX.len() + 8);
    }

    #[test]
    fn test_copy_project_files_skips_git_and_manifests() {
        let project = TempDir::new().unwrap();
        let staging = TempDir::new().unwrap();
        let root = project.path();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join(".git").join("HEAD"), "ref").unwrap();
        fs::write(root.join(MANIFEST_FILE_NAME), "{}").unwrap();
        fs::create_dir_all(root.join("src").join("child")).unwrap();
        fs::write(root.join("src").join("main.rs"), "fn main() {}").unwrap();
        fs::write(root.join("src").join("child").join(MANIFEST_FILE_NAME), "{}").unwrap();

        let copied = copy_project_files(root, staging.path()).unwrap();

        assert_eq!(copied, 1);
        assert!(staging.path().join("src").join("main.rs").exists());
        assert!(!staging.path().join(".git").exists());
        assert!(!staging.path().join(MANIFEST_FILE_NAME).exists());
    }

    #[test]
    fn test_stage_requires_manifest() {
        let project = TempDir::new().unwrap();
        let library = TemplateLibrary::new(project.path());
        let err = stage(&library, project.path(), &mut NonInteractive::new()).unwrap_err();
        assert!(matches!(err, Error::ManifestNotFound { .. }));
    }

    #[test]
    fn test_stage_shows_local_edits_as_working_tree_changes() {
        if !git_available() {
            return;
        }

        let lib = TempDir::new().unwrap();
        let template = lib.path().join("tpl");
        fs::create_dir_all(&template).unwrap();
        fs::write(template.join("README.md"), "# $${project_name_pretty}\n").unwrap();
        let library = TemplateLibrary::new(lib.path());

        let work = TempDir::new().unwrap();
        let project = work.path().join("diff-demo");
        let options = PullOptions::new(&project).template("tpl");
        init(&library, &options, &mut NonInteractive::new()).unwrap();
        fs::write(project.join("README.md"), "# Diff Demo\n\nlocal notes\n").unwrap();

        let staged = stage(&library, &project, &mut NonInteractive::new()).unwrap();

        assert!(!staged.reused);
        assert_eq!(git_output(&staged.staging_dir, &["status", "--porcelain"]), "M README.md");
        assert_eq!(staged.template, "tpl");

        fs::remove_dir_all(staged.staging_dir.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_stage_reuses_repository_between_runs() {
        if !git_available() {
            return;
        }

        let lib = TempDir::new().unwrap();
        let template = lib.path().join("tpl");
        fs::create_dir_all(&template).unwrap();
        fs::write(template.join("README.md"), "# $${project_name_pretty}\n").unwrap();
        fs::write(template.join("OLD.md"), "old\n").unwrap();
        let library = TemplateLibrary::new(lib.path());

        let work = TempDir::new().unwrap();
        let project = work.path().join("reuse-demo");
        init(&library, &PullOptions::new(&project).template("tpl"), &mut NonInteractive::new()).unwrap();
        fs::remove_file(project.join("OLD.md")).unwrap();

        let first = stage(&library, &project, &mut NonInteractive::new()).unwrap();
        assert!(!first.reused);

        // Template drops a file and gains another between runs
        fs::remove_file(template.join("OLD.md")).unwrap();
        fs::write(template.join("NEW.md"), "new\n").unwrap();
        fs::write(first.staging_dir.join("scratch.txt"), "leftover").unwrap();

        let second = stage(&library, &project, &mut NonInteractive::new()).unwrap();
        assert!(second.reused);
        assert_eq!(second.staging_dir, first.staging_dir);
        assert_eq!(git_output(&second.staging_dir, &["rev-list", "--count", "HEAD"]), "2");
        assert_eq!(git_output(&second.staging_dir, &["status", "--porcelain"]), "");
        assert!(second.staging_dir.join("NEW.md").exists());
        assert!(!second.staging_dir.join("OLD.md").exists());
        assert!(!second.staging_dir.join("scratch.txt").exists());

        fs::remove_dir_all(second.staging_dir.parent().unwrap()).unwrap();
    }

    fn git_output(dir: &Path, args: &[&str]) -> String {
        let output = Command::new("git").current_dir(dir).args(args).output().unwrap();
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    #[test]
    fn test_open_in_tool_reports_failures() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            open_in_tool("", dir.path()),
            Err(Error::DiffTool { .. })
        ));
        assert!(matches!(
            open_in_tool("boilersync-no-such-tool --flag", dir.path()),
            Err(Error::DiffTool { .. })
        ));
    }
}
