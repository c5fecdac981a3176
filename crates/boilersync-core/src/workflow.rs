//! Pull and init: the end-to-end flows built on the core modules
//!
//! A pull seeds a fresh interpolation context (from the target's manifest
//! when there is one), expands the template over the target, and writes the
//! manifest back. Init is a pull into an empty directory that additionally
//! registers the new project with an enclosing one.

use crate::context::{InterpolationContext, Scalar};
use crate::error::{Error, IoResultExt, Result};
use crate::names::ProjectNames;
use crate::project::{manifest_path, register_with_parent, Manifest};
use crate::prompt::Prompter;
use crate::templates::{process_template_directory, ProcessReport, TemplateLibrary};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

/// Entries ignored when deciding whether a directory is empty
const IGNORED_ENTRIES: &[&str] = &[".DS_Store"];

/// Inputs to a single pull
#[derive(Debug, Clone, Default)]
pub struct PullOptions {
    /// Template id; defaults to the one recorded in the target's manifest
    pub template: Option<String>,

    /// Project root to expand into
    pub target: PathBuf,

    /// Names to use instead of prompting; must match an existing manifest
    pub names: Option<ProjectNames>,

    /// Variables known up front, seeded before any prompting
    pub variables: BTreeMap<String, Scalar>,
}

impl PullOptions {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            ..Self::default()
        }
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn names(mut self, names: ProjectNames) -> Self {
        self.names = Some(names);
        self
    }

    pub fn variables(mut self, variables: BTreeMap<String, Scalar>) -> Self {
        self.variables = variables;
        self
    }
}

/// What a pull produced
#[derive(Debug, Clone)]
pub struct PullOutcome {
    pub manifest: Manifest,
    pub report: ProcessReport,
    /// Manifest existed before this pull
    pub resynced: bool,
}

/// What an init produced
#[derive(Debug, Clone)]
pub struct InitOutcome {
    pub pull: PullOutcome,
    /// Enclosing project this one was registered under
    pub parent: Option<PathBuf>,
}

/// Expand a template into `options.target` and record the result in its manifest
///
/// This does not check whether the target may be overwritten; see `sync` and
/// `init` for the guarded entry points.
pub fn pull<P>(library: &TemplateLibrary, options: &PullOptions, prompter: &mut P) -> Result<PullOutcome>
where
    P: Prompter + ?Sized,
{
    let target = &options.target;
    let existing = Manifest::load(target)?;

    let template = options
        .template
        .clone()
        .or_else(|| existing.as_ref().map(|m| m.template.clone()))
        .ok_or_else(|| Error::manifest_not_found(manifest_path(target)))?;
    let template_root = library.template_path(&template)?;

    let mut ctx = InterpolationContext::new();
    match (&existing, &options.names) {
        (Some(manifest), explicit) => {
            ctx.set_project_names(ProjectNames::new(
                &manifest.name_snake,
                &manifest.name_pretty,
            ))?;
            if let Some(explicit) = explicit {
                ctx.set_project_names(explicit.clone())?;
            }
        }
        (None, Some(explicit)) => ctx.set_project_names(explicit.clone())?,
        (None, None) => {
            let default = default_names(target)?;
            ctx.set_project_names(prompter.project_names(&default)?)?;
        }
    }

    if let Some(manifest) = &existing {
        ctx.set_collected_variables(manifest.variables.clone())?;
    }
    ctx.set_collected_variables(options.variables.clone())?;

    info!(template = %template, project = %target.display(), "expanding template");
    let report = process_template_directory(&template_root, target, &mut ctx, prompter)?;

    let resynced = existing.is_some();
    let names = ctx
        .project_names()
        .cloned()
        .ok_or_else(|| Error::invalid_name(""))?;
    let manifest = match existing {
        Some(mut manifest) => {
            manifest.template = template;
            manifest.variables = ctx.collected_variables();
            manifest
        }
        None => Manifest {
            template,
            name_snake: names.snake,
            name_pretty: names.pretty,
            variables: ctx.collected_variables(),
            children: Vec::new(),
        },
    };
    manifest.save(target)?;

    Ok(PullOutcome {
        manifest,
        report,
        resynced,
    })
}

/// Initialize a new project in an empty (or missing) directory
///
/// After the pull, the project registers itself in the nearest enclosing
/// project's manifest, if any.
pub fn init<P>(library: &TemplateLibrary, options: &PullOptions, prompter: &mut P) -> Result<InitOutcome>
where
    P: Prompter + ?Sized,
{
    ensure_empty(&options.target)?;
    fs::create_dir_all(&options.target).at(&options.target)?;

    let pull = pull(library, options, prompter)?;
    let parent = register_with_parent(&options.target)?;

    Ok(InitOutcome { pull, parent })
}

/// Re-pull a template over a project, guarding local changes
///
/// Without `force`, a non-empty target must already be a managed project
/// (manifest present) whose git work tree is clean, so every overwritten file
/// can be reviewed and reverted through version control. With `force` the
/// template is stamped over whatever is there.
pub fn sync<P>(
    library: &TemplateLibrary,
    options: &PullOptions,
    force: bool,
    prompter: &mut P,
) -> Result<PullOutcome>
where
    P: Prompter + ?Sized,
{
    let target = &options.target;
    if force {
        warn!(project = %target.display(), "forced pull, local changes will be overwritten");
    } else if !is_empty(target)? {
        if !manifest_path(target).exists() {
            return Err(Error::target_not_empty(target));
        }
        ensure_clean_worktree(target)?;
    }

    pull(library, options, prompter)
}

/// Fail with `TargetNotEmpty` unless `dir` is missing or empty
pub fn ensure_empty(dir: &Path) -> Result<()> {
    if is_empty(dir)? {
        Ok(())
    } else {
        Err(Error::target_not_empty(dir))
    }
}

fn is_empty(dir: &Path) -> Result<bool> {
    if !dir.exists() {
        return Ok(true);
    }

    for entry in fs::read_dir(dir).at(dir)? {
        let entry = entry.at(dir)?;
        let name = entry.file_name();
        if !IGNORED_ENTRIES.iter().any(|ignored| name == *ignored) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Fail unless `dir` is inside a git work tree without uncommitted changes
pub fn ensure_clean_worktree(dir: &Path) -> Result<()> {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(["status", "--porcelain"])
        .output()
        .map_err(|e| Error::git(format!("failed to run git: {}", e)))?;

    if !output.status.success() {
        return Err(Error::NotVersionControlled {
            path: dir.to_path_buf(),
        });
    }
    if !output.stdout.iter().all(u8::is_ascii_whitespace) {
        return Err(Error::DirtyWorkingTree {
            path: dir.to_path_buf(),
        });
    }
    Ok(())
}

/// Names derived from the target directory's own name
pub fn default_names(target: &Path) -> Result<ProjectNames> {
    let resolved = target
        .canonicalize()
        .unwrap_or_else(|_| target.to_path_buf());
    let name = resolved
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    ProjectNames::from_dir_name(&name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::prompt::NonInteractive;
    use tempfile::TempDir;

    /// Records every question; answers names with a fixed value
    struct Recording {
        names: ProjectNames,
        answers: BTreeMap<String, String>,
        asked_names: usize,
        asked: Vec<String>,
    }

    impl Recording {
        fn new(answers: &[(&str, &str)]) -> Self {
            Self {
                names: ProjectNames::new("custom", "Custom Name"),
                answers: answers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                asked_names: 0,
                asked: Vec::new(),
            }
        }
    }

    impl Prompter for Recording {
        fn project_names(&mut self, _default: &ProjectNames) -> Result<ProjectNames> {
            self.asked_names += 1;
            Ok(self.names.clone())
        }

        fn variable(&mut self, name: &str, _label: &str) -> Result<String> {
            self.asked.push(name.to_string());
            self.answers
                .get(name)
                .cloned()
                .ok_or_else(|| Error::missing_variable(name))
        }
    }

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn library_with(files: &[(&str, &str)]) -> (TempDir, TemplateLibrary) {
        let dir = TempDir::new().unwrap();
        for (relative, content) in files {
            write(&dir.path().join("tpl"), relative, content);
        }
        let library = TemplateLibrary::new(dir.path());
        (dir, library)
    }

    #[test]
    fn test_pull_prompts_for_names_and_writes_manifest() {
        let (_lib, library) = library_with(&[("a.txt", "$${project_name_pretty} by $${author}")]);
        let work = TempDir::new().unwrap();
        let target = work.path().join("proj");
        let mut prompter = Recording::new(&[("author", "Ada")]);

        let outcome = pull(&library, &PullOptions::new(&target).template("tpl"), &mut prompter).unwrap();

        assert_eq!(prompter.asked_names, 1);
        assert!(!outcome.resynced);
        assert_eq!(fs::read_to_string(target.join("a.txt")).unwrap(), "Custom Name by Ada");
        let manifest = Manifest::load(&target).unwrap().unwrap();
        assert_eq!(manifest.template, "tpl");
        assert_eq!(manifest.name_snake, "custom");
        assert_eq!(manifest.variables.get("author"), Some(&Scalar::from("Ada")));
    }

    #[test]
    fn test_repull_reuses_manifest_without_prompting() {
        let (lib, library) = library_with(&[("a.txt", "$${author}")]);
        let work = TempDir::new().unwrap();
        let target = work.path().join("proj");

        pull(
            &library,
            &PullOptions::new(&target).template("tpl"),
            &mut Recording::new(&[("author", "Ada")]),
        )
        .unwrap();

        // Upstream template gains a new token
        write(&lib.path().join("tpl"), "b.txt", "$${license}");

        let mut prompter = Recording::new(&[("license", "MIT")]);
        let outcome = pull(&library, &PullOptions::new(&target), &mut prompter).unwrap();

        assert!(outcome.resynced);
        assert_eq!(prompter.asked_names, 0);
        assert_eq!(prompter.asked, vec!["license"]);
        assert_eq!(outcome.manifest.variables.len(), 2);
        assert_eq!(fs::read_to_string(target.join("b.txt")).unwrap(), "MIT");
    }

    #[test]
    fn test_repull_preserves_children() {
        let (_lib, library) = library_with(&[("a.txt", "x")]);
        let work = TempDir::new().unwrap();
        let target = work.path().join("proj");
        let mut prompter = NonInteractive::new();

        pull(&library, &PullOptions::new(&target).template("tpl"), &mut prompter).unwrap();
        let mut manifest = Manifest::load(&target).unwrap().unwrap();
        manifest.add_child("nested");
        manifest.save(&target).unwrap();

        let outcome = pull(&library, &PullOptions::new(&target), &mut prompter).unwrap();
        assert_eq!(outcome.manifest.children, vec!["nested"]);
    }

    #[test]
    fn test_repull_rejects_renamed_project() {
        let (_lib, library) = library_with(&[("a.txt", "x")]);
        let work = TempDir::new().unwrap();
        let target = work.path().join("proj");
        let mut prompter = NonInteractive::new();

        pull(&library, &PullOptions::new(&target).template("tpl"), &mut prompter).unwrap();

        let renamed = PullOptions::new(&target).names(ProjectNames::new("other", "Other"));
        let err = pull(&library, &renamed, &mut prompter).unwrap_err();
        assert!(matches!(err, Error::ContextReinitialized { .. }));
    }

    #[test]
    fn test_pull_without_template_or_manifest() {
        let (_lib, library) = library_with(&[("a.txt", "x")]);
        let work = TempDir::new().unwrap();

        let err = pull(&library, &PullOptions::new(work.path()), &mut NonInteractive::new()).unwrap_err();
        assert!(matches!(err, Error::ManifestNotFound { .. }));
    }

    #[test]
    fn test_pull_unknown_template() {
        let (_lib, library) = library_with(&[("a.txt", "x")]);
        let work = TempDir::new().unwrap();

        let options = PullOptions::new(work.path()).template("missing");
        let err = pull(&library, &options, &mut NonInteractive::new()).unwrap_err();
        assert!(matches!(err, Error::TemplateNotFound { .. }));
    }

    #[test]
    fn test_corrupt_manifest_aborts_pull() {
        let (_lib, library) = library_with(&[("a.txt", "x")]);
        let work = TempDir::new().unwrap();
        fs::write(manifest_path(work.path()), "{ broken").unwrap();

        let options = PullOptions::new(work.path()).template("tpl");
        let err = pull(&library, &options, &mut NonInteractive::new()).unwrap_err();
        assert!(matches!(err, Error::ManifestCorrupt { .. }));
        assert!(!work.path().join("a.txt").exists());
    }

    #[test]
    fn test_seeded_variables_skip_prompts() {
        let (_lib, library) = library_with(&[("a.txt", "$${port}")]);
        let work = TempDir::new().unwrap();
        let target = work.path().join("svc");

        let mut variables = BTreeMap::new();
        variables.insert("port".to_string(), Scalar::Int(8080));
        let options = PullOptions::new(&target).template("tpl").variables(variables);
        pull(&library, &options, &mut NonInteractive::new()).unwrap();

        assert_eq!(fs::read_to_string(target.join("a.txt")).unwrap(), "8080");
    }

    #[test]
    fn test_init_requires_empty_target() {
        let (_lib, library) = library_with(&[("a.txt", "x")]);
        let work = TempDir::new().unwrap();
        fs::write(work.path().join("existing.txt"), "mine").unwrap();

        let options = PullOptions::new(work.path()).template("tpl");
        let err = init(&library, &options, &mut NonInteractive::new()).unwrap_err();
        assert!(matches!(err, Error::TargetNotEmpty { .. }));
        assert!(!work.path().join("a.txt").exists());
    }

    #[test]
    fn test_init_ignores_ds_store_and_uses_directory_name() {
        let (_lib, library) = library_with(&[("$${project_name_snake}.txt", "$${project_name_pretty}")]);
        let work = TempDir::new().unwrap();
        let target = work.path().join("my-app");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join(".DS_Store"), "").unwrap();

        let outcome = init(&library, &PullOptions::new(&target).template("tpl"), &mut NonInteractive::new()).unwrap();

        assert_eq!(fs::read_to_string(target.join("my_app.txt")).unwrap(), "My App");
        assert_eq!(outcome.pull.manifest.name_pretty, "My App");
        assert_eq!(outcome.parent, None);
    }

    #[test]
    fn test_init_registers_with_enclosing_project() {
        let (_lib, library) = library_with(&[("a.txt", "x")]);
        let work = TempDir::new().unwrap();
        let parent = work.path().join("mono");
        let mut prompter = NonInteractive::new();

        init(&library, &PullOptions::new(&parent).template("tpl"), &mut prompter).unwrap();
        let child = parent.join("services").join("api");
        let outcome = init(&library, &PullOptions::new(&child).template("tpl"), &mut prompter).unwrap();

        assert_eq!(outcome.parent, Some(parent.canonicalize().unwrap()));
        let manifest = Manifest::load(&parent).unwrap().unwrap();
        assert_eq!(manifest.children, vec!["services/api"]);
    }

    #[test]
    fn test_sync_refuses_unmanaged_non_empty_directory() {
        let (_lib, library) = library_with(&[("a.txt", "x")]);
        let work = TempDir::new().unwrap();
        fs::write(work.path().join("notes.md"), "mine").unwrap();

        let options = PullOptions::new(work.path()).template("tpl");
        let err = sync(&library, &options, false, &mut NonInteractive::new()).unwrap_err();
        assert!(matches!(err, Error::TargetNotEmpty { .. }));

        sync(&library, &options, true, &mut NonInteractive::new()).unwrap();
        assert!(work.path().join("a.txt").exists());
        assert_eq!(fs::read_to_string(work.path().join("notes.md")).unwrap(), "mine");
    }

    #[test]
    fn test_sync_into_empty_directory_needs_no_checks() {
        let (_lib, library) = library_with(&[("a.txt", "x")]);
        let work = TempDir::new().unwrap();

        let options = PullOptions::new(work.path()).template("tpl");
        sync(&library, &options, false, &mut NonInteractive::new()).unwrap();
        assert!(manifest_path(work.path()).exists());
    }

    #[test]
    fn test_default_names_from_directory() {
        let work = TempDir::new().unwrap();
        let target = work.path().join("Hello World");
        assert_eq!(
            default_names(&target).unwrap(),
            ProjectNames::new("hello_world", "Hello World")
        );
    }
}
