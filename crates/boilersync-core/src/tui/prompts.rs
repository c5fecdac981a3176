//! Charm-style CLI prompts using cliclack

use crate::config::Settings;
use crate::diff;
use crate::error::Error;
use crate::names::{normalize_to_snake, snake_to_pretty, ProjectNames};
use crate::project::{find_project_root, registry::path_exists, Manifest};
use crate::prompt::{parse_assignments, NonInteractive, Prompter};
use crate::templates::TemplateLibrary;
use crate::workflow::{self, PullOptions};
use anyhow::{Context, Result};
use colored::Colorize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// CLI arguments for the init command
#[derive(Debug, Clone, Default)]
pub struct InitArgs {
    /// Template id to use
    pub template: Option<String>,

    /// Project directory to create
    pub directory: Option<PathBuf>,

    /// Preset variable values as `KEY=VALUE`
    pub vars: Vec<String>,

    /// Never prompt; use defaults and presets only
    pub no_input: bool,
}

/// CLI arguments for the pull command
#[derive(Debug, Clone, Default)]
pub struct PullArgs {
    /// Template id; defaults to the one recorded in the manifest
    pub template: Option<String>,

    /// Project root; defaults to the enclosing project
    pub directory: Option<PathBuf>,

    /// Preset variable values as `KEY=VALUE`
    pub vars: Vec<String>,

    /// Never prompt; use the manifest, defaults and presets only
    pub no_input: bool,

    /// Overwrite without checking for a manifest or a clean work tree
    pub force: bool,
}

/// CLI arguments for the diff command
#[derive(Debug, Clone, Default)]
pub struct DiffArgs {
    /// Project root; defaults to the enclosing project
    pub directory: Option<PathBuf>,
}

/// Answers questions with cliclack inputs, after consulting presets
pub struct ClackPrompter {
    presets: BTreeMap<String, String>,
}

impl ClackPrompter {
    pub fn new(presets: BTreeMap<String, String>) -> Self {
        Self { presets }
    }
}

impl Prompter for ClackPrompter {
    fn project_names(&mut self, default: &ProjectNames) -> crate::Result<ProjectNames> {
        let snake: String = cliclack::input("Project name (snake_case)")
            .default_input(&default.snake)
            .placeholder(&default.snake)
            .validate(|input: &String| match normalize_to_snake(input) {
                Ok(normalized) if normalized == *input => Ok(()),
                Ok(normalized) => Err(format!("Use snake_case, e.g. {}", normalized)),
                Err(e) => Err(e.to_string()),
            })
            .interact()
            .map_err(Error::Prompt)?;

        let suggested = if snake == default.snake {
            default.pretty.clone()
        } else {
            snake_to_pretty(&snake)
        };
        let pretty: String = cliclack::input("Project display name")
            .default_input(&suggested)
            .placeholder(&suggested)
            .interact()
            .map_err(Error::Prompt)?;

        Ok(ProjectNames::new(snake, pretty))
    }

    fn variable(&mut self, name: &str, label: &str) -> crate::Result<String> {
        if let Some(value) = self.presets.get(name) {
            return Ok(value.clone());
        }

        cliclack::input(label)
            .placeholder(name)
            .interact()
            .map_err(Error::Prompt)
    }
}

fn prompter(vars: &[String], no_input: bool) -> Result<Box<dyn Prompter>> {
    let presets = parse_assignments(vars)?;
    Ok(if no_input {
        Box::new(NonInteractive::with_presets(presets))
    } else {
        Box::new(ClackPrompter::new(presets))
    })
}

/// Create a new project from a template
pub fn run_init(settings: &Settings, args: InitArgs) -> Result<()> {
    cliclack::intro("boilersync init")?;

    let library = open_library(settings)?;
    let template = select_template(&library, args.template.as_deref(), args.no_input)?;
    let project_dir = select_directory(args.directory.as_deref(), args.no_input)?;

    let mut prompter = prompter(&args.vars, args.no_input)?;
    let options = PullOptions::new(&project_dir).template(&template);
    let outcome = workflow::init(&library, &options, prompter.as_mut())?;

    cliclack::log::success(format!(
        "Created {} files in {}",
        outcome.pull.report.file_count(),
        project_dir.display()
    ))?;
    if let Some(parent) = &outcome.parent {
        cliclack::log::info(format!("Registered as a child of {}", parent.display()))?;
    }

    cliclack::outro(format!(
        "{} is ready",
        outcome.pull.manifest.name_pretty
    ))?;
    Ok(())
}

/// Re-apply a template over an existing project
pub fn run_pull(settings: &Settings, args: PullArgs) -> Result<()> {
    cliclack::intro("boilersync pull")?;

    let library = open_library(settings)?;
    let project_dir = match &args.directory {
        Some(dir) => absolute(dir)?,
        None => enclosing_project(settings)?.unwrap_or(std::env::current_dir()?),
    };

    let template = match args.template.as_deref() {
        Some(template) => Some(template.to_string()),
        None if Manifest::load(&project_dir)?.is_some() => None,
        None => Some(select_template(&library, None, args.no_input)?),
    };

    let mut prompter = prompter(&args.vars, args.no_input)?;
    let mut options = PullOptions::new(&project_dir);
    options.template = template;
    let outcome = workflow::sync(&library, &options, args.force, prompter.as_mut())?;

    cliclack::log::success(format!(
        "Pulled '{}' into {} ({} files)",
        outcome.manifest.template,
        project_dir.display(),
        outcome.report.file_count()
    ))?;
    cliclack::outro("Review the changes with git diff")?;
    Ok(())
}

/// Compare a project with a fresh expansion of its template
pub fn run_diff(settings: &Settings, args: DiffArgs) -> Result<()> {
    cliclack::intro("boilersync diff")?;

    let library = open_library(settings)?;
    let project_dir = match &args.directory {
        Some(dir) => absolute(dir)?,
        None => enclosing_project(settings)?
            .ok_or_else(|| Error::project_not_found(std::env::current_dir().unwrap_or_default()))?,
    };

    cliclack::log::step(format!("Staging fresh expansion of {}", project_dir.display()))?;
    let mut prompter = ClackPrompter::new(BTreeMap::new());
    let staged = diff::stage(&library, &project_dir, &mut prompter)?;
    cliclack::log::success(format!(
        "Staged '{}' with {} project files in {}",
        staged.template,
        staged.copied,
        staged.staging_dir.display()
    ))?;

    if staged.reused {
        cliclack::log::info("Reused the comparison repository from the last diff")?;
    }

    diff::open_in_tool(&settings.diff_tool, &staged.staging_dir)
        .context("Set BOILERSYNC_DIFF_TOOL or diff_tool in ~/.boilersync_config")?;
    cliclack::outro(format!(
        "{} will be reused for future diffs",
        staged.staging_dir.display()
    ))?;
    Ok(())
}

/// Print the templates available in the library
pub fn list_templates(settings: &Settings) -> Result<()> {
    let library = settings.library();
    let templates = library
        .list()
        .with_context(|| format!("Failed to read template directory {}", library.root().display()))?;

    println!();
    println!("  {} {}", "Templates in".bold(), library.root().display());
    println!();
    if templates.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for template in &templates {
        println!("  {} {}", "•".cyan(), template);
    }
    println!();

    Ok(())
}

fn open_library(settings: &Settings) -> Result<TemplateLibrary> {
    let library = settings.library();
    if !library.root().is_dir() {
        anyhow::bail!(
            "Template directory {} does not exist. Set BOILERSYNC_TEMPLATE_DIR or pass --template-dir.",
            library.root().display()
        );
    }
    cliclack::log::info(format!("Using templates from {}", library.root().display()))?;
    Ok(library)
}

fn select_template(library: &TemplateLibrary, specified: Option<&str>, no_input: bool) -> Result<String> {
    let templates = library.list()?;

    // If a template was specified, validate it directly
    if let Some(template) = specified {
        library.template_path(template)?;
        return Ok(template.to_string());
    }

    if templates.is_empty() {
        anyhow::bail!("No templates found in {}", library.root().display());
    }

    // If only one template, use it automatically
    if templates.len() == 1 {
        let template = templates[0].clone();
        cliclack::log::info(format!("Using template: {}", template))?;
        return Ok(template);
    }

    if no_input {
        anyhow::bail!(
            "No template given. Available templates: {}",
            templates.join(", ")
        );
    }

    let mut select = cliclack::select("Select a template");
    for template in &templates {
        select = select.item(template.clone(), template, "");
    }
    Ok(select.interact()?)
}

fn select_directory(specified: Option<&Path>, no_input: bool) -> Result<PathBuf> {
    let current_dir = std::env::current_dir()?;

    let path = if let Some(dir) = specified {
        let p = absolute(dir)?;
        cliclack::log::info(format!("Using directory: {}", p.display()))?;
        p
    } else if no_input {
        current_dir
    } else {
        let input: String = cliclack::input("Project directory")
            .placeholder(".")
            .default_input(".")
            .interact()?;

        if input.is_empty() || input == "." {
            current_dir
        } else {
            absolute(Path::new(&input))?
        }
    };

    // Validate parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.exists() && parent != Path::new("") {
            anyhow::bail!("Parent directory does not exist: {}", parent.display());
        }
    }

    Ok(path)
}

fn enclosing_project(settings: &Settings) -> Result<Option<PathBuf>> {
    if let Some(root) = &settings.root_override {
        return Ok(Some(absolute(root)?));
    }
    let current_dir = std::env::current_dir()?;
    Ok(find_project_root(&current_dir, path_exists))
}

fn absolute(path: &Path) -> Result<PathBuf> {
    Ok(if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    })
}
