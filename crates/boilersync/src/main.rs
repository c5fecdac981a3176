//! boilersync CLI - Generate projects from templates and keep them in sync

mod logging;

use anyhow::{Context, Result};
use boilersync_core::tui::{self, DiffArgs, InitArgs, PullArgs};
use boilersync_core::Settings;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "boilersync")]
#[command(about = "Generate projects from boilerplate templates and keep them in sync")]
#[command(version)]
pub struct Args {
    /// Template library directory (overrides BOILERSYNC_TEMPLATE_DIR and ~/.boilersync_config)
    #[arg(long = "template-dir", global = true)]
    pub template_dir: Option<PathBuf>,

    /// Show debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new project from a template
    Init(CliInitArgs),
    /// Re-apply a project's template over its files
    Pull(CliPullArgs),
    /// Open a project next to a fresh expansion of its template
    Diff(CliDiffArgs),
    /// List the templates in the library
    Templates,
}

#[derive(Parser, Debug)]
pub struct CliInitArgs {
    /// Template to use
    pub template: Option<String>,

    /// Project directory to create
    #[arg(short, long)]
    pub directory: Option<PathBuf>,

    /// Preset a template variable (repeatable)
    #[arg(long = "var", value_name = "KEY=VALUE")]
    pub vars: Vec<String>,

    /// Never prompt; fail if a variable has no value
    #[arg(long = "no-input")]
    pub no_input: bool,
}

impl From<CliInitArgs> for InitArgs {
    fn from(args: CliInitArgs) -> Self {
        InitArgs {
            template: args.template,
            directory: args.directory,
            vars: args.vars,
            no_input: args.no_input,
        }
    }
}

#[derive(Parser, Debug)]
pub struct CliPullArgs {
    /// Template to use (defaults to the one recorded in .boilersync)
    pub template: Option<String>,

    /// Project root (defaults to the enclosing project)
    #[arg(short, long)]
    pub directory: Option<PathBuf>,

    /// Preset a template variable (repeatable)
    #[arg(long = "var", value_name = "KEY=VALUE")]
    pub vars: Vec<String>,

    /// Never prompt; fail if a variable has no value
    #[arg(long = "no-input")]
    pub no_input: bool,

    /// Overwrite even without a manifest or with uncommitted changes
    #[arg(short, long)]
    pub force: bool,
}

impl From<CliPullArgs> for PullArgs {
    fn from(args: CliPullArgs) -> Self {
        PullArgs {
            template: args.template,
            directory: args.directory,
            vars: args.vars,
            no_input: args.no_input,
            force: args.force,
        }
    }
}

#[derive(Parser, Debug)]
pub struct CliDiffArgs {
    /// Project root (defaults to the enclosing project)
    #[arg(short, long)]
    pub directory: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    let args = Args::parse();
    logging::init(args.verbose);

    let settings = Settings::load()
        .context("Failed to load user configuration")?
        .with_template_dir(args.template_dir);
    tracing::debug!(?settings, "resolved settings");

    let result = match args.command {
        Command::Init(init_args) => tui::run_init(&settings, init_args.into()),
        Command::Pull(pull_args) => tui::run_pull(&settings, pull_args.into()),
        Command::Diff(diff_args) => tui::run_diff(
            &settings,
            DiffArgs {
                directory: diff_args.directory,
            },
        ),
        Command::Templates => tui::list_templates(&settings),
    };

    // Ensure cursor is visible on normal exit
    let _ = console::Term::stderr().show_cursor();

    result
}
