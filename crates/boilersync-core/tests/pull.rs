//! End-to-end runs against the bundled `templates/` library

use boilersync_core::prompt::parse_assignments;
use boilersync_core::workflow::{self, PullOptions};
use boilersync_core::{Error, Manifest, NonInteractive, Prompter, ProjectNames, Scalar, TemplateLibrary};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn library() -> TemplateLibrary {
    TemplateLibrary::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("../../templates"))
}

fn presets(pairs: &[&str]) -> NonInteractive {
    NonInteractive::with_presets(parse_assignments(pairs).unwrap())
}

/// Fails the test if asked anything
struct Silent;

impl Prompter for Silent {
    fn project_names(&mut self, _default: &ProjectNames) -> boilersync_core::Result<ProjectNames> {
        panic!("names should come from the manifest");
    }

    fn variable(&mut self, name: &str, _label: &str) -> boilersync_core::Result<String> {
        panic!("unexpected prompt for {}", name);
    }
}

#[test]
fn test_library_lists_hello() {
    let templates = library().list().unwrap();
    assert!(templates.contains(&"hello".to_string()));
}

#[test]
fn test_init_hello_template() {
    let work = TempDir::new().unwrap();
    let target = work.path().join("my-app");

    let options = PullOptions::new(&target).template("hello");
    let outcome = workflow::init(&library(), &options, &mut presets(&["author=Ada"])).unwrap();

    assert_eq!(
        fs::read_to_string(target.join("README.md")).unwrap(),
        "Hello, My App!\n"
    );
    assert_eq!(
        fs::read_to_string(target.join("my_app.cfg")).unwrap(),
        "name=my_app\nauthor=Ada"
    );
    assert_eq!(
        fs::read_to_string(target.join("src").join("main.py")).unwrap(),
        "# My App\nprint(\"my_app by Ada\")\n"
    );
    assert_eq!(outcome.pull.report.file_count(), 3);

    let manifest = Manifest::load(&target).unwrap().unwrap();
    assert_eq!(manifest.template, "hello");
    assert_eq!(manifest.name_snake, "my_app");
    assert_eq!(manifest.name_pretty, "My App");
    assert_eq!(manifest.variables.len(), 1);
    assert_eq!(manifest.variables.get("author"), Some(&Scalar::from("Ada")));
}

#[test]
fn test_repull_restores_template_files_without_prompting() {
    let work = TempDir::new().unwrap();
    let target = work.path().join("my-app");
    let options = PullOptions::new(&target).template("hello");
    workflow::init(&library(), &options, &mut presets(&["author=Ada"])).unwrap();

    fs::write(target.join("README.md"), "edited").unwrap();
    fs::write(target.join("notes.txt"), "kept").unwrap();

    let outcome = workflow::pull(&library(), &PullOptions::new(&target), &mut Silent).unwrap();

    assert!(outcome.resynced);
    assert_eq!(
        fs::read_to_string(target.join("README.md")).unwrap(),
        "Hello, My App!\n"
    );
    assert_eq!(fs::read_to_string(target.join("notes.txt")).unwrap(), "kept");
}

#[test]
fn test_init_without_required_variable_fails() {
    let work = TempDir::new().unwrap();
    let target = work.path().join("my-app");

    let options = PullOptions::new(&target).template("hello");
    let err = workflow::init(&library(), &options, &mut NonInteractive::new()).unwrap_err();
    assert!(matches!(err, Error::MissingVariable { ref name } if name == "author"));
}

#[test]
fn test_nested_init_registers_child() {
    let work = TempDir::new().unwrap();
    let parent = work.path().join("platform");
    let child = parent.join("services").join("billing");

    let mut prompter = presets(&["author=Grace"]);
    workflow::init(&library(), &PullOptions::new(&parent).template("hello"), &mut prompter).unwrap();
    let outcome =
        workflow::init(&library(), &PullOptions::new(&child).template("hello"), &mut prompter).unwrap();

    assert!(outcome.parent.is_some());
    assert!(child.join("billing.cfg").exists());
    let manifest = Manifest::load(&parent).unwrap().unwrap();
    assert_eq!(manifest.children, vec!["services/billing"]);

    // Re-initializing the same child is refused; registration is unchanged
    let err = workflow::init(&library(), &PullOptions::new(&child).template("hello"), &mut prompter)
        .unwrap_err();
    assert!(matches!(err, Error::TargetNotEmpty { .. }));
    let manifest = Manifest::load(&parent).unwrap().unwrap();
    assert_eq!(manifest.children.len(), 1);
}
