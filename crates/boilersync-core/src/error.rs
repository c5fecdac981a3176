//! Error types for boilersync-core

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias using boilersync-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by template expansion and project bookkeeping
#[derive(Error, Debug)]
pub enum Error {
    /// Requested template id is absent from the library
    #[error("Template '{template}' not found in {}", library.display())]
    TemplateNotFound { template: String, library: PathBuf },

    /// Target directory already has content
    #[error("Target directory is not empty: {}", path.display())]
    TargetNotEmpty { path: PathBuf },

    /// Persisted manifest exists but cannot be read
    #[error("Manifest at {} is corrupt: {reason}", path.display())]
    ManifestCorrupt { path: PathBuf, reason: String },

    /// No manifest where one is required
    #[error("No .boilersync manifest found at {}", path.display())]
    ManifestNotFound { path: PathBuf },

    /// No project root above the starting directory
    #[error("Could not find .boilersync in {} or any parent directory", start.display())]
    ProjectNotFound { start: PathBuf },

    /// Same token bound twice with different values in one run
    #[error("Variable '{name}' is already set to {existing}, refusing to change it to {attempted}")]
    VariableConflict {
        name: String,
        existing: String,
        attempted: String,
    },

    /// Project names set twice with different values in one run
    #[error("Project names are already set to '{existing}', refusing to change them to '{attempted}'")]
    ContextReinitialized { existing: String, attempted: String },

    /// Normalizing a name produced nothing usable
    #[error("Invalid project name: '{raw}' contains no letters or digits")]
    InvalidName { raw: String },

    /// Interpolated path segment would escape or collapse the target tree
    #[error("Path segment '{template_segment}' expands to invalid name '{rendered}'")]
    InvalidPathSegment {
        template_segment: String,
        rendered: String,
    },

    /// A variable was needed but prompting is disabled
    #[error("No value provided for variable '{name}'")]
    MissingVariable { name: String },

    /// `KEY=VALUE` assignment that cannot be parsed
    #[error("Invalid variable assignment '{pair}', expected KEY=VALUE")]
    InvalidAssignment { pair: String },

    /// Working tree has uncommitted changes
    #[error("Uncommitted changes in {}; commit or stash them first, or pass --force", path.display())]
    DirtyWorkingTree { path: PathBuf },

    /// Directory is not inside a git work tree
    #[error("{} is not a git work tree; pass --force to overwrite anyway", path.display())]
    NotVersionControlled { path: PathBuf },

    /// Git invocation failed
    #[error("Git operation failed: {message}")]
    Git { message: String },

    /// External diff tool could not be launched
    #[error("Failed to launch diff tool '{tool}': {message}")]
    DiffTool { tool: String, message: String },

    /// User configuration file is malformed
    #[error("Invalid configuration in {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    /// IO error
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Prompt rendering failed
    #[error("Prompt failed: {0}")]
    Prompt(#[source] std::io::Error),
}

impl Error {
    /// Create a template not found error
    pub fn template_not_found(template: impl Into<String>, library: impl Into<PathBuf>) -> Self {
        Self::TemplateNotFound {
            template: template.into(),
            library: library.into(),
        }
    }

    /// Create a target not empty error
    pub fn target_not_empty(path: impl Into<PathBuf>) -> Self {
        Self::TargetNotEmpty { path: path.into() }
    }

    /// Create a manifest corrupt error
    pub fn manifest_corrupt(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ManifestCorrupt {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a manifest not found error
    pub fn manifest_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ManifestNotFound { path: path.into() }
    }

    /// Create a project not found error
    pub fn project_not_found(start: impl Into<PathBuf>) -> Self {
        Self::ProjectNotFound {
            start: start.into(),
        }
    }

    /// Create an invalid name error
    pub fn invalid_name(raw: impl Into<String>) -> Self {
        Self::InvalidName { raw: raw.into() }
    }

    /// Create a missing variable error
    pub fn missing_variable(name: impl Into<String>) -> Self {
        Self::MissingVariable { name: name.into() }
    }

    /// Create a git error
    pub fn git(message: impl Into<String>) -> Self {
        Self::Git {
            message: message.into(),
        }
    }

    /// Wrap an IO error with the path it concerns
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// Attach a path to `std::io::Result` failures
pub(crate) trait IoResultExt<T> {
    fn at(self, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn at(self, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|e| Error::io(path, e))
    }
}
