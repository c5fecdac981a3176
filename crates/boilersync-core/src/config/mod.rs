//! User settings: template library location and diff tool
//!
//! Resolution order for each setting: environment variable, then the YAML
//! user config at `~/.boilersync_config`, then the built-in default. Path
//! settings expand a leading `~` and `$VAR` / `${VAR}` references.

use crate::error::{Error, Result};
use crate::templates::TemplateLibrary;
use serde::Deserialize;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Environment variable overriding the template library location
pub const TEMPLATE_DIR_ENV: &str = "BOILERSYNC_TEMPLATE_DIR";

/// Environment variable overriding the external diff tool
pub const DIFF_TOOL_ENV: &str = "BOILERSYNC_DIFF_TOOL";

/// Environment variable pinning the project root instead of searching upward
pub const ROOT_DIR_ENV: &str = "BOILERSYNC_ROOT_DIR";

/// User config file name, relative to the home directory
pub const USER_CONFIG_FILE: &str = ".boilersync_config";

const DEFAULT_TEMPLATE_DIR: &str = "boilerplate";
const DEFAULT_DIFF_TOOL: &str = "github";

/// Contents of the user config file; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UserConfig {
    /// Template library root; `~` and environment variables are expanded
    pub template_dir: Option<PathBuf>,

    /// Command launched by `diff` with the staging directory as its argument
    pub diff_tool: Option<String>,
}

impl UserConfig {
    /// Read the config file; a missing or empty file yields defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::io(path, e)),
        };

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Effective settings for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub template_dir: PathBuf,
    pub diff_tool: String,
    /// Fixed project root, bypassing the upward manifest search
    pub root_override: Option<PathBuf>,
}

impl Settings {
    /// Resolve settings from the process environment and the user's home directory
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir();
        let user = match &home {
            Some(home) => UserConfig::load(&home.join(USER_CONFIG_FILE))?,
            None => UserConfig::default(),
        };
        Ok(Self::resolve(user, home.as_deref(), |key| std::env::var_os(key)))
    }

    /// Combine user config, home directory and environment lookups
    pub fn resolve<F>(user: UserConfig, home: Option<&Path>, env: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let non_empty = |key: &str| env(key).filter(|value| !value.is_empty());
        let expand = |path: PathBuf| expand_path(&path, home, &env);

        let template_dir = non_empty(TEMPLATE_DIR_ENV)
            .map(PathBuf::from)
            .or(user.template_dir)
            .map(expand)
            .unwrap_or_else(|| match home {
                Some(home) => home.join(DEFAULT_TEMPLATE_DIR),
                None => PathBuf::from(DEFAULT_TEMPLATE_DIR),
            });

        let diff_tool = non_empty(DIFF_TOOL_ENV)
            .map(|tool| tool.to_string_lossy().into_owned())
            .or(user.diff_tool)
            .unwrap_or_else(|| DEFAULT_DIFF_TOOL.to_string());

        let root_override = non_empty(ROOT_DIR_ENV).map(PathBuf::from).map(expand);

        Self {
            template_dir,
            diff_tool,
            root_override,
        }
    }

    /// Replace the template library location (e.g. from a CLI flag)
    pub fn with_template_dir(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir {
            self.template_dir = dir;
        }
        self
    }

    pub fn library(&self) -> TemplateLibrary {
        TemplateLibrary::new(&self.template_dir)
    }
}

/// Expand `~` to `home` and `$VAR` through `env`; unknown variables are kept
fn expand_path<F>(path: &Path, home: Option<&Path>, env: &F) -> PathBuf
where
    F: Fn(&str) -> Option<OsString>,
{
    let home = home.map(|home| home.to_string_lossy().into_owned());
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full_with_context_no_errors(
        &*raw,
        || home.clone(),
        |var: &str| {
            env(var)
                .and_then(|value| value.into_string().ok())
                .or_else(|| if var == "HOME" { home.clone() } else { None })
        },
    );
    PathBuf::from(expanded.into_owned())
}
