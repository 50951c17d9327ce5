//! Layered precedence resolution for qdl configuration.
//!
//! This module provides a single entry point for merging command-line values
//! with the three well-known config file locations and the built-in defaults.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. Command-line flags
//! 2. `qdl.json` in the working directory
//! 3. `qdl.json` in the user's home directory
//! 4. `qdl.json` next to the executable
//! 5. Built-in defaults
//!
//! The merge rule is truthiness-over-falsiness: a key holding `false` or
//! `null` in a higher-precedence source is treated like an absent key, so a
//! lower-precedence source may still supply it. Default fill, by contrast,
//! triggers on absence only: an explicit `false` that survived the merge is
//! kept (see [`crate::config::schema::ConfigMap::fill`]).

use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::schema::{keys, ConfigMap, Settings};
use crate::{Error, Result};

/// File name looked up in each config location.
pub const CONFIG_FILE_NAME: &str = "qdl.json";

/// Environment variable overriding the home directory used for config lookup.
/// Primarily for test isolation.
pub const HOME_DIR_ENV: &str = "QDL_HOME_DIR";

/// Environment variable overriding the executable directory used for config
/// lookup. Primarily for test isolation.
pub const EXE_DIR_ENV: &str = "QDL_EXE_DIR";

/// Default values applied after the merge, in fill order.
pub const DEFAULTS: &[(&str, &str)] = &[
    (keys::CACHEDIR, "./cache"),
    (keys::CACHE, "240"),
    (keys::PAGE, "1"),
    (keys::PER_PAGE, "300"),
    (keys::FORMAT, "csv"),
];

/// Sample config written by `qdl config init`.
pub const CONFIG_TEMPLATE: &str = r#"{
    "--apikey": "YOUR_KEY",
    "--trim_start": "2014-01-01",
    "--per_page": "10",
    "--url": true
}
"#;

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from a command-line flag
    CliFlag,
    /// Value from qdl.json in the working directory
    WorkingDir,
    /// Value from qdl.json in the home directory
    HomeDir,
    /// Value from qdl.json next to the executable
    ExecutableDir,
    /// Built-in default value
    Default,
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::WorkingDir => write!(f, "working-dir"),
            ValueSource::HomeDir => write!(f, "home-dir"),
            ValueSource::ExecutableDir => write!(f, "exe-dir"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// The three well-known config file locations.
#[derive(Debug, Clone)]
pub struct Locations {
    /// `<cwd>/qdl.json`
    pub working: PathBuf,
    /// `<home>/qdl.json`
    pub home: PathBuf,
    /// `<executable dir>/qdl.json`
    pub executable: PathBuf,
}

impl Locations {
    /// Derive the standard locations for this process.
    ///
    /// Failure to determine any of the three directories is fatal. The
    /// `QDL_HOME_DIR` and `QDL_EXE_DIR` environment variables override the
    /// home and executable directories respectively.
    pub fn discover() -> Result<Self> {
        let working = env::current_dir()?;

        let home = match env::var_os(HOME_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::home_dir().ok_or(Error::NoHomeDir)?,
        };

        let executable = match env::var_os(EXE_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => env::current_exe()?
                .parent()
                .ok_or(Error::NoExeDir)?
                .to_path_buf(),
        };

        Ok(Self::in_dirs(&working, &home, &executable))
    }

    /// Build locations from explicit directories.
    pub fn in_dirs(working: &Path, home: &Path, executable: &Path) -> Self {
        Self {
            working: working.join(CONFIG_FILE_NAME),
            home: home.join(CONFIG_FILE_NAME),
            executable: executable.join(CONFIG_FILE_NAME),
        }
    }
}

/// A fully resolved configuration with per-key provenance.
#[derive(Debug, Clone)]
pub struct Resolved {
    /// Merged and default-filled values
    pub values: ConfigMap,
    origins: BTreeMap<String, ValueSource>,
}

impl Resolved {
    /// Where the value for `key` came from.
    pub fn source_of(&self, key: &str) -> Option<ValueSource> {
        self.origins.get(key).copied()
    }

    /// Extract typed settings from the resolved values.
    pub fn settings(&self) -> Result<Settings> {
        Settings::from_map(&self.values)
    }
}

/// Resolve configuration with the full precedence chain.
///
/// Starting from the command-line values, each available config file is
/// merged in precedence order, then the built-in defaults fill any keys
/// still absent. Source files are never written to.
pub fn resolve(invocation: ConfigMap, locations: &Locations) -> Result<Resolved> {
    let mut origins: BTreeMap<String, ValueSource> = invocation
        .iter()
        .map(|(key, _)| (key.clone(), ValueSource::CliFlag))
        .collect();
    let mut values = invocation;

    let sources = [
        (&locations.working, ValueSource::WorkingDir),
        (&locations.home, ValueSource::HomeDir),
        (&locations.executable, ValueSource::ExecutableDir),
    ];
    for (path, source) in sources {
        if let Some(map) = load_source_file(path)? {
            for key in values.adopt(map) {
                origins.insert(key, source);
            }
        }
    }

    for (key, default) in DEFAULTS {
        if values.fill(key, default) {
            origins.insert(key.to_string(), ValueSource::Default);
        }
    }

    Ok(Resolved { values, origins })
}

/// Load one config source file.
///
/// A missing file is not an error and contributes nothing to the merge. A
/// file that exists but does not parse as a JSON object is fatal.
pub fn load_source_file(path: &Path) -> Result<Option<ConfigMap>> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    match serde_json::from_slice::<ConfigMap>(&data) {
        Ok(map) => Ok(Some(map)),
        Err(source) => Err(Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Outcome of [`write_template`], reported to the user rather than raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateOutcome {
    /// A fresh template was written
    Created,
    /// A config file already exists at the working-directory location
    AlreadyExists,
    /// The write failed (permissions, disk)
    Failed(String),
}

/// Write the sample config template at the working-directory location.
///
/// An existing file is left untouched. None of the outcomes is fatal; the
/// caller displays the result.
pub fn write_template(locations: &Locations) -> TemplateOutcome {
    if locations.working.exists() {
        return TemplateOutcome::AlreadyExists;
    }
    match fs::write(&locations.working, CONFIG_TEMPLATE) {
        Ok(()) => TemplateOutcome::Created,
        Err(e) => TemplateOutcome::Failed(e.to_string()),
    }
}
