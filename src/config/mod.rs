//! Configuration for qdl.
//!
//! qdl merges command-line values with up to three JSON config files, all
//! named `qdl.json`:
//!
//! - the working directory
//! - the user's home directory
//! - the directory containing the executable
//!
//! ## Precedence
//!
//! Command line > working directory > home directory > executable directory
//! > built-in defaults.
//!
//! The merge rule is truthiness-over-falsiness: `false` and `null` behave
//! like absent keys and never shield a key from a lower-precedence source.
//! Defaults fill on absence only. See [`schema`] for the value rules and
//! [`resolver`] for the precedence chain.

pub mod resolver;
pub mod schema;

pub use resolver::{
    load_source_file, resolve, write_template, Locations, Resolved, TemplateOutcome, ValueSource,
    CONFIG_FILE_NAME, CONFIG_TEMPLATE, DEFAULTS, EXE_DIR_ENV, HOME_DIR_ENV,
};
pub use schema::{keys, ConfigMap, ConfigValue, OutputFormat, Settings};
