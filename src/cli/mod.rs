//! CLI argument definitions for qdl.
//!
//! Parsed arguments are converted into a [`ConfigMap`] and merged with the
//! config files by [`crate::config::resolver`]; flags that were not given on
//! the command line land in the map as `false`, which the merge treats like
//! an absent key.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::schema::{keys, ConfigMap};

/// Environment variable supplying the API key when `--apikey` is not given.
pub const APIKEY_ENV: &str = "QDL_APIKEY";

/// Build metadata baked in by build.rs.
const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("QDL_GIT_COMMIT"),
    " ",
    env!("QDL_BUILD_TIMESTAMP"),
    ")"
);

/// qdl - command line console for the Quandl financial data API.
///
/// Start with `qdl config init` to create a sample config file, then
/// `qdl get WIKI/AAPL` to fetch data.
#[derive(Parser, Debug)]
#[command(name = "qdl")]
#[command(author, version, long_version = LONG_VERSION)]
#[command(about = "Command line console for the Quandl financial data API", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Options recognized by every subcommand. Each maps to a config file key,
/// so any of them may also be set in qdl.json.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Send this api key with the request
    #[arg(short = 'k', long, global = true, env = APIKEY_ENV)]
    pub apikey: Option<String>,

    /// Output as csv, json or xml (default: csv)
    #[arg(short = 'f', long, global = true, value_parser = ["csv", "json", "xml"])]
    pub format: Option<String>,

    /// Save to file instead of stdout
    #[arg(short = 'o', long, global = true)]
    pub out: Option<PathBuf>,

    /// Show the request URL after the output
    #[arg(short = 'u', long, global = true)]
    pub url: bool,

    /// Show all registered arguments after the command
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    /// Cache directory (default: ./cache)
    #[arg(short = 'C', long, global = true)]
    pub cachedir: Option<PathBuf>,

    /// Cache life in minutes, 0 to disable (default: 240)
    #[arg(short = 'c', long, global = true)]
    pub cache: Option<String>,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download data for one or more symbols
    Get {
        /// Symbols to fetch, e.g. WIKI/AAPL
        #[arg(required = true)]
        symbols: Vec<String>,

        #[command(flatten)]
        query: GetOpts,
    },

    /// List the datasets available from a source
    List {
        /// Source code, e.g. WIKI
        source: String,

        #[command(flatten)]
        paging: PageOpts,
    },

    /// Search the dataset catalog
    Search {
        /// Search terms
        query: String,

        #[command(flatten)]
        paging: PageOpts,
    },

    /// Configuration file management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Dataset query options for `get`
#[derive(Args, Debug, Clone, Default)]
pub struct GetOpts {
    /// Request data column <N> only
    #[arg(short = 'n', long)]
    pub column: Option<String>,

    /// Request <N> rows
    #[arg(short = 'r', long)]
    pub rows: Option<String>,

    /// Start data at <DATE>, format yyyy-mm-dd
    #[arg(short = 't', long, value_parser = parse_date)]
    pub trim_start: Option<String>,

    /// End data at <DATE>, format yyyy-mm-dd
    #[arg(short = 'T', long, value_parser = parse_date)]
    pub trim_end: Option<String>,

    /// Set sort order to asc or desc
    #[arg(short = 's', long, value_parser = ["asc", "desc"])]
    pub sort_order: Option<String>,

    /// Exclude CSV headers
    #[arg(short = 'x', long)]
    pub exclude_headers: bool,

    /// Get metadata only (json/xml format)
    #[arg(long)]
    pub exclude_data: bool,

    /// Set sampling frequency
    #[arg(long, value_parser = ["none", "daily", "weekly", "monthly", "quarterly", "annual"])]
    pub collapse: Option<String>,

    /// Enable data calculation
    #[arg(long, value_parser = ["diff", "rdiff", "cumul", "normalize"])]
    pub transformation: Option<String>,
}

/// Paging options for `list` and `search`
#[derive(Args, Debug, Clone, Default)]
pub struct PageOpts {
    /// Start at page <N> (default: 1)
    #[arg(short = 'p', long)]
    pub page: Option<String>,

    /// Show <N> results per page (default: 300)
    #[arg(short = 'P', long)]
    pub per_page: Option<String>,
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Create a sample qdl.json in the working directory
    Init,

    /// Show config file locations and whether each exists
    Show,
}

/// Validate a yyyy-mm-dd date argument, keeping it as a string.
fn parse_date(s: &str) -> Result<String, String> {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|_| s.to_string())
        .map_err(|_| format!("invalid date '{}': expected yyyy-mm-dd", s))
}

impl Cli {
    /// Convert the parsed invocation into the highest-precedence ConfigMap.
    pub fn to_config_map(&self) -> ConfigMap {
        let mut map = ConfigMap::new();
        self.global.apply_to(&mut map);
        match &self.command {
            Some(Commands::Get { query, .. }) => query.apply_to(&mut map),
            Some(Commands::List { paging, .. }) | Some(Commands::Search { paging, .. }) => {
                paging.apply_to(&mut map)
            }
            _ => {}
        }
        map
    }
}

impl GlobalOpts {
    fn apply_to(&self, map: &mut ConfigMap) {
        if let Some(apikey) = &self.apikey {
            map.set_str(keys::APIKEY, apikey);
        }
        if let Some(format) = &self.format {
            map.set_str(keys::FORMAT, format);
        }
        if let Some(out) = &self.out {
            map.set_str(keys::OUT, out.to_string_lossy());
        }
        if let Some(cachedir) = &self.cachedir {
            map.set_str(keys::CACHEDIR, cachedir.to_string_lossy());
        }
        if let Some(cache) = &self.cache {
            map.set_str(keys::CACHE, cache);
        }
        map.set_flag(keys::URL, self.url);
        map.set_flag(keys::DEBUG, self.debug);
    }
}

impl GetOpts {
    fn apply_to(&self, map: &mut ConfigMap) {
        if let Some(column) = &self.column {
            map.set_str(keys::COLUMN, column);
        }
        if let Some(rows) = &self.rows {
            map.set_str(keys::ROWS, rows);
        }
        if let Some(trim_start) = &self.trim_start {
            map.set_str(keys::TRIM_START, trim_start);
        }
        if let Some(trim_end) = &self.trim_end {
            map.set_str(keys::TRIM_END, trim_end);
        }
        if let Some(sort_order) = &self.sort_order {
            map.set_str(keys::SORT_ORDER, sort_order);
        }
        if let Some(collapse) = &self.collapse {
            map.set_str(keys::COLLAPSE, collapse);
        }
        if let Some(transformation) = &self.transformation {
            map.set_str(keys::TRANSFORMATION, transformation);
        }
        map.set_flag(keys::EXCLUDE_HEADERS, self.exclude_headers);
        map.set_flag(keys::EXCLUDE_DATA, self.exclude_data);
    }
}

impl PageOpts {
    fn apply_to(&self, map: &mut ConfigMap) {
        if let Some(page) = &self.page {
            map.set_str(keys::PAGE, page);
        }
        if let Some(per_page) = &self.per_page {
            map.set_str(keys::PER_PAGE, per_page);
        }
    }
}
