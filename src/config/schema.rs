//! On-disk configuration schema and merge rules.
//!
//! Config files are flat JSON objects mapping long option names to values:
//!
//! ```json
//! {
//!     "--apikey": "YOUR_KEY",
//!     "--trim_start": "2014-01-01",
//!     "--url": true
//! }
//! ```
//!
//! Values are strings for valued options and booleans for flags. For merge
//! purposes, `false` and `null` are interchangeable with absence: neither
//! shields a key from a lower-precedence source. See [`ConfigValue::is_truthy`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Well-known option keys, as they appear in config files and the merged map.
pub mod keys {
    pub const APIKEY: &str = "--apikey";
    pub const FORMAT: &str = "--format";
    pub const OUT: &str = "--out";
    pub const URL: &str = "--url";
    pub const DEBUG: &str = "--debug";
    pub const CACHEDIR: &str = "--cachedir";
    pub const CACHE: &str = "--cache";
    pub const PAGE: &str = "--page";
    pub const PER_PAGE: &str = "--per_page";
    pub const COLUMN: &str = "--column";
    pub const ROWS: &str = "--rows";
    pub const TRIM_START: &str = "--trim_start";
    pub const TRIM_END: &str = "--trim_end";
    pub const SORT_ORDER: &str = "--sort_order";
    pub const EXCLUDE_HEADERS: &str = "--exclude_headers";
    pub const EXCLUDE_DATA: &str = "--exclude_data";
    pub const COLLAPSE: &str = "--collapse";
    pub const TRANSFORMATION: &str = "--transformation";
}

/// A single configuration value.
///
/// `Null` models an explicit JSON `null` in a config file; it behaves like
/// the key being absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// Boolean flag value
    Flag(bool),
    /// String option value
    Str(String),
    /// Explicit JSON null
    Null,
}

impl ConfigValue {
    /// Merge truthiness: every value is truthy except `false` and `null`.
    ///
    /// A non-truthy value never blocks a lower-precedence source from
    /// supplying the key, so a user cannot force a flag to `false` to
    /// override a config file's `true`. Downstream behavior depends on
    /// this (notably enabling `--url` from a config file).
    pub fn is_truthy(&self) -> bool {
        !matches!(self, ConfigValue::Flag(false) | ConfigValue::Null)
    }

    /// The string content, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Flag(b) => write!(f, "{}", b),
            ConfigValue::Str(s) => write!(f, "{}", s),
            ConfigValue::Null => write!(f, "null"),
        }
    }
}

/// Mapping of option name to value.
///
/// One `ConfigMap` is parsed per source (command line, each config file) and
/// they are merged in precedence order with [`ConfigMap::adopt`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigMap(BTreeMap<String, ConfigValue>);

impl ConfigMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a value by option key.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.0.get(key)
    }

    /// Insert a value, replacing any existing one.
    pub fn set(&mut self, key: impl Into<String>, value: ConfigValue) {
        self.0.insert(key.into(), value);
    }

    /// Insert a string value.
    pub fn set_str(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.set(key, ConfigValue::Str(value.into()));
    }

    /// Insert a flag value.
    pub fn set_flag(&mut self, key: impl Into<String>, value: bool) {
        self.set(key, ConfigValue::Flag(value));
    }

    /// The string content of `key`'s value, if present and a string.
    pub fn str_value(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ConfigValue::as_str)
    }

    /// Whether `key` is effectively enabled as a flag.
    ///
    /// Any truthy value enables the flag, so `"--url": true` and
    /// `"--url": "yes"` both count. Absent, `false` and `null` do not.
    pub fn flag_value(&self, key: &str) -> bool {
        self.get(key).is_some_and(ConfigValue::is_truthy)
    }

    /// Truthiness-over-falsiness merge: adopt `lower`'s value for every key
    /// that is absent, `null` or `false` here. Keys holding a truthy value
    /// are never overridden.
    ///
    /// Returns the keys that were adopted, so callers can track provenance.
    pub fn adopt(&mut self, lower: ConfigMap) -> Vec<String> {
        let mut adopted = Vec::new();
        for (key, value) in lower.0 {
            let shielded = self.0.get(&key).is_some_and(ConfigValue::is_truthy);
            if !shielded {
                self.0.insert(key.clone(), value);
                adopted.push(key);
            }
        }
        adopted
    }

    /// Absence-only default fill: set `key` to `value` only when the key is
    /// missing entirely. An explicit `false` or `null` left over after the
    /// merge is kept as-is.
    ///
    /// Returns whether the default was applied.
    pub fn fill(&mut self, key: &str, value: &str) -> bool {
        if self.0.contains_key(key) {
            return false;
        }
        self.set_str(key, value);
        true
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConfigValue)> {
        self.0.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Payload output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Json,
    Xml,
}

impl OutputFormat {
    /// The format name as it appears in URLs and config values.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Xml => "xml",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "xml" => Ok(OutputFormat::Xml),
            other => Err(Error::InvalidValue {
                key: keys::FORMAT.to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Typed view over a fully resolved [`ConfigMap`].
///
/// Extraction assumes the map has been through default fill, so the five
/// defaulted keys are present unless a config file replaced them with a
/// non-string value.
#[derive(Debug, Clone)]
pub struct Settings {
    /// API key sent as `auth_token`, if configured
    pub apikey: Option<String>,
    /// Payload format requested from the API
    pub format: OutputFormat,
    /// Output file; stdout when unset
    pub out: Option<PathBuf>,
    /// Echo the request URL after output
    pub show_url: bool,
    /// Dump all registered arguments after the command
    pub debug: bool,
    /// Cache directory
    pub cache_dir: PathBuf,
    /// Cache life in minutes; zero or negative disables caching
    pub cache_minutes: f64,
    /// Result page for list/search
    pub page: u32,
    /// Results per page for list/search
    pub per_page: u32,
}

impl Settings {
    /// Extract typed settings from a resolved map.
    pub fn from_map(map: &ConfigMap) -> Result<Self> {
        Ok(Self {
            apikey: map.str_value(keys::APIKEY).map(str::to_string),
            format: required(map, keys::FORMAT)?.parse()?,
            out: map.str_value(keys::OUT).map(PathBuf::from),
            show_url: map.flag_value(keys::URL),
            debug: map.flag_value(keys::DEBUG),
            cache_dir: PathBuf::from(required(map, keys::CACHEDIR)?),
            cache_minutes: parsed(map, keys::CACHE)?,
            page: parsed(map, keys::PAGE)?,
            per_page: parsed(map, keys::PER_PAGE)?,
        })
    }
}

fn required<'a>(map: &'a ConfigMap, key: &str) -> Result<&'a str> {
    map.str_value(key)
        .ok_or_else(|| Error::Other(format!("missing value for {}", key)))
}

fn parsed<T: FromStr>(map: &ConfigMap, key: &str) -> Result<T> {
    let raw = required(map, key)?;
    raw.parse().map_err(|_| Error::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_from_json(json: &str) -> ConfigMap {
        serde_json::from_str(json).unwrap()
    }

    // ==================== ConfigValue Tests ====================

    #[test]
    fn test_deserialize_mixed_values() {
        let map = map_from_json(r#"{"--apikey": "k", "--url": true, "--rows": null}"#);

        assert_eq!(map.get(keys::APIKEY), Some(&ConfigValue::Str("k".into())));
        assert_eq!(map.get(keys::URL), Some(&ConfigValue::Flag(true)));
        assert_eq!(map.get(keys::ROWS), Some(&ConfigValue::Null));
    }

    #[test]
    fn test_truthiness() {
        assert!(ConfigValue::Str("csv".into()).is_truthy());
        assert!(ConfigValue::Str(String::new()).is_truthy());
        assert!(ConfigValue::Flag(true).is_truthy());
        assert!(!ConfigValue::Flag(false).is_truthy());
        assert!(!ConfigValue::Null.is_truthy());
    }

    // ==================== Merge Tests ====================

    #[test]
    fn test_adopt_truthy_value_wins() {
        let mut higher = map_from_json(r#"{"--format": "json"}"#);
        let lower = map_from_json(r#"{"--format": "xml", "--page": "2"}"#);

        let adopted = higher.adopt(lower);

        assert_eq!(higher.str_value(keys::FORMAT), Some("json"));
        assert_eq!(higher.str_value(keys::PAGE), Some("2"));
        assert_eq!(adopted, vec![keys::PAGE.to_string()]);
    }

    #[test]
    fn test_adopt_false_does_not_shield() {
        let mut higher = map_from_json(r#"{"--url": false}"#);
        let lower = map_from_json(r#"{"--url": true}"#);

        higher.adopt(lower);

        assert_eq!(higher.get(keys::URL), Some(&ConfigValue::Flag(true)));
    }

    #[test]
    fn test_adopt_null_does_not_shield() {
        let mut higher = map_from_json(r#"{"--format": null}"#);
        let lower = map_from_json(r#"{"--format": "json"}"#);

        higher.adopt(lower);

        assert_eq!(higher.str_value(keys::FORMAT), Some("json"));
    }

    #[test]
    fn test_adopt_false_over_false_takes_lower() {
        let mut higher = map_from_json(r#"{"--url": false}"#);
        let lower = map_from_json(r#"{"--url": false}"#);

        higher.adopt(lower);

        assert_eq!(higher.get(keys::URL), Some(&ConfigValue::Flag(false)));
    }

    // ==================== Default Fill Tests ====================

    #[test]
    fn test_fill_absent_key() {
        let mut map = ConfigMap::new();

        assert!(map.fill(keys::FORMAT, "csv"));
        assert_eq!(map.str_value(keys::FORMAT), Some("csv"));
    }

    #[test]
    fn test_fill_present_key_untouched() {
        let mut map = map_from_json(r#"{"--format": "json"}"#);

        assert!(!map.fill(keys::FORMAT, "csv"));
        assert_eq!(map.str_value(keys::FORMAT), Some("json"));
    }

    /// Pins the default-fill policy: fill triggers on absence only, so an
    /// explicit `false` survives the fill step.
    #[test]
    fn test_fill_keeps_explicit_false() {
        let mut map = map_from_json(r#"{"--cache": false}"#);

        assert!(!map.fill(keys::CACHE, "240"));
        assert_eq!(map.get(keys::CACHE), Some(&ConfigValue::Flag(false)));
    }

    // ==================== OutputFormat Tests ====================

    #[test]
    fn test_output_format_round_trip() {
        for (name, format) in [
            ("csv", OutputFormat::Csv),
            ("json", OutputFormat::Json),
            ("xml", OutputFormat::Xml),
        ] {
            assert_eq!(name.parse::<OutputFormat>().unwrap(), format);
            assert_eq!(format.to_string(), name);
        }
    }

    #[test]
    fn test_output_format_rejects_unknown() {
        let err = "yaml".parse::<OutputFormat>().unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }));
    }

    // ==================== Settings Tests ====================

    fn resolved_map() -> ConfigMap {
        map_from_json(
            r#"{
                "--apikey": "SECRET",
                "--format": "json",
                "--cachedir": "./cache",
                "--cache": "240",
                "--page": "1",
                "--per_page": "300",
                "--url": true
            }"#,
        )
    }

    #[test]
    fn test_settings_from_map() {
        let settings = Settings::from_map(&resolved_map()).unwrap();

        assert_eq!(settings.apikey.as_deref(), Some("SECRET"));
        assert_eq!(settings.format, OutputFormat::Json);
        assert!(settings.out.is_none());
        assert!(settings.show_url);
        assert!(!settings.debug);
        assert_eq!(settings.cache_dir, PathBuf::from("./cache"));
        assert_eq!(settings.cache_minutes, 240.0);
        assert_eq!(settings.page, 1);
        assert_eq!(settings.per_page, 300);
    }

    #[test]
    fn test_settings_invalid_number_names_key() {
        let mut map = resolved_map();
        map.set_str(keys::PAGE, "first");

        let err = Settings::from_map(&map).unwrap_err();
        match err {
            Error::InvalidValue { key, value } => {
                assert_eq!(key, keys::PAGE);
                assert_eq!(value, "first");
            }
            other => panic!("Expected InvalidValue, got: {:?}", other),
        }
    }

    #[test]
    fn test_settings_fractional_cache_minutes() {
        let mut map = resolved_map();
        map.set_str(keys::CACHE, "0.5");

        let settings = Settings::from_map(&map).unwrap();
        assert_eq!(settings.cache_minutes, 0.5);
    }
}
