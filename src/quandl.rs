//! Thin blocking client for the Quandl REST API.
//!
//! One client is built per run from the resolved settings; nothing here is
//! process-global. Every operation records the URL it requested so the CLI
//! can echo it with `--url`.

use std::io::Read;

use crate::cache::FileCache;
use crate::config::schema::{ConfigMap, ConfigValue, OutputFormat};
use crate::{Error, Result};

/// Quandl API base URL.
const QUANDL_API_BASE: &str = "https://www.quandl.com/api/v1";

/// User-Agent header sent with every request.
const USER_AGENT: &str = "qdl-cli";

/// Option names forwarded from `get` flags to the dataset query string.
pub const GET_OPTION_NAMES: &[&str] = &[
    "column",
    "rows",
    "trim_start",
    "trim_end",
    "sort_order",
    "collapse",
    "transformation",
    "exclude_headers",
    "exclude_data",
];

/// Query-string options for dataset requests, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pairs: Vec<(String, String)>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a query parameter.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    /// Collect recognized option keys out of a resolved config map.
    ///
    /// String values pass through as-is; boolean flags are emitted as
    /// `name=true` only when enabled.
    pub fn from_config(map: &ConfigMap, names: &[&str]) -> Self {
        let mut opts = Self::new();
        for name in names {
            let key = format!("--{}", name);
            match map.get(&key) {
                Some(ConfigValue::Str(value)) => opts.set(*name, value.clone()),
                Some(ConfigValue::Flag(true)) => opts.set(*name, "true"),
                _ => {}
            }
        }
        opts
    }

    fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }
}

/// Per-run Quandl client configuration.
pub struct Client {
    api_key: Option<String>,
    base_url: String,
    cache: Option<FileCache>,
    /// URL of the most recent request, for `--url` display.
    pub last_url: Option<String>,
}

impl Client {
    /// Build a client from the resolved api key and cache handler.
    pub fn new(api_key: Option<String>, cache: Option<FileCache>) -> Self {
        Self {
            api_key,
            base_url: QUANDL_API_BASE.to_string(),
            cache,
            last_url: None,
        }
    }

    /// Point the client at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch one symbol's data, e.g. `WIKI/AAPL`.
    pub fn get_symbol(
        &mut self,
        symbol: &str,
        format: OutputFormat,
        opts: &QueryOptions,
    ) -> Result<Vec<u8>> {
        self.request(self.symbol_url(symbol, format, opts))
    }

    /// Fetch several symbols in one multiset request.
    pub fn get_symbols(
        &mut self,
        symbols: &[String],
        format: OutputFormat,
        opts: &QueryOptions,
    ) -> Result<Vec<u8>> {
        self.request(self.multiset_url(symbols, format, opts))
    }

    /// List the datasets published by a source.
    pub fn get_list(
        &mut self,
        source: &str,
        format: OutputFormat,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<u8>> {
        self.request(self.list_url(source, format, page, per_page))
    }

    /// Full-text search over the dataset catalog.
    pub fn get_search(
        &mut self,
        query: &str,
        format: OutputFormat,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<u8>> {
        self.request(self.search_url(query, format, page, per_page))
    }

    fn symbol_url(&self, symbol: &str, format: OutputFormat, opts: &QueryOptions) -> String {
        let mut url = format!("{}/datasets/{}.{}", self.base_url, symbol, format);
        append_query(&mut url, opts.pairs());
        url
    }

    /// Multiset column addressing uses dots, so `WIKI/AAPL.4` becomes
    /// `WIKI.AAPL.4`.
    fn multiset_url(&self, symbols: &[String], format: OutputFormat, opts: &QueryOptions) -> String {
        let columns: Vec<String> = symbols.iter().map(|s| s.replace('/', ".")).collect();
        let mut url = format!(
            "{}/multisets.{}?columns={}",
            self.base_url,
            format,
            columns.join(",")
        );
        append_query(&mut url, opts.pairs());
        url
    }

    fn list_url(&self, source: &str, format: OutputFormat, page: u32, per_page: u32) -> String {
        format!(
            "{}/datasets.{}?query=*&source_code={}&per_page={}&page={}",
            self.base_url, format, source, per_page, page
        )
    }

    /// The catalog endpoint cannot produce csv; csv requests are served as
    /// json instead.
    fn search_url(&self, query: &str, format: OutputFormat, page: u32, per_page: u32) -> String {
        let format = match format {
            OutputFormat::Csv => OutputFormat::Json,
            other => other,
        };
        format!(
            "{}/datasets.{}?query={}&per_page={}&page={}",
            self.base_url,
            format,
            encode(query),
            per_page,
            page
        )
    }

    /// Issue the request, going through the cache when one is configured.
    ///
    /// The cache lookup key is the URL without the auth token, so entries
    /// survive key rotation and keys never reach the filesystem.
    fn request(&mut self, url: String) -> Result<Vec<u8>> {
        let full_url = self.authenticated(url.clone());
        self.last_url = Some(full_url.clone());

        match &self.cache {
            Some(cache) => cache.fetch(&url, || http_get(&full_url)),
            None => http_get(&full_url),
        }
    }

    fn authenticated(&self, mut url: String) -> String {
        if let Some(key) = &self.api_key {
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str("auth_token=");
            url.push_str(key);
        }
        url
    }
}

fn append_query(url: &mut String, pairs: &[(String, String)]) {
    for (name, value) in pairs {
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(name);
        url.push('=');
        url.push_str(&encode(value));
    }
}

/// Minimal query-value encoding; spaces are the only character users
/// routinely hit (search queries).
fn encode(value: &str) -> String {
    value.replace(' ', "+")
}

fn http_get(url: &str) -> Result<Vec<u8>> {
    let response = ureq::get(url)
        .set("User-Agent", USER_AGENT)
        .call()
        .map_err(|e| match e {
            ureq::Error::Status(code, resp) => {
                let body = resp.into_string().unwrap_or_default();
                Error::Api(format!("HTTP {}: {}", code, body))
            }
            e => Error::Api(e.to_string()),
        })?;

    let mut payload = Vec::new();
    response.into_reader().read_to_end(&mut payload)?;
    Ok(payload)
}
