//! Disk-backed response cache with a minutes-based time-to-live.
//!
//! One file per distinct request signature, named by the hex digest of the
//! lookup key. Freshness is judged from the entry file's modification time;
//! stale entries are overwritten in place and never purged. The cache is a
//! performance layer only: a failed entry write never discards a payload
//! that was already produced.
//!
//! Concurrent invocations sharing a cache directory are not serialized here;
//! callers that need that must provide their own external locking.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use sha2::{Digest, Sha256};

use crate::Result;

/// Digest hex characters used for entry file names.
const ENTRY_NAME_LEN: usize = 24;

/// A cache handler bound to a directory and a time-to-live.
///
/// Construction returns `None` when the configured ttl disables caching, so
/// callers hold an `Option<FileCache>` and skip the cache entirely for the
/// run when it is off.
#[derive(Debug)]
pub struct FileCache {
    dir: PathBuf,
    ttl: Duration,
}

impl FileCache {
    /// Build a cache handler for `dir` with a ttl in minutes.
    ///
    /// A ttl of zero or less (or NaN) is the explicit "off" switch, not an
    /// error: the result is `None` and no entry is ever read or written.
    pub fn new(dir: impl Into<PathBuf>, ttl_minutes: f64) -> Option<Self> {
        if !(ttl_minutes > 0.0) {
            return None;
        }
        // Absurdly large ttls saturate instead of overflowing.
        let ttl = Duration::try_from_secs_f64(ttl_minutes * 60.0).unwrap_or(Duration::MAX);
        Some(Self {
            dir: dir.into(),
            ttl,
        })
    }

    /// The entry file holding `key`'s payload.
    pub fn entry_path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        let hex = format!("{:x}", digest);
        self.dir.join(&hex[..ENTRY_NAME_LEN])
    }

    /// Serve `key` from disk when a fresh entry exists, otherwise invoke
    /// `producer` and store its payload.
    ///
    /// Producer failures propagate to the caller and leave no entry behind.
    /// A failed entry write is swallowed: the freshly produced payload is
    /// still returned.
    pub fn fetch<F>(&self, key: &str, producer: F) -> Result<Vec<u8>>
    where
        F: FnOnce() -> Result<Vec<u8>>,
    {
        let path = self.entry_path(key);
        if let Some(payload) = self.read_fresh(&path)? {
            return Ok(payload);
        }

        let payload = producer()?;
        let _ = self.store(&path, &payload);
        Ok(payload)
    }

    /// Read the entry at `path` if it exists and is younger than the ttl.
    fn read_fresh(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        let meta = match fs::metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        // A modification time in the future (clock skew) counts as age zero.
        let age = meta.modified()?.elapsed().unwrap_or(Duration::ZERO);
        if age < self.ttl {
            Ok(Some(fs::read(path)?))
        } else {
            Ok(None)
        }
    }

    fn store(&self, path: &Path, payload: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(path, payload)?;
        Ok(())
    }
}
