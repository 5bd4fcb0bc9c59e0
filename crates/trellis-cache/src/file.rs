//! File-based cache implementation.
//!
//! [`FileCache`] stores cache entries as files on disk, organized into buckets
//! (subdirectories). Each entry is a single file with a binary header followed
//! by the data:
//!
//! ```text
//! [stored_at: u64 LE][etag_len: u32 LE][etag bytes][data bytes]
//! ```
//!
//! On read, only the header is read first to validate expiry and etag. The
//! full data is read only on cache hit, avoiding unnecessary I/O on mismatch.
//!
//! On construction, [`FileCache`] validates a `VERSION` file in the cache root.
//! If the version mismatches or is missing, the entire cache directory is wiped
//! and recreated. This ensures stale caches from previous builds are never used.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::{Cache, CacheBucket};

/// File-based [`Cache`] rooted at a directory on disk.
///
/// Directory layout:
/// ```text
/// {root}/
/// +-- VERSION            # contains the cache version string
/// +-- tree/              # bucket "tree"
/// |   +-- snapshot       # cache entry
/// +-- nav/               # bucket "nav"
///     +-- ...
/// ```
pub struct FileCache {
    root: PathBuf,
    ttl: Option<Duration>,
}

impl FileCache {
    /// Create a new file-based cache at `root`, validating the cache version.
    ///
    /// If the `VERSION` file inside `root` does not match `version`, the entire
    /// cache directory is removed and recreated with the new version. Errors
    /// during validation are logged but never fatal.
    #[must_use]
    pub fn new(root: PathBuf, version: &str) -> Self {
        validate_version(&root, version);
        Self { root, ttl: None }
    }

    /// Set the entry time-to-live.
    ///
    /// Entries older than `ttl` are treated as cache misses on read.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

impl Cache for FileCache {
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket> {
        Box::new(FileCacheBucket {
            dir: self.root.join(name),
            ttl: self.ttl,
        })
    }
}

/// A single bucket backed by a directory on disk.
struct FileCacheBucket {
    dir: PathBuf,
    ttl: Option<Duration>,
}

impl CacheBucket for FileCacheBucket {
    fn get(&self, key: &str, etag: &str) -> Option<Vec<u8>> {
        let path = self.dir.join(key);
        let mut file = File::open(&path).ok()?;

        // Read stored-at timestamp (u64 LE, seconds since epoch)
        let mut ts_buf = [0u8; 8];
        file.read_exact(&mut ts_buf).ok()?;
        let stored_at = u64::from_le_bytes(ts_buf);

        if let Some(ttl) = self.ttl {
            let now = unix_now();
            if now.saturating_sub(stored_at) > ttl.as_secs() {
                return None;
            }
        }

        // Read etag length (u32 LE)
        let mut len_buf = [0u8; 4];
        file.read_exact(&mut len_buf).ok()?;
        let etag_len = u32::from_le_bytes(len_buf) as usize;

        // Read stored etag
        let mut stored_etag = vec![0u8; etag_len];
        file.read_exact(&mut stored_etag).ok()?;

        // Validate etag (skip if caller passes empty etag)
        if !etag.is_empty() && stored_etag != etag.as_bytes() {
            return None;
        }

        // Etag matches — read the data
        let mut data = Vec::new();
        file.read_to_end(&mut data).ok()?;
        Some(data)
    }

    fn set(&self, key: &str, etag: &str, value: &[u8]) {
        let path = self.dir.join(key);

        // Silently ignore errors — cache is optional
        let Some(parent) = path.parent() else {
            return;
        };
        if fs::create_dir_all(parent).is_err() {
            return;
        }

        let etag_bytes = etag.as_bytes();
        let mut buf = Vec::with_capacity(8 + 4 + etag_bytes.len() + value.len());
        buf.extend_from_slice(&unix_now().to_le_bytes());
        buf.extend_from_slice(&(etag_bytes.len() as u32).to_le_bytes());
        buf.extend_from_slice(etag_bytes);
        buf.extend_from_slice(value);

        let _ = fs::write(&path, &buf);
    }

    fn remove(&self, key: &str) {
        let path = self.dir.join(key);
        if path.exists()
            && let Err(e) = fs::remove_file(&path)
        {
            tracing::debug!(key = %key, error = %e, "Failed to remove cache entry");
        }
    }
}

/// Seconds since the Unix epoch.
fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

/// Validate the cache version, wiping the directory on mismatch.
fn validate_version(root: &Path, version: &str) {
    let version_file = root.join("VERSION");

    // Try to read the existing version
    match fs::read_to_string(&version_file) {
        Ok(stored) if stored == version => {
            tracing::debug!("cache version matches: {version}");
            return;
        }
        Ok(stored) => {
            tracing::info!(
                "cache version mismatch (stored={stored}, current={version}), wiping cache"
            );
        }
        Err(_) => {
            tracing::info!("no cache VERSION file found, initializing cache");
        }
    }

    // Wipe and recreate
    if root.exists()
        && let Err(e) = fs::remove_dir_all(root)
    {
        tracing::warn!("failed to remove cache directory: {e}");
    }
    if let Err(e) = fs::create_dir_all(root) {
        tracing::warn!("failed to create cache directory: {e}");
        return;
    }
    if let Err(e) = fs::write(&version_file, version) {
        tracing::warn!("failed to write cache VERSION file: {e}");
    }
}
