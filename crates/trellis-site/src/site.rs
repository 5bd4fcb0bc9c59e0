//! Site tree loading with cached snapshots.
//!
//! [`SiteTree`] owns the current [`PageTree`] snapshot and rebuilds it from
//! the content source on demand. Snapshots are published whole: a rebuild
//! assembles the complete tree before a single atomic swap, so readers never
//! observe a partially built tree.
//!
//! # Thread Safety
//!
//! - `snapshot()` returns `Arc<PageTree>` with minimal locking (just an Arc
//!   clone)
//! - `tree()` uses double-checked locking so concurrent callers trigger at
//!   most one build
//! - `invalidate()` is lock-free (atomic flag)
//!
//! A failed build leaves the previous snapshot in place and records the
//! error for the status surface; callers make exactly one build attempt per
//! invalidation, never a retry loop.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use trellis_cache::{Cache, CacheBucket, CacheBucketExt, FileCache, NullCache};
use trellis_content::{Page, scan_content_root};

use crate::tree::{PageTree, TreeBuilder};

/// Cache key for the tree snapshot within the tree bucket.
const TREE_KEY: &str = "snapshot";

/// Configuration for [`SiteTree`].
#[derive(Clone, Debug)]
pub struct SiteTreeConfig {
    /// Content root directory.
    pub source_dir: PathBuf,
    /// Content file extension without the dot.
    pub extension: String,
    /// Cache directory. `None` disables caching.
    pub cache_dir: Option<PathBuf>,
    /// Application version for cache invalidation.
    pub version: String,
    /// Cache entry lifetime in seconds. `None` means entries never expire.
    pub ttl_secs: Option<u64>,
}

impl Default for SiteTreeConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::new(),
            extension: "md".to_owned(),
            cache_dir: None,
            version: String::new(),
            ttl_secs: None,
        }
    }
}

/// Cache format for tree snapshots.
///
/// Every field is required: an entry missing any top-level key fails
/// deserialization and counts as a cache miss. A partially shaped entry
/// never produces a partial tree.
#[derive(Serialize, Deserialize)]
struct CachedTree {
    pages: HashMap<String, Page>,
    roots: Vec<String>,
    built_at: u64,
}

impl From<&PageTree> for CachedTree {
    fn from(tree: &PageTree) -> Self {
        Self {
            pages: tree.pages().clone(),
            roots: tree.root_routes().to_vec(),
            built_at: tree.built_at(),
        }
    }
}

impl From<CachedTree> for PageTree {
    fn from(cached: CachedTree) -> Self {
        PageTree::new(cached.pages, cached.roots, cached.built_at)
    }
}

/// Tree statistics for the status report.
#[derive(Clone, Debug, Serialize)]
pub struct TreeStats {
    /// Total page count.
    pub pages: usize,
    /// Root page count.
    pub roots: usize,
    /// Whether the current snapshot came from a successful build.
    pub built: bool,
    /// Unix timestamp of the last successful build.
    pub built_at: u64,
    /// Message of the last failed build, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Site tree service with cached, atomically swapped snapshots.
pub struct SiteTree {
    source_dir: PathBuf,
    extension: String,
    cache: Arc<dyn Cache>,
    tree_bucket: Box<dyn CacheBucket>,
    /// Mutex serializing build operations.
    build_lock: Mutex<()>,
    /// Current snapshot (atomically swappable).
    current: RwLock<Arc<PageTree>>,
    /// Snapshot validity flag.
    valid: AtomicBool,
    /// Message of the last failed build.
    last_error: RwLock<Option<String>>,
}

impl SiteTree {
    /// Create a new site tree service.
    ///
    /// The initial snapshot is empty and unbuilt; the first `tree()` call
    /// performs the build.
    #[must_use]
    pub fn new(config: SiteTreeConfig) -> Self {
        let cache: Arc<dyn Cache> = match &config.cache_dir {
            Some(dir) => {
                let mut file_cache = FileCache::new(dir.clone(), &config.version);
                if let Some(secs) = config.ttl_secs {
                    file_cache = file_cache.with_ttl(Duration::from_secs(secs));
                }
                Arc::new(file_cache)
            }
            None => Arc::new(NullCache),
        };
        let tree_bucket = cache.bucket("tree");

        Self {
            source_dir: config.source_dir,
            extension: config.extension,
            cache,
            tree_bucket,
            build_lock: Mutex::new(()),
            current: RwLock::new(Arc::new(PageTree::default())),
            valid: AtomicBool::new(false),
            last_error: RwLock::new(None),
        }
    }

    /// Content root directory.
    #[must_use]
    pub fn source_dir(&self) -> &PathBuf {
        &self.source_dir
    }

    /// The cache shared by this service.
    ///
    /// Collaborators (the navigation projector) open their own buckets here
    /// so that invalidation by version and TTL applies uniformly.
    #[must_use]
    pub fn cache(&self) -> &Arc<dyn Cache> {
        &self.cache
    }

    /// Current snapshot without triggering a build.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn snapshot(&self) -> Arc<PageTree> {
        self.current.read().unwrap().clone()
    }

    /// Current snapshot, building it first when needed.
    ///
    /// Uses double-checked locking:
    /// 1. Fast path: return the current snapshot if valid
    /// 2. Slow path: acquire `build_lock`, recheck, then build once
    ///
    /// A failed build keeps the previous snapshot and marks the state valid
    /// anyway, so repeated calls do not retry until `invalidate()`.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn tree(&self) -> Arc<PageTree> {
        if self.valid.load(Ordering::Acquire) {
            return self.snapshot();
        }

        let _guard = self.build_lock.lock().unwrap();

        if self.valid.load(Ordering::Acquire) {
            return self.snapshot();
        }

        // Try the file cache first
        if let Some(cached) = self.tree_bucket.get_json::<CachedTree>(TREE_KEY, "") {
            let tree = Arc::new(PageTree::from(cached));
            *self.current.write().unwrap() = Arc::clone(&tree);
            *self.last_error.write().unwrap() = None;
            self.valid.store(true, Ordering::Release);
            return tree;
        }

        // Build from the content source
        match self.build_from_source() {
            Ok(tree) => {
                let tree = Arc::new(tree);
                self.tree_bucket
                    .set_json(TREE_KEY, "", &CachedTree::from(tree.as_ref()));
                *self.current.write().unwrap() = Arc::clone(&tree);
                *self.last_error.write().unwrap() = None;
                tracing::info!(
                    pages = tree.len(),
                    roots = tree.roots().len(),
                    "Built page tree"
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "Page tree build failed, keeping previous snapshot");
                *self.last_error.write().unwrap() = Some(e.to_string());
            }
        }

        self.valid.store(true, Ordering::Release);
        self.snapshot()
    }

    /// Invalidate the current snapshot and the cached entry.
    ///
    /// The next `tree()` call rebuilds; current readers keep their existing
    /// `Arc<PageTree>`.
    pub fn invalidate(&self) {
        self.valid.store(false, Ordering::Release);
        self.tree_bucket.remove(TREE_KEY);
    }

    /// Invalidate and rebuild unconditionally.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn rebuild(&self) -> Arc<PageTree> {
        self.invalidate();
        self.tree()
    }

    /// Statistics for the status report.
    ///
    /// Does not trigger a build; reflects the current snapshot.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    #[must_use]
    pub fn stats(&self) -> TreeStats {
        let tree = self.snapshot();
        TreeStats {
            pages: tree.len(),
            roots: tree.roots().len(),
            built: tree.is_built(),
            built_at: tree.built_at(),
            last_error: self.last_error.read().unwrap().clone(),
        }
    }

    /// Scan the content source and build a fresh tree.
    ///
    /// Files that cannot be read or parsed are skipped with a warning; they
    /// never abort the build.
    fn build_from_source(&self) -> Result<PageTree, crate::tree::BuildError> {
        let mut builder = TreeBuilder::new();

        for rel_path in scan_content_root(&self.source_dir, &self.extension) {
            let abs_path = self.source_dir.join(&rel_path);
            let raw = match fs::read_to_string(&abs_path) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!(path = %rel_path.display(), error = %e, "Failed to read content file");
                    continue;
                }
            };
            match Page::from_file(&rel_path, &raw) {
                Ok(page) => builder.add_page(page),
                Err(e) => {
                    tracing::warn!(path = %rel_path.display(), error = %e, "Skipping unparseable content file");
                }
            }
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    // SiteTree is shared across request handlers via Arc
    static_assertions::assert_impl_all!(super::SiteTree: Send, Sync);

    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;

    fn create_test_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    fn write_fixture(source_dir: &std::path::Path) {
        fs::create_dir_all(source_dir.join("reports")).unwrap();
        fs::write(source_dir.join("index.md"), "# Home\n").unwrap();
        fs::write(
            source_dir.join("reports/_index.md"),
            "---\ntitle: Reports\n---\n",
        )
        .unwrap();
        fs::write(
            source_dir.join("reports/q1.md"),
            "---\nsort_order: 2\n---\n",
        )
        .unwrap();
        fs::write(
            source_dir.join("reports/q2.md"),
            "---\nsort_order: 1\n---\n",
        )
        .unwrap();
    }

    fn create_site(source_dir: PathBuf) -> SiteTree {
        SiteTree::new(SiteTreeConfig {
            source_dir,
            ..Default::default()
        })
    }

    #[test]
    fn test_tree_builds_fixture() {
        let temp_dir = create_test_dir();
        write_fixture(temp_dir.path());

        let site = create_site(temp_dir.path().to_path_buf());
        let tree = site.tree();

        assert!(tree.is_built());
        assert_eq!(tree.len(), 4);
        let roots: Vec<&str> = tree.roots().iter().map(|p| p.route.as_str()).collect();
        assert_eq!(roots, vec!["/"]);
        let children: Vec<&str> = tree
            .children("/reports/")
            .iter()
            .map(|p| p.route.as_str())
            .collect();
        assert_eq!(children, vec!["/reports/q2/", "/reports/q1/"]);
    }

    #[test]
    fn test_tree_missing_source_keeps_unbuilt_snapshot() {
        let temp_dir = create_test_dir();
        let site = create_site(temp_dir.path().join("nonexistent"));

        let tree = site.tree();

        assert!(!tree.is_built());
        assert!(tree.is_empty());
        let stats = site.stats();
        assert!(!stats.built);
        assert!(stats.last_error.is_some());
    }

    #[test]
    fn test_tree_single_build_attempt_until_invalidate() {
        let temp_dir = create_test_dir();
        let source_dir = temp_dir.path().join("content");
        let site = create_site(source_dir.clone());

        // First attempt fails (no source dir) but marks state valid
        let t1 = site.tree();
        assert!(!t1.is_built());

        // Content appears, but without invalidation no rebuild happens
        fs::create_dir_all(&source_dir).unwrap();
        fs::write(source_dir.join("index.md"), "# Home").unwrap();
        let t2 = site.tree();
        assert!(Arc::ptr_eq(&t1, &t2));

        // Invalidation allows the next attempt
        site.invalidate();
        let t3 = site.tree();
        assert!(t3.is_built());
        assert_eq!(t3.len(), 1);
    }

    #[test]
    fn test_tree_caches_snapshot_between_calls() {
        let temp_dir = create_test_dir();
        write_fixture(temp_dir.path());
        let site = create_site(temp_dir.path().to_path_buf());

        let t1 = site.tree();
        let t2 = site.tree();

        assert!(Arc::ptr_eq(&t1, &t2));
    }

    #[test]
    fn test_skips_malformed_files_and_builds_rest() {
        let temp_dir = create_test_dir();
        fs::write(temp_dir.path().join("good.md"), "# Good").unwrap();
        fs::write(temp_dir.path().join("bad.md"), "---\ntitle: [broken\n---\n").unwrap();

        let site = create_site(temp_dir.path().to_path_buf());
        let tree = site.tree();

        assert!(tree.is_built());
        assert_eq!(tree.len(), 1);
        assert!(tree.get("/good/").is_some());
        assert!(tree.get("/bad/").is_none());
    }

    #[test]
    fn test_file_cache_round_trip_preserves_structure() {
        let temp_dir = create_test_dir();
        let source_dir = temp_dir.path().join("content");
        let cache_dir = temp_dir.path().join("cache");
        fs::create_dir_all(&source_dir).unwrap();
        write_fixture(&source_dir);

        let config = SiteTreeConfig {
            source_dir: source_dir.clone(),
            cache_dir: Some(cache_dir.clone()),
            version: "1.0.0".to_owned(),
            ..Default::default()
        };

        let first = SiteTree::new(config.clone()).tree();

        // Remove the source: the second service must come from the cache
        fs::remove_dir_all(&source_dir).unwrap();
        let second = SiteTree::new(config).tree();

        assert!(second.is_built());
        assert_eq!(second.len(), first.len());
        assert_eq!(second.root_routes(), first.root_routes());
        for (route, page) in first.pages() {
            let restored = second.get(route).expect("route missing after round trip");
            assert_eq!(restored.parent, page.parent);
            assert_eq!(restored.children, page.children);
            assert_eq!(restored.sort_order, page.sort_order);
        }
    }

    #[test]
    fn test_partial_cache_entry_is_a_miss() {
        // An entry missing the roots key must fail strict deserialization
        let partial = serde_json::json!({
            "pages": {},
            "built_at": 123
        });
        let result: Result<CachedTree, _> = serde_json::from_value(partial);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalidate_removes_cached_entry() {
        let temp_dir = create_test_dir();
        let source_dir = temp_dir.path().join("content");
        fs::create_dir_all(&source_dir).unwrap();
        write_fixture(&source_dir);

        let site = SiteTree::new(SiteTreeConfig {
            source_dir: source_dir.clone(),
            cache_dir: Some(temp_dir.path().join("cache")),
            version: "1.0.0".to_owned(),
            ..Default::default()
        });

        let _ = site.tree();
        fs::write(source_dir.join("extra.md"), "# Extra").unwrap();

        // Rebuild must reread the source, not the stale cache entry
        let rebuilt = site.rebuild();
        assert!(rebuilt.get("/extra/").is_some());
    }

    #[test]
    fn test_concurrent_access_builds_once() {
        use std::thread;

        let temp_dir = create_test_dir();
        write_fixture(temp_dir.path());
        let site = Arc::new(create_site(temp_dir.path().to_path_buf()));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let site = Arc::clone(&site);
                thread::spawn(move || {
                    let tree = site.tree();
                    assert!(tree.get("/reports/").is_some());
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn test_stats_reflect_snapshot() {
        let temp_dir = create_test_dir();
        write_fixture(temp_dir.path());
        let site = create_site(temp_dir.path().to_path_buf());

        let _ = site.tree();
        let stats = site.stats();

        assert_eq!(stats.pages, 4);
        assert_eq!(stats.roots, 1);
        assert!(stats.built);
        assert!(stats.built_at > 0);
        assert!(stats.last_error.is_none());
    }
}
