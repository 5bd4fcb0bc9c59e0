//! Content file discovery by filesystem walking.
//!
//! The scanner only identifies files; it reads no content. Downstream
//! processing (parsing, tree building) consumes the returned paths in order,
//! so the scan order must be reproducible across runs.

use std::fs;
use std::path::{Path, PathBuf};

/// Scan a content root for files with the given extension.
///
/// Returns every matching file beneath `root` (recursive) as paths relative
/// to `root`, sorted lexicographically on the full relative path so that
/// downstream processing is deterministic.
///
/// A missing, unreadable, or non-directory root yields an empty list rather
/// than an error; the configuration layer owns the separate "is the root
/// valid" check. Dot-prefixed files and directories are skipped.
///
/// # Arguments
///
/// * `root` - Content root directory
/// * `extension` - File extension without the dot (e.g., "md")
#[must_use]
pub fn scan_content_root(root: &Path, extension: &str) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if root.is_dir() {
        scan_directory(root, Path::new(""), extension, &mut files);
    }
    files.sort();
    files
}

fn scan_directory(dir: &Path, rel_prefix: &Path, extension: &str, files: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        tracing::debug!(dir = %dir.display(), "Failed to read content directory");
        return;
    };

    for entry in entries.filter_map(Result::ok) {
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }

        let rel_path = rel_prefix.join(&name);
        let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());

        if is_dir {
            scan_directory(&entry.path(), &rel_path, extension, files);
        } else if rel_path.extension().is_some_and(|e| e == extension) {
            files.push(rel_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    #[test]
    fn test_scan_missing_root_returns_empty() {
        let files = scan_content_root(Path::new("/nonexistent"), "md");
        assert!(files.is_empty());
    }

    #[test]
    fn test_scan_root_is_file_returns_empty() {
        let temp_dir = create_test_dir();
        let file = temp_dir.path().join("not-a-dir");
        fs::write(&file, "x").unwrap();

        let files = scan_content_root(&file, "md");
        assert!(files.is_empty());
    }

    #[test]
    fn test_scan_empty_dir_returns_empty() {
        let temp_dir = create_test_dir();
        let files = scan_content_root(temp_dir.path(), "md");
        assert!(files.is_empty());
    }

    #[test]
    fn test_scan_finds_nested_files() {
        let temp_dir = create_test_dir();
        fs::write(temp_dir.path().join("index.md"), "# Home").unwrap();
        let sub = temp_dir.path().join("reports");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("q1.md"), "# Q1").unwrap();

        let files = scan_content_root(temp_dir.path(), "md");

        assert_eq!(
            files,
            vec![PathBuf::from("index.md"), PathBuf::from("reports/q1.md")]
        );
    }

    #[test]
    fn test_scan_filters_by_extension() {
        let temp_dir = create_test_dir();
        fs::write(temp_dir.path().join("page.md"), "# Page").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "notes").unwrap();
        fs::write(temp_dir.path().join("style.css"), "body {}").unwrap();

        let files = scan_content_root(temp_dir.path(), "md");

        assert_eq!(files, vec![PathBuf::from("page.md")]);
    }

    #[test]
    fn test_scan_skips_dotfiles_and_dot_dirs() {
        let temp_dir = create_test_dir();
        fs::write(temp_dir.path().join(".hidden.md"), "# Hidden").unwrap();
        fs::write(temp_dir.path().join("visible.md"), "# Visible").unwrap();
        let dot_dir = temp_dir.path().join(".git");
        fs::create_dir(&dot_dir).unwrap();
        fs::write(dot_dir.join("inner.md"), "# Inner").unwrap();

        let files = scan_content_root(temp_dir.path(), "md");

        assert_eq!(files, vec![PathBuf::from("visible.md")]);
    }

    #[test]
    fn test_scan_order_is_lexicographic() {
        let temp_dir = create_test_dir();
        fs::write(temp_dir.path().join("zebra.md"), "").unwrap();
        fs::write(temp_dir.path().join("alpha.md"), "").unwrap();
        let sub = temp_dir.path().join("mid");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("page.md"), "").unwrap();

        let files = scan_content_root(temp_dir.path(), "md");

        assert_eq!(
            files,
            vec![
                PathBuf::from("alpha.md"),
                PathBuf::from("mid/page.md"),
                PathBuf::from("zebra.md"),
            ]
        );
    }
}
