//! Path acceptance rules shared by every walk.

use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::Path;

/// Decides whether a file qualifies for processing.
///
/// A path is accepted when its final extension is in the allow-list and none
/// of its components names an excluded directory.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    extensions: HashSet<String>,
    excluded_dirs: HashSet<String>,
}

impl PathFilter {
    /// Creates a filter from an extension allow-list and a directory exclusion set.
    ///
    /// Extensions may be given with or without a leading dot and in any case.
    pub fn new<E, D>(extensions: E, excluded_dirs: D) -> Self
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        D: IntoIterator,
        D::Item: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| normalize_extension(e.as_ref()))
                .filter(|e| !e.is_empty())
                .collect(),
            excluded_dirs: excluded_dirs
                .into_iter()
                .map(|d| d.as_ref().trim().to_string())
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    /// Returns `true` if `path` passes both the extension and exclusion rules.
    pub fn accepts(&self, path: &Path) -> bool {
        self.has_allowed_extension(path) && !self.is_excluded(path)
    }

    /// Returns `true` if any component of `path` is an excluded directory name.
    pub fn is_excluded(&self, path: &Path) -> bool {
        path.components()
            .any(|c| self.is_excluded_name(c.as_os_str()))
    }

    /// Returns `true` if a single file or directory name is in the exclusion set.
    pub fn is_excluded_name(&self, name: &OsStr) -> bool {
        name.to_str()
            .map(|s| self.excluded_dirs.contains(s))
            .unwrap_or(false)
    }

    fn has_allowed_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|os| os.to_str())
            .map(|s| self.extensions.contains(&s.to_lowercase()))
            .unwrap_or(false)
    }
}

/// Normalizes an extension for comparison: trimmed, no leading dot, lower case.
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_filter() -> PathFilter {
        PathFilter::new(
            [".ts", ".tsx", ".js", ".jsx", ".py"],
            ["node_modules", ".git", "dist", "build", "__pycache__"],
        )
    }

    #[test]
    fn test_rejects_unlisted_extension() {
        let filter = default_filter();
        assert!(!filter.accepts(Path::new("README.md")));
        assert!(!filter.accepts(Path::new("src/docs/guide.md")));
        assert!(!filter.accepts(Path::new("Makefile")));
        assert!(filter.accepts(Path::new("src/app.ts")));
    }

    #[test]
    fn test_rejects_nested_excluded_dir() {
        let filter = default_filter();
        assert!(!filter.accepts(Path::new("a/b/node_modules/c/file.ts")));
        assert!(!filter.accepts(Path::new("node_modules/file.ts")));
        assert!(!filter.accepts(Path::new("functions/__pycache__/mod.py")));
        assert!(filter.accepts(Path::new("a/b/modules/c/file.ts")));
    }

    #[test]
    fn test_exclusion_matches_whole_segments_only() {
        let filter = default_filter();
        assert!(filter.accepts(Path::new("distribution/file.js")));
        assert!(filter.accepts(Path::new("src/rebuild/file.js")));
    }

    #[test]
    fn test_extension_normalization() {
        let filter = PathFilter::new(["TS", " .Py "], Vec::<String>::new());
        assert!(filter.accepts(Path::new("x.ts")));
        assert!(filter.accepts(Path::new("x.TS")));
        assert!(filter.accepts(Path::new("x.py")));
        // Only the final extension counts.
        assert!(filter.accepts(Path::new("types.d.ts")));
        assert!(!filter.accepts(Path::new("x.ts.bak")));
    }

    #[test]
    fn test_empty_allow_list_accepts_nothing() {
        let filter = PathFilter::new(Vec::<String>::new(), ["node_modules"]);
        assert!(!filter.accepts(Path::new("src/app.ts")));
    }
}
