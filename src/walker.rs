use crate::errors::{Error, Result};
use crate::filter::PathFilter;
use ignore::{DirEntry, WalkBuilder};
use std::fs;
use log::{debug, warn};
use std::path::{Path, PathBuf};

/// Walks a directory tree and yields the files a [`PathFilter`] accepts.
///
/// Every call to [`FileScanner::scan`] performs a fresh traversal. Symlinks are
/// not followed, so a single scan never reaches the same file twice.
#[derive(Debug, Clone)]
pub struct FileScanner {
    filter: PathFilter,
    respect_gitignore: bool,
}

impl FileScanner {
    pub fn new(filter: PathFilter) -> Self {
        Self {
            filter,
            respect_gitignore: false,
        }
    }

    /// Honor `.gitignore`/`.ignore` files during traversal. Off by default, in
    /// which case every entry under the root is visited, hidden ones included.
    pub fn respect_gitignore(mut self, yes: bool) -> Self {
        self.respect_gitignore = yes;
        self
    }

    pub fn filter(&self) -> &PathFilter {
        &self.filter
    }

    /// Lazily enumerates accepted files under `root`.
    ///
    /// The filter sees each path relative to `root`, so directories above the
    /// root never cause exclusion. Unreadable entries are logged and skipped.
    pub fn scan(&self, root: &Path) -> impl Iterator<Item = PathBuf> + 'static {
        let mut walker = WalkBuilder::new(root);
        walker
            .standard_filters(false)
            .hidden(false)
            .follow_links(false);
        if self.respect_gitignore {
            walker
                .ignore(true)
                .git_ignore(true)
                .git_global(true)
                .git_exclude(true);
        }

        let prune = self.filter.clone();
        walker.filter_entry(move |entry| !is_excluded_dir(&prune, entry));

        let filter = self.filter.clone();
        let root = root.to_path_buf();
        walker
            .build()
            .filter_map(move |entry| accept_entry(&root, &filter, entry))
    }
}

/// Fails unless `root` is a directory whose entries can be listed.
///
/// Errors below the root are skipped during a scan, so this must be called
/// before scanning for a missing root to be reported at all.
pub fn check_root(root: &Path) -> Result<()> {
    let metadata = fs::metadata(root)?;
    if !metadata.is_dir() {
        return Err(Error::Config(format!(
            "Scan root '{}' is not a directory",
            root.display()
        )));
    }
    fs::read_dir(root)?;
    Ok(())
}

/// Maps one walk result to an accepted file path, logging and dropping errors.
fn accept_entry(
    root: &Path,
    filter: &PathFilter,
    entry: std::result::Result<DirEntry, ignore::Error>,
) -> Option<PathBuf> {
    match entry {
        Ok(entry) => {
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                return None;
            }
            let rel = relative_to(root, entry.path());
            if filter.accepts(rel) {
                Some(entry.into_path())
            } else {
                debug!("Filtered out {}", entry.path().display());
                None
            }
        }
        Err(err) => {
            warn!("Skipping unreadable entry: {err}");
            None
        }
    }
}

/// Directories below the root whose own name is excluded are pruned from the walk.
fn is_excluded_dir(filter: &PathFilter, entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_some_and(|ft| ft.is_dir())
        && filter.is_excluded_name(entry.file_name())
}

fn relative_to<'a>(root: &Path, path: &'a Path) -> &'a Path {
    match path.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel,
        _ => path,
    }
}
