use crate::config::{ConfigLoader, Overrides};
use crate::errors::{Error, Result};
use crate::patterns::{PatternEntry, PatternTable};
use crate::report::RunSummary;
use crate::walker::{FileScanner, check_root};
use indicatif::ProgressBar;
use log::{debug, error, info};
use regex::Regex;
use std::borrow::Cow;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Three or more newlines separated only by whitespace.
const BLANK_RUN: &str = r"\n\s*\n\s*\n";

/// Applies an ordered [`PatternTable`] to file contents.
///
/// Each entry replaces every occurrence of its match string in the text left
/// by the entries before it. Occurrences are counted against the original
/// text, so an entry that only fires on text produced by an earlier entry adds
/// nothing to the count, and one whose matches were consumed earlier still
/// counts them.
pub struct RewriteEngine {
    table: PatternTable,
    blank_run: Regex,
}

/// The outcome of rewriting a single piece of text.
#[derive(Debug, PartialEq, Eq)]
pub struct Rewrite<'a> {
    /// The rewritten text, borrowed when nothing matched.
    pub content: Cow<'a, str>,
    /// Occurrences of every match string in the original text.
    pub occurrences: usize,
}

/// Options for processing a file.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessOptions {
    /// If `true`, changes will be calculated but not written to disk.
    pub dry_run: bool,
}

/// The result of processing a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessResult {
    /// Occurrences counted by the engine. Zero when the file was left untouched.
    pub occurrences: usize,
    /// `true` if the content changed (or would have, in a dry run).
    pub modified: bool,
}

impl RewriteEngine {
    pub fn new(table: PatternTable) -> Result<Self> {
        Ok(Self {
            table,
            blank_run: Regex::new(BLANK_RUN)?,
        })
    }

    pub fn table(&self) -> &PatternTable {
        &self.table
    }

    /// Rewrites `content` with every entry of the table, in order.
    ///
    /// When at least one entry matched, runs of blank lines in the result are
    /// collapsed to a single blank line.
    pub fn rewrite<'a>(&self, content: &'a str) -> Rewrite<'a> {
        let mut current = Cow::Borrowed(content);
        let mut occurrences = 0;
        let mut matched = false;

        for entry in self.table.iter() {
            occurrences += content.matches(entry.find.as_str()).count();
            if current.contains(entry.find.as_str()) {
                matched = true;
                current = Cow::Owned(current.replace(entry.find.as_str(), &entry.replacement));
            }
        }

        if !matched {
            return Rewrite {
                content: Cow::Borrowed(content),
                occurrences: 0,
            };
        }

        let collapsed = match self.blank_run.replace_all(current.as_ref(), "\n\n") {
            Cow::Owned(s) => Some(s),
            Cow::Borrowed(_) => None,
        };
        let content = match collapsed {
            Some(s) => Cow::Owned(s),
            None => current,
        };

        Rewrite {
            content,
            occurrences,
        }
    }

    /// Rewrites a single file in place.
    ///
    /// The file is only written when its content actually changes. Writes go
    /// through a temporary file in the same directory which is then renamed
    /// over the original, keeping its permissions.
    pub fn process_file(&self, path: &Path, options: ProcessOptions) -> Result<ProcessResult> {
        let bytes = fs::read(path)?;
        let content = String::from_utf8(bytes)?;
        let rewrite = self.rewrite(&content);

        if rewrite.content == content {
            return Ok(ProcessResult {
                occurrences: 0,
                modified: false,
            });
        }

        if !options.dry_run {
            write_atomically(path, rewrite.content.as_bytes())?;
        }

        Ok(ProcessResult {
            occurrences: rewrite.occurrences,
            modified: true,
        })
    }
}

fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        Some(_) => Path::new("."),
        None => {
            return Err(format!("Could not get parent directory for {}", path.display()).into());
        }
    };

    let mut temp_file = NamedTempFile::new_in(parent)?;
    temp_file.write_all(contents)?;
    temp_file.flush()?;

    let perms = fs::metadata(path)?.permissions();
    fs::set_permissions(temp_file.path(), perms)?;

    temp_file.persist(path)?;
    Ok(())
}

/// Arguments of the `rewrite` command after CLI parsing.
pub struct RewriteArgs {
    pub root: PathBuf,
    pub config: Option<PathBuf>,
    pub find: Option<String>,
    pub replace: Option<String>,
    pub overrides: Overrides,
    pub dry_run: bool,
    pub respect_gitignore: bool,
}

/// The main entry point for the `rewrite` command.
///
/// This function:
/// 1. Loads the configuration and applies command-line overrides.
/// 2. Walks the root, rewriting every accepted file in turn.
/// 3. Prints one line per modified file and a final summary.
///
/// Files that cannot be read, decoded or written are logged and skipped.
/// A root that is missing or not a directory fails the whole run.
pub fn run_rewrite(args: RewriteArgs) -> Result<RunSummary> {
    check_root(&args.root)?;
    let mut config = ConfigLoader::resolve(args.config.as_deref(), &args.root)?;
    args.overrides.apply(&mut config);

    let table = match (args.find, args.replace) {
        (Some(find), replace) => {
            PatternTable::new(vec![PatternEntry::new(find, replace.unwrap_or_default())])?
        }
        (None, Some(_)) => return Err("--replace requires --find".into()),
        (None, None) => config.pattern_table()?,
    };
    if table.is_empty() {
        return Err(
            "No rewrite patterns configured. Add `patterns` to the config or pass --find/--replace"
                .into(),
        );
    }
    info!("Rewriting with {} pattern(s)", table.len());

    let engine = RewriteEngine::new(table)?;
    let scanner = FileScanner::new(config.path_filter()).respect_gitignore(args.respect_gitignore);
    let options = ProcessOptions {
        dry_run: args.dry_run,
    };

    println!("Rewriting deprecated patterns under {}", args.root.display());
    println!("{}", "=".repeat(50));

    let pb = ProgressBar::new_spinner();
    let mut summary = RunSummary::default();

    for path in scanner.scan(&args.root) {
        let rel = relative_path(&args.root, &path);
        pb.set_message(format!("Processing: {}", rel.display()));
        pb.tick();

        summary.record_scanned();
        match engine.process_file(&path, options) {
            Ok(result) => {
                if result.modified {
                    pb.suspend(|| {
                        if args.dry_run {
                            println!("DRY Modified {} ({} changes)", rel.display(), result.occurrences);
                        } else {
                            println!("Modified {} ({} changes)", rel.display(), result.occurrences);
                        }
                    });
                    summary.record_rewrite(rel, result.occurrences);
                } else {
                    debug!("Unchanged {}", rel.display());
                }
            }
            Err(e) => {
                let e = Error::processing(&path, e);
                pb.suspend(|| error!("{e}"));
            }
        }
    }
    pb.finish_and_clear();

    println!("{}", "=".repeat(50));
    println!("Files scanned  : {}", summary.files_scanned);
    println!("Files modified : {}", summary.files_matched);
    println!("Total changes  : {}", summary.total_occurrences);
    if args.dry_run && summary.files_matched > 0 {
        println!("\nDry run: no files were written");
    } else if summary.files_matched == 0 {
        println!("\nNo deprecated patterns found");
    }

    Ok(summary)
}

/// The path shown to the user and stored in summaries: relative to the root when possible.
pub(crate) fn relative_path(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}
