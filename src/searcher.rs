use crate::config::{ConfigLoader, DEFAULT_REPORT_STEM, Overrides};
use crate::errors::{Error, Result};
use crate::output_formatter::{OutputFormat, OutputFormatter, ReportSink};
use crate::patterns::PatternList;
use crate::report::{FileRecord, RunSummary};
use crate::rewriter::relative_path;
use crate::walker::{FileScanner, check_root};
use indicatif::ProgressBar;
use log::{debug, error, info};
use regex::RegexSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Finds literal patterns line by line.
///
/// All patterns are compiled into one escaped `RegexSet`, so each line is
/// checked once no matter how many patterns there are.
pub struct SearchEngine {
    patterns: PatternList,
    pattern_set: RegexSet,
}

impl SearchEngine {
    pub fn new(patterns: PatternList) -> Result<Self> {
        let pattern_set = RegexSet::new(patterns.iter().map(|p| regex::escape(p)))?;
        Ok(Self {
            patterns,
            pattern_set,
        })
    }

    /// Searches `content` and returns the findings under `path`.
    ///
    /// Every pattern that is a substring of a line is recorded for that line,
    /// so one line can appear under several patterns.
    pub fn search_str(&self, path: &Path, content: &str) -> FileRecord {
        let mut record = FileRecord::new(path);
        for (idx, line) in content.split('\n').enumerate() {
            for pattern_idx in self.pattern_set.matches(line).into_iter() {
                record.push(&self.patterns[pattern_idx], idx + 1, line);
            }
        }
        record
    }

    /// Searches a single file.
    ///
    /// Files with a NUL byte in their first 1KB are treated as binary and
    /// produce an empty record. Other files must be valid UTF-8.
    pub fn search_file(&self, path: &Path) -> Result<FileRecord> {
        let bytes = fs::read(path)?;
        if bytes.iter().take(1024).any(|&b| b == 0) {
            debug!("Skipping binary file {}", path.display());
            return Ok(FileRecord::new(path));
        }
        let content = String::from_utf8(bytes)?;
        Ok(self.search_str(path, &content))
    }
}

/// Arguments of the `find` command after CLI parsing.
pub struct SearchArgs {
    pub root: PathBuf,
    pub config: Option<PathBuf>,
    pub patterns: Vec<String>,
    pub overrides: Overrides,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub write_report: bool,
    pub preview: usize,
    pub respect_gitignore: bool,
}

/// The main entry point for the `find` command.
///
/// This function handles:
/// 1. Loading the configuration and the pattern list.
/// 2. Walking the root and searching every accepted file.
/// 3. Printing per-file findings and a summary.
/// 4. Writing the report into the scan root when anything was found.
pub fn run_search(args: SearchArgs) -> Result<RunSummary> {
    check_root(&args.root)?;
    let mut config = ConfigLoader::resolve(args.config.as_deref(), &args.root)?;
    args.overrides.apply(&mut config);

    let patterns = if args.patterns.is_empty() {
        config.pattern_list()?
    } else {
        PatternList::new(args.patterns.iter().cloned())?
    };
    if patterns.is_empty() {
        return Err(
            "No search patterns configured. Add `search` or `patterns` to the config or pass --pattern"
                .into(),
        );
    }
    info!("Searching for {} pattern(s)", patterns.len());

    let engine = SearchEngine::new(patterns)?;
    let scanner = FileScanner::new(config.path_filter()).respect_gitignore(args.respect_gitignore);

    println!("Searching for deprecated patterns under {}", args.root.display());
    println!("{}", "=".repeat(50));

    let pb = ProgressBar::new_spinner();
    let mut summary = RunSummary::default();

    for path in scanner.scan(&args.root) {
        let rel = relative_path(&args.root, &path);
        pb.set_message(format!("Scanning: {}", rel.display()));
        pb.tick();

        summary.record_scanned();
        match engine.search_file(&path) {
            Ok(mut record) => {
                if record.is_empty() {
                    continue;
                }
                record.path = rel;
                pb.suspend(|| print_record(&record, args.preview));
                summary.record(record);
            }
            Err(e) => {
                let e = Error::processing(&path, e);
                pb.suspend(|| error!("{e}"));
            }
        }
    }
    pb.finish_and_clear();

    println!("\n{}", "=".repeat(50));
    println!("Files scanned       : {}", summary.files_scanned);
    println!("Files with matches  : {}", summary.files_matched);
    println!("Total occurrences   : {}", summary.total_occurrences);

    if !summary.has_matches() {
        println!("\nNo deprecated patterns found");
        return Ok(summary);
    }

    println!("\nMost common patterns:");
    for (pattern, count) in summary.pattern_totals().iter().take(10) {
        println!("  {pattern}: {count}");
    }

    if args.write_report {
        let file_name = args
            .output
            .or(config.report_file)
            .unwrap_or_else(|| PathBuf::from(format!("{DEFAULT_REPORT_STEM}.{}", args.format.extension())));
        let report_path = args.root.join(file_name);
        let formatter = OutputFormatter::new(args.format, true);
        write_report(&formatter, &report_path, &summary)?;
        println!("\nReport written to {}", report_path.display());
    }

    Ok(summary)
}

/// Prints one file's findings, showing at most `preview` lines per pattern.
fn print_record(record: &FileRecord, preview: usize) {
    println!(
        "\n{} ({} occurrences)",
        record.path.display(),
        record.occurrence_count()
    );
    for hits in &record.hits {
        println!("  {} ({}):", hits.pattern, hits.occurrences.len());
        for occ in hits.occurrences.iter().take(preview) {
            println!("    line {}: {}", occ.line_number, occ.line);
        }
        if hits.occurrences.len() > preview {
            println!("    ... and {} more", hits.occurrences.len() - preview);
        }
    }
}

/// Writes the report next to the scanned files, replacing any previous one atomically.
fn write_report<S: ReportSink>(sink: &S, path: &Path, summary: &RunSummary) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut temp_file = NamedTempFile::new_in(dir)?;
    sink.write_report(&mut temp_file, summary)?;
    temp_file.flush()?;
    temp_file.persist(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn engine(patterns: &[&str]) -> SearchEngine {
        SearchEngine::new(PatternList::new(patterns.iter().copied()).unwrap()).unwrap()
    }

    #[test]
    fn test_two_patterns_on_one_line() {
        let engine = engine(&[".isOrgAdmin", ".isOrgOwner"]);
        let record = engine.search_str(
            Path::new("guard.ts"),
            "const a = 1;\nif (x.isOrgAdmin && y.isOrgOwner) return;\n",
        );

        assert_eq!(record.occurrence_count(), 2);
        let admin = record.occurrences_of(".isOrgAdmin").unwrap();
        let owner = record.occurrences_of(".isOrgOwner").unwrap();
        assert_eq!(admin.len(), 1);
        assert_eq!(owner.len(), 1);
        assert_eq!(admin[0].line_number, 2);
        assert_eq!(owner[0].line_number, 2);
        assert_eq!(admin[0].line, "if (x.isOrgAdmin && y.isOrgOwner) return;");
    }

    #[test]
    fn test_patterns_are_literal() {
        // `.` must not act as a regex wildcard.
        let engine = engine(&[".admin", "role === 'org_admin'"]);
        let record = engine.search_str(
            Path::new("a.ts"),
            "xadmin\nuser.admin\nif (role === 'org_admin') {}\n",
        );

        let lines: Vec<usize> = record
            .occurrences_of(".admin")
            .unwrap()
            .iter()
            .map(|o| o.line_number)
            .collect();
        assert_eq!(lines, vec![2]);
        assert_eq!(record.occurrences_of("role === 'org_admin'").unwrap()[0].line_number, 3);
    }

    #[test]
    fn test_one_entry_per_line_even_with_repeats() {
        let engine = engine(&["org_owner"]);
        let record = engine.search_str(Path::new("a.py"), "org_owner org_owner\n");
        assert_eq!(record.occurrence_count(), 1);
    }

    #[test]
    fn test_lines_are_trimmed() {
        let engine = engine(&["userData.owner"]);
        let record = engine.search_str(Path::new("a.ts"), "    if (userData.owner) {\r\n");
        assert_eq!(
            record.occurrences_of("userData.owner").unwrap()[0].line,
            "if (userData.owner) {"
        );
    }

    #[test]
    fn test_binary_file_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("blob.js");
        fs::write(&path, b"org_admin\0\0binary").unwrap();

        let record = engine(&["org_admin"]).search_file(&path).unwrap();
        assert!(record.is_empty());
    }

    #[test]
    fn test_invalid_utf8_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("latin1.py");
        fs::write(&path, [b'o', b'r', b'g', 0xe9, b'\n']).unwrap();

        let err = engine(&["org"]).search_file(&path).unwrap_err();
        assert!(matches!(err, Error::Utf8(_)));
    }

    #[test]
    fn test_run_search_writes_report_and_skips_md() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("guard.ts"), "if (x.isOrgAdmin) {}\n").unwrap();
        fs::write(root.join("NOTES.md"), "x.isOrgAdmin\n").unwrap();
        fs::create_dir(root.join("node_modules")).unwrap();
        fs::write(root.join("node_modules/dep.ts"), "x.isOrgAdmin\n").unwrap();

        let summary = run_search(SearchArgs {
            root: root.to_path_buf(),
            config: None,
            patterns: vec![".isOrgAdmin".into()],
            overrides: Overrides::default(),
            format: OutputFormat::Text,
            output: None,
            write_report: true,
            preview: 2,
            respect_gitignore: false,
        })
        .unwrap();

        assert_eq!(summary.files_scanned, 1);
        assert_eq!(summary.files_matched, 1);
        assert_eq!(summary.total_occurrences, 1);
        assert_eq!(summary.findings[0].path, PathBuf::from("guard.ts"));

        let report =
            fs::read_to_string(root.join(format!("{DEFAULT_REPORT_STEM}.txt"))).unwrap();
        assert!(report.contains("File: guard.ts"));
        assert!(report.contains("Line 1: if (x.isOrgAdmin) {}"));
    }

    #[test]
    fn test_run_search_without_matches_writes_no_report() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("clean.ts"), "const ok = true;\n").unwrap();

        let summary = run_search(SearchArgs {
            root: root.to_path_buf(),
            config: None,
            patterns: vec!["org_admin".into()],
            overrides: Overrides::default(),
            format: OutputFormat::Json,
            output: None,
            write_report: true,
            preview: 2,
            respect_gitignore: false,
        })
        .unwrap();

        assert!(!summary.has_matches());
        assert!(!root.join(format!("{DEFAULT_REPORT_STEM}.json")).exists());
    }

    #[test]
    fn test_run_search_requires_patterns() {
        let temp_dir = TempDir::new().unwrap();
        let result = run_search(SearchArgs {
            root: temp_dir.path().to_path_buf(),
            config: None,
            patterns: vec![],
            overrides: Overrides::default(),
            format: OutputFormat::Text,
            output: None,
            write_report: false,
            preview: 2,
            respect_gitignore: false,
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_run_search_rejects_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let result = run_search(SearchArgs {
            root: temp_dir.path().join("no/such/dir"),
            config: None,
            patterns: vec!["org_admin".into()],
            overrides: Overrides::default(),
            format: OutputFormat::Text,
            output: None,
            write_report: true,
            preview: 2,
            respect_gitignore: false,
        });
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
