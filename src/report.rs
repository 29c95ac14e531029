//! Per-file findings and run-level aggregation.
//!
//! Totals are plain sums and do not depend on the order files are recorded
//! in. The lists keep discovery order so console and report output read in
//! the order the tree was walked.

use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// A single matching line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    /// 1-based line number.
    pub line_number: usize,
    /// The line with surrounding whitespace trimmed.
    pub line: String,
}

/// All occurrences of one pattern in one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternHits {
    pub pattern: String,
    pub occurrences: Vec<Occurrence>,
}

/// Search findings for a single file, grouped by pattern in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub path: PathBuf,
    pub hits: Vec<PatternHits>,
}

impl FileRecord {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            hits: Vec::new(),
        }
    }

    /// Records one occurrence of `pattern`.
    pub fn push(&mut self, pattern: &str, line_number: usize, line: &str) {
        let occurrence = Occurrence {
            line_number,
            line: line.trim().to_string(),
        };
        match self.hits.iter_mut().find(|h| h.pattern == pattern) {
            Some(hits) => hits.occurrences.push(occurrence),
            None => self.hits.push(PatternHits {
                pattern: pattern.to_string(),
                occurrences: vec![occurrence],
            }),
        }
    }

    /// Occurrences recorded for `pattern`, if any.
    pub fn occurrences_of(&self, pattern: &str) -> Option<&[Occurrence]> {
        self.hits
            .iter()
            .find(|h| h.pattern == pattern)
            .map(|h| h.occurrences.as_slice())
    }

    pub fn occurrence_count(&self) -> usize {
        self.hits.iter().map(|h| h.occurrences.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// A file changed by rewrite mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewrittenFile {
    pub path: PathBuf,
    pub occurrences: usize,
}

/// Aggregated results of one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Files that passed the filter and were processed, including ones that failed.
    pub files_scanned: usize,
    /// Files with at least one match (search) or that were modified (rewrite).
    pub files_matched: usize,
    /// Sum of all occurrences across files and patterns.
    pub total_occurrences: usize,
    /// Search findings, one record per matching file.
    pub findings: Vec<FileRecord>,
    /// Rewrite results, one entry per modified file.
    pub rewritten: Vec<RewrittenFile>,
}

impl RunSummary {
    pub fn record_scanned(&mut self) {
        self.files_scanned += 1;
    }

    /// Adds a file's search findings. Empty records only count as scanned elsewhere.
    pub fn record(&mut self, record: FileRecord) {
        if record.is_empty() {
            return;
        }
        self.files_matched += 1;
        self.total_occurrences += record.occurrence_count();
        self.findings.push(record);
    }

    /// Adds a file modified by rewrite mode.
    pub fn record_rewrite(&mut self, path: impl Into<PathBuf>, occurrences: usize) {
        self.files_matched += 1;
        self.total_occurrences += occurrences;
        self.rewritten.push(RewrittenFile {
            path: path.into(),
            occurrences,
        });
    }

    /// Folds another summary into this one.
    pub fn merge(&mut self, other: RunSummary) {
        self.files_scanned += other.files_scanned;
        self.files_matched += other.files_matched;
        self.total_occurrences += other.total_occurrences;
        self.findings.extend(other.findings);
        self.rewritten.extend(other.rewritten);
    }

    pub fn has_matches(&self) -> bool {
        self.files_matched > 0
    }

    /// Total occurrences per pattern across all files, most frequent first.
    ///
    /// Ties are broken by pattern text so the ordering is stable.
    pub fn pattern_totals(&self) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for record in &self.findings {
            for hits in &record.hits {
                *counts.entry(hits.pattern.as_str()).or_insert(0) += hits.occurrences.len();
            }
        }

        let mut totals: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(p, c)| (p.to_string(), c))
            .collect();
        totals.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        totals
    }
}
