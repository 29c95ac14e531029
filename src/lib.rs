//! `rolesweep` finds and rewrites deprecated identifier strings across a source tree.
//!
//! It provides the core logic for the `rolesweep` command-line tool but can also
//! be used as a library. The main components are:
//!
//! - `PathFilter`: accepts files by extension allow-list and excluded directory names.
//! - `FileScanner`: lazily walks a tree and yields the files a filter accepts.
//! - `RewriteEngine`: applies an ordered table of literal replacements, counting
//!   occurrences against the original text, and writes files back atomically.
//! - `SearchEngine`: reports every line containing one of a list of literal patterns.
//! - `RunSummary`: aggregates per-file findings; `OutputFormatter` serializes them.
//! - `config`: loads extensions, exclusions and pattern tables from YAML.
//!
//! Processing is single-threaded: each file is read, processed and written
//! before the next one is opened.

pub mod cli;
pub mod config;
pub mod errors;
pub mod filter;
pub mod output_formatter;
pub mod patterns;
pub mod report;
pub mod rewriter;
pub mod searcher;
pub mod walker;

// Re-export main types for easier access by library users.
pub use config::RunConfig;
pub use errors::{Error, Result};
pub use filter::PathFilter;
pub use output_formatter::{OutputFormat, OutputFormatter, ReportSink};
pub use patterns::{PatternEntry, PatternList, PatternTable};
pub use report::{FileRecord, Occurrence, RunSummary};
pub use rewriter::RewriteEngine;
pub use searcher::SearchEngine;
pub use walker::FileScanner;
