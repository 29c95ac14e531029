use crate::output_formatter::OutputFormat;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Finds and rewrites deprecated identifiers across a source tree.
///
/// `rolesweep` walks a directory, keeps files whose extension is allowed and
/// that do not live under an excluded directory, and either reports where
/// literal patterns occur or rewrites them with an ordered replacement table.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Find and rewrite deprecated identifiers across a source tree",
    long_about = "rolesweep - Find and rewrite deprecated identifier strings (legacy role names, flag names) across a codebase.

Patterns are literal strings, not regexes. Rewrite tables are applied in order,
and each entry sees the text produced by the entries before it.

QUICK EXAMPLES:
  rolesweep find                          # Report configured patterns under the current directory
  rolesweep find -p '.isOrgAdmin' src/    # Report a single pattern
  rolesweep rewrite --dry-run             # Preview the configured rewrite table
  rolesweep rewrite --find 'userData.admin' --replace 'userData.isOrgAdmin'

Configuration is read from rolesweep.yaml in the scan root, or from --config."
)]
pub struct Args {
    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command that walks a tree.
#[derive(ClapArgs, Debug, Clone)]
pub struct WalkOptions {
    /// The directory to scan. Defaults to the current directory.
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Path to a YAML configuration file.
    #[arg(short, long, env = "ROLESWEEP_CONFIG")]
    pub config: Option<PathBuf>,

    /// A comma-separated list of file extensions to include (replaces the configured list).
    #[arg(short = 'x', long = "ext", value_delimiter = ',')]
    pub extensions: Vec<String>,

    /// A comma-separated list of directory names to exclude (replaces the configured set).
    #[arg(short = 'e', long = "exclude", value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Skip files ignored by .gitignore and .ignore files.
    #[arg(long)]
    pub respect_gitignore: bool,
}

/// The set of available commands for the `rolesweep` CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report every line containing a deprecated pattern
    ///
    /// EXAMPLES:
    ///   rolesweep find                              # Use rolesweep.yaml or defaults
    ///   rolesweep find -p '.isOrgAdmin' -p "'org_owner'" .
    ///   rolesweep find -f json -o roles.json        # JSON report
    ///   rolesweep find --fail-on-match              # Exit 1 if anything is found (CI)
    ///
    /// Without --pattern, the `search` list from the config is used, falling
    /// back to the match strings of its `patterns` table.
    Find {
        #[command(flatten)]
        walk: WalkOptions,

        /// A literal pattern to search for. Repeatable; replaces the configured list.
        #[arg(short, long = "pattern")]
        patterns: Vec<String>,

        /// The report format.
        #[arg(short = 'f', long = "format", value_enum, default_value = "text")]
        format: OutputFormat,

        /// Report file name, relative to the scan root.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not write a report file.
        #[arg(long)]
        no_report: bool,

        /// How many occurrences per pattern to print for each file.
        #[arg(long, default_value_t = 2)]
        preview: usize,

        /// Exit with status 1 when any pattern is found.
        #[arg(long)]
        fail_on_match: bool,
    },

    /// Rewrite deprecated patterns in place
    ///
    /// EXAMPLES:
    ///   rolesweep rewrite --dry-run                 # Preview the configured table
    ///   rolesweep rewrite -c migrate-roles.yaml src/
    ///   rolesweep rewrite --find " || legacyCheck()" --replace ""
    ///
    /// Config file format (rolesweep.yaml):
    ///   patterns:
    ///     - match: "userClaims?.role === 'admin'"
    ///       replacement: "userClaims?.isOrgAdmin"
    ///     - match: " || userData?.role === 'owner'"
    ///       replacement: ""                      # empty = delete
    Rewrite {
        #[command(flatten)]
        walk: WalkOptions,

        /// A single literal string to replace (instead of the configured table).
        #[arg(long)]
        find: Option<String>,

        /// The replacement for --find. Defaults to deleting the match.
        #[arg(long, requires = "find")]
        replace: Option<String>,

        /// Preview the changes without modifying any files.
        #[arg(long)]
        dry_run: bool,
    },
}

/// Parses command-line arguments and returns the populated `Args` struct.
pub fn parse_args() -> Args {
    Args::parse()
}
