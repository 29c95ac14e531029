//! The main entry point for the `rolesweep` command-line application.
//!
//! This file is responsible for parsing command-line arguments, setting up
//! logging and dispatching to the `find` and `rewrite` handlers in the library.

use env_logger::Env;
use rolesweep::cli::{self, Commands};
use rolesweep::config::Overrides;
use rolesweep::errors::Result;
use rolesweep::rewriter::{self, RewriteArgs};
use rolesweep::searcher::{self, SearchArgs};
use std::env;
use std::process;

fn main() {
    // With no arguments at all, print a short guide instead of clap's error.
    if env::args().len() == 1 {
        println!("Find and rewrite deprecated identifiers across a source tree\n");
        println!("QUICK START EXAMPLES:");
        println!("  rolesweep find                              # Report configured patterns under .");
        println!("  rolesweep find -p '.isOrgAdmin' src/        # Report one pattern");
        println!("  rolesweep rewrite --dry-run                 # Preview the rewrite table");
        println!("  rolesweep rewrite --find 'a' --replace 'b'  # One-off replacement\n");
        println!("Patterns are read from rolesweep.yaml in the scan root, or from --config.");
        println!("Run 'rolesweep --help' for full command list");
        process::exit(0);
    }

    let args = cli::parse_args();

    let env = if args.debug {
        Env::default().default_filter_or("debug")
    } else {
        Env::default().default_filter_or("warn")
    };
    env_logger::Builder::from_env(env).init();

    match run(args.command) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(2);
        }
    }
}

/// Runs a command and returns the process exit code.
fn run(command: Commands) -> Result<i32> {
    match command {
        Commands::Find {
            walk,
            patterns,
            format,
            output,
            no_report,
            preview,
            fail_on_match,
        } => {
            let summary = searcher::run_search(SearchArgs {
                root: walk.root,
                config: walk.config,
                patterns,
                overrides: Overrides {
                    extensions: walk.extensions,
                    excluded_dirs: walk.exclude,
                },
                format,
                output,
                write_report: !no_report,
                preview,
                respect_gitignore: walk.respect_gitignore,
            })?;
            Ok(if fail_on_match && summary.has_matches() { 1 } else { 0 })
        }
        Commands::Rewrite {
            walk,
            find,
            replace,
            dry_run,
        } => {
            rewriter::run_rewrite(RewriteArgs {
                root: walk.root,
                config: walk.config,
                find,
                replace,
                overrides: Overrides {
                    extensions: walk.extensions,
                    excluded_dirs: walk.exclude,
                },
                dry_run,
                respect_gitignore: walk.respect_gitignore,
            })?;
            Ok(0)
        }
    }
}
