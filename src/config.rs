use crate::errors::Result;
use crate::filter::{PathFilter, normalize_extension};
use crate::patterns::{PatternEntry, PatternList, PatternTable};
use log::{debug, warn};
use serde::Deserialize;
use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The config file picked up from the scan root when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "rolesweep.yaml";

/// The report file name used when neither the config nor the CLI names one.
pub const DEFAULT_REPORT_STEM: &str = "deprecated_patterns_report";

const DEFAULT_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "py"];

const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "__pycache__",
    ".next",
    "coverage",
    ".vscode",
    ".idea",
];

/// Everything a run needs to know, as loaded from YAML.
///
/// Every field is optional in the file; missing fields take the defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// File extensions to process, with or without a leading dot.
    pub extensions: Vec<String>,
    /// Directory names that exclude every path below them.
    pub excluded_dirs: Vec<String>,
    /// The ordered rewrite table.
    pub patterns: Vec<PatternEntry>,
    /// Literal strings reported by search mode.
    pub search: Vec<String>,
    /// Report file name, relative to the scan root.
    pub report_file: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            excluded_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect(),
            patterns: Vec::new(),
            search: Vec::new(),
            report_file: None,
        }
    }
}

impl RunConfig {
    pub fn path_filter(&self) -> PathFilter {
        PathFilter::new(&self.extensions, &self.excluded_dirs)
    }

    /// The rewrite table with no-op pairs removed.
    ///
    /// An entry whose match equals its replacement can never change a file, so
    /// it is dropped here with a warning rather than carried into the engine.
    pub fn pattern_table(&self) -> Result<PatternTable> {
        let (table, dropped) = PatternTable::new(self.patterns.clone())?.without_noops();
        for entry in &dropped {
            warn!("Ignoring no-op pattern {:?} (match equals replacement)", entry.find);
        }
        Ok(table)
    }

    /// The search-mode pattern list.
    ///
    /// Falls back to the match strings of the rewrite table, so a search
    /// reports exactly what a rewrite would touch.
    pub fn pattern_list(&self) -> Result<PatternList> {
        if self.search.is_empty() {
            PatternList::new(self.pattern_table()?.match_strings())
        } else {
            PatternList::new(self.search.iter().cloned())
        }
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub extensions: Vec<String>,
    pub excluded_dirs: Vec<String>,
}

impl Overrides {
    /// Replaces the configured sets with any non-empty override.
    pub fn apply(&self, config: &mut RunConfig) {
        if !self.extensions.is_empty() {
            config.extensions = self
                .extensions
                .iter()
                .map(|e| normalize_extension(e))
                .collect();
        }
        if !self.excluded_dirs.is_empty() {
            config.excluded_dirs = self.excluded_dirs.clone();
        }
    }
}

/// A utility for locating and loading run configurations.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Finds the configuration file by searching in a prioritized list of locations.
    ///
    /// The search order is:
    /// 1. `config_path` itself (absolute, or relative to the current directory).
    /// 2. A path relative to the scan root.
    /// 3. Inside the `~/.rolesweep` directory.
    /// 4. Next to the executable.
    pub fn find_config(config_path: &Path, root: &Path) -> Result<PathBuf> {
        if config_path.exists() {
            return Ok(config_path.to_path_buf());
        }

        let mut tried = vec![config_path.to_path_buf()];
        if config_path.is_absolute() {
            return Err(not_found(config_path, &tried));
        }

        let in_root = root.join(config_path);
        if in_root.exists() {
            return Ok(in_root);
        }
        tried.push(in_root);

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".rolesweep").join(config_path);
            if home_config.exists() {
                return Ok(home_config);
            }
            tried.push(home_config);
        }

        if let Ok(exe_path) = env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let exe_config = exe_dir.join(config_path);
                if exe_config.exists() {
                    return Ok(exe_config);
                }
                tried.push(exe_config);
            }
        }

        Err(not_found(config_path, &tried))
    }

    /// Loads a `RunConfig` from a YAML file.
    pub fn load(path: &Path) -> Result<RunConfig> {
        let file = File::open(path)?;
        let config: RunConfig = serde_yaml::from_reader(file)?;
        Ok(config)
    }

    /// Produces the configuration for a run rooted at `root`.
    ///
    /// An explicit path must resolve. Without one, `root/rolesweep.yaml` is
    /// used when present and the built-in defaults otherwise.
    pub fn resolve(explicit: Option<&Path>, root: &Path) -> Result<RunConfig> {
        match explicit {
            Some(path) => {
                let resolved = Self::find_config(path, root)?;
                println!("Using config file: {}", resolved.display());
                Self::load(&resolved)
            }
            None => {
                let candidate = root.join(DEFAULT_CONFIG_FILE);
                if candidate.is_file() {
                    println!("Using config file: {}", candidate.display());
                    Self::load(&candidate)
                } else {
                    debug!("No {} in {}, using defaults", DEFAULT_CONFIG_FILE, root.display());
                    Ok(RunConfig::default())
                }
            }
        }
    }
}

fn not_found(config_path: &Path, tried: &[PathBuf]) -> crate::errors::Error {
    let tried: Vec<String> = tried.iter().map(|p| p.display().to_string()).collect();
    format!(
        "Config file '{}' not found. Searched in:\n  - {}",
        config_path.display(),
        tried.join("\n  - ")
    )
    .into()
}
