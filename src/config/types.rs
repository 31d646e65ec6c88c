//! Core configuration types.
//! - Config holds runtime settings with sensible defaults.
//! - LogLevel represents verbosity with simple parsing helpers.
//! - DriveConfig / AreaEntry describe where the JD tree lives and what it contains.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::paths;
use crate::mover::MoverSettings;
use crate::naming::DEFAULT_MAX_ATTEMPTS;
use crate::rename::DEFAULT_HISTORY_LIMIT;

/// Program-defined verbosity levels exposed to users/config.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Informational output (default)
    #[default]
    Normal,
    /// More info (like verbose)
    Info,
    /// Debug/trace
    Debug,
}

impl LogLevel {
    /// Parse common string names into our LogLevel (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" | "detailed" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// A storage location holding (part of) the JD tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriveConfig {
    pub id: String,
    pub base_path: PathBuf,
    /// JD root inside the drive; relative values are joined onto `base_path`.
    pub jd_root: Option<PathBuf>,
    /// Used when a request names no drive.
    pub default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderEntry {
    /// Full JD id, e.g. "21.03".
    pub number: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryEntry {
    /// Display name used as the directory name, e.g. "21 Billing".
    pub name: String,
    pub folders: Vec<FolderEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AreaEntry {
    /// Display name used as the directory name, e.g. "20-29 Finance".
    pub name: String,
    pub categories: Vec<CategoryEntry>,
}

/// Runtime configuration.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Console verbosity
    pub log_level: LogLevel,
    /// Optional path to a log file
    pub log_file: Option<PathBuf>,
    /// Where the move ledger and rename undo log are kept
    pub data_dir: PathBuf,
    /// If true, report actions but do not modify the filesystem
    pub dry_run: bool,
    /// If true, preserve permissions and timestamps after cross-device copies
    pub preserve_metadata: bool,
    /// Numbered variants tried before a unique-name lookup gives up
    pub unique_name_attempts: u32,
    /// Rename batches kept in the undo log
    pub undo_history_limit: usize,
    /// Default for batch moves: halt at the first failure
    pub stop_on_error: bool,
    pub drives: Vec<DriveConfig>,
    pub catalog: Vec<AreaEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Normal,
            log_file: None,
            data_dir: paths::default_data_dir().unwrap_or_else(|_| PathBuf::from(".jd_mover")),
            dry_run: false,
            preserve_metadata: false,
            unique_name_attempts: DEFAULT_MAX_ATTEMPTS,
            undo_history_limit: DEFAULT_HISTORY_LIMIT,
            stop_on_error: false,
            drives: Vec::new(),
            catalog: Vec::new(),
        }
    }
}

impl Config {
    /// Mover knobs derived from this config.
    pub fn mover_settings(&self) -> MoverSettings {
        MoverSettings {
            preserve_metadata: self.preserve_metadata,
            dry_run: self.dry_run,
            unique_name_attempts: self.unique_name_attempts,
        }
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join("ledger.json")
    }

    /// Directory of the key/value store backing the rename undo log.
    pub fn store_dir(&self) -> PathBuf {
        self.data_dir.join("store")
    }

    pub fn folder_count(&self) -> usize {
        self.catalog
            .iter()
            .flat_map(|a| &a.categories)
            .map(|c| c.folders.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_parses_aliases() {
        assert_eq!(LogLevel::parse(" DEBUG "), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("verbose"), Some(LogLevel::Info));
        assert_eq!(LogLevel::parse("none"), Some(LogLevel::Quiet));
        assert_eq!(LogLevel::parse("loud"), None);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn defaults_match_engine_defaults() {
        let c = Config::default();
        assert_eq!(c.unique_name_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(c.undo_history_limit, DEFAULT_HISTORY_LIMIT);
        assert!(!c.dry_run);
        assert_eq!(c.ledger_path(), c.data_dir.join("ledger.json"));
        assert_eq!(c.mover_settings().unique_name_attempts, DEFAULT_MAX_ATTEMPTS);
    }
}
