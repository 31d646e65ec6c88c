//! CLI definition and parsing.
//! Defines Args (global flags + subcommands) and provides parse() for command-line handling.
//!
//! Notes:
//! - --debug is a shorthand for --log-level debug.
//! - File arguments have stray surrounding quotes removed (PowerShell/CMD quoting leftovers).

use clap::{Args as ClapArgs, Parser, Subcommand, ValueHint};
use std::path::{Path, PathBuf};

use crate::config::types::{Config, LogLevel};
use crate::mover::ConflictStrategy;
use crate::rename::{CaseTransform, FindReplace, NumberPosition, Numbering, RenameOptions};
use crate::repo::RecordId;

/// Move, rename and undo file organization into a Johnny.Decimal tree.
/// CLI flags override config values (which are loaded from XML if present).
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Organize files into a Johnny.Decimal folder tree")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Enable debug logging (equivalent to `--log-level debug`).
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    /// Set log level. One of: quiet, normal, info, debug.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Print the config file location used by jd-mover and exit.
    #[arg(long)]
    pub print_config: bool,

    /// Show what would be done, but do not modify files or the ledger.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Preserve permissions and timestamps on cross-device moves.
    #[arg(long, global = true)]
    pub preserve_metadata: bool,

    /// Override the directory holding the ledger and undo log.
    #[arg(long, global = true, value_hint = ValueHint::DirPath)]
    pub data_dir: Option<PathBuf>,

    /// Emit results and logs as JSON.
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Move files into a JD folder.
    Move(MoveArgs),
    /// Move recorded files back to where they came from.
    Rollback {
        /// Ledger record ids.
        #[arg(required = true)]
        ids: Vec<RecordId>,
    },
    /// List recorded moves.
    History {
        /// Include records that were already rolled back.
        #[arg(long)]
        all: bool,
    },
    /// Pattern-based bulk rename with undo.
    #[command(subcommand)]
    Rename(RenameCommand),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct MoveArgs {
    /// Target JD folder number, e.g. 21.03.
    pub folder: String,

    /// Files to move.
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    pub files: Vec<PathBuf>,

    /// What to do when a file with the same name already exists.
    #[arg(long, value_enum, default_value_t = ConflictStrategy::Rename)]
    pub conflict: ConflictStrategy,

    /// Drive id (defaults to the configured default drive).
    #[arg(long)]
    pub drive: Option<String>,

    /// Halt at the first failed file.
    #[arg(long)]
    pub stop_on_error: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum RenameCommand {
    /// Show what the rules would do.
    Preview(RenameRun),
    /// Rename files and record an undo entry.
    Apply(RenameRun),
    /// Reverse a rename batch (the most recent when no id is given).
    Undo { id: Option<String> },
    /// List undoable rename batches, newest first.
    Log,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RenameRun {
    #[command(flatten)]
    pub rules: RuleArgs,

    /// Files to rename, in numbering order.
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    pub files: Vec<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct RuleArgs {
    /// Text to find in the base name.
    #[arg(long)]
    pub find: Option<String>,
    /// Replacement text (default: remove the match).
    #[arg(long, requires = "find")]
    pub replace: Option<String>,
    /// Replace every occurrence, not only the first.
    #[arg(long, requires = "find")]
    pub all: bool,
    /// Match `--find` case-insensitively.
    #[arg(long, requires = "find")]
    pub ignore_case: bool,

    #[arg(long, value_enum)]
    pub case: Option<CaseTransform>,

    #[arg(long)]
    pub prefix: Option<String>,
    #[arg(long)]
    pub suffix: Option<String>,

    /// Append a zero-padded sequence number.
    #[arg(long)]
    pub number: bool,
    #[arg(long, default_value_t = 1, requires = "number")]
    pub start: u64,
    #[arg(long, default_value_t = 3, requires = "number")]
    pub digits: usize,
    #[arg(long, value_enum, default_value_t = NumberPosition::Suffix, requires = "number")]
    pub number_position: NumberPosition,
    #[arg(long, default_value = "_", requires = "number")]
    pub separator: String,
}

impl RuleArgs {
    /// Unvalidated options; call `validate()` on the result.
    pub fn to_options(&self) -> RenameOptions {
        RenameOptions {
            find_replace: self.find.as_ref().map(|find| FindReplace {
                find: find.clone(),
                replace: self.replace.clone().unwrap_or_default(),
                all: self.all,
                match_case: !self.ignore_case,
            }),
            case: self.case,
            prefix: self.prefix.clone(),
            suffix: self.suffix.clone(),
            number: self.number.then(|| Numbering {
                start: self.start,
                digits: self.digits,
                position: self.number_position,
                separator: self.separator.clone(),
            }),
        }
    }
}

impl Args {
    /// Effective log level derived from flags.
    /// Precedence: --debug > --log-level value > None (use config default).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level.as_deref().and_then(LogLevel::parse)
    }

    /// Apply CLI overrides to a loaded Config (in-place). No-ops for unset flags.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
        if self.dry_run {
            cfg.dry_run = true;
        }
        if self.preserve_metadata {
            cfg.preserve_metadata = true;
        }
        if let Some(d) = &self.data_dir {
            cfg.data_dir = d.clone();
        }
        if let Some(Command::Move(m)) = &self.command
            && m.stop_on_error
        {
            cfg.stop_on_error = true;
        }
    }
}

/// Strip quoting leftovers from a user-supplied path.
pub fn clean_path(p: &Path) -> PathBuf {
    let s = p.to_string_lossy();
    let trimmed = s.trim();
    let quoted = trimmed.len() >= 2
        && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
            || (trimmed.starts_with('\'') && trimmed.ends_with('\'')));
    if quoted {
        PathBuf::from(&trimmed[1..trimmed.len() - 1])
    } else {
        // Apostrophes inside names are legitimate; only a stray trailing `"` is dropped.
        PathBuf::from(trimmed.trim_end_matches('"'))
    }
}

pub fn parse() -> Args {
    Args::parse()
}
