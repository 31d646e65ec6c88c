//! Application orchestrator.
//! Loads/merges config, initializes logging, installs the ctrl-c handler and
//! dispatches the chosen subcommand.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use jd_mover::batch::{BatchEvent, BatchOptions, spawn_batch};
use jd_mover::catalog::{drives_from_config, folders_from_config};
use jd_mover::cli::{Args, Command, MoveArgs, RenameCommand, RenameRun, clean_path};
use jd_mover::config::{CONFIG_ENV_VAR, LoadResult, default_config_path, load_or_init};
use jd_mover::output as out;
use jd_mover::rename::{RenameEngine, RenamePreviewItem};
use jd_mover::{
    CancelToken, Config, FileKvStore, FileMover, JsonLedger, MoveLedger, MoveRequest, MoveResult,
    RecordId, RecordStatus,
};

use crate::logging::init_tracing;

/// Exit status for runs where some items failed.
const EXIT_PARTIAL: u8 = 1;
const EXIT_USAGE: u8 = 2;
const EXIT_CANCELLED: u8 = 130;

/// Run the CLI application and return the process exit status.
pub fn run(args: Args) -> Result<u8> {
    // Handle --print-config before logging init
    if args.print_config {
        print_config_location();
        return Ok(0);
    }

    let Some(command) = args.command.clone() else {
        out::print_error("no command given; run with --help for usage");
        return Ok(EXIT_USAGE);
    };

    let mut cfg = match load_or_init()? {
        LoadResult::Loaded { config, path } => {
            debug!(path = %path.display(), "loaded config");
            config
        }
        LoadResult::CreatedTemplate(path) => {
            out::print_success(&format!(
                "A template jd_mover config was written to: {}",
                path.display()
            ));
            out::print_info("Add your drives and JD catalog to it, then re-run this command.");
            out::print_info(&format!("To use a different location set {CONFIG_ENV_VAR}."));
            return Ok(0);
        }
    };
    args.apply_overrides(&mut cfg);
    cfg.validate()?;

    // Initialize logging and keep the guard so buffered lines are flushed on exit.
    let guard = init_tracing(&cfg.log_level, cfg.log_file.as_deref(), args.json).map_err(|e| {
        out::print_error(&format!("Failed to initialize logging: {e}"));
        e
    })?;

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || {
            cancel.cancel();
            out::print_warn("Received interrupt; finishing the current file and stopping...");
        })
        .context("install ctrl-c handler")?;
    }

    debug!(?args, "starting jd-mover");
    let result = match command {
        Command::Move(m) => run_move(&cfg, &m, &cancel, args.json),
        Command::Rollback { ids } => run_rollback(&cfg, &ids, &cancel, args.json),
        Command::History { all } => run_history(&cfg, all, args.json),
        Command::Rename(r) => run_rename(&cfg, r, &cancel, args.json),
    };

    // Ensure logs are flushed before exit
    drop(guard);
    result
}

fn print_config_location() {
    if let Some(p) = std::env::var_os(CONFIG_ENV_VAR) {
        out::print_info(&format!(
            "Using {CONFIG_ENV_VAR} (explicit):\n  {}\n",
            PathBuf::from(p).display()
        ));
        return;
    }
    match default_config_path() {
        Ok(p) => {
            out::print_info(&format!("Default jd_mover config path:\n  {}\n", p.display()));
            if p.exists() {
                out::print_info("A config file already exists at that location.");
            } else {
                out::print_info("No config file exists there yet. Run any command to create a template.");
            }
        }
        Err(e) => out::print_error(&format!("Could not determine a default config path: {e}")),
    }
}

fn open_ledger(cfg: &Config) -> Arc<JsonLedger> {
    Arc::new(JsonLedger::new(cfg.ledger_path()))
}

fn build_mover(cfg: &Config) -> FileMover {
    FileMover::new(
        Arc::new(folders_from_config(cfg)),
        Arc::new(drives_from_config(cfg)),
        open_ledger(cfg),
    )
    .with_settings(cfg.mover_settings())
}

fn build_rename_engine(cfg: &Config) -> RenameEngine {
    RenameEngine::new(Arc::new(FileKvStore::new(cfg.store_dir())), cfg.undo_history_limit)
}

fn exit_status(failed: usize, cancelled: bool) -> u8 {
    if cancelled {
        EXIT_CANCELLED
    } else if failed > 0 {
        EXIT_PARTIAL
    } else {
        0
    }
}

fn describe(result: &MoveResult, dry_run: bool) -> String {
    match result {
        MoveResult::Success {
            source,
            destination,
            record_id,
            ..
        } => match record_id {
            Some(id) => format!("[{id}] {} -> {}", source.display(), destination.display()),
            None if dry_run => format!("would move {} -> {}", source.display(), destination.display()),
            None => format!("{} -> {}", source.display(), destination.display()),
        },
        MoveResult::Skipped { source, reason, .. } => {
            format!("skipped {}: {reason}", source.display())
        }
        MoveResult::Failed { source, reason, .. } => {
            format!("failed {}: {reason}", source.display())
        }
    }
}

fn run_move(cfg: &Config, m: &MoveArgs, cancel: &CancelToken, json: bool) -> Result<u8> {
    let requests: Vec<MoveRequest> = m
        .files
        .iter()
        .map(|f| {
            let mut req = MoveRequest::new(clean_path(f), m.folder.trim()).with_conflict(m.conflict);
            if let Some(d) = &m.drive {
                req = req.on_drive(d.clone());
            }
            req
        })
        .collect();

    let handle = spawn_batch(
        build_mover(cfg),
        requests,
        BatchOptions {
            stop_on_error: cfg.stop_on_error,
        },
        cancel.clone(),
    );
    let dry_run = cfg.dry_run;
    let report = handle
        .wait(|event| {
            if json {
                return;
            }
            if let BatchEvent::FileComplete(r) = event {
                match r {
                    MoveResult::Failed { .. } => out::print_error(&describe(r, dry_run)),
                    MoveResult::Skipped { .. } => out::print_warn(&describe(r, dry_run)),
                    MoveResult::Success { .. } => out::print_user(&describe(r, dry_run)),
                }
            }
        })
        .context("move worker stopped without a report")?;

    if json {
        out::print_json(&report);
    } else {
        out::print_info(&format!(
            "{} of {} moved ({} skipped, {} failed)",
            report.success - report.skipped,
            report.total,
            report.skipped,
            report.failed
        ));
    }
    Ok(exit_status(report.failed, report.cancelled))
}

fn run_rollback(cfg: &Config, ids: &[RecordId], cancel: &CancelToken, json: bool) -> Result<u8> {
    let mover = build_mover(cfg);
    if cfg.dry_run {
        for &id in ids {
            match mover.ledger().get_record(id)? {
                Some(r) if r.status == RecordStatus::Moved => out::print_user(&format!(
                    "would restore [{id}] {} -> {}",
                    r.current_path.display(),
                    r.original_path.display()
                )),
                Some(r) => out::print_warn(&format!("[{id}] is already {}", r.status)),
                None => out::print_warn(&format!("[{id}] not found")),
            }
        }
        return Ok(0);
    }

    let summary = mover.batch_rollback(ids, cancel, |done, total| {
        debug!(done, total, "rollback progress");
    });
    if json {
        out::print_json(&summary);
    } else {
        for f in &summary.failures {
            out::print_error(&format!("[{}] {}", f.record_id, f.reason));
        }
        out::print_info(&format!(
            "{} of {} rolled back ({} failed)",
            summary.success, summary.total, summary.failed
        ));
    }
    Ok(exit_status(summary.failed, summary.cancelled))
}

fn run_history(cfg: &Config, all: bool, json: bool) -> Result<u8> {
    let ledger = open_ledger(cfg);
    let records: Vec<_> = ledger
        .list_records()?
        .into_iter()
        .filter(|r| all || r.status == RecordStatus::Moved)
        .collect();
    if json {
        out::print_json(&records);
        return Ok(0);
    }
    if records.is_empty() {
        out::print_info("no recorded moves");
    }
    for r in &records {
        out::print_user(&format!(
            "[{}] {} {} {} <- {} ({})",
            r.id,
            r.status,
            r.folder_number,
            r.current_path.display(),
            r.original_path.display(),
            r.moved_at.format("%Y-%m-%d %H:%M")
        ));
    }
    Ok(0)
}

fn print_preview(items: &[RenamePreviewItem]) {
    for item in items {
        let line = format!("{} -> {}", item.original_name, item.new_name);
        match item.conflict {
            Some(c) => out::print_warn(&format!("{line} [{c}]")),
            None if item.will_change => out::print_user(&line),
            None => out::print_user(&format!("{} (unchanged)", item.original_name)),
        }
    }
}

fn preview_for(engine: &RenameEngine, run: &RenameRun) -> Result<Vec<RenamePreviewItem>> {
    let rules = run.rules.to_options().validate()?;
    let files: Vec<PathBuf> = run.files.iter().map(|f| clean_path(f)).collect();
    Ok(engine.preview(&files, &rules))
}

fn run_rename(cfg: &Config, cmd: RenameCommand, cancel: &CancelToken, json: bool) -> Result<u8> {
    let engine = build_rename_engine(cfg);
    match cmd {
        RenameCommand::Preview(run) => {
            let preview = preview_for(&engine, &run)?;
            if json {
                out::print_json(&preview);
            } else {
                print_preview(&preview);
            }
            Ok(0)
        }
        RenameCommand::Apply(run) => {
            let preview = preview_for(&engine, &run)?;
            if cfg.dry_run {
                if json {
                    out::print_json(&preview);
                } else {
                    print_preview(&preview);
                }
                return Ok(0);
            }
            let result = engine.execute(&preview, cancel, |done, total| {
                debug!(done, total, "rename progress");
            })?;
            if json {
                out::print_json(&result);
            } else {
                for e in &result.errors {
                    out::print_error(&format!("{}: {}", e.path.display(), e.reason));
                }
                out::print_info(&format!("{} of {} renamed", result.count, result.total));
                if let Some(id) = &result.undo_id {
                    out::print_user(&format!("undo id: {id}"));
                }
            }
            Ok(exit_status(result.errors.len(), result.cancelled))
        }
        RenameCommand::Undo { id } => {
            let progress = |done: usize, total: usize| debug!(done, total, "undo progress");
            let result = match id {
                Some(id) => engine.undo(id.trim(), cancel, progress)?,
                None => engine.undo_latest(cancel, progress)?,
            };
            if json {
                out::print_json(&result);
            } else {
                for e in &result.errors {
                    out::print_error(&format!("{}: {}", e.path.display(), e.reason));
                }
                out::print_info(&format!("{} of {} restored", result.count, result.total));
                if !result.log_removed {
                    out::print_warn(&format!(
                        "{} file(s) still to restore; fix the errors above and run undo again",
                        result.total - result.count
                    ));
                }
            }
            Ok(exit_status(result.errors.len(), result.cancelled))
        }
        RenameCommand::Log => {
            let records = engine.history().list()?;
            if json {
                out::print_json(&records);
                return Ok(0);
            }
            if records.is_empty() {
                out::print_info("no rename batches to undo");
            }
            for r in &records {
                out::print_user(&format!(
                    "{}  {}  {} file(s)",
                    r.id,
                    r.created_at.format("%Y-%m-%d %H:%M:%S"),
                    r.entries.len()
                ));
            }
            Ok(0)
        }
    }
}
