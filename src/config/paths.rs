//! Default path helpers and symlink checks.
//! Determines OS-appropriate config/data/log paths and detects symlinked ancestors.

use anyhow::{Context, Result, anyhow};
use dirs::{config_dir, data_dir};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file (or a directory holding `config.xml`).
pub const CONFIG_ENV_VAR: &str = "JD_MOVER_CONFIG";

const APP_DIR: &str = "jd_mover";
const CONFIG_FILE: &str = "config.xml";

/// Config path: `$JD_MOVER_CONFIG` if set, else the per-user config dir.
///
/// A relative env value is resolved against the current directory; a value that
/// names an existing directory gets `config.xml` appended.
pub fn default_config_path() -> Result<PathBuf> {
    if let Some(raw) = env::var_os(CONFIG_ENV_VAR).filter(|v| !v.is_empty()) {
        let mut p = PathBuf::from(raw);
        if p.is_relative() {
            p = env::current_dir()
                .context("resolve current directory for relative config path")?
                .join(p);
        }
        if p.is_dir() {
            p.push(CONFIG_FILE);
        }
        return Ok(p);
    }
    let base = config_dir()
        .or_else(|| home_fallback(&[".config"]))
        .ok_or_else(|| anyhow!("cannot determine a config directory (no HOME?)"))?;
    Ok(base.join(APP_DIR).join(CONFIG_FILE))
}

/// Directory holding the move ledger and rename undo log.
pub fn default_data_dir() -> Result<PathBuf> {
    let base = data_dir()
        .or_else(|| home_fallback(&[".local", "share"]))
        .ok_or_else(|| anyhow!("cannot determine a data directory (no HOME?)"))?;
    Ok(base.join(APP_DIR))
}

/// Default log file inside the data dir.
pub fn default_log_path() -> Result<PathBuf> {
    Ok(default_data_dir()?.join("jd_mover.log"))
}

fn home_fallback(parts: &[&str]) -> Option<PathBuf> {
    env::var_os("HOME").map(|h| parts.iter().fold(PathBuf::from(h), |p, s| p.join(s)))
}

/// Return true if any existing ancestor of `path` is a symlink.
pub fn path_has_symlink_ancestor(path: &Path) -> io::Result<bool> {
    let mut p = path.parent();
    while let Some(anc) = p {
        if anc.exists() {
            let meta = fs::symlink_metadata(anc)?;
            if meta.file_type().is_symlink() {
                return Ok(true);
            }
        }
        p = anc.parent();
    }
    Ok(false)
}
