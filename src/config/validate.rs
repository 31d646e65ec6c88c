//! Config validation logic.
//! Verifies limits, unique drive ids and folder numbers, and reports drives whose
//! base directory is currently unavailable.

use anyhow::{Result, bail};
use std::collections::HashSet;
use tracing::{info, warn};

use super::types::Config;

impl Config {
    /// Validate values that would otherwise fail late and confusingly.
    ///
    /// A drive whose base directory is missing only warns: removable media may
    /// be unplugged, and the resolver reports it when the drive is actually used.
    pub fn validate(&self) -> Result<()> {
        if self.unique_name_attempts == 0 {
            bail!("unique_name_attempts must be at least 1");
        }
        if self.undo_history_limit == 0 {
            bail!("undo_history_limit must be at least 1");
        }

        let mut ids = HashSet::new();
        for d in &self.drives {
            if d.id.is_empty() {
                bail!("drive with base_path '{}' has an empty id", d.base_path.display());
            }
            if !ids.insert(d.id.as_str()) {
                bail!("duplicate drive id '{}'", d.id);
            }
            if !d.base_path.is_dir() {
                warn!(drive = %d.id, base = %d.base_path.display(), "drive base directory is not available");
            }
        }
        if self.drives.iter().filter(|d| d.default).count() > 1 {
            bail!("more than one drive is marked default");
        }

        let mut numbers = HashSet::new();
        for area in &self.catalog {
            for cat in &area.categories {
                for f in &cat.folders {
                    if f.number.is_empty() {
                        bail!("folder '{}' in '{}' has no number", f.name, cat.name);
                    }
                    if !numbers.insert(f.number.as_str()) {
                        bail!("duplicate folder number '{}'", f.number);
                    }
                }
            }
        }

        info!(
            drives = self.drives.len(),
            folders = numbers.len(),
            data_dir = %self.data_dir.display(),
            "config validated"
        );
        Ok(())
    }
}
