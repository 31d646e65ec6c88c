//! Folder and drive repositories built from the loaded config.

use crate::config::Config;
use crate::repo::{DriveInfo, FolderInfo, StaticDrives, StaticFolders};

/// Flatten the area/category/folder tree into a lookup by folder number.
pub fn folders_from_config(cfg: &Config) -> StaticFolders {
    StaticFolders::new(cfg.catalog.iter().flat_map(|area| {
        area.categories.iter().flat_map(move |cat| {
            cat.folders.iter().map(move |f| FolderInfo {
                number: f.number.clone(),
                name: f.name.clone(),
                category_name: cat.name.clone(),
                area_name: area.name.clone(),
            })
        })
    }))
}

pub fn drives_from_config(cfg: &Config) -> StaticDrives {
    let drives = cfg
        .drives
        .iter()
        .map(|d| DriveInfo {
            id: d.id.clone(),
            base_path: d.base_path.clone(),
            jd_root_path: d.jd_root.clone(),
        })
        .collect();
    let default_id = cfg.drives.iter().find(|d| d.default).map(|d| d.id.clone());
    StaticDrives::new(drives, default_id)
}
