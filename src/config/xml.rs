//! XML configuration support.
//! - Loads settings, drives and the JD catalog from config.xml (quick_xml + serde).
//! - Creates a commented template at the default location if missing.
//!
//! Notes:
//! - Unknown elements or attributes are a hard error, so typos surface early.
//! - An explicit `$JD_MOVER_CONFIG` that does not exist is an error; no template is written there.

use anyhow::{Context, Result, bail};
use quick_xml::de::from_str as from_xml_str;
use serde::{Deserialize, Deserializer};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

use super::paths::{CONFIG_ENV_VAR, default_config_path, path_has_symlink_ancestor};
use super::types::{AreaEntry, CategoryEntry, Config, DriveConfig, FolderEntry, LogLevel};
use crate::platform::{set_dir_mode_0700, set_file_mode_0600, write_new_file_private};

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename = "config", deny_unknown_fields)]
struct XmlConfig {
    log_level: Option<String>,
    log_file: Option<String>,
    data_dir: Option<String>,
    #[serde(default, deserialize_with = "de_trimmed_opt")]
    dry_run: Option<bool>,
    #[serde(default, deserialize_with = "de_trimmed_opt")]
    preserve_metadata: Option<bool>,
    #[serde(default, deserialize_with = "de_trimmed_opt")]
    unique_name_attempts: Option<u32>,
    #[serde(default, deserialize_with = "de_trimmed_opt")]
    undo_history_limit: Option<usize>,
    #[serde(default, deserialize_with = "de_trimmed_opt")]
    stop_on_error: Option<bool>,
    #[serde(default)]
    drives: XmlDrives,
    #[serde(default)]
    catalog: XmlCatalog,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct XmlDrives {
    #[serde(rename = "drive", default)]
    drive: Vec<XmlDrive>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct XmlDrive {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@default", default)]
    default: Option<bool>,
    base_path: String,
    jd_root: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct XmlCatalog {
    #[serde(rename = "area", default)]
    area: Vec<XmlArea>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct XmlArea {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "category", default)]
    category: Vec<XmlCategory>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct XmlCategory {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "folder", default)]
    folder: Vec<XmlFolder>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct XmlFolder {
    #[serde(rename = "@number")]
    number: String,
    #[serde(rename = "@name")]
    name: String,
}

/// Trim surrounding whitespace before parsing an optional scalar.
/// An empty element reads as unset.
fn de_trimmed_opt<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse::<T>().map(Some).map_err(serde::de::Error::custom),
    }
}

fn non_empty_path(s: Option<&str>) -> Option<PathBuf> {
    s.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(PathBuf::from)
}

// Map XmlConfig -> Config
fn xml_to_config(parsed: XmlConfig) -> Result<Config> {
    let mut cfg = Config::default();

    if let Some(s) = parsed.log_level.as_deref() {
        cfg.log_level = s.parse::<LogLevel>().map_err(anyhow::Error::msg)?;
    }
    cfg.log_file = non_empty_path(parsed.log_file.as_deref());
    if let Some(d) = non_empty_path(parsed.data_dir.as_deref()) {
        cfg.data_dir = d;
    }
    cfg.dry_run = parsed.dry_run.unwrap_or(false);
    cfg.preserve_metadata = parsed.preserve_metadata.unwrap_or(false);
    if let Some(n) = parsed.unique_name_attempts {
        cfg.unique_name_attempts = n;
    }
    if let Some(n) = parsed.undo_history_limit {
        cfg.undo_history_limit = n;
    }
    cfg.stop_on_error = parsed.stop_on_error.unwrap_or(false);

    cfg.drives = parsed
        .drives
        .drive
        .into_iter()
        .map(|d| {
            Ok(DriveConfig {
                id: d.id.trim().to_string(),
                base_path: non_empty_path(Some(&d.base_path))
                    .with_context(|| format!("drive '{}' has an empty base_path", d.id))?,
                jd_root: non_empty_path(d.jd_root.as_deref()),
                default: d.default.unwrap_or(false),
            })
        })
        .collect::<Result<_>>()?;

    cfg.catalog = parsed
        .catalog
        .area
        .into_iter()
        .map(|a| AreaEntry {
            name: a.name.trim().to_string(),
            categories: a
                .category
                .into_iter()
                .map(|c| CategoryEntry {
                    name: c.name.trim().to_string(),
                    folders: c
                        .folder
                        .into_iter()
                        .map(|f| FolderEntry {
                            number: f.number.trim().to_string(),
                            name: f.name.trim().to_string(),
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();

    Ok(cfg)
}

/// Parse config XML text.
pub fn parse_config_xml(contents: &str) -> Result<Config> {
    let parsed: XmlConfig = from_xml_str(contents).context("parse config xml")?;
    xml_to_config(parsed)
}

/// Load a Config from a specific XML file path.
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read config xml '{}'", path.display()))?;
    parse_config_xml(&contents).with_context(|| format!("load config '{}'", path.display()))
}

/// Outcome of locating the config file.
#[derive(Debug)]
pub enum LoadResult {
    Loaded { config: Config, path: PathBuf },
    /// No config existed at the default location; a template was written there.
    CreatedTemplate(PathBuf),
}

/// Load the active config, writing a template first if the default one is missing.
pub fn load_or_init() -> Result<LoadResult> {
    let explicit = env::var_os(CONFIG_ENV_VAR).is_some_and(|v| !v.is_empty());
    let path = default_config_path()?;
    if !path.exists() {
        if explicit {
            bail!(
                "{CONFIG_ENV_VAR} points to '{}', which does not exist",
                path.display()
            );
        }
        create_template_config(&path)?;
        return Ok(LoadResult::CreatedTemplate(path));
    }
    let config = load_config_from_xml_path(&path)?;
    Ok(LoadResult::Loaded { config, path })
}

const TEMPLATE: &str = r#"<!--
  jd_mover configuration (XML)

  Settings:
    log_level             -> quiet | normal | info | debug
    log_file              -> path to a log file (optional)
    data_dir              -> where the move ledger and rename undo log live
    dry_run               -> true: report moves without touching files
    preserve_metadata     -> true: keep timestamps/permissions on cross-device copies
    unique_name_attempts  -> numbered variants tried before giving up (default 100)
    undo_history_limit    -> rename batches kept for undo (default 10)
    stop_on_error         -> true: batch moves halt at the first failure

  Drives (at least one is needed to move files):
    <drive id="main" default="true">
      <base_path>/path/to/storage</base_path>
      <jd_root>Johnny.Decimal</jd_root>
    </drive>

  Catalog:
    <area name="20-29 Finance">
      <category name="21 Billing">
        <folder number="21.03" name="Invoices"/>
      </category>
    </area>

  CLI flags override values in this file.
-->
<config>
  <log_level>normal</log_level>
  <preserve_metadata>false</preserve_metadata>
  <unique_name_attempts>100</unique_name_attempts>
  <undo_history_limit>10</undo_history_limit>
  <stop_on_error>false</stop_on_error>
  <drives>
  </drives>
  <catalog>
  </catalog>
</config>
"#;

/// Create the template config file and its parent directory.
/// Refuses to write through symlinked ancestors.
pub fn create_template_config(path: &Path) -> Result<()> {
    if path_has_symlink_ancestor(path)? {
        bail!(
            "Refusing to create config: ancestor of {} is a symlink",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create config directory '{}'", parent.display()))?;
        let _ = set_dir_mode_0700(parent);
    }

    write_new_file_private(path, TEMPLATE.as_bytes())
        .with_context(|| format!("write template config '{}'", path.display()))?;
    let _ = set_file_mode_0600(path);

    info!("Created template config at {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"
<config>
  <log_level> debug </log_level>
  <data_dir>/var/lib/jd</data_dir>
  <unique_name_attempts> 50 </unique_name_attempts>
  <stop_on_error>true</stop_on_error>
  <drives>
    <drive id="main" default="true">
      <base_path>/mnt/data</base_path>
      <jd_root>JD</jd_root>
    </drive>
    <drive id="usb">
      <base_path>/media/usb</base_path>
    </drive>
  </drives>
  <catalog>
    <area name="20-29 Finance">
      <category name="21 Billing">
        <folder number="21.01" name="Receipts"/>
        <folder number="21.03" name="Invoices"/>
      </category>
    </area>
  </catalog>
</config>
"#;

    #[test]
    fn parses_full_document() {
        let cfg = parse_config_xml(SAMPLE).unwrap();
        assert_eq!(cfg.log_level, LogLevel::Debug);
        assert_eq!(cfg.data_dir, PathBuf::from("/var/lib/jd"));
        assert_eq!(cfg.unique_name_attempts, 50);
        assert!(cfg.stop_on_error);
        assert_eq!(cfg.drives.len(), 2);
        assert!(cfg.drives[0].default);
        assert_eq!(cfg.drives[0].jd_root, Some(PathBuf::from("JD")));
        assert!(!cfg.drives[1].default);
        assert_eq!(cfg.drives[1].jd_root, None);
        assert_eq!(cfg.folder_count(), 2);
        assert_eq!(cfg.catalog[0].categories[0].folders[1].name, "Invoices");
    }

    #[test]
    fn template_parses_to_defaults() {
        let cfg = parse_config_xml(TEMPLATE).unwrap();
        assert!(cfg.drives.is_empty());
        assert_eq!(cfg.undo_history_limit, 10);
        assert_eq!(cfg.log_level, LogLevel::Normal);
    }

    #[test]
    fn unknown_element_is_rejected() {
        let err = parse_config_xml("<config><download_base>/x</download_base></config>");
        assert!(err.is_err());
    }

    #[test]
    fn bad_number_is_rejected() {
        let err = parse_config_xml("<config><undo_history_limit>ten</undo_history_limit></config>");
        assert!(err.is_err());
    }

    #[test]
    fn bad_log_level_is_rejected() {
        assert!(parse_config_xml("<config><log_level>loud</log_level></config>").is_err());
    }

    #[test]
    fn empty_log_file_means_none() {
        let cfg = parse_config_xml("<config><log_file>   </log_file></config>").unwrap();
        assert_eq!(cfg.log_file, None);
    }

    #[test]
    fn template_is_created_once() {
        let td = tempdir().unwrap();
        let path = td.path().join("cfg").join("config.xml");
        create_template_config(&path).unwrap();
        assert!(path.exists());
        assert!(create_template_config(&path).is_err());
        let cfg = load_config_from_xml_path(&path).unwrap();
        assert!(cfg.drives.is_empty());
    }
}
