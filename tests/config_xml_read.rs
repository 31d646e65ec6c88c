use jd_mover::config::{CONFIG_ENV_VAR, LoadResult, load_or_init, parse_config_xml};
use jd_mover::{Config, LogLevel};
use serial_test::serial;
use std::env;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const FULL: &str = r#"
<config>
  <log_level>info</log_level>
  <data_dir>/srv/jd-data</data_dir>
  <undo_history_limit>3</undo_history_limit>
  <drives>
    <drive id="nas" default="true">
      <base_path>/mnt/nas</base_path>
      <jd_root>Johnny.Decimal</jd_root>
    </drive>
  </drives>
  <catalog>
    <area name="30-39 Life">
      <category name="31 Media">
        <folder number="31.01" name="Photos"/>
        <folder number="31.02" name="Music"/>
      </category>
    </area>
  </catalog>
</config>
"#;

struct EnvGuard;

impl EnvGuard {
    fn set(path: &Path) -> Self {
        unsafe { env::set_var(CONFIG_ENV_VAR, path) };
        EnvGuard
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        unsafe { env::remove_var(CONFIG_ENV_VAR) };
    }
}

#[test]
fn full_document_maps_onto_config() {
    let cfg: Config = parse_config_xml(FULL).unwrap();
    assert_eq!(cfg.log_level, LogLevel::Info);
    assert_eq!(cfg.undo_history_limit, 3);
    assert_eq!(cfg.ledger_path(), Path::new("/srv/jd-data").join("ledger.json"));
    assert_eq!(cfg.drives.len(), 1);
    assert!(cfg.drives[0].default);
    assert_eq!(cfg.folder_count(), 2);
    cfg.validate().unwrap();
}

#[test]
fn unknown_elements_are_rejected() {
    let bad = "<config><log_levl>debug</log_levl></config>";
    assert!(parse_config_xml(bad).is_err());
}

#[test]
#[serial]
fn env_var_selects_the_config_file() {
    let td = tempdir().unwrap();
    let path = td.path().join("custom.xml");
    fs::write(&path, FULL).unwrap();
    let _g = EnvGuard::set(&path);

    match load_or_init().unwrap() {
        LoadResult::Loaded { config, path: used } => {
            assert_eq!(used, path);
            assert_eq!(config.drives[0].id, "nas");
        }
        LoadResult::CreatedTemplate(p) => panic!("unexpected template at {}", p.display()),
    }
}

#[test]
#[serial]
fn env_var_pointing_nowhere_is_an_error() {
    let td = tempdir().unwrap();
    let path = td.path().join("missing.xml");
    let _g = EnvGuard::set(&path);

    let err = load_or_init().unwrap_err();
    assert!(err.to_string().contains("does not exist"));
    assert!(!path.exists(), "no template is written for an explicit path");
}

#[test]
#[serial]
fn env_var_directory_gets_config_xml() {
    let td = tempdir().unwrap();
    fs::write(td.path().join("config.xml"), FULL).unwrap();
    let _g = EnvGuard::set(td.path());

    match load_or_init().unwrap() {
        LoadResult::Loaded { path, .. } => assert_eq!(path, td.path().join("config.xml")),
        LoadResult::CreatedTemplate(p) => panic!("unexpected template at {}", p.display()),
    }
}
