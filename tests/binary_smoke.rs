use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use predicates::prelude::*;
use std::path::Path;

fn write_config(dir: &TempDir, jd: &Path) -> std::path::PathBuf {
    let xml = format!(
        r#"<config>
  <log_level>quiet</log_level>
  <data_dir>{data}</data_dir>
  <drives>
    <drive id="main" default="true">
      <base_path>{jd}</base_path>
    </drive>
  </drives>
  <catalog>
    <area name="20-29 Finance">
      <category name="21 Billing">
        <folder number="21.03" name="Invoices"/>
      </category>
    </area>
  </catalog>
</config>"#,
        data = dir.path().join("data").display(),
        jd = jd.display()
    );
    let cfg = dir.child("config.xml");
    cfg.write_str(&xml).unwrap();
    cfg.path().to_path_buf()
}

fn jd_mover(config: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("jd-mover"));
    cmd.env("JD_MOVER_CONFIG", config).env_remove("RUST_LOG");
    cmd
}

#[test]
fn print_config_reports_explicit_path() {
    let td = TempDir::new().unwrap();
    let cfg = td.path().join("somewhere.xml");
    jd_mover(&cfg)
        .arg("--print-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("JD_MOVER_CONFIG").and(predicate::str::contains("somewhere.xml")));
}

#[test]
fn missing_explicit_config_fails() {
    let td = TempDir::new().unwrap();
    jd_mover(&td.path().join("nope.xml"))
        .args(["history"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn move_history_and_rollback_round_trip() {
    let td = TempDir::new().unwrap();
    let jd = td.child("jd");
    jd.create_dir_all().unwrap();
    let inbox = td.child("inbox");
    inbox.create_dir_all().unwrap();
    let src = inbox.child("bill.pdf");
    src.write_str("pay me").unwrap();
    let cfg = write_config(&td, jd.path());

    jd_mover(&cfg)
        .args(["move", "21.03"])
        .arg(src.path())
        .assert()
        .success();
    src.assert(predicate::path::missing());
    jd.child("20-29 Finance/21 Billing/21.03 Invoices/bill.pdf")
        .assert("pay me");

    jd_mover(&cfg)
        .args(["history"])
        .assert()
        .success()
        .stdout(predicate::str::contains("21.03").and(predicate::str::contains("bill.pdf")));

    jd_mover(&cfg).args(["rollback", "1"]).assert().success();
    src.assert("pay me");
}

#[test]
fn dry_run_move_touches_nothing() {
    let td = TempDir::new().unwrap();
    let jd = td.child("jd");
    jd.create_dir_all().unwrap();
    let src = td.child("scan.png");
    src.write_str("img").unwrap();
    let cfg = write_config(&td, jd.path());

    jd_mover(&cfg)
        .args(["--dry-run", "move", "21.03"])
        .arg(src.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("would move"));
    src.assert("img");
    jd.child("20-29 Finance").assert(predicate::path::missing());
}

#[test]
fn rename_preview_json_lists_new_names() {
    let td = TempDir::new().unwrap();
    let jd = td.child("jd");
    jd.create_dir_all().unwrap();
    let a = td.child("document.pdf");
    a.write_str("a").unwrap();
    let cfg = write_config(&td, jd.path());

    let out = jd_mover(&cfg)
        .args(["--json", "rename", "preview", "--prefix", "2025_"])
        .arg(a.path())
        .assert()
        .success();
    let items: serde_json::Value = serde_json::from_slice(&out.get_output().stdout).unwrap();
    assert_eq!(items[0]["new_name"], "2025_document.pdf");
    assert_eq!(items[0]["will_change"], true);
    assert!(items[0]["conflict"].is_null());
    a.assert("a");
}

#[test]
fn rename_apply_then_undo_latest() {
    let td = TempDir::new().unwrap();
    let jd = td.child("jd");
    jd.create_dir_all().unwrap();
    let a = td.child("file.txt");
    a.write_str("a").unwrap();
    let cfg = write_config(&td, jd.path());

    jd_mover(&cfg)
        .args(["rename", "apply", "--number", "--start", "5"])
        .arg(a.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("undo id:"));
    td.child("file_005.txt").assert("a");

    jd_mover(&cfg).args(["rename", "undo"]).assert().success();
    a.assert("a");
    td.child("file_005.txt").assert(predicate::path::missing());
}
