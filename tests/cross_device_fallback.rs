mod common;

use common::{RecordingFs, Tree, catalog, drives, invoices_dir};
use jd_mover::{FileMover, MemoryLedger, MoveRequest, MoveResult};
use std::fs;
use std::sync::Arc;

fn mover_with(tree: &Tree, fs: Arc<RecordingFs>) -> FileMover {
    FileMover::new(
        Arc::new(catalog()),
        Arc::new(drives(&tree.jd)),
        Arc::new(MemoryLedger::new()),
    )
    .with_fs(fs)
}

#[test]
fn cross_device_move_copies_then_deletes() {
    let tree = Tree::new();
    let src = tree.file("report.pdf", "payload");
    let fs_double = Arc::new(RecordingFs::cross_device());
    let m = mover_with(&tree, fs_double.clone());

    let result = m.move_file(&MoveRequest::new(&src, "21.03"));
    let MoveResult::Success { copied, destination, .. } = &result else {
        panic!("expected success, got {result:?}");
    };
    assert!(*copied);
    assert_eq!(fs_double.calls(), vec!["rename", "copy", "remove"]);
    assert!(!src.exists());
    assert_eq!(fs::read_to_string(destination).unwrap(), "payload");
    assert_eq!(*destination, invoices_dir(&tree).join("report.pdf"));
}

#[test]
fn cross_device_rollback_uses_the_same_fallback() {
    let tree = Tree::new();
    let src = tree.file("report.pdf", "payload");
    let fs_double = Arc::new(RecordingFs::cross_device());
    let m = mover_with(&tree, fs_double.clone());

    let id = match m.move_file(&MoveRequest::new(&src, "21.03")) {
        MoveResult::Success { record_id: Some(id), .. } => id,
        other => panic!("unexpected {other:?}"),
    };
    m.rollback(id).unwrap();
    assert_eq!(
        fs_double.calls(),
        vec!["rename", "copy", "remove", "rename", "copy", "remove"]
    );
    assert_eq!(fs::read_to_string(&src).unwrap(), "payload");
}

#[test]
fn same_device_move_is_a_single_rename() {
    let tree = Tree::new();
    let src = tree.file("a.txt", "a");
    let fs_double = Arc::new(RecordingFs::default());
    let m = mover_with(&tree, fs_double.clone());

    assert!(m.move_file(&MoveRequest::new(&src, "31.01")).is_success());
    assert_eq!(fs_double.calls(), vec!["rename"]);
}
