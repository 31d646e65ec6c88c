mod common;

use common::{Tree, catalog, drives};
use jd_mover::{
    CancelToken, FileMover, JsonLedger, MoveLedger, MoveRequest, MoveResult, OrganizeError,
    RecordId, RecordStatus,
};
use std::fs;
use std::sync::Arc;

fn json_mover(tree: &Tree) -> FileMover {
    let ledger = JsonLedger::new(tree.td.path().join("data").join("ledger.json"));
    FileMover::new(Arc::new(catalog()), Arc::new(drives(&tree.jd)), Arc::new(ledger))
}

#[test]
fn batch_rollback_restores_three_then_refuses_again() {
    let tree = Tree::new();
    let m = json_mover(&tree);
    let sources: Vec<_> = ["one.txt", "two.txt", "three.txt"]
        .iter()
        .map(|n| tree.file(n, n))
        .collect();

    let ids: Vec<RecordId> = sources
        .iter()
        .map(|s| match m.move_file(&MoveRequest::new(s, "21.03")) {
            MoveResult::Success { record_id: Some(id), .. } => id,
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert!(sources.iter().all(|s| !s.exists()));

    let summary = m.batch_rollback(&ids, &CancelToken::new(), |_, _| {});
    assert_eq!((summary.total, summary.success, summary.failed), (3, 3, 0));
    for (s, id) in sources.iter().zip(&ids) {
        assert!(s.exists());
        let rec = m.ledger().get_record(*id).unwrap().unwrap();
        assert_eq!(rec.status, RecordStatus::Undone);
    }

    for id in &ids {
        assert!(matches!(m.rollback(*id), Err(OrganizeError::InvalidState(_))));
    }
    let again = m.batch_rollback(&ids, &CancelToken::new(), |_, _| {});
    assert_eq!(again.failed, 3);
    assert!(again.failures.iter().all(|f| f.kind == "invalid_state"));
}

#[test]
fn ledger_survives_a_new_process() {
    let tree = Tree::new();
    let src = tree.file("keep.txt", "k");
    let id = match json_mover(&tree).move_file(&MoveRequest::new(&src, "31.01")) {
        MoveResult::Success { record_id: Some(id), .. } => id,
        other => panic!("unexpected {other:?}"),
    };

    // A fresh mover reads the same ledger file.
    let restored = json_mover(&tree).rollback(id).unwrap();
    assert_eq!(restored, src);
    assert_eq!(fs::read_to_string(&src).unwrap(), "k");
}

#[test]
fn rollback_never_overwrites_original_slot() {
    let tree = Tree::new();
    let m = json_mover(&tree);
    let src = tree.file("a.txt", "first");
    let (id, dest) = match m.move_file(&MoveRequest::new(&src, "21.03")) {
        MoveResult::Success {
            record_id: Some(id),
            destination,
            ..
        } => (id, destination),
        other => panic!("unexpected {other:?}"),
    };
    fs::write(&src, "second").unwrap();

    assert!(matches!(m.rollback(id), Err(OrganizeError::Conflict(_))));
    assert_eq!(fs::read_to_string(&src).unwrap(), "second");
    assert_eq!(fs::read_to_string(&dest).unwrap(), "first");
}
