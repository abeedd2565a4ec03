mod common;

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

use common::write_file;
use near_duper_core::config::IgnoreSet;
use near_duper_core::deletion::{self, DeletionMode, DeletionOutcome};
use near_duper_core::grouping::classify;
use near_duper_core::protocol::scanner::{self, parse_str};
use near_duper_core::retention::{self, plan, plan_bulk};
use near_duper_core::{Classification, Error};

const STREAM: &str = "\
EXACT|1.0
/docs/budget.xlsx
/backup/budget.xlsx
---GROUP---
SIMILAR|0.82
/docs/report.docx|1.00
/drafts/report-old.docx|0.64
---GROUP---
EXACT|1.0
/slides/deck.pptx
/archive/2023/deck.pptx
/archive/2024/deck.pptx
---GROUP---
";

#[test]
fn test_scanner_stream_round_trip() {
    let parsed = parse_str(STREAM);
    assert!(parsed.malformed.is_empty());
    assert_eq!(parsed.groups.len(), 3);

    let mut out = Vec::new();
    scanner::write_groups(&parsed.groups, &mut out).unwrap();
    let reparsed = parse_str(&String::from_utf8(out).unwrap());

    assert_eq!(reparsed.groups, parsed.groups);
    let classes: Vec<Classification> = reparsed.groups.iter().map(|g| g.classification).collect();
    assert_eq!(
        classes,
        vec![Classification::Exact, Classification::Similar, Classification::Exact]
    );
}

#[test]
fn test_parse_stream_from_reader() {
    let parsed = scanner::parse_stream(STREAM.as_bytes()).unwrap();
    assert_eq!(parsed.groups[2].members.len(), 3);
    assert!(parsed.groups[2].members.iter().all(|m| m.similarity == 1.0));
}

#[test]
fn test_bulk_plan_never_touches_similar_members() {
    let groups = classify(parse_str(STREAM).groups, &IgnoreSet::default());
    let decisions = plan_bulk(&groups, Path::new("/docs"));

    assert_eq!(decisions.len(), 2);
    for decision in &decisions {
        assert!(!decision.deletes(Path::new("/docs/report.docx")));
        assert!(!decision.deletes(Path::new("/drafts/report-old.docx")));
    }
    assert_eq!(decisions[0].keep.path, PathBuf::from("/docs/budget.xlsx"));
    // None of the deck copies sit in the scan root; the first directory wins.
    assert_eq!(decisions[1].keep.path, PathBuf::from("/archive/2023/deck.pptx"));
    assert_eq!(decisions[1].delete.len(), 2);
}

#[test]
fn test_bulk_execution_on_disk() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("root");
    let kept = write_file(&root.join("a.docx"), "aaaa");
    let copy1 = write_file(&tmp.path().join("x/a.docx"), "aaaa");
    let copy2 = write_file(&tmp.path().join("y/a.docx"), "aaaa");
    let similar_a = write_file(&root.join("b.docx"), "bb");
    let similar_b = write_file(&tmp.path().join("x/b.docx"), "bc");

    let stream = format!(
        "EXACT|1.0\n{}\n{}\n{}\n---GROUP---\nSIMILAR|0.9\n{}|1.0\n{}|0.9\n---GROUP---\n",
        copy1.display(),
        kept.display(),
        copy2.display(),
        similar_a.display(),
        similar_b.display()
    );
    let groups = classify(parse_str(&stream).groups, &IgnoreSet::default());

    let decisions: Vec<_> = groups.iter().filter_map(|g| plan(g, &root)).collect();
    assert_eq!(decisions[0].reclaimable_bytes, 8);
    assert_eq!(retention::total_reclaimable(&decisions), 10);

    let report = deletion::execute_bulk(&decisions);
    assert_eq!(report.deleted(), 2);
    assert_eq!(report.freed_bytes(), 8);
    assert_eq!(report.skipped_groups, vec![similar_a.clone()]);
    assert!(kept.exists());
    assert!(!copy1.exists());
    assert!(!copy2.exists());
    assert!(similar_b.exists());

    // The reviewed similar group is removed on its own.
    let similar = &decisions[1];
    let report = deletion::execute(similar, DeletionMode::Reviewed).unwrap();
    assert_eq!(report.deleted(), 1);
    assert!(similar_a.exists());
    assert!(!similar_b.exists());
}

#[test]
fn test_deleting_one_member_leaves_other_groups_alone() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    let a1 = write_file(&root.join("a.xlsx"), "1");
    let a2 = write_file(&root.join("old/a.xlsx"), "1");
    let b1 = write_file(&root.join("b.xlsx"), "2");
    let b2 = write_file(&root.join("old/b.xlsx"), "2");

    let stream = format!(
        "EXACT|1.0\n{}\n{}\nEXACT|1.0\n{}\n{}\n",
        a2.display(),
        a1.display(),
        b2.display(),
        b1.display()
    );
    let groups = parse_str(&stream).groups;
    let first = plan(&groups[0], root).unwrap();
    let second_before = plan(&groups[1], root).unwrap();

    let outcome = deletion::delete_member(&first, &a2).unwrap();
    assert_eq!(outcome, DeletionOutcome::Deleted { bytes: 1 });
    assert!(matches!(
        deletion::delete_member(&first, &b2),
        Err(Error::NotInDeleteSet(_))
    ));

    assert_eq!(plan(&groups[1], root).unwrap(), second_before);
    assert!(b2.exists());
    assert_eq!(fs::read_to_string(&a1).unwrap(), "1");
}

#[test]
fn test_ignore_patterns_filter_scanner_groups() {
    let stream = "EXACT|1.0\n/docs/~$budget.xlsx\n/docs/budget.xlsx\n/backup/budget.xlsx\n";
    let ignore = IgnoreSet::new(&["*/~$*".to_string()]);
    let groups = classify(parse_str(stream).groups, &ignore);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].members.len(), 2);
}
