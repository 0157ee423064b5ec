//! Index-document consistency E2E tests: replace, delete, concurrency.

use std::collections::BTreeSet;
use std::sync::Arc;

use pretty_assertions::assert_eq;

use e2e_tests::{test_pipeline, TestHarness, TEST_SECRET};
use blindex_types::{DocumentId, LimitSettings, TenantId, TokenHash};

fn expected_hashes(text: &str) -> Vec<TokenHash> {
    test_pipeline(TEST_SECRET, LimitSettings::default())
        .document_tokens(text)
        .unwrap()
        .into_sorted_vec()
}

/// Stored rows equal the token set of the current text, through every change.
#[test]
fn test_entries_track_current_text() {
    let harness = TestHarness::new();
    let writer = harness.writer(TEST_SECRET);
    let tenant = TenantId::new();
    let doc = DocumentId::new();

    for text in [
        "Die Kündigungsfrist beträgt drei Monate",
        "Haftung ist auf Vorsatz beschränkt",
        "Haftung",
    ] {
        writer.reindex(tenant, doc, text).unwrap();
        assert_eq!(harness.storage.document_hashes(tenant, doc).unwrap(), expected_hashes(text));
    }
}

/// Reindexing twice with the same text leaves the same state as once.
#[test]
fn test_reindex_idempotent() {
    let harness = TestHarness::new();
    let writer = harness.writer(TEST_SECRET);
    let tenant = TenantId::new();
    let doc = DocumentId::new();
    let text = "Die Kündigungsfrist beträgt drei Monate";

    writer.reindex(tenant, doc, text).unwrap();
    let once = harness.storage.document_hashes(tenant, doc).unwrap();
    let stats_once = harness.storage.get_stats().unwrap().entry_count;

    writer.reindex(tenant, doc, text).unwrap();
    assert_eq!(harness.storage.document_hashes(tenant, doc).unwrap(), once);
    assert_eq!(harness.storage.get_stats().unwrap().entry_count, stats_once);
}

/// Empty text and deletion both leave no rows behind.
#[test]
fn test_empty_text_and_delete_remove_rows() {
    let harness = TestHarness::new();
    let writer = harness.writer(TEST_SECRET);
    let planner = harness.planner(TEST_SECRET);
    let tenant = TenantId::new();
    let emptied = DocumentId::new();
    let deleted = DocumentId::new();

    writer.reindex(tenant, emptied, "Haftung Monate").unwrap();
    writer.reindex(tenant, deleted, "Haftung Monate").unwrap();

    writer.reindex(tenant, emptied, "").unwrap();
    writer.remove(tenant, deleted).unwrap();

    assert!(harness.storage.document_hashes(tenant, emptied).unwrap().is_empty());
    assert!(harness.storage.document_hashes(tenant, deleted).unwrap().is_empty());
    assert!(planner.search(tenant, "haftung", None).unwrap().is_empty());
    assert_eq!(harness.storage.get_stats().unwrap().entry_count, 0);
}

/// Other documents are untouched by a document's replace or delete.
#[test]
fn test_replace_is_scoped_to_document() {
    let harness = TestHarness::new();
    let writer = harness.writer(TEST_SECRET);
    let tenant = TenantId::new();
    let doc = DocumentId::new();
    let neighbour = DocumentId::new();

    writer.reindex(tenant, neighbour, "Haftung Monate").unwrap();
    writer.reindex(tenant, doc, "Haftung Monate").unwrap();
    writer.reindex(tenant, doc, "Vertragsstrafe").unwrap();
    writer.remove(tenant, doc).unwrap();

    assert_eq!(
        harness.storage.document_hashes(tenant, neighbour).unwrap(),
        expected_hashes("Haftung Monate")
    );
}

/// Concurrent reindexes of one document leave exactly one writer's token set.
#[test]
fn test_concurrent_reindex_same_document() {
    let harness = TestHarness::new();
    let tenant = TenantId::new();
    let doc = DocumentId::new();
    let texts: Vec<String> = (0..8)
        .map(|i| format!("alpha{i} beta{i} gamma{i} delta{i}"))
        .collect();

    let handles: Vec<_> = texts
        .iter()
        .cloned()
        .map(|text| {
            let writer = harness.writer(TEST_SECRET);
            std::thread::spawn(move || {
                for _ in 0..5 {
                    match writer.reindex(tenant, doc, &text) {
                        Ok(_) => return,
                        Err(e) if e.is_conflict() => continue,
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                }
                panic!("reindex kept conflicting");
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stored = harness.storage.document_hashes(tenant, doc).unwrap();
    let matches: Vec<_> = texts
        .iter()
        .filter(|text| expected_hashes(text) == stored)
        .collect();
    assert_eq!(matches.len(), 1, "stored rows must equal exactly one text's token set");
}

/// Different documents index in parallel without interfering.
#[test]
fn test_parallel_reindex_different_documents() {
    let harness = TestHarness::new();
    let tenant = TenantId::new();
    let docs: Vec<DocumentId> = (0..8).map(|_| DocumentId::new()).collect();

    let handles: Vec<_> = docs
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            let writer = harness.writer(TEST_SECRET);
            let doc = *doc;
            std::thread::spawn(move || {
                writer
                    .reindex(tenant, doc, &format!("Haftung eintrag{i}"))
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let found: BTreeSet<_> = harness
        .planner(TEST_SECRET)
        .search(tenant, "haftung", None)
        .unwrap()
        .document_ids()
        .into_iter()
        .collect();
    assert_eq!(found, docs.iter().copied().collect::<BTreeSet<_>>());
}

/// Queries run alongside writers and never fail.
#[test]
fn test_queries_during_reindex() {
    let harness = TestHarness::new();
    let tenant = TenantId::new();
    let doc = DocumentId::new();
    let writer = harness.writer(TEST_SECRET);
    writer.reindex(tenant, doc, "Haftung").unwrap();

    let planner = Arc::new(harness.planner(TEST_SECRET));
    let reader = {
        let planner = Arc::clone(&planner);
        std::thread::spawn(move || {
            for _ in 0..50 {
                planner.search(tenant, "haftung", None).unwrap();
            }
        })
    };
    for i in 0..20 {
        let text = if i % 2 == 0 { "Monate" } else { "Haftung" };
        writer.reindex(tenant, doc, text).unwrap();
    }
    reader.join().unwrap();

    // Last write was "Haftung"
    assert!(planner.search(tenant, "haftung", None).unwrap().contains(doc));
}
