#![forbid(unsafe_code)]

use bubbles_core::model::{ActiveGroups, BubbleId, DueBucket, completed};
use bubbles_storage::{DB_FILE_NAME, SqliteStore, StoreError};
use std::path::PathBuf;

fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("bubbles_storage_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

#[test]
fn create_adds_exactly_one_incomplete_record() {
    let mut store = SqliteStore::open_in_memory().expect("open store");
    let before = store.list_all().expect("list before");

    let id = store.create("Buy milk", DueBucket::Today).expect("create");

    let after = store.list_all().expect("list after");
    assert_eq!(after.len(), before.len() + 1);
    let created = after
        .iter()
        .find(|bubble| bubble.id == id)
        .expect("created bubble listed");
    assert_eq!(created.description, "Buy milk");
    assert_eq!(created.due, DueBucket::Today);
    assert!(!created.is_complete);
    assert_eq!(store.get(id).expect("get"), *created);
}

#[test]
fn buy_milk_lands_in_today_group_only() {
    let mut store = SqliteStore::open_in_memory().expect("open store");
    store.create("Buy milk", DueBucket::Today).expect("create");

    let groups = ActiveGroups::partition(store.list_all().expect("list"));
    let has_milk = |due: DueBucket| {
        groups
            .group(due)
            .iter()
            .any(|bubble| bubble.description == "Buy milk")
    };
    assert!(has_milk(DueBucket::Today));
    assert!(!has_milk(DueBucket::ThisWeek));
    assert!(!has_milk(DueBucket::Later));
}

#[test]
fn popped_report_moves_to_completed_listing_and_stays_there() {
    let mut store = SqliteStore::open_in_memory().expect("open store");
    let id = store
        .create("Write report", DueBucket::ThisWeek)
        .expect("create");

    for _ in 0..3 {
        store.mark_complete(id).expect("mark complete is idempotent");

        let all = store.list_all().expect("list");
        let groups = ActiveGroups::partition(all.clone());
        assert!(
            DueBucket::ALL
                .iter()
                .all(|due| groups.group(*due).iter().all(|b| b.id != id)),
            "popped bubble must leave every active group"
        );
        let done = completed(all);
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].description, "Write report");
        assert!(done[0].is_complete);
    }
}

#[test]
fn mark_complete_unknown_id_is_not_found_and_changes_nothing() {
    let mut store = SqliteStore::open_in_memory().expect("open store");
    store.create("Keep me", DueBucket::Later).expect("create");
    let before = store.list_all().expect("list before");

    let err = store.mark_complete(BubbleId::new(9_999)).unwrap_err();
    assert!(matches!(err, StoreError::UnknownId), "got {err}");

    assert_eq!(store.list_all().expect("list after"), before);
    assert!(matches!(
        store.get(BubbleId::new(9_999)),
        Err(StoreError::UnknownId)
    ));
}

#[test]
fn create_rejects_blank_and_overlong_descriptions_without_writing() {
    let mut store = SqliteStore::open_in_memory().expect("open store");

    for raw in ["", "   "] {
        let err = store.create(raw, DueBucket::Today).unwrap_err();
        assert!(
            matches!(err, StoreError::InvalidInput("description required")),
            "got {err}"
        );
    }
    let err = store
        .create(&"x".repeat(251), DueBucket::Today)
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidInput(_)), "got {err}");

    assert_eq!(store.count().expect("count"), 0);
}

#[test]
fn identical_creates_get_distinct_ids_in_the_same_group() {
    let mut store = SqliteStore::open_in_memory().expect("open store");
    let first = store.create("Water plants", DueBucket::Later).expect("first");
    let second = store.create("Water plants", DueBucket::Later).expect("second");
    assert_ne!(first, second);

    let groups = ActiveGroups::partition(store.list_all().expect("list"));
    let ids = groups
        .later
        .iter()
        .map(|bubble| bubble.id)
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![first, second]);
    assert!(groups.today.is_empty());
    assert!(groups.this_week.is_empty());
}

#[test]
fn bucket_column_rejects_labels_outside_the_enumeration() {
    let storage_dir = temp_dir("bucket_check_constraint");
    SqliteStore::open(&storage_dir).expect("open store");

    let conn = rusqlite::Connection::open(storage_dir.join(DB_FILE_NAME)).expect("raw conn");
    let result = conn.execute(
        r#"INSERT INTO bubble(description, "when", is_complete) VALUES ('x', 'Due never', 0)"#,
        [],
    );
    assert!(result.is_err(), "check constraint must reject unknown bucket");
    drop(conn);

    let store = SqliteStore::open(&storage_dir).expect("reopen store");
    assert_eq!(store.count().expect("count"), 0);
    let _ = std::fs::remove_dir_all(storage_dir);
}

#[test]
fn file_store_persists_across_reopen_and_never_reuses_ids() {
    let storage_dir = temp_dir("persist_reopen");

    let first = {
        let mut store = SqliteStore::open(&storage_dir).expect("open store");
        assert_eq!(store.storage_dir(), Some(storage_dir.as_path()));
        let id = store.create("Call mum", DueBucket::ThisWeek).expect("create");
        store.mark_complete(id).expect("pop");
        id
    };

    let mut store = SqliteStore::open(&storage_dir).expect("reopen store");
    store.ensure_schema().expect("schema setup is idempotent");

    let reloaded = store.get(first).expect("get after reopen");
    assert_eq!(reloaded.description, "Call mum");
    assert_eq!(reloaded.due, DueBucket::ThisWeek);
    assert!(reloaded.is_complete);

    let second = store.create("Call dad", DueBucket::ThisWeek).expect("create");
    assert!(second > first);

    drop(store);
    let _ = std::fs::remove_dir_all(storage_dir);
}
