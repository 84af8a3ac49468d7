use chrono::{DateTime, Local, TimeZone};
use diary_board::{
    DiaryEntry, DiaryState, DiaryStore, JsonFileStore, KeyValueStore, StoreError, DIARY_LIST_KEY,
};
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

fn day(d: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2022, 3, d, 12, 0, 0).unwrap()
}

#[test]
fn missing_file_reads_as_empty_slot() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path().join("diary.json"));

    assert_eq!(store.path(), dir.path().join("diary.json"));
    assert_eq!(store.get(DIARY_LIST_KEY).unwrap(), None);
    assert!(DiaryStore::new(store).load().unwrap().is_empty());
}

#[test]
fn set_creates_parent_dirs_and_keeps_other_slots() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("diary.json");
    let mut store = JsonFileStore::new(&path);

    store.set("other", json!("kept")).unwrap();
    store.set(DIARY_LIST_KEY, json!([])).unwrap();

    let on_disk: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk["other"], json!("kept"));
    assert_eq!(on_disk[DIARY_LIST_KEY], json!([]));
    assert!(!dir.path().join("nested").join("diary.json.tmp").exists());
}

#[test]
fn corrupt_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("diary.json");
    fs::write(&path, "{ not json").unwrap();

    let err = JsonFileStore::new(&path).get(DIARY_LIST_KEY).unwrap_err();
    assert!(matches!(err, StoreError::Corrupt { .. }));
}

#[test]
fn diary_survives_a_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("diary.json");

    let mut state = DiaryState::load(DiaryStore::new(JsonFileStore::new(&path))).unwrap();
    state.append(DiaryEntry::new("A", "first", day(1))).unwrap();
    state
        .append(DiaryEntry::new("B", "second", day(3)).starred(true))
        .unwrap();
    state.append(DiaryEntry::new("C", "", day(2))).unwrap();
    drop(state);

    let reloaded = DiaryState::load(DiaryStore::new(JsonFileStore::new(&path))).unwrap();
    let titles: Vec<&str> = reloaded.entries().iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["B", "C", "A"]);
    assert!(reloaded.entries()[0].is_star);
    assert_eq!(reloaded.entries()[0].contents, "second");
    assert_eq!(reloaded.entries()[2].date, day(1));
}

#[test]
fn hand_edited_file_with_bad_entries_loads_the_rest() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("diary.json");
    let text = json!({
        DIARY_LIST_KEY: [
            {"title": "kept", "contents": "", "date": day(2).to_rfc3339(), "isStar": false},
            {"title": "no date", "contents": "", "isStar": false},
        ]
    });
    fs::write(&path, text.to_string()).unwrap();

    let state = DiaryState::load(DiaryStore::new(JsonFileStore::new(&path))).unwrap();
    assert_eq!(state.len(), 1);
    assert_eq!(state.entries()[0].title, "kept");
}
