//! Mapping between diary entries and the persisted `diaryList` slot.
//!
//! The slot holds an array of flat objects:
//! `{"title": str, "contents": str, "date": RFC 3339 str, "isStar": bool}`.
//! There is no version tag. Elements that do not have all four fields with the
//! right types are dropped on load without an error.

use crate::diary_entry::{DiaryEntry, EntryId};
use crate::kv_store::{KeyValueStore, StoreError};
use chrono::{DateTime, Local};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DIARY_LIST_KEY: &str = "diaryList";

#[derive(Debug, Serialize, Deserialize)]
struct StoredDiary {
    title: String,
    contents: String,
    date: DateTime<Local>,
    #[serde(rename = "isStar")]
    is_star: bool,
}

impl From<&DiaryEntry> for StoredDiary {
    fn from(entry: &DiaryEntry) -> Self {
        StoredDiary {
            title: entry.title.clone(),
            contents: entry.contents.clone(),
            date: entry.date,
            is_star: entry.is_star,
        }
    }
}

impl From<StoredDiary> for DiaryEntry {
    fn from(stored: StoredDiary) -> Self {
        DiaryEntry {
            id: EntryId::UNASSIGNED,
            title: stored.title,
            contents: stored.contents,
            date: stored.date,
            is_star: stored.is_star,
        }
    }
}

pub struct DiaryStore<S> {
    backend: S,
}

impl<S: KeyValueStore> DiaryStore<S> {
    pub fn new(backend: S) -> Self {
        DiaryStore { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut S {
        &mut self.backend
    }

    /// Rewrites the whole slot with `entries`, in the given order.
    pub fn save(&mut self, entries: &[DiaryEntry]) -> Result<(), StoreError> {
        let stored = entries
            .iter()
            .map(|entry| serde_json::to_value(StoredDiary::from(entry)))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| StoreError::Rejected(format!("{DIARY_LIST_KEY}: {err}")))?;
        self.backend.set(DIARY_LIST_KEY, Value::Array(stored))
    }

    /// Reads the slot back. Entries come back unassigned and unsorted.
    pub fn load(&self) -> Result<Vec<DiaryEntry>, StoreError> {
        let items = match self.backend.get(DIARY_LIST_KEY)? {
            None => return Ok(Vec::new()),
            Some(Value::Array(items)) => items,
            Some(other) => {
                warn!(
                    "event=slot_unexpected_shape module=diary_store key={} kind={}",
                    DIARY_LIST_KEY,
                    value_kind(&other)
                );
                return Ok(Vec::new());
            }
        };

        let total = items.len();
        let entries: Vec<DiaryEntry> = items
            .into_iter()
            .filter_map(|item| serde_json::from_value::<StoredDiary>(item).ok())
            .map(DiaryEntry::from)
            .collect();

        if entries.len() != total {
            debug!(
                "event=entries_dropped module=diary_store kept={} dropped={}",
                entries.len(),
                total - entries.len()
            );
        }
        Ok(entries)
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
