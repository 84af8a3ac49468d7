//! Diary list model, persistence and edit channel behind the `diary_board` app.

pub mod config;
pub mod diary_entry;
pub mod diary_state;
pub mod diary_store;
pub mod form;
pub mod kv_store;
pub mod logging;
pub mod notify;
pub mod ui;

pub use config::Config;
pub use diary_entry::{DiaryEntry, EntryId};
pub use diary_state::{DiaryError, DiaryState};
pub use diary_store::{DiaryStore, DIARY_LIST_KEY};
pub use kv_store::{JsonFileStore, KeyValueStore, MemoryStore, StoreError};
pub use notify::{channel, EditInbox, EditRequest, EditSender, EditTarget};
