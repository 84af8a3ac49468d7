use crate::diary_entry::{DiaryEntry, EntryId};
use crate::diary_store::DiaryStore;
use crate::kv_store::{KeyValueStore, StoreError};
use log::{info, warn};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiaryError {
    #[error("index {index} is out of range for {len} entries")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("no diary entry with id {0}")]
    UnknownEntry(EntryId),
    #[error("diary list changed but could not be saved: {0}")]
    Persist(#[from] StoreError),
}

/// The canonical diary list.
///
/// Entries are kept sorted newest first. Every successful mutation rewrites
/// the whole persisted list exactly once. When that write fails the in-memory
/// change is kept and [`DiaryError::Persist`] is returned.
pub struct DiaryState<S> {
    entries: Vec<DiaryEntry>,
    next_id: usize,
    store: DiaryStore<S>,
}

impl<S: KeyValueStore> DiaryState<S> {
    /// Starts an empty list on top of `store` without reading it.
    pub fn new(store: DiaryStore<S>) -> Self {
        DiaryState {
            entries: Vec::new(),
            next_id: 1,
            store,
        }
    }

    /// Reads the persisted list and sorts it.
    pub fn load(store: DiaryStore<S>) -> Result<Self, StoreError> {
        let loaded = store.load()?;
        let mut state = Self::new(store);
        state.entries = loaded;
        sort_by_date_desc(&mut state.entries);
        for index in 0..state.entries.len() {
            let id = state.issue_id();
            state.entries[index].id = id;
        }
        info!(
            "event=diary_loaded module=diary_state count={}",
            state.entries.len()
        );
        Ok(state)
    }

    pub fn entries(&self) -> &[DiaryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: EntryId) -> Option<&DiaryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn position_of(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    pub fn store(&self) -> &DiaryStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut DiaryStore<S> {
        &mut self.store
    }

    /// Adds a new entry and returns the id it was given.
    pub fn append(&mut self, mut entry: DiaryEntry) -> Result<EntryId, DiaryError> {
        let id = self.issue_id();
        entry.id = id;
        self.entries.push(entry);
        sort_by_date_desc(&mut self.entries);
        info!("event=entry_added module=diary_state id={}", id);
        self.persist()?;
        Ok(id)
    }

    /// Replaces the entry at `index`. The replacement takes over its id.
    pub fn replace(&mut self, index: usize, mut entry: DiaryEntry) -> Result<(), DiaryError> {
        let len = self.entries.len();
        let slot = self
            .entries
            .get_mut(index)
            .ok_or(DiaryError::IndexOutOfRange { index, len })?;
        entry.id = slot.id;
        *slot = entry;
        sort_by_date_desc(&mut self.entries);
        info!("event=entry_replaced module=diary_state index={}", index);
        self.persist()
    }

    pub fn replace_by_id(&mut self, id: EntryId, entry: DiaryEntry) -> Result<(), DiaryError> {
        let index = self.position_of(id).ok_or(DiaryError::UnknownEntry(id))?;
        self.replace(index, entry)
    }

    pub fn remove_at(&mut self, index: usize) -> Result<DiaryEntry, DiaryError> {
        if index >= self.entries.len() {
            return Err(DiaryError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        let removed = self.entries.remove(index);
        info!(
            "event=entry_removed module=diary_state index={} id={}",
            index, removed.id
        );
        self.persist()?;
        Ok(removed)
    }

    pub fn remove_by_id(&mut self, id: EntryId) -> Result<DiaryEntry, DiaryError> {
        let index = self.position_of(id).ok_or(DiaryError::UnknownEntry(id))?;
        self.remove_at(index)
    }

    fn issue_id(&mut self) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        id
    }

    fn persist(&mut self) -> Result<(), DiaryError> {
        self.store.save(&self.entries).map_err(|err| {
            warn!(
                "event=persist_failed module=diary_state count={} error={}",
                self.entries.len(),
                err
            );
            DiaryError::Persist(err)
        })
    }
}

/// Newest first. The sort is stable, so equal dates keep their current order.
fn sort_by_date_desc(entries: &mut [DiaryEntry]) {
    entries.sort_by(|a, b| b.date.cmp(&a.date));
}
