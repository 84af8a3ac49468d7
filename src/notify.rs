//! Edit requests from screens that do not own the diary list.
//!
//! A detail screen holds an [`EditSender`] and publishes the edited entry. The
//! list owner holds the single [`EditInbox`] and calls [`EditInbox::deliver`]
//! before it renders, so every published edit is applied before the next frame.

use crate::diary_entry::{DiaryEntry, EntryId};
use crate::diary_state::{DiaryError, DiaryState};
use crate::kv_store::KeyValueStore;
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use log::{debug, warn};

/// Which entry an edit request replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    /// Position in the list as it was when the sender read it.
    Position(usize),
    Id(EntryId),
}

#[derive(Debug, Clone)]
pub struct EditRequest {
    pub target: EditTarget,
    pub entry: DiaryEntry,
}

impl EditRequest {
    pub fn at_position(index: usize, entry: DiaryEntry) -> Self {
        EditRequest {
            target: EditTarget::Position(index),
            entry,
        }
    }

    pub fn for_id(id: EntryId, entry: DiaryEntry) -> Self {
        EditRequest {
            target: EditTarget::Id(id),
            entry,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EditSender {
    tx: UnboundedSender<EditRequest>,
}

impl EditSender {
    /// Fire and forget. A request sent after the inbox is gone is dropped.
    pub fn publish(&self, request: EditRequest) {
        let target = request.target;
        if self.tx.unbounded_send(request).is_err() {
            warn!(
                "event=edit_request_dropped module=notify target={:?} reason=inbox_closed",
                target
            );
        }
    }
}

#[derive(Debug)]
pub struct EditInbox {
    rx: UnboundedReceiver<EditRequest>,
}

impl EditInbox {
    /// Applies every pending request in publish order.
    ///
    /// Failed requests do not stop the drain; their errors are returned.
    pub fn deliver<S: KeyValueStore>(&mut self, state: &mut DiaryState<S>) -> Vec<DiaryError> {
        let mut errors = Vec::new();
        while let Ok(request) = self.rx.try_recv() {
            debug!(
                "event=edit_request_delivered module=notify target={:?}",
                request.target
            );
            let result = match request.target {
                EditTarget::Position(index) => state.replace(index, request.entry),
                EditTarget::Id(id) => state.replace_by_id(id, request.entry),
            };
            if let Err(err) = result {
                warn!(
                    "event=edit_request_failed module=notify target={:?} error={}",
                    request.target, err
                );
                errors.push(err);
            }
        }
        errors
    }
}

/// Creates the sender side and the single inbox of an edit channel.
pub fn channel() -> (EditSender, EditInbox) {
    let (tx, rx) = mpsc::unbounded();
    (EditSender { tx }, EditInbox { rx })
}
