use chrono::{DateTime, Local};
use std::fmt;

/// Session-stable handle for a diary entry.
///
/// Ids are handed out by [`DiaryState`](crate::diary_state::DiaryState) when it
/// loads or adopts an entry. They are never written to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub usize);

impl EntryId {
    /// Id carried by entries the list model has not adopted yet.
    pub const UNASSIGNED: EntryId = EntryId(0);

    pub fn is_assigned(self) -> bool {
        self != Self::UNASSIGNED
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiaryEntry {
    pub id: EntryId,
    pub title: String,
    pub contents: String,
    pub date: DateTime<Local>,
    pub is_star: bool,
}

impl DiaryEntry {
    pub fn new(title: impl Into<String>, contents: impl Into<String>, date: DateTime<Local>) -> Self {
        DiaryEntry {
            id: EntryId::UNASSIGNED,
            title: title.into(),
            contents: contents.into(),
            date,
            is_star: false,
        }
    }

    pub fn starred(mut self, is_star: bool) -> Self {
        self.is_star = is_star;
        self
    }

    /// First line of the contents, used as a preview on the board.
    pub fn preview(&self) -> &str {
        self.contents.lines().next().unwrap_or("")
    }
}
