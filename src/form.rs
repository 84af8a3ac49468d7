use crate::diary_entry::{DiaryEntry, EntryId};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use crossterm::event::KeyCode;
use thiserror::Error;

pub const DATE_INPUT_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("`{0}` is not a date in YYYY-MM-DD HH:MM form")]
    InvalidDate(String),
    #[error("`{0}` does not exist in the local time zone")]
    NonexistentLocalTime(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Contents,
    Date,
}

impl Field {
    fn next(self) -> Self {
        match self {
            Field::Title => Field::Contents,
            Field::Contents => Field::Date,
            Field::Date => Field::Title,
        }
    }
}

/// Editing state of the write screen, for both new and existing entries.
#[derive(Debug, Clone)]
pub struct DiaryForm {
    pub title: String,
    pub contents: String,
    pub date: String,
    pub focus: Field,
    /// Byte offset of the cursor inside the focused field.
    cursor: usize,
    id: EntryId,
    is_star: bool,
    /// Full timestamp of the entry being edited; kept while the date text is untouched.
    original_date: Option<DateTime<Local>>,
}

impl DiaryForm {
    pub fn new(now: DateTime<Local>) -> Self {
        DiaryForm {
            title: String::new(),
            contents: String::new(),
            date: now.format(DATE_INPUT_FORMAT).to_string(),
            focus: Field::Title,
            cursor: 0,
            id: EntryId::UNASSIGNED,
            is_star: false,
            original_date: None,
        }
    }

    pub fn edit(entry: &DiaryEntry) -> Self {
        DiaryForm {
            title: entry.title.clone(),
            contents: entry.contents.clone(),
            date: entry.date.format(DATE_INPUT_FORMAT).to_string(),
            focus: Field::Title,
            cursor: entry.title.len(),
            id: entry.id,
            is_star: entry.is_star,
            original_date: Some(entry.date),
        }
    }

    pub fn is_edit(&self) -> bool {
        self.id.is_assigned()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            Field::Title => &mut self.title,
            Field::Contents => &mut self.contents,
            Field::Date => &mut self.date,
        }
    }

    pub fn focused(&self) -> &str {
        match self.focus {
            Field::Title => &self.title,
            Field::Contents => &self.contents,
            Field::Date => &self.date,
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
        self.cursor = self.focused().len();
    }

    /// Applies one key press to the focused field.
    pub fn apply_key(&mut self, code: KeyCode) {
        let cursor = self.cursor;
        match code {
            KeyCode::Tab => self.focus_next(),
            KeyCode::Char(c) => {
                self.focused_mut().insert(cursor, c);
                self.cursor += c.len_utf8();
            }
            KeyCode::Enter if self.focus == Field::Contents => {
                self.contents.insert(cursor, '\n');
                self.cursor += 1;
            }
            KeyCode::Enter => self.focus_next(),
            KeyCode::Backspace => {
                if let Some(prev) = prev_boundary(self.focused(), cursor) {
                    self.focused_mut().remove(prev);
                    self.cursor = prev;
                }
            }
            KeyCode::Delete => {
                if cursor < self.focused().len() {
                    self.focused_mut().remove(cursor);
                }
            }
            KeyCode::Left => {
                if let Some(prev) = prev_boundary(self.focused(), cursor) {
                    self.cursor = prev;
                }
            }
            KeyCode::Right => {
                let next = self.focused()[cursor..].chars().next();
                if let Some(c) = next {
                    self.cursor += c.len_utf8();
                }
            }
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.focused().len(),
            _ => {}
        }
    }

    /// Builds the entry, keeping id and star flag when editing.
    pub fn build(&self) -> Result<DiaryEntry, FormError> {
        let input = self.date.trim();
        if let Some(original) = self.original_date {
            if original.format(DATE_INPUT_FORMAT).to_string() == input {
                return Ok(self.entry_at(original));
            }
        }
        let naive = NaiveDateTime::parse_from_str(input, DATE_INPUT_FORMAT)
            .map_err(|_| FormError::InvalidDate(input.to_string()))?;
        let date = Local
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| FormError::NonexistentLocalTime(input.to_string()))?;
        Ok(self.entry_at(date))
    }

    fn entry_at(&self, date: DateTime<Local>) -> DiaryEntry {
        DiaryEntry {
            id: self.id,
            title: self.title.clone(),
            contents: self.contents.clone(),
            date,
            is_star: self.is_star,
        }
    }
}

fn prev_boundary(text: &str, cursor: usize) -> Option<usize> {
    text[..cursor].char_indices().next_back().map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2022, 3, 10, 12, 30, 0).unwrap()
    }

    fn type_text(form: &mut DiaryForm, text: &str) {
        for c in text.chars() {
            form.apply_key(KeyCode::Char(c));
        }
    }

    #[test]
    fn new_form_builds_entry_at_given_time() {
        let mut form = DiaryForm::new(noon());
        type_text(&mut form, "Spring");
        form.apply_key(KeyCode::Tab);
        type_text(&mut form, "first line");
        form.apply_key(KeyCode::Enter);
        type_text(&mut form, "second");

        let entry = form.build().unwrap();
        assert_eq!(entry.title, "Spring");
        assert_eq!(entry.contents, "first line\nsecond");
        assert_eq!(entry.date, noon());
        assert!(!entry.id.is_assigned());
        assert!(!form.is_edit());
    }

    #[test]
    fn editing_handles_multibyte_text() {
        let mut form = DiaryForm::new(noon());
        type_text(&mut form, "일기장");
        form.apply_key(KeyCode::Backspace);
        form.apply_key(KeyCode::Left);
        form.apply_key(KeyCode::Char('x'));
        assert_eq!(form.title, "일x기");
        form.apply_key(KeyCode::End);
        form.apply_key(KeyCode::Delete);
        assert_eq!(form.title, "일x기");
    }

    #[test]
    fn invalid_date_is_rejected() {
        let mut form = DiaryForm::new(noon());
        form.apply_key(KeyCode::Tab);
        form.apply_key(KeyCode::Tab);
        assert_eq!(form.focus, Field::Date);
        for _ in 0..form.date.len() {
            form.apply_key(KeyCode::Backspace);
        }
        type_text(&mut form, "tomorrow");

        assert_eq!(
            form.build().unwrap_err(),
            FormError::InvalidDate("tomorrow".to_string())
        );
    }

    #[test]
    fn edit_form_keeps_id_star_and_exact_date() {
        let with_seconds = noon() + chrono::Duration::seconds(42);
        let mut original = DiaryEntry::new("Old", "body", with_seconds).starred(true);
        original.id = EntryId(7);
        let mut form = DiaryForm::edit(&original);
        type_text(&mut form, "er");

        let edited = form.build().unwrap();
        assert!(form.is_edit());
        assert_eq!(edited.id, EntryId(7));
        assert!(edited.is_star);
        assert_eq!(edited.title, "Older");
        assert_eq!(edited.date, original.date);
    }
}
