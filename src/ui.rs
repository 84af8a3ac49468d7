use crate::config::DEFAULT_DATE_FORMAT;
use crate::diary_entry::DiaryEntry;
use crate::diary_state::DiaryState;
use crate::form::{DiaryForm, Field};
use crate::kv_store::KeyValueStore;
use chrono::{DateTime, Local};
use color_eyre::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use std::{
    fmt::Write as _,
    io::{stdout, Stdout},
    time::{Duration, Instant},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const CELL_HEIGHT: u16 = 5;
const COLUMNS: usize = 2;
const STAR: &str = "★";

pub enum Action {
    Write,
    Open(usize),
    Quit,
}

pub enum DetailAction {
    Back,
    Edit,
    ToggleStar,
    Delete,
}

pub struct UI {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    date_format: String,
    selected: usize,
    status: Option<String>,
    cursor_visible: bool,
    last_cursor_update: Instant,
}

impl UI {
    pub fn new(date_format: String) -> Result<Self> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;

        Ok(UI {
            terminal,
            date_format,
            selected: 0,
            status: None,
            cursor_visible: true,
            last_cursor_update: Instant::now(),
        })
    }

    /// Shown under the board until the next key press.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    pub fn display<S: KeyValueStore>(&mut self, diary_state: &DiaryState<S>) -> Result<()> {
        let entries = diary_state.entries();
        self.selected = self.selected.min(entries.len().saturating_sub(1));
        let selected = self.selected;
        let date_format = self.date_format.as_str();
        let status = self.status.as_deref();

        self.terminal.draw(|f| {
            let chunks = screen_chunks(f.area());
            f.render_widget(header("Diary"), chunks[0]);
            render_board(f, chunks[1], entries, selected, date_format);

            let footer = match status {
                Some(message) => Paragraph::new(message.to_string())
                    .style(Style::default().fg(Color::Red))
                    .alignment(Alignment::Center),
                None => controls(if entries.is_empty() {
                    &[("w", "write"), ("q", "quit")][..]
                } else {
                    &[("arrows", "move"), ("Enter", "open"), ("w", "write"), ("q", "quit")][..]
                }),
            };
            f.render_widget(footer, chunks[2]);
        })?;

        Ok(())
    }

    pub fn handle_input<S: KeyValueStore>(
        &mut self,
        diary_state: &DiaryState<S>,
    ) -> Result<Option<Action>> {
        let Some(key) = read_key()? else {
            return Ok(None);
        };
        self.status = None;

        let len = diary_state.len();
        match key.code {
            KeyCode::Char('w') => Ok(Some(Action::Write)),
            KeyCode::Char('q') => Ok(Some(Action::Quit)),
            KeyCode::Enter if len > 0 => Ok(Some(Action::Open(self.selected))),
            code => {
                self.selected = move_selection(self.selected, len, code);
                Ok(None)
            }
        }
    }

    pub fn view_entry(&mut self, entry: &DiaryEntry) -> Result<DetailAction> {
        loop {
            let date = format_date(&entry.date, &self.date_format);
            self.terminal.draw(|f| {
                let chunks = screen_chunks(f.area());

                let mut title = entry.title.clone();
                if entry.is_star {
                    title = format!("{STAR} {title}");
                }
                f.render_widget(header(&title), chunks[0]);

                let body = Paragraph::new(entry.contents.clone())
                    .wrap(Wrap { trim: false })
                    .block(Block::default().borders(Borders::ALL).title(date));
                f.render_widget(body, chunks[1]);

                let star_label = if entry.is_star { "unstar" } else { "star" };
                f.render_widget(
                    controls(&[
                        ("e", "edit"),
                        ("s", star_label),
                        ("d", "delete"),
                        ("Esc", "back"),
                    ]),
                    chunks[2],
                );
            })?;

            if let Some(key) = read_key()? {
                match key.code {
                    KeyCode::Char('e') => return Ok(DetailAction::Edit),
                    KeyCode::Char('s') => return Ok(DetailAction::ToggleStar),
                    KeyCode::Char('d') => return Ok(DetailAction::Delete),
                    KeyCode::Esc | KeyCode::Char('q') => return Ok(DetailAction::Back),
                    _ => {}
                }
            }
        }
    }

    /// Runs the write screen. `None` when the user cancels.
    pub fn write_entry(&mut self, mut form: DiaryForm) -> Result<Option<DiaryEntry>> {
        let mut error: Option<String> = None;
        let mut last_content_update = Instant::now();
        let heading = if form.is_edit() { "Edit Diary" } else { "New Diary" };

        loop {
            let now = Instant::now();
            let should_update_cursor =
                now.duration_since(self.last_cursor_update) >= Duration::from_millis(500);
            let should_redraw = should_update_cursor
                || now.duration_since(last_content_update) < Duration::from_millis(50);

            if should_redraw {
                let cursor_visible = self.cursor_visible;
                self.terminal.draw(|f| {
                    render_form(f, heading, &form, cursor_visible, error.as_deref());
                })?;

                if should_update_cursor {
                    self.cursor_visible = !self.cursor_visible;
                    self.last_cursor_update = now;
                }
            }

            if !event::poll(Duration::from_millis(50))? {
                continue;
            }
            let Some(key) = read_key()? else {
                continue;
            };
            last_content_update = Instant::now();

            match key.code {
                KeyCode::Esc => return Ok(None),
                KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    match form.build() {
                        Ok(entry) => return Ok(Some(entry)),
                        Err(err) => error = Some(err.to_string()),
                    }
                }
                code => {
                    error = None;
                    form.apply_key(code);
                }
            }
        }
    }
}

impl Drop for UI {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}

/// Next key press, ignoring releases and non-key events.
fn read_key() -> Result<Option<KeyEvent>> {
    match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => Ok(Some(key)),
        _ => Ok(None),
    }
}

fn screen_chunks(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(CELL_HEIGHT),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(area)
}

fn header(text: &str) -> Paragraph<'static> {
    Paragraph::new(text.to_string())
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
}

fn controls(keys: &[(&str, &str)]) -> Paragraph<'static> {
    let mut spans = Vec::new();
    for (i, (key, label)) in keys.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(", "));
        }
        spans.push(Span::styled(
            key.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(format!(" {label}")));
    }
    Paragraph::new(Line::from(spans))
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center)
}

fn render_board(
    f: &mut Frame,
    area: Rect,
    entries: &[DiaryEntry],
    selected: usize,
    date_format: &str,
) {
    let block = Block::default().borders(Borders::ALL).title("Entries");
    let inner = block.inner(area);
    f.render_widget(block, area);

    if entries.is_empty() {
        let empty = Paragraph::new("No diary entries yet.")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(empty, inner);
        return;
    }

    let visible_rows = usize::from((inner.height / CELL_HEIGHT).max(1));
    let first_row = (selected / COLUMNS).saturating_sub(visible_rows - 1);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(CELL_HEIGHT); visible_rows])
        .split(inner);

    for (row, row_area) in rows.iter().enumerate() {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
            .split(*row_area);
        for (column, cell_area) in cells.iter().enumerate() {
            let index = (first_row + row) * COLUMNS + column;
            if let Some(entry) = entries.get(index) {
                render_cell(f, *cell_area, entry, index == selected, date_format);
            }
        }
    }
}

fn render_cell(f: &mut Frame, area: Rect, entry: &DiaryEntry, selected: bool, date_format: &str) {
    let border_style = if selected {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    if entry.is_star {
        block = block.title(format!(" {STAR} "));
    }

    let width = usize::from(area.width.saturating_sub(2));
    let lines = vec![
        Line::from(Span::styled(
            truncate_to_width(&entry.title, width),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::raw(truncate_to_width(entry.preview(), width))),
        Line::from(Span::styled(
            truncate_to_width(&format_date(&entry.date, date_format), width),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_form(
    f: &mut Frame,
    heading: &str,
    form: &DiaryForm,
    cursor_visible: bool,
    error: Option<&str>,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(3),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(f.area());

    f.render_widget(header(heading), chunks[0]);

    let fields = [
        (Field::Title, "Title", &form.title, chunks[1]),
        (Field::Contents, "Contents", &form.contents, chunks[2]),
        (Field::Date, "Date (YYYY-MM-DD HH:MM)", &form.date, chunks[3]),
    ];
    for (field, label, value, area) in fields {
        let focused = form.focus == field;
        let text = if focused && cursor_visible {
            let mut with_cursor = value.clone();
            with_cursor.insert(form.cursor(), '|');
            with_cursor
        } else {
            value.clone()
        };
        let border_style = if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        let input = Paragraph::new(text).wrap(Wrap { trim: false }).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(label),
        );
        f.render_widget(input, area);
    }

    let footer = match error {
        Some(message) => Paragraph::new(message.to_string())
            .style(Style::default().fg(Color::Red))
            .alignment(Alignment::Center),
        None => controls(&[("Tab", "next field"), ("Ctrl-S", "register"), ("Esc", "cancel")]),
    };
    f.render_widget(footer, chunks[4]);
}

/// Formats `date` with a chrono format string, falling back to the default
/// format when the configured one is invalid.
pub fn format_date(date: &DateTime<Local>, format: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", date.format(format)).is_ok() {
        return out;
    }
    date.format(DEFAULT_DATE_FORMAT).to_string()
}

/// Cuts `text` to at most `max_width` terminal columns, marking the cut with `…`.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let budget = max_width.saturating_sub(1);
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    if max_width > 0 {
        out.push('…');
    }
    out
}

/// Moves the board selection for an arrow key. Rows hold two cells.
pub fn move_selection(selected: usize, len: usize, code: KeyCode) -> usize {
    if len == 0 {
        return 0;
    }
    let last = len - 1;
    match code {
        KeyCode::Left => selected.saturating_sub(1),
        KeyCode::Right => (selected + 1).min(last),
        KeyCode::Up => selected.checked_sub(COLUMNS).unwrap_or(selected),
        KeyCode::Down if selected + COLUMNS <= last => selected + COLUMNS,
        KeyCode::Home => 0,
        KeyCode::End => last,
        _ => selected.min(last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn format_date_uses_configured_format() {
        let date = Local.with_ymd_and_hms(2022, 3, 10, 12, 0, 0).unwrap();
        assert_eq!(format_date(&date, "%Y.%m.%d"), "2022.03.10");
        assert_eq!(format_date(&date, DEFAULT_DATE_FORMAT), "2022-03-10 (Thu)");
    }

    #[test]
    fn format_date_falls_back_on_invalid_format() {
        let date = Local.with_ymd_and_hms(2022, 3, 10, 12, 0, 0).unwrap();
        assert_eq!(format_date(&date, "%Q"), "2022-03-10 (Thu)");
    }

    #[test]
    fn truncate_respects_wide_characters() {
        assert_eq!(truncate_to_width("diary", 10), "diary");
        assert_eq!(truncate_to_width("diary", 4), "dia…");
        assert_eq!(truncate_to_width("일기장입니다", 5), "일기…");
        assert_eq!(truncate_to_width("diary", 0), "");
    }

    #[test]
    fn selection_moves_within_grid() {
        assert_eq!(move_selection(0, 5, KeyCode::Right), 1);
        assert_eq!(move_selection(4, 5, KeyCode::Right), 4);
        assert_eq!(move_selection(1, 5, KeyCode::Down), 3);
        assert_eq!(move_selection(3, 5, KeyCode::Down), 3);
        assert_eq!(move_selection(1, 5, KeyCode::Up), 1);
        assert_eq!(move_selection(3, 5, KeyCode::Up), 1);
        assert_eq!(move_selection(0, 5, KeyCode::Left), 0);
        assert_eq!(move_selection(7, 3, KeyCode::Char('x')), 2);
        assert_eq!(move_selection(0, 0, KeyCode::Down), 0);
    }
}
