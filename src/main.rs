use chrono::Local;
use color_eyre::eyre::{eyre, Result};
use diary_board::form::DiaryForm;
use diary_board::logging::init_logging;
use diary_board::ui::{Action, DetailAction, UI};
use diary_board::{
    channel, Config, DiaryEntry, DiaryError, DiaryState, DiaryStore, EditInbox, EditRequest,
    EditSender, EntryId, JsonFileStore, KeyValueStore,
};
use log::{error, info};

fn main() -> Result<()> {
    color_eyre::install()?;

    let config = Config::load()?;
    let _logger = init_logging(config.log_level, &config.log_dir)?;

    let backend = JsonFileStore::new(&config.data_file);
    let data_file = backend.path().to_path_buf();
    let mut diary_state = DiaryState::load(DiaryStore::new(backend)).map_err(|e| {
        error!("event=diary_load_failed module=main error={}", e);
        eyre!("Failed to load diary from {}: {}", data_file.display(), e)
    })?;
    let (sender, mut inbox) = channel();
    let mut ui = UI::new(config.date_format.clone())?;

    loop {
        deliver_edits(&mut ui, &mut inbox, &mut diary_state);
        ui.display(&diary_state)?;

        if let Some(action) = ui.handle_input(&diary_state)? {
            match action {
                Action::Write => {
                    if let Some(entry) = ui.write_entry(DiaryForm::new(Local::now()))? {
                        report(&mut ui, diary_state.append(entry).map(|_| ()));
                    }
                }
                Action::Open(index) => {
                    let Some(entry) = diary_state.entries().get(index).cloned() else {
                        continue;
                    };
                    if let Some(id) = show_detail(&mut ui, &sender, entry)? {
                        deliver_edits(&mut ui, &mut inbox, &mut diary_state);
                        report(&mut ui, diary_state.remove_by_id(id).map(|_| ()));
                    }
                }
                Action::Quit => break,
            }
        }
    }

    info!("event=app_exit module=main count={}", diary_state.len());
    Ok(())
}

/// Detail screen. Edits go out on the edit channel; returns the id to delete, if any.
fn show_detail(ui: &mut UI, sender: &EditSender, mut entry: DiaryEntry) -> Result<Option<EntryId>> {
    loop {
        match ui.view_entry(&entry)? {
            DetailAction::Back => return Ok(None),
            DetailAction::Delete => return Ok(Some(entry.id)),
            DetailAction::Edit => {
                if let Some(edited) = ui.write_entry(DiaryForm::edit(&entry))? {
                    sender.publish(EditRequest::for_id(entry.id, edited.clone()));
                    entry = edited;
                }
            }
            DetailAction::ToggleStar => {
                let is_star = !entry.is_star;
                entry.is_star = is_star;
                sender.publish(EditRequest::for_id(entry.id, entry.clone()));
            }
        }
    }
}

fn deliver_edits<S: KeyValueStore>(ui: &mut UI, inbox: &mut EditInbox, state: &mut DiaryState<S>) {
    let errors = inbox.deliver(state);
    if let Some(message) = delivery_status(&errors) {
        ui.set_status(message);
    }
}

/// Status line text for failed edit deliveries: the message itself when one
/// failed, otherwise the count and the first message.
fn delivery_status(errors: &[DiaryError]) -> Option<String> {
    match errors {
        [] => None,
        [only] => Some(only.to_string()),
        [first, ..] => Some(format!(
            "{} edits could not be applied (first: {})",
            errors.len(),
            first
        )),
    }
}

fn report(ui: &mut UI, result: Result<(), DiaryError>) {
    if let Err(err) = result {
        error!("event=mutation_failed module=main error={}", err);
        ui.set_status(err.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_status_reports_every_failure() {
        assert_eq!(delivery_status(&[]), None);

        let one = [DiaryError::UnknownEntry(EntryId(3))];
        assert_eq!(
            delivery_status(&one).as_deref(),
            Some("no diary entry with id #3")
        );

        let two = [
            DiaryError::IndexOutOfRange { index: 4, len: 1 },
            DiaryError::UnknownEntry(EntryId(3)),
        ];
        assert_eq!(
            delivery_status(&two).as_deref(),
            Some("2 edits could not be applied (first: index 4 is out of range for 1 entries)")
        );
    }
}
