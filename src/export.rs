use crate::events::{Event, Events};
use crate::report::ExportTotals;
use crate::retention::{system_time_from_epoch, ExportWindow};
use crate::sanitize::message_file_name;
use crate::store::{ItemKind, MailFolder, MailItem, StoreError};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// What happened to one eligible message.
enum Outcome {
    TooOld,
    AlreadySaved(PathBuf),
    Saved(PathBuf, u64),
    WriteFailed(PathBuf, StoreError),
}

fn write_message<I: MailItem>(item: &I, path: &Path, sent_epoch: i64) -> Result<u64, StoreError> {
    item.save_as(path)?;
    // Stamp the file with the sent time, which is what retention looks at.
    let file = OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|e| StoreError::io(path, e))?;
    file.set_modified(system_time_from_epoch(sent_epoch))
        .map_err(|e| StoreError::io(path, e))?;
    let metadata = file.metadata().map_err(|e| StoreError::io(path, e))?;
    Ok(metadata.len())
}

fn save_if_new<I: MailItem>(
    item: &I,
    directory: &Path,
    window: &ExportWindow,
) -> Result<Outcome, StoreError> {
    let sent = item.sent_on()?;
    if !window.is_eligible(sent) {
        return Ok(Outcome::TooOld);
    }
    let subject = item.subject()?;
    let sent_epoch = sent.timestamp();
    let path = directory.join(message_file_name(directory, &subject, sent_epoch));
    if path.exists() {
        return Ok(Outcome::AlreadySaved(path));
    }
    Ok(match write_message(item, &path, sent_epoch) {
        Ok(size) => Outcome::Saved(path, size),
        Err(e) => Outcome::WriteFailed(path, e),
    })
}

/// Exports a single item into `directory` unless it is not a mail, is older
/// than the window, or has been exported before.
///
/// Errors are reported through `events` and never stop the caller.
pub fn export_message<I: MailItem>(
    item: &I,
    directory: &Path,
    chain: &str,
    window: &ExportWindow,
    events: &Events,
) -> ExportTotals {
    let kind = item.kind();
    if kind != ItemKind::Mail {
        events.emit(Event::ItemSkipped {
            chain: chain.to_string(),
            kind: kind.to_string(),
        });
        return ExportTotals::default();
    }

    let mut totals = ExportTotals {
        processed: 1,
        ..Default::default()
    };
    match save_if_new(item, directory, window) {
        Ok(Outcome::TooOld) => {}
        Ok(Outcome::AlreadySaved(path)) => events.emit(Event::MessageAlreadySaved(path)),
        Ok(Outcome::Saved(path, size)) => {
            events.emit(Event::MessageSaved(path));
            totals.saved = 1;
            totals.bytes = size;
        }
        Ok(Outcome::WriteFailed(path, e)) => events.emit(Event::WriteFailed {
            path,
            error: e.to_string(),
        }),
        Err(e) => events.emit(Event::ItemFailed {
            chain: chain.to_string(),
            kind: kind.to_string(),
            error: e.to_string(),
        }),
    }
    totals
}

/// Exports the items directly inside `folder`, not those of its subfolders.
pub fn export_folder<F: MailFolder>(
    folder: &F,
    directory: &Path,
    chain: &str,
    window: &ExportWindow,
    events: &Events,
) -> ExportTotals {
    events.emit(Event::FolderStarted(chain.to_string()));
    let mut totals = ExportTotals::default();
    match folder.items() {
        Ok(items) => {
            for item in items.iter() {
                totals += export_message(item, directory, chain, window, events);
            }
        }
        Err(e) => events.emit(Event::FolderFailed {
            chain: chain.to_string(),
            error: e.to_string(),
        }),
    }
    events.emit(Event::FolderFinished {
        chain: chain.to_string(),
        processed: totals.processed,
        saved: totals.saved,
    });
    totals
}
