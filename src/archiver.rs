use crate::events::{Event, Events};
use crate::report::Summary;
use crate::retention::ExportWindow;
use crate::settings::Settings;
use crate::store::{MailStore, StoreError};
use crate::sweep::{sweep, RetentionPolicy};
use crate::walk::{top_level_folders, Walker};
use chrono::{DateTime, Local};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("expected exactly one email account, found {0}")]
    AccountCount(usize),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("cannot create output directory {path}: {source}")]
    OutputRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot mirror the folder tree: {0}")]
    Mirror(#[source] io::Error),
}

/// Exports the single account of `store` below `output_root`, then sweeps
/// expired exports if enabled.
pub fn run<S: MailStore>(
    store: &S,
    settings: &Settings,
    output_root: &Path,
    events: &Events,
) -> Result<Summary, Error> {
    run_at(store, settings, output_root, events, Local::now())
}

/// Same as [`run`], with cutoffs computed from `now`.
pub fn run_at<S: MailStore>(
    store: &S,
    settings: &Settings,
    output_root: &Path,
    events: &Events,
    now: DateTime<Local>,
) -> Result<Summary, Error> {
    let accounts = store.accounts()?;
    events.emit(Event::AccountCount(accounts.len()));
    let account = match accounts.as_slice() {
        [account] => account,
        _ => return Err(Error::AccountCount(accounts.len())),
    };

    fs::create_dir_all(output_root).map_err(|source| Error::OutputRoot {
        path: output_root.to_path_buf(),
        source,
    })?;
    events.emit(Event::OutputRoot(output_root.to_path_buf()));
    events.emit(Event::AccountName(account.clone()));

    let folders = top_level_folders(store, account, events)?;
    let window = ExportWindow::new(now, settings.email_max_age_days);
    let export = Walker::new(output_root, window, events)
        .max_depth(settings.max_folder_depth)
        .walk(&folders)
        .map_err(Error::Mirror)?;
    events.emit(Event::ExportSummary(export));

    let policy = RetentionPolicy::new(
        settings.delete_old_emails,
        settings.retention_max_age_days,
        now.into(),
    );
    let swept = sweep(output_root, &policy, events);
    events.emit(Event::SweepSummary(swept));

    Ok(Summary {
        export,
        sweep: swept,
    })
}
