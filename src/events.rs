//! Lifecycle events of an archive run.
//!
//! The core never writes to a log or a terminal itself. It emits [`Event`]s
//! into [`Events`], which hands every event to each registered
//! [`Subscriber`]. The binary registers a [`LogSubscriber`] writing through
//! `tracing` and a [`StatusSubscriber`] printing to the terminal; tests can
//! register a recorder instead.

use crate::report::{megabytes, ExportTotals, SweepTotals};
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    OutputRoot(PathBuf),
    AccountCount(usize),
    AccountName(String),
    TopLevelFolders,
    TopLevelFolder(String),
    DirectoryCreated(PathBuf),
    FolderStarted(String),
    FolderFinished {
        chain: String,
        processed: u64,
        saved: u64,
    },
    FolderFailed {
        chain: String,
        error: String,
    },
    DepthLimitReached {
        chain: String,
        skipped: usize,
    },
    ItemSkipped {
        chain: String,
        kind: String,
    },
    ItemFailed {
        chain: String,
        kind: String,
        error: String,
    },
    MessageSaved(PathBuf),
    MessageAlreadySaved(PathBuf),
    WriteFailed {
        path: PathBuf,
        error: String,
    },
    SweepDisabled,
    SweepStarted {
        max_age_days: u32,
        cutoff_epoch: i64,
    },
    ScanFailed {
        path: PathBuf,
        error: String,
    },
    FileExpired(PathBuf),
    FileRemoved(PathBuf),
    RemoveFailed {
        path: PathBuf,
        error: String,
    },
    SweepFinished,
    ExportSummary(ExportTotals),
    SweepSummary(SweepTotals),
}

impl Event {
    pub fn severity(&self) -> Severity {
        match self {
            Event::ItemSkipped { .. }
            | Event::MessageSaved(_)
            | Event::MessageAlreadySaved(_)
            | Event::FileRemoved(_) => Severity::Debug,
            Event::DepthLimitReached { .. } => Severity::Warn,
            Event::FolderFailed { .. }
            | Event::ItemFailed { .. }
            | Event::WriteFailed { .. }
            | Event::ScanFailed { .. }
            | Event::RemoveFailed { .. } => Severity::Error,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Event::OutputRoot(path) => {
                write!(f, "The directory where emails will be stored: {}", path.display())
            }
            Event::AccountCount(count) => write!(f, "Number of email accounts: {}", count),
            Event::AccountName(name) => write!(f, "Discovered email account name: {}", name),
            Event::TopLevelFolders => write!(f, "Found the following top level folders:"),
            Event::TopLevelFolder(name) => write!(f, "{}", name),
            Event::DirectoryCreated(path) => {
                write!(f, "Created new directory at {}", path.display())
            }
            Event::FolderStarted(chain) => write!(f, "Processing emails in: {}", chain),
            Event::FolderFinished {
                chain,
                processed,
                saved,
            } => write!(
                f,
                "Processed {} emails in {} with {} new emails discovered and written to disk",
                processed, chain, saved
            ),
            Event::FolderFailed { chain, error } => {
                write!(f, "Error reading folder {}: {}", chain, error)
            }
            Event::DepthLimitReached { chain, skipped } => write!(
                f,
                "Not descending into {} folders below {}: maximum folder depth reached",
                skipped, chain
            ),
            Event::ItemSkipped { chain, kind } => {
                write!(f, "Skipped {} item in {}", kind, chain)
            }
            Event::ItemFailed { chain, kind, error } => write!(
                f,
                "Error: an item in {} was identified as {}, however, it could not be processed as one: {}",
                chain, kind, error
            ),
            Event::MessageSaved(path) => {
                write!(f, "Saved email to filesystem: {}", path.display())
            }
            Event::MessageAlreadySaved(path) => {
                write!(f, "Email previously saved: {}", path.display())
            }
            Event::WriteFailed { path, error } => write!(
                f,
                "Error writing item to file system: {} (the email may be classified as restricted): {}",
                path.display(),
                error
            ),
            Event::SweepDisabled => write!(
                f,
                "No emails were deleted as deleteOldEmails is not set to True"
            ),
            Event::SweepStarted {
                max_age_days,
                cutoff_epoch,
            } => write!(
                f,
                "Identifying emails older than {} days (modified at or before epoch {}) in the archive",
                max_age_days, cutoff_epoch
            ),
            Event::ScanFailed { path, error } => {
                write!(f, "Error reading archive at {}: {}", path.display(), error)
            }
            Event::FileExpired(path) => write!(
                f,
                "The following email is older than the max number of days: {}",
                path.display()
            ),
            Event::FileRemoved(path) => {
                write!(f, "Successfully deleted old email: {}", path.display())
            }
            Event::RemoveFailed { path, error } => {
                write!(f, "Failed to delete old email: {}: {}", path.display(), error)
            }
            Event::SweepFinished => write!(f, "Finished processing the removal of emails"),
            Event::ExportSummary(totals) => {
                write!(
                    f,
                    "Processed {} emails with {} new emails discovered",
                    totals.processed, totals.saved
                )?;
                if totals.saved > 0 {
                    write!(
                        f,
                        " and written to disk consuming {:.3}MB",
                        megabytes(totals.bytes)
                    )?;
                }
                Ok(())
            }
            Event::SweepSummary(totals) => {
                if totals.removed > 0 {
                    write!(
                        f,
                        "Successfully removed {} emails consuming {:.3}MB",
                        totals.removed,
                        megabytes(totals.bytes)
                    )
                } else {
                    write!(f, "No emails were removed from the file system")
                }
            }
        }
    }
}

pub trait Subscriber {
    fn notify(&self, event: &Event);
}

impl<S: Subscriber + ?Sized> Subscriber for Rc<S> {
    fn notify(&self, event: &Event) {
        (**self).notify(event)
    }
}

/// Fans events out to every subscriber, in registration order.
#[derive(Default)]
pub struct Events {
    subscribers: Vec<Box<dyn Subscriber>>,
}

impl Events {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: impl Subscriber + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn emit(&self, event: Event) {
        for subscriber in self.subscribers.iter() {
            subscriber.notify(&event);
        }
    }
}

/// Writes events to whatever `tracing` subscriber is installed.
pub struct LogSubscriber;

impl Subscriber for LogSubscriber {
    fn notify(&self, event: &Event) {
        match event.severity() {
            Severity::Debug => tracing::debug!("{}", event),
            Severity::Info => tracing::info!("{}", event),
            Severity::Warn => tracing::warn!("{}", event),
            Severity::Error => tracing::error!("{}", event),
        }
    }
}

/// Prints events on a terminal spinner.
pub struct StatusSubscriber {
    progress: ProgressBar,
    min_severity: Severity,
}

impl StatusSubscriber {
    pub fn new(quiet: bool) -> Self {
        let progress = if quiet {
            ProgressBar::hidden()
        } else {
            let progress = ProgressBar::new_spinner();
            progress.set_style(
                ProgressStyle::with_template("{spinner} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            progress.enable_steady_tick(Duration::from_millis(100));
            progress
        };
        StatusSubscriber {
            progress,
            min_severity: Severity::Info,
        }
    }

    /// Handle to the spinner, so the caller can clear it once done.
    pub fn progress(&self) -> ProgressBar {
        self.progress.clone()
    }
}

impl Subscriber for StatusSubscriber {
    fn notify(&self, event: &Event) {
        if let Event::FolderStarted(chain) = event {
            self.progress.set_message(chain.clone());
        }
        if event.severity() >= self.min_severity {
            self.progress.println(event.to_string());
        }
    }
}
