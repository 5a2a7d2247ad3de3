//! Read-only access to a mail store.
//!
//! A store holds accounts, each account a tree of folders, each folder a
//! list of items. Only items of kind [`ItemKind::Mail`] are ever exported.

pub mod fs;
pub mod memory;

use chrono::{DateTime, Local};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use self::fs::FsStore;
pub use self::memory::MemoryStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("missing {0} header")]
    MissingHeader(&'static str),

    #[error("invalid {header} header {value:?}: {reason}")]
    InvalidHeader {
        header: &'static str,
        value: String,
        reason: String,
    },

    #[error("unknown account: {0}")]
    UnknownAccount(String),

    #[error("export refused: {0}")]
    Refused(String),
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Type tag of an item in a folder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemKind {
    Mail,
    MeetingRequest,
    Appointment,
    Contact,
    Other,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            ItemKind::Mail => "mail",
            ItemKind::MeetingRequest => "meeting request",
            ItemKind::Appointment => "appointment",
            ItemKind::Contact => "contact",
            ItemKind::Other => "other",
        })
    }
}

pub trait MailStore {
    type Folder: MailFolder;

    /// Display names of the connected accounts.
    fn accounts(&self) -> Result<Vec<String>>;

    /// Top-level folders of an account.
    fn folders(&self, account: &str) -> Result<Vec<Self::Folder>>;
}

pub trait MailFolder: Sized {
    type Item: MailItem;

    fn name(&self) -> &str;

    fn folders(&self) -> Result<Vec<Self>>;

    fn items(&self) -> Result<Vec<Self::Item>>;
}

pub trait MailItem {
    fn kind(&self) -> ItemKind;

    fn subject(&self) -> Result<String>;

    fn sent_on(&self) -> Result<DateTime<Local>>;

    /// Writes the native representation of the item to `path`.
    fn save_as(&self, path: &Path) -> Result<()>;
}
