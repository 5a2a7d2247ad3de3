//! A mail store kept as plain files.
//!
//! Every directory directly below the root is an account, directories below
//! an account are folders, and files inside a folder are items:
//!
//! ```text
//! root/
//!   alice@example.com/
//!     Inbox/
//!       0001.eml
//!       Projects/
//!         0002.eml
//!     Calendar/
//!       standup.ics
//! ```
//!
//! Names starting with a dot are ignored.

use super::{ItemKind, MailFolder, MailItem, MailStore, Result, StoreError};
use chrono::{DateTime, Local, TimeZone};
use mailparse::MailHeaderMap;
use once_cell::unsync::OnceCell;
use std::fs;
use std::path::{Path, PathBuf};

pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let metadata = fs::metadata(&root).map_err(|e| StoreError::io(&root, e))?;
        if !metadata.is_dir() {
            return Err(StoreError::io(
                &root,
                std::io::Error::new(std::io::ErrorKind::Other, "not a directory"),
            ));
        }
        Ok(FsStore { root })
    }
}

fn should_skip(path: &Path) -> bool {
    path.file_name()
        .map_or(true, |name| name.to_string_lossy().starts_with('.'))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Lists the visible subdirectories and files of `dir`, each sorted by name.
fn list_dir(dir: &Path) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    let mut dirs = vec![];
    let mut files = vec![];
    for entry in fs::read_dir(dir).map_err(|e| StoreError::io(dir, e))? {
        let path = entry.map_err(|e| StoreError::io(dir, e))?.path();
        if should_skip(&path) {
            continue;
        }
        if path.is_dir() {
            dirs.push(path);
        } else {
            files.push(path);
        }
    }
    dirs.sort();
    files.sort();
    Ok((dirs, files))
}

impl MailStore for FsStore {
    type Folder = FsFolder;

    fn accounts(&self) -> Result<Vec<String>> {
        let (dirs, _) = list_dir(&self.root)?;
        Ok(dirs.iter().map(|dir| file_name(dir)).collect())
    }

    fn folders(&self, account: &str) -> Result<Vec<FsFolder>> {
        let path = self.root.join(account);
        if !path.is_dir() {
            return Err(StoreError::UnknownAccount(account.to_string()));
        }
        FsFolder::children_of(&path)
    }
}

pub struct FsFolder {
    name: String,
    path: PathBuf,
}

impl FsFolder {
    fn children_of(path: &Path) -> Result<Vec<FsFolder>> {
        let (dirs, _) = list_dir(path)?;
        Ok(dirs
            .into_iter()
            .map(|path| FsFolder {
                name: file_name(&path),
                path,
            })
            .collect())
    }
}

impl MailFolder for FsFolder {
    type Item = FsItem;

    fn name(&self) -> &str {
        &self.name
    }

    fn folders(&self) -> Result<Vec<FsFolder>> {
        FsFolder::children_of(&self.path)
    }

    fn items(&self) -> Result<Vec<FsItem>> {
        let (_, files) = list_dir(&self.path)?;
        Ok(files.into_iter().map(FsItem::new).collect())
    }
}

pub struct FsItem {
    path: PathBuf,
    kind: ItemKind,
    headers: OnceCell<Headers>,
}

/// The headers an export needs, read once per item.
struct Headers {
    subject: Option<String>,
    date: Option<String>,
}

impl FsItem {
    fn new(path: PathBuf) -> Self {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
        let kind = match extension.as_deref() {
            Some("eml") => ItemKind::Mail,
            Some("ics") => ItemKind::Appointment,
            Some("vcf") => ItemKind::Contact,
            _ => ItemKind::Other,
        };
        FsItem {
            path,
            kind,
            headers: OnceCell::new(),
        }
    }

    fn headers(&self) -> Result<&Headers> {
        self.headers.get_or_try_init(|| {
            let raw = fs::read(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
            let (headers, _) =
                mailparse::parse_headers(&raw).map_err(|e| StoreError::InvalidHeader {
                    header: "headers",
                    value: self.path.display().to_string(),
                    reason: e.to_string(),
                })?;
            Ok(Headers {
                subject: headers.get_first_value("Subject"),
                date: headers.get_first_value("Date"),
            })
        })
    }
}

impl MailItem for FsItem {
    fn kind(&self) -> ItemKind {
        self.kind
    }

    fn subject(&self) -> Result<String> {
        let subject = self.headers()?.subject.as_deref().unwrap_or_default();
        Ok(subject.trim().to_string())
    }

    fn sent_on(&self) -> Result<DateTime<Local>> {
        let value = self
            .headers()?
            .date
            .clone()
            .ok_or(StoreError::MissingHeader("Date"))?;
        let invalid = |reason: String| StoreError::InvalidHeader {
            header: "Date",
            value: value.clone(),
            reason,
        };
        let epoch = mailparse::dateparse(&value).map_err(|e| invalid(e.to_string()))?;
        Local
            .timestamp_opt(epoch, 0)
            .single()
            .ok_or_else(|| invalid("out of range".to_string()))
    }

    /// Writes a fresh copy of the raw message. The copy does not inherit
    /// the permissions of the source file.
    fn save_as(&self, path: &Path) -> Result<()> {
        let raw = fs::read(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
        fs::write(path, raw).map_err(|e| StoreError::io(path, e))
    }
}
