//! In-memory mail store, built up front and read like any other store.

use super::{ItemKind, MailFolder, MailItem, MailStore, Result, StoreError};
use chrono::{DateTime, Local};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    accounts: Vec<(String, Vec<MemoryFolder>)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(mut self, name: &str, folders: Vec<MemoryFolder>) -> Self {
        self.accounts.push((name.to_string(), folders));
        self
    }
}

impl MailStore for MemoryStore {
    type Folder = MemoryFolder;

    fn accounts(&self) -> Result<Vec<String>> {
        Ok(self.accounts.iter().map(|(name, _)| name.clone()).collect())
    }

    fn folders(&self, account: &str) -> Result<Vec<MemoryFolder>> {
        self.accounts
            .iter()
            .find(|(name, _)| name == account)
            .map(|(_, folders)| folders.clone())
            .ok_or_else(|| StoreError::UnknownAccount(account.to_string()))
    }
}

#[derive(Clone, Debug)]
pub struct MemoryFolder {
    name: String,
    folders: Vec<MemoryFolder>,
    items: Vec<MemoryItem>,
    unreadable: bool,
}

impl MemoryFolder {
    pub fn new(name: &str) -> Self {
        MemoryFolder {
            name: name.to_string(),
            folders: vec![],
            items: vec![],
            unreadable: false,
        }
    }

    pub fn with_folder(mut self, folder: MemoryFolder) -> Self {
        self.folders.push(folder);
        self
    }

    pub fn with_item(mut self, item: MemoryItem) -> Self {
        self.items.push(item);
        self
    }

    /// Listing the subfolders or items of this folder will fail.
    pub fn unreadable(mut self) -> Self {
        self.unreadable = true;
        self
    }

    fn check_readable(&self) -> Result<()> {
        if self.unreadable {
            return Err(StoreError::Refused(format!("{} cannot be read", self.name)));
        }
        Ok(())
    }
}

impl MailFolder for MemoryFolder {
    type Item = MemoryItem;

    fn name(&self) -> &str {
        &self.name
    }

    fn folders(&self) -> Result<Vec<MemoryFolder>> {
        self.check_readable()?;
        Ok(self.folders.clone())
    }

    fn items(&self) -> Result<Vec<MemoryItem>> {
        self.check_readable()?;
        Ok(self.items.clone())
    }
}

#[derive(Clone, Debug)]
pub struct MemoryItem {
    kind: ItemKind,
    subject: String,
    sent_on: Option<DateTime<Local>>,
    body: Vec<u8>,
    restricted: bool,
}

impl MemoryItem {
    pub fn mail(subject: &str, sent_on: DateTime<Local>) -> Self {
        MemoryItem {
            kind: ItemKind::Mail,
            subject: subject.to_string(),
            sent_on: Some(sent_on),
            body: format!("Subject: {}\r\n\r\n", subject).into_bytes(),
            restricted: false,
        }
    }

    pub fn with_kind(mut self, kind: ItemKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_body(mut self, body: &[u8]) -> Self {
        self.body = body.to_vec();
        self
    }

    /// The item will have no readable sent time.
    pub fn without_sent_on(mut self) -> Self {
        self.sent_on = None;
        self
    }

    /// The item will refuse to be saved.
    pub fn restricted(mut self) -> Self {
        self.restricted = true;
        self
    }
}

impl MailItem for MemoryItem {
    fn kind(&self) -> ItemKind {
        self.kind
    }

    fn subject(&self) -> Result<String> {
        Ok(self.subject.clone())
    }

    fn sent_on(&self) -> Result<DateTime<Local>> {
        self.sent_on.ok_or(StoreError::MissingHeader("Date"))
    }

    fn save_as(&self, path: &Path) -> Result<()> {
        if self.restricted {
            return Err(StoreError::Refused(format!(
                "{:?} is classified as restricted",
                self.subject
            )));
        }
        fs::write(path, &self.body).map_err(|e| StoreError::io(path, e))
    }
}
