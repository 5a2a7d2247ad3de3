use crate::events::{Event, Events};
use crate::export::export_folder;
use crate::materialize::ensure_dir;
use crate::report::ExportTotals;
use crate::retention::ExportWindow;
use crate::store::{MailFolder, MailStore, Result as StoreResult};
use std::io;
use std::path::{Path, PathBuf};

/// Default number of folder levels visited below an account, counting the
/// top-level folders themselves.
pub const DEFAULT_MAX_DEPTH: usize = 4;

/// Top-level folders which never hold mail worth archiving.
pub const EXCLUDED_FOLDERS: &[&str] = &[
    "Deleted Items",
    "Outbox",
    "Junk Email",
    "Drafts",
    "Conversation History",
    "Calendar",
    "Contacts",
    "Yammer Root",
    "Sync Issues",
    "Scheduled",
    "Quick Step Settings",
    "PersonMetadata",
    "RSS Subscriptions",
    "MeContact",
    "Archive",
    "Files",
    "Notes",
    "Conversation Action Settings",
    "Tasks",
    "Journal",
    "ExternalContacts",
    "News Feed",
    "Social Activity Notifications",
    "Suggested Contacts",
    "Tools",
];

pub fn is_excluded(name: &str) -> bool {
    EXCLUDED_FOLDERS.contains(&name)
}

/// Lists the top-level folders of `account` worth visiting.
pub fn top_level_folders<S: MailStore>(
    store: &S,
    account: &str,
    events: &Events,
) -> StoreResult<Vec<S::Folder>> {
    events.emit(Event::TopLevelFolders);
    let mut folders = store.folders(account)?;
    folders.retain(|folder| !is_excluded(folder.name()));
    for folder in folders.iter() {
        events.emit(Event::TopLevelFolder(folder.name().to_string()));
    }
    Ok(folders)
}

/// Mirrors a folder tree into directories below `output_root`, exporting
/// the messages of every visited folder.
pub struct Walker<'a> {
    output_root: PathBuf,
    max_depth: usize,
    window: ExportWindow,
    events: &'a Events,
}

impl<'a> Walker<'a> {
    pub fn new(output_root: &Path, window: ExportWindow, events: &'a Events) -> Self {
        Walker {
            output_root: output_root.to_path_buf(),
            max_depth: DEFAULT_MAX_DEPTH,
            window,
            events,
        }
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    pub fn walk<F: MailFolder>(&self, folders: &[F]) -> io::Result<ExportTotals> {
        let mut totals = ExportTotals::default();
        for folder in folders.iter() {
            totals += self.visit(folder, &self.output_root, None, 1)?;
        }
        Ok(totals)
    }

    fn visit<F: MailFolder>(
        &self,
        folder: &F,
        parent: &Path,
        parent_chain: Option<&str>,
        depth: usize,
    ) -> io::Result<ExportTotals> {
        let directory = ensure_dir(parent, folder.name(), self.events)?;
        let chain = match parent_chain {
            Some(parent_chain) => format!("{}/{}", parent_chain, folder.name()),
            None => folder.name().to_string(),
        };
        let mut totals = export_folder(folder, &directory, &chain, &self.window, self.events);

        let children = match folder.folders() {
            Ok(children) => children,
            Err(e) => {
                self.events.emit(Event::FolderFailed {
                    chain,
                    error: e.to_string(),
                });
                return Ok(totals);
            }
        };
        if depth >= self.max_depth {
            if !children.is_empty() {
                self.events.emit(Event::DepthLimitReached {
                    chain,
                    skipped: children.len(),
                });
            }
            return Ok(totals);
        }
        for child in children.iter() {
            totals += self.visit(child, &directory, Some(&chain), depth + 1)?;
        }
        Ok(totals)
    }
}
