use crate::events::{Event, Events};
use crate::sanitize::sanitize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Returns the directory mirroring `folder_name` inside `parent`, creating
/// it if it does not exist yet.
pub fn ensure_dir(parent: &Path, folder_name: &str, events: &Events) -> io::Result<PathBuf> {
    let directory = parent.join(sanitize(folder_name, ' '));
    if !directory.is_dir() {
        fs::create_dir(&directory).map_err(|e| {
            io::Error::new(e.kind(), format!("{}: {}", directory.display(), e))
        })?;
        events.emit(Event::DirectoryCreated(directory.clone()));
    }
    Ok(directory)
}
