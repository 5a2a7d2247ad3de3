use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use std::path::Path;

/// Subject used for messages which have none.
pub const NO_SUBJECT: &str = "No Subject Provided";

/// Extension of every exported message file.
pub const EXPORT_EXTENSION: &str = "msg";

/// Combined length of directory and file name above which the file name
/// gets truncated. It leaves room below the 260-character path limit for
/// the epoch prefix.
const MAX_NAME_LENGTH: usize = 230;

static UNSAFE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new("[^A-Za-z0-9]+").unwrap());

/// Replaces every run of characters outside `[A-Za-z0-9]` with a single
/// `replacement`.
pub fn sanitize(raw: &str, replacement: char) -> String {
    let mut buf = [0; 4];
    let replacement: &str = replacement.encode_utf8(&mut buf);
    UNSAFE_RUN.replace_all(raw, NoExpand(replacement)).into_owned()
}

/// Computes the file name a message is exported to inside `directory`.
///
/// The sent epoch prefix keeps names of messages sharing a subject apart,
/// and makes the name deterministic so that an existing file means the
/// message was already exported.
pub fn message_file_name(directory: &Path, subject: &str, sent_epoch: i64) -> String {
    let name = if subject.is_empty() { NO_SUBJECT } else { subject };
    let mut stem = sanitize(name, '_');
    let base_len = stem.chars().count() + EXPORT_EXTENSION.len() + 1;
    let directory_len = directory.to_string_lossy().chars().count();

    if directory_len + base_len >= MAX_NAME_LENGTH {
        let budget = MAX_NAME_LENGTH
            .saturating_sub(directory_len)
            .saturating_sub(EXPORT_EXTENSION.len() + 1);
        stem = stem.chars().take(budget).collect();
    }
    format!("{}_{}.{}", sent_epoch, stem, EXPORT_EXTENSION)
}
