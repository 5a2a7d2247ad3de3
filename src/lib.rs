//! Exports the messages of a mailbox into a directory tree mirroring its
//! folders, one file per message, and optionally deletes exported files
//! once they fall out of the retention window.

pub mod archiver;
pub mod events;
pub mod export;
pub mod materialize;
pub mod report;
pub mod retention;
pub mod sanitize;
pub mod settings;
pub mod store;
pub mod sweep;
pub mod walk;
