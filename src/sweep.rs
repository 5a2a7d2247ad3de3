use crate::events::{Event, Events};
use crate::report::SweepTotals;
use crate::retention::{epoch_of, is_expired, retention_cutoff};
use crate::sanitize::EXPORT_EXTENSION;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;
use walkdir::WalkDir;

/// When exported files get deleted.
#[derive(Clone, Copy, Debug)]
pub struct RetentionPolicy {
    pub enabled: bool,
    pub max_age_days: u32,
    pub cutoff: SystemTime,
}

impl RetentionPolicy {
    pub fn new(enabled: bool, max_age_days: u32, now: SystemTime) -> Self {
        RetentionPolicy {
            enabled,
            max_age_days,
            cutoff: retention_cutoff(now, max_age_days),
        }
    }
}

/// Size of the file at `path` if it is expired.
fn expired_size(path: &Path, cutoff: SystemTime) -> io::Result<Option<u64>> {
    let metadata = fs::metadata(path)?;
    if !is_expired(metadata.modified()?, cutoff) {
        return Ok(None);
    }
    Ok(Some(metadata.len()))
}

/// Deletes every exported file below `output_root` last modified at or
/// before the policy cutoff. Exported files carry their message's sent time
/// as modification time, so this removes messages by age.
pub fn sweep(output_root: &Path, policy: &RetentionPolicy, events: &Events) -> SweepTotals {
    let mut totals = SweepTotals::default();
    if !policy.enabled {
        events.emit(Event::SweepDisabled);
        return totals;
    }

    events.emit(Event::SweepStarted {
        max_age_days: policy.max_age_days,
        cutoff_epoch: epoch_of(policy.cutoff),
    });
    for entry in WalkDir::new(output_root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().unwrap_or(output_root).to_path_buf();
                events.emit(Event::ScanFailed {
                    path,
                    error: e.to_string(),
                });
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file()
            || path.extension().map_or(true, |ext| ext != OsStr::new(EXPORT_EXTENSION))
        {
            continue;
        }

        let size = match expired_size(path, policy.cutoff) {
            Ok(Some(size)) => size,
            Ok(None) => continue,
            Err(e) => {
                events.emit(Event::RemoveFailed {
                    path: path.to_path_buf(),
                    error: e.to_string(),
                });
                continue;
            }
        };
        events.emit(Event::FileExpired(path.to_path_buf()));
        match fs::remove_file(path) {
            Ok(()) => {
                events.emit(Event::FileRemoved(path.to_path_buf()));
                totals.removed += 1;
                totals.bytes += size;
            }
            Err(e) => events.emit(Event::RemoveFailed {
                path: path.to_path_buf(),
                error: e.to_string(),
            }),
        }
    }
    events.emit(Event::SweepFinished);
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::tests::recording;
    use crate::retention::system_time_from_epoch;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::TempDir;

    const DAY: u64 = 86_400;

    fn write_aged(path: &Path, content: &str, mtime: SystemTime) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
    }

    #[test]
    fn test_sweep_removes_old_exports() {
        let tmp_dir = TempDir::new().unwrap();
        let root = tmp_dir.path();
        let now = SystemTime::now();
        let old = now - Duration::from_secs(10 * DAY);
        let recent = now - Duration::from_secs(DAY);

        write_aged(&root.join("Inbox/1_old.msg"), "12345", old);
        write_aged(&root.join("Inbox/Deep/Deeper/2_old.msg"), "123", old);
        write_aged(&root.join("Inbox/3_recent.msg"), "1", recent);
        write_aged(&root.join("Inbox/notes.txt"), "keep me", old);

        let (events, _) = recording();
        let policy = RetentionPolicy::new(true, 5, now);
        let totals = sweep(root, &policy, &events);
        assert_eq!(
            totals,
            SweepTotals {
                removed: 2,
                bytes: 8,
            }
        );
        assert!(!root.join("Inbox/1_old.msg").exists());
        assert!(!root.join("Inbox/Deep/Deeper/2_old.msg").exists());
        assert!(root.join("Inbox/3_recent.msg").exists());
        assert!(root.join("Inbox/notes.txt").exists());
    }

    #[test]
    fn test_sweep_cutoff_is_inclusive() {
        let tmp_dir = TempDir::new().unwrap();
        let now = system_time_from_epoch(100 * DAY as i64);
        let policy = RetentionPolicy::new(true, 5, now);
        write_aged(&tmp_dir.path().join("at.msg"), "x", policy.cutoff);
        write_aged(
            &tmp_dir.path().join("after.msg"),
            "x",
            policy.cutoff + Duration::from_secs(1),
        );
        let (events, _) = recording();
        let totals = sweep(tmp_dir.path(), &policy, &events);
        assert_eq!(totals.removed, 1);
        assert!(!tmp_dir.path().join("at.msg").exists());
        assert!(tmp_dir.path().join("after.msg").exists());
    }

    #[test]
    fn test_disabled_sweep_keeps_everything() {
        let tmp_dir = TempDir::new().unwrap();
        let now = SystemTime::now();
        let path = tmp_dir.path().join("Inbox/1_ancient.msg");
        write_aged(&path, "x", system_time_from_epoch(0));

        let (events, recorder) = recording();
        let policy = RetentionPolicy::new(false, 5, now);
        assert_eq!(sweep(tmp_dir.path(), &policy, &events), SweepTotals::default());
        assert!(path.exists());
        assert_eq!(recorder.events(), vec![Event::SweepDisabled]);
    }

    #[test]
    fn test_sweep_reports_unreadable_root() {
        let tmp_dir = TempDir::new().unwrap();
        let root = tmp_dir.path().join("missing");
        let (events, recorder) = recording();
        let policy = RetentionPolicy::new(true, 5, SystemTime::now());
        assert_eq!(sweep(&root, &policy, &events), SweepTotals::default());

        let events = recorder.events();
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::ScanFailed { path, .. } if *path == root)));
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::RemoveFailed { .. })));
        assert_eq!(events.last(), Some(&Event::SweepFinished));
    }

    #[cfg(unix)]
    #[test]
    fn test_sweep_continues_past_undeletable_file() {
        use std::os::unix::fs::PermissionsExt;

        let tmp_dir = TempDir::new().unwrap();
        let root = tmp_dir.path();
        let now = SystemTime::now();
        let old = now - Duration::from_secs(10 * DAY);
        let locked = root.join("A/1_locked.msg");
        let free = root.join("B/2_free.msg");
        write_aged(&locked, "123", old);
        write_aged(&free, "45", old);
        let locked_dir = root.join("A");
        fs::set_permissions(&locked_dir, fs::Permissions::from_mode(0o555)).unwrap();
        let privileged = fs::write(locked_dir.join("canary"), "").is_ok();

        let (events, recorder) = recording();
        let totals = sweep(root, &RetentionPolicy::new(true, 5, now), &events);
        fs::set_permissions(&locked_dir, fs::Permissions::from_mode(0o755)).unwrap();
        if privileged {
            // Directory permissions do not bind this user.
            return;
        }

        assert_eq!(
            totals,
            SweepTotals {
                removed: 1,
                bytes: 2,
            }
        );
        assert!(locked.exists());
        assert!(!free.exists());
        assert!(recorder
            .events()
            .iter()
            .any(|event| matches!(event, Event::RemoveFailed { path, .. } if *path == locked)));
    }
}
