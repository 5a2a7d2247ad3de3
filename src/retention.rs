use chrono::{DateTime, Duration as ChronoDuration, NaiveDateTime, SubsecRound, TimeZone};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const SECONDS_PER_DAY: u64 = 86_400;

/// Whether a file last modified at `mtime` falls out of retention.
/// Files modified exactly at the cutoff are expired.
pub fn is_expired(mtime: SystemTime, cutoff: SystemTime) -> bool {
    mtime <= cutoff
}

/// The instant `max_age_days` days before `now`, never earlier than the
/// Unix epoch.
pub fn retention_cutoff(now: SystemTime, max_age_days: u32) -> SystemTime {
    let age = Duration::from_secs(u64::from(max_age_days) * SECONDS_PER_DAY);
    match now.duration_since(UNIX_EPOCH) {
        Ok(since) if since > age => now - age,
        _ => UNIX_EPOCH,
    }
}

/// Converts whole seconds since the Unix epoch to a `SystemTime`.
pub fn system_time_from_epoch(epoch: i64) -> SystemTime {
    if epoch >= 0 {
        UNIX_EPOCH + Duration::from_secs(epoch as u64)
    } else {
        UNIX_EPOCH - Duration::from_secs(epoch.unsigned_abs())
    }
}

/// Whole seconds since the Unix epoch, negative before it.
pub fn epoch_of(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(since) => since.as_secs() as i64,
        Err(before) => -(before.duration().as_secs() as i64),
    }
}

/// Which messages are recent enough to export.
///
/// The cutoff is a wall-clock time: `max_age_days` calendar days before the
/// local time of `now`, whatever daylight saving changes lie in between.
#[derive(Clone, Copy, Debug)]
pub struct ExportWindow {
    pub cutoff: NaiveDateTime,
}

impl ExportWindow {
    pub fn new<Tz: TimeZone>(now: DateTime<Tz>, max_age_days: u32) -> Self {
        ExportWindow {
            cutoff: now.naive_local() - ChronoDuration::days(i64::from(max_age_days)),
        }
    }

    pub fn is_eligible<Tz: TimeZone>(&self, sent: DateTime<Tz>) -> bool {
        age_delta_days(sent.naive_local(), self.cutoff) >= 0
    }
}

/// Whole days from `cutoff` to `sent`, rounded down.
///
/// Both sides are wall-clock times truncated to the second, so a message
/// sent in the same second as the cutoff is zero days away and one sent a
/// second earlier is minus one day away.
pub fn age_delta_days(sent: NaiveDateTime, cutoff: NaiveDateTime) -> i64 {
    let sent = sent.trunc_subsecs(0);
    let cutoff = cutoff.trunc_subsecs(0);
    (sent - cutoff)
        .num_seconds()
        .div_euclid(SECONDS_PER_DAY as i64)
}
