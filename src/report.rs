use std::ops::AddAssign;

/// Counters of an export walk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExportTotals {
    /// Mail items looked at, eligible or not.
    pub processed: u64,
    /// Messages newly written to disk.
    pub saved: u64,
    /// Bytes written by newly saved messages.
    pub bytes: u64,
}

impl AddAssign for ExportTotals {
    fn add_assign(&mut self, other: Self) {
        self.processed += other.processed;
        self.saved += other.saved;
        self.bytes += other.bytes;
    }
}

/// Counters of a retention sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepTotals {
    pub removed: u64,
    pub bytes: u64,
}

/// Final counters of a whole run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub export: ExportTotals,
    pub sweep: SweepTotals,
}

pub fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / 1000.0 / 1000.0
}
