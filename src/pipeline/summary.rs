use std::fmt;
use std::time::Duration;

use crate::pipeline::task::FileOutcome;

/// Totals of one pipeline run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub files_processed: u64,
    pub files_skipped: u64,
    pub windows_failed: u64,
    pub records_written: u64,
    pub elapsed: Duration,
    pub cancelled: bool,
}

impl RunSummary {
    /// Accounts for one flushed file
    pub fn record(&mut self, outcome: &FileOutcome, rows: u64) {
        if outcome.is_skipped() {
            self.files_skipped += 1;
        } else {
            self.files_processed += 1;
        }
        self.windows_failed += outcome.failed_windows() as u64;
        self.records_written += rows;
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} files processed, {} skipped, {} windows failed, {} records written in {:.2?}",
               self.files_processed, self.files_skipped, self.windows_failed,
               self.records_written, self.elapsed)?;
        if self.cancelled {
            write!(f, " (cancelled)")?;
        }
        Ok(())
    }
}
