use indicatif::{ProgressBar, ProgressStyle};

/// Per-file progress display
///
/// The catalog is walked lazily, so the total is unknown and the bar is a
/// spinner with a running count.
pub struct ProgressTracker {
    bar: ProgressBar,
}

impl ProgressTracker {
    pub fn new(enabled: bool) -> Self {
        if !enabled {
            return ProgressTracker { bar: ProgressBar::hidden() };
        }

        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {pos} files {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        bar.enable_steady_tick(std::time::Duration::from_millis(120));

        ProgressTracker { bar }
    }

    pub fn increment(&self, amount: u64) {
        self.bar.inc(amount);
    }

    pub fn set_message(&self, msg: &str) {
        self.bar.set_message(msg.to_string());
    }

    pub fn finish(&self, msg: &str) {
        self.bar.finish_with_message(msg.to_string());
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_tracker_still_counts() {
        let tracker = ProgressTracker::new(false);
        tracker.increment(1);
        tracker.increment(2);
        tracker.set_message("wheat/2010");
        assert_eq!(tracker.position(), 3);
        tracker.finish("done");
    }
}
