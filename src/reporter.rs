//! Simple methods to track time and report progress after a while. \
//! The reporter is an external collaborator of the decider engine and not
//! part of the decider contract.

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use num_format::ToFormattedString;

use crate::config::user_locale;

/// Tracks progress of a long running decider or verifier run and renders a
/// progress line when one is due.
pub struct Reporter {
    start_time: Instant,
    started_at: DateTime<Local>,
    last_progress_time: Instant,
    report_progress_after: Duration,
    total: u64,
}

impl Reporter {
    pub fn new_default(total: u64) -> Self {
        Self {
            start_time: Instant::now(),
            started_at: Local::now(),
            last_progress_time: Instant::now(),
            report_progress_after: Duration::new(2, 0),
            total,
        }
    }

    pub fn new(total: u64, report_progress_after: Duration) -> Self {
        Self {
            report_progress_after,
            ..Self::new_default(total)
        }
    }

    /// Header line with the wall-clock start of the run.
    pub fn run_header(&self, name: &str) -> String {
        format!(
            "{name}: started {}, {} machines",
            self.started_at.format("%Y-%m-%d %H:%M:%S"),
            self.total.to_formatted_string(&user_locale())
        )
    }

    /// Reports progress; should be called when [Self::is_due_progress]
    /// returns true. Calling this too often may be inefficient as the
    /// parameters would be passed needlessly most of the time.
    pub fn report(&mut self, processed: u64) -> String {
        self.last_progress_time = Instant::now();
        let locale = &user_locale();
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let per_second = if elapsed > 0.0 {
            (processed as f64 / elapsed) as u64
        } else {
            0
        };
        if self.total > 0 {
            let percent = (processed as f64 / self.total as f64 * 1000.0).round() / 10.0;
            format!(
                "Progress: {} of {} ({percent}%), {} per second",
                processed.to_formatted_string(locale),
                self.total.to_formatted_string(locale),
                per_second.to_formatted_string(locale),
            )
        } else {
            format!(
                "Progress: {}, {} per second",
                processed.to_formatted_string(locale),
                per_second.to_formatted_string(locale),
            )
        }
    }

    pub fn is_due_progress(&self) -> bool {
        self.last_progress_time.elapsed() > self.report_progress_after
    }

    pub fn start_time(&self) -> Instant {
        self.start_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reporter_progress_line_contains_percentage() {
        let mut reporter = Reporter::new_default(200_000);
        let line = reporter.report(50_000);
        assert!(line.contains("50,000"));
        assert!(line.contains("200,000"));
        assert!(line.contains("25%"));
    }

    #[test]
    fn reporter_due_after_interval() {
        let reporter = Reporter::new(10, Duration::from_millis(0));
        std::thread::sleep(Duration::from_millis(2));
        assert!(reporter.is_due_progress());
    }
}
