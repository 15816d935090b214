/// Duration in milliseconds with microsecond precision, for result reports.
pub fn duration_as_ms_rounded(duration: std::time::Duration) -> f64 {
    (duration.as_secs_f64() * 1_000_000.0).round() / 1000.0
}

/// Number of worker threads for a decider run at the given CPU utilization
/// percentage. Clamped to 0..=150% (oversubscribing a little can utilize the
/// cores better than 100%); always at least 1.
pub fn num_cpus_percentage(percent: usize) -> usize {
    let cpus = num_cpus::get();
    (cpus * percent.min(150) / 100).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_rounding_keeps_microseconds() {
        let d = std::time::Duration::from_micros(1_234_567);
        assert_eq!(1234.567, duration_as_ms_rounded(d));
    }

    #[test]
    fn worker_count_is_clamped_and_never_zero() {
        assert_eq!(1, num_cpus_percentage(0));
        let cpus = num_cpus::get();
        assert_eq!(cpus, num_cpus_percentage(100));
        assert_eq!((cpus * 3 / 2).max(1), num_cpus_percentage(400));
    }
}
