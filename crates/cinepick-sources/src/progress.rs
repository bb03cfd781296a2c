use std::collections::HashMap;
use tracing::{info, warn};

/// Receives per-movie progress from a running genre task.
pub trait ProgressSink: Send + Sync {
    /// `done` of `total` candidates on `genre`'s listing have been handled.
    fn movie_done(&self, genre: &str, done: usize, total: usize);
}

impl<F> ProgressSink for F
where
    F: Fn(&str, usize, usize) + Send + Sync,
{
    fn movie_done(&self, genre: &str, done: usize, total: usize) {
        self(genre, done, total)
    }
}

/// Sink that discards progress.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn movie_done(&self, _genre: &str, _done: usize, _total: usize) {}
}

/// Counts what happened to each listing candidate and logs one summary line per scope.
pub struct ProgressTracker {
    scope: String,
    candidates: usize,
    collected: usize,
    already_known: usize,
    image_failures: usize,
    stopped_early: bool,
    start_time: std::time::Instant,
    error_counts: HashMap<String, usize>,
}

impl ProgressTracker {
    pub fn new(scope: impl Into<String>, candidates: usize) -> Self {
        Self {
            scope: scope.into(),
            candidates,
            collected: 0,
            already_known: 0,
            image_failures: 0,
            stopped_early: false,
            start_time: std::time::Instant::now(),
            error_counts: HashMap::new(),
        }
    }

    pub fn record_collected(&mut self) {
        self.collected += 1;
    }

    pub fn record_already_known(&mut self) {
        self.already_known += 1;
    }

    /// Poster could not be saved; the record itself is still collected.
    pub fn record_image_failure(&mut self, category: &str) {
        self.image_failures += 1;
        *self.error_counts.entry(category.to_string()).or_insert(0) += 1;
    }

    pub fn record_stopped(&mut self) {
        self.stopped_early = true;
    }

    pub fn collected(&self) -> usize {
        self.collected
    }

    pub fn already_known(&self) -> usize {
        self.already_known
    }

    pub fn image_failures(&self) -> usize {
        self.image_failures
    }

    pub fn log_summary(&self) {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if self.image_failures > 0 || self.stopped_early {
            warn!(
                scope = %self.scope,
                candidates = self.candidates,
                collected = self.collected,
                already_known = self.already_known,
                image_failures = self.image_failures,
                stopped_early = self.stopped_early,
                "{} finished in {:.1}s with issues",
                self.scope,
                elapsed
            );

            if !self.error_counts.is_empty() {
                let mut entries: Vec<_> = self.error_counts.iter().collect();
                entries.sort_by(|a, b| b.1.cmp(a.1));
                let breakdown: Vec<String> = entries
                    .iter()
                    .map(|(category, count)| format!("{}: {}", category, count))
                    .collect();
                info!("Error breakdown: {}", breakdown.join(", "));
            }
        } else {
            info!(
                scope = %self.scope,
                candidates = self.candidates,
                collected = self.collected,
                already_known = self.already_known,
                "{} finished in {:.1}s",
                self.scope,
                elapsed
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_tracker_counts() {
        let mut tracker = ProgressTracker::new("genre action", 4);
        tracker.record_collected();
        tracker.record_collected();
        tracker.record_already_known();
        tracker.record_image_failure("http");
        tracker.log_summary();

        assert_eq!(tracker.collected(), 2);
        assert_eq!(tracker.already_known(), 1);
        assert_eq!(tracker.image_failures(), 1);
    }

    #[test]
    fn test_closure_sink() {
        let seen = Mutex::new(Vec::new());
        let sink = |genre: &str, done: usize, total: usize| {
            seen.lock().unwrap().push(format!("{}:{}/{}", genre, done, total));
        };
        sink.movie_done("drama", 1, 3);
        assert_eq!(seen.lock().unwrap().as_slice(), ["drama:1/3".to_string()]);
    }
}
