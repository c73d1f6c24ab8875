//! Shared debouncing logic for file change events.
//!
//! Editors save in bursts (auto-save, format-on-save, atomic rename
//! dances); debouncing collapses each burst into one event per path.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Debounces file change events by path.
///
/// Records change timestamps and returns paths that have been stable
/// for the configured duration. Last-write-wins: re-recording a path
/// resets its timer.
#[derive(Debug)]
pub struct Debouncer {
    /// Pending changes: path -> last change timestamp.
    pending: HashMap<PathBuf, Instant>,
    /// How long a path must be quiet before it is released.
    duration: Duration,
}

impl Debouncer {
    /// Create a new debouncer with the given duration in milliseconds.
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            pending: HashMap::new(),
            duration: Duration::from_millis(debounce_ms),
        }
    }

    /// Record a change, resetting the timer for this path.
    pub fn record(&mut self, path: PathBuf) {
        self.pending.insert(path, Instant::now());
    }

    /// Drop a path from pending (e.g., when the file is deleted).
    pub fn remove(&mut self, path: &PathBuf) {
        self.pending.remove(path);
    }

    /// Take all paths that have been stable for the debounce duration,
    /// removing them from pending.
    pub fn take_ready(&mut self) -> Vec<PathBuf> {
        let now = Instant::now();
        let mut ready = Vec::new();

        self.pending.retain(|path, last_change| {
            if now.duration_since(*last_change) >= self.duration {
                ready.push(path.clone());
                false
            } else {
                true
            }
        });

        ready
    }

    /// Check if there are any pending changes.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn releases_after_quiet_period() {
        let mut debouncer = Debouncer::new(50);

        let path = PathBuf::from("content/posts/a.md");
        debouncer.record(path.clone());

        assert!(debouncer.take_ready().is_empty());
        assert!(debouncer.has_pending());

        sleep(Duration::from_millis(60));

        let ready = debouncer.take_ready();
        assert_eq!(ready, vec![path]);
        assert!(!debouncer.has_pending());
    }

    #[test]
    fn rerecording_resets_the_timer() {
        let mut debouncer = Debouncer::new(50);

        let path = PathBuf::from("content/posts/a.md");
        debouncer.record(path.clone());
        sleep(Duration::from_millis(30));

        debouncer.record(path.clone());
        sleep(Duration::from_millis(30));

        // 60ms since the first record, but only 30ms since the last
        assert!(debouncer.take_ready().is_empty());

        sleep(Duration::from_millis(30));
        assert_eq!(debouncer.take_ready().len(), 1);
    }

    #[test]
    fn paths_release_independently() {
        let mut debouncer = Debouncer::new(50);

        let first = PathBuf::from("content/posts/a.md");
        let second = PathBuf::from("content/authors/b.json");

        debouncer.record(first.clone());
        sleep(Duration::from_millis(30));
        debouncer.record(second.clone());
        sleep(Duration::from_millis(25));

        assert_eq!(debouncer.take_ready(), vec![first]);
        assert!(debouncer.has_pending());

        sleep(Duration::from_millis(30));
        assert_eq!(debouncer.take_ready(), vec![second]);
    }

    #[test]
    fn removed_paths_are_forgotten() {
        let mut debouncer = Debouncer::new(50);

        let path = PathBuf::from("content/posts/a.md");
        debouncer.record(path.clone());
        debouncer.remove(&path);
        assert!(!debouncer.has_pending());
    }
}
