//! Session-level accounting for a sync run.
//!
//! A sync session absorbs one [`PageOutcome`](crate::PageOutcome) per page
//! and emits a [`SyncProgress`] after each. At the end, the tally decides
//! whether the session as a whole failed: importing nothing while at least
//! one row failed is an error (likely a wrong key or corrupted history),
//! while partial success is reported as success with a failure count.

use crate::cursor::PageOutcome;

/// Cumulative progress reported to the caller after each page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncProgress {
    /// Rows fetched so far, across all pages.
    pub fetched: u64,
    /// Rows decrypted and mirrored so far.
    pub decrypted: u64,
    /// Rows that failed to decrypt or parse so far.
    pub failed: u64,
    /// True on the final report of the session.
    pub done: bool,
}

/// Running totals for one sync session.
#[derive(Debug, Clone, Default)]
pub struct SessionTally {
    fetched: u64,
    imported: u64,
    failed: u64,
    first_error: Option<String>,
}

impl SessionTally {
    /// Start a fresh session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one page's outcome into the session totals.
    pub fn absorb(&mut self, fetched: u64, page: &PageOutcome) {
        self.fetched += fetched;
        self.imported += page.imported();
        self.failed += page.failed();
    }

    /// Remember the first per-row error for diagnostics. Later errors are
    /// ignored; the first one is usually the representative one.
    pub fn note_error(&mut self, error: impl Into<String>) {
        if self.first_error.is_none() {
            self.first_error = Some(error.into());
        }
    }

    /// Total rows imported this session.
    pub fn imported(&self) -> u64 {
        self.imported
    }

    /// Total rows failed this session.
    pub fn failed(&self) -> u64 {
        self.failed
    }

    /// The first per-row error seen, if any.
    pub fn first_error(&self) -> Option<&str> {
        self.first_error.as_deref()
    }

    /// True when the session must be reported as a failure: at least one
    /// row failed and not a single row imported.
    pub fn is_total_failure(&self) -> bool {
        self.failed > 0 && self.imported == 0
    }

    /// Snapshot the cumulative progress for the caller.
    pub fn progress(&self, done: bool) -> SyncProgress {
        SyncProgress {
            fetched: self.fetched,
            decrypted: self.imported,
            failed: self.failed,
            done,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(successes: &[&str], failures: &[&str]) -> PageOutcome {
        let mut p = PageOutcome::new();
        for s in successes {
            p.record_success(s);
        }
        for f in failures {
            p.record_failure(f);
        }
        p
    }

    #[test]
    fn clean_session_is_not_failure() {
        let mut tally = SessionTally::new();
        tally.absorb(2, &page(&["t1", "t2"], &[]));
        assert!(!tally.is_total_failure());
        assert_eq!(tally.imported(), 2);
        assert_eq!(tally.failed(), 0);
    }

    #[test]
    fn partial_failure_is_not_failure() {
        let mut tally = SessionTally::new();
        tally.absorb(5, &page(&["t1", "t2", "t4", "t5"], &["t3"]));
        tally.note_error("authentication failed");
        assert!(!tally.is_total_failure());
        assert_eq!(tally.failed(), 1);
    }

    #[test]
    fn all_failed_session_is_failure() {
        let mut tally = SessionTally::new();
        tally.absorb(2, &page(&[], &["t1", "t2"]));
        tally.absorb(1, &page(&[], &["t3"]));
        tally.note_error("authentication failed");
        tally.note_error("later error");
        assert!(tally.is_total_failure());
        assert_eq!(tally.first_error(), Some("authentication failed"));
    }

    #[test]
    fn empty_session_is_not_failure() {
        // Nothing fetched, nothing failed: caught up, not broken.
        let tally = SessionTally::new();
        assert!(!tally.is_total_failure());
    }

    #[test]
    fn progress_is_cumulative() {
        let mut tally = SessionTally::new();
        tally.absorb(3, &page(&["t1", "t2"], &["t3"]));
        let p1 = tally.progress(false);
        assert_eq!(p1.fetched, 3);
        assert_eq!(p1.decrypted, 2);
        assert_eq!(p1.failed, 1);
        assert!(!p1.done);

        tally.absorb(2, &page(&["t4", "t5"], &[]));
        let p2 = tally.progress(true);
        assert_eq!(p2.fetched, 5);
        assert_eq!(p2.decrypted, 4);
        assert!(p2.done);
    }
}
