//! Cursor advancement policy for one page of sync.
//!
//! The replication cursor is the highest server-assigned `imported_at`
//! whose row has been durably mirrored. The engine records what happened
//! to each row of a page here, then asks where the cursor may move.
//!
//! Two rules keep the protocol live without losing data:
//! - the cursor never moves past a row that failed *if* any later or equal
//!   row succeeded - it moves to the last **successful** row, so a crash
//!   re-fetches nothing that was written and nothing successful is skipped;
//! - a page where *every* row failed still advances the cursor to the last
//!   row, otherwise an unrecoverable row would be re-fetched forever.
//!   Those rows are permanently skipped, and the session tally reports
//!   them.

/// Per-page record of which rows imported and which failed.
#[derive(Debug, Clone, Default)]
pub struct PageOutcome {
    imported: u64,
    failed: u64,
    last_success: Option<String>,
    last_row: Option<String>,
}

impl PageOutcome {
    /// Start tracking a fresh page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a row that decrypted and mirrored successfully.
    ///
    /// Rows must be recorded in server order (ascending `imported_at`).
    pub fn record_success(&mut self, imported_at: &str) {
        self.imported += 1;
        self.last_success = Some(imported_at.to_string());
        self.last_row = Some(imported_at.to_string());
    }

    /// Record a row that failed to decrypt or parse.
    pub fn record_failure(&mut self, imported_at: &str) {
        self.failed += 1;
        self.last_row = Some(imported_at.to_string());
    }

    /// Rows imported from this page.
    pub fn imported(&self) -> u64 {
        self.imported
    }

    /// Rows that failed on this page.
    pub fn failed(&self) -> u64 {
        self.failed
    }

    /// Where the cursor may move once this page is durable.
    ///
    /// `None` only for an empty page (nothing recorded), in which case the
    /// cursor must not move at all.
    pub fn next_cursor(&self) -> Option<&str> {
        if self.last_success.is_some() {
            self.last_success.as_deref()
        } else {
            self.last_row.as_deref()
        }
    }
}
