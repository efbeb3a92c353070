//! Outcome of one rollback-processing run, for host-side auditing and
//! assertions. Everything here is also logged as it happens.

/// Why a changeset was left untouched during drift reversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The changelog row carries no checksum, so its ledger rows cannot be
    /// identified. Guessing is worse than skipping.
    MissingChecksum,
    /// No ledger rows exist for the changeset's recorded identity. Covers
    /// raw scripts, fully irreversible changesets, and entries orphaned by
    /// a checksum change.
    NothingToUndo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skip {
    pub changeset_id: String,
    pub reason: SkipReason,
}

/// One changeset whose compensations were persisted during precomputation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Precomputed {
    pub changeset_id: String,
    pub checksum: String,
    pub statements: usize,
}

/// A changeset whose step failed without aborting the run. Its bookkeeping
/// is intact; a future run retries it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failed {
    pub changeset_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Whether this run created the ledger table.
    pub ledger_created: bool,
    /// Changesets whose compensations were derived and persisted.
    pub precomputed: Vec<Precomputed>,
    /// Unexpected changesets fully undone and cleaned up.
    pub reversed: Vec<String>,
    /// Unexpected changesets left untouched, with the reason.
    pub skipped: Vec<Skip>,
    /// Per-changeset failures that did not abort the run.
    pub failed: Vec<Failed>,
}
