//! Error taxonomy for rollback processing.
//!
//! Only two conditions abort an entire run: an unusable ledger table and,
//! under [`ReplayFailurePolicy::Abort`](crate::config::ReplayFailurePolicy),
//! a failed statement replay. Everything else is scoped to a single
//! changeset and reported through the run's [`RunReport`](crate::report::RunReport).

use std::fmt;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error raised by the host's database executor, wrapped so the driver's
/// native error type stays out of this crate's signatures.
#[derive(Debug)]
pub struct ExecutorError(Box<dyn std::error::Error + Send + Sync>);

impl ExecutorError {
    pub fn new(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(source.into())
    }
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ExecutorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.0.as_ref())
    }
}

/// Error raised by the migration engine collaborator.
#[derive(Debug)]
pub struct EngineError(Box<dyn std::error::Error + Send + Sync>);

impl EngineError {
    pub fn new(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(source.into())
    }

    /// Engine failure described by a plain message.
    pub fn message(msg: impl Into<String>) -> Self {
        Self(msg.into().into())
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.0.as_ref())
    }
}

/// Failure modes of dialect SQL generation for a single change.
#[derive(Error, Debug)]
pub enum SqlGenError {
    /// The change has no mechanical reversal. Recoverable: the deriver
    /// skips the change and keeps going.
    #[error("change cannot be mechanically reversed")]
    NotReversible,

    /// The generator failed outright.
    #[error("sql generation failed: {0}")]
    Failed(String),
}

#[derive(Error, Debug)]
pub enum Error {
    /// The ledger table could not be checked, created, or queried.
    /// Aborts the run before any changeset is touched.
    #[error("rollback ledger `{table}` is unavailable: {source}")]
    StoreUnavailable {
        table: String,
        #[source]
        source: ExecutorError,
    },

    /// Inserting or deleting bookkeeping rows failed. Fatal for the
    /// enclosing changeset's step, not for the run.
    #[error("failed to persist rollback bookkeeping for changeset `{changeset}`: {source}")]
    Persist {
        changeset: String,
        #[source]
        source: ExecutorError,
    },

    /// A stored compensating statement failed during replay. The
    /// changeset's transaction is rolled back and its bookkeeping is left
    /// intact so a future run can retry.
    #[error("rollback statement {order} for changeset `{changeset}` failed: {source}")]
    Replay {
        changeset: String,
        order: usize,
        #[source]
        source: ExecutorError,
    },

    /// A derived statement does not fit the ledger's statement column.
    /// A configuration error, never silent truncation.
    #[error("rollback statement for changeset `{changeset}` is {len} chars, limit is {max}")]
    StatementTooLong {
        changeset: String,
        len: usize,
        max: usize,
    },

    /// Generating SQL for a custom-authored rollback change failed. Custom
    /// rollback is authoritative, so there is no skip-and-continue here.
    #[error("rollback sql generation failed for changeset `{changeset}`: {source}")]
    Generate {
        changeset: String,
        #[source]
        source: SqlGenError,
    },

    /// The migration engine could not list changesets or compute a checksum.
    #[error("migration engine error: {0}")]
    Engine(#[from] EngineError),

    /// Configuration could not be parsed or is inconsistent.
    #[error("invalid configuration: {0}")]
    Config(String),
}
