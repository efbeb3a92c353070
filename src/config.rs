//! Host-supplied configuration surface.
//!
//! The crate never loads configuration itself; the host either builds a
//! [`Config`] in code or hands over a TOML fragment from its own
//! configuration file via [`Config::from_toml_str`].

use serde::Deserialize;

use crate::error::{Error, Result};

/// Default name of the engine's applied-changesets table.
pub const DEFAULT_CHANGELOG_TABLE: &str = "DATABASECHANGELOG";

/// Default name of the rollback ledger table owned by this crate.
pub const DEFAULT_LEDGER_TABLE: &str = "DATABASECHANGELOGRB";

/// Default width of the ledger's statement column.
pub const DEFAULT_MAX_STATEMENT_LEN: usize = 4096;

/// What to do when replaying a stored rollback statement fails.
///
/// Either way the failed changeset's transaction is rolled back and its
/// bookkeeping stays intact, so a future run can retry it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayFailurePolicy {
    /// Record the failure and move on to the next unexpected changeset.
    #[default]
    Continue,
    /// Abort the whole run on the first replay failure.
    Abort,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Master switch; when false the whole hook is a no-op.
    pub enabled: bool,
    /// Name of the engine's applied-changesets table. Read and deleted
    /// from, never created here.
    pub changelog_table: String,
    /// Name of the ledger table this crate creates and owns.
    pub ledger_table: String,
    /// Width of the ledger's statement column. A derived statement longer
    /// than this raises [`Error::StatementTooLong`](crate::Error::StatementTooLong);
    /// raise the limit rather than expect truncation.
    pub max_statement_len: usize,
    pub on_replay_failure: ReplayFailurePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            changelog_table: DEFAULT_CHANGELOG_TABLE.to_string(),
            ledger_table: DEFAULT_LEDGER_TABLE.to_string(),
            max_statement_len: DEFAULT_MAX_STATEMENT_LEN,
            on_replay_failure: ReplayFailurePolicy::default(),
        }
    }
}

impl Config {
    /// Parse a TOML fragment, e.g. the `[rollback]` section of the host's
    /// configuration file. Unknown keys are rejected.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|e| Error::Config(e.to_string()))
    }
}
