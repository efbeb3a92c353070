//! Collaborator contracts.
//!
//! The migration engine, the dialect SQL generator, and the bound database
//! connection all live in the host; this crate only consumes them through
//! the traits here. No singletons: the executor for the run is passed in
//! explicitly.

use crate::error::{EngineError, ExecutorError, SqlGenError};
use crate::identity::{Checksum, ChecksumVersion};

/// Where a changeset definition came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSource {
    /// Structured, introspectable change definitions.
    Structured,
    /// A raw external SQL script. Not introspectable, so not mechanically
    /// reversible.
    RawScript,
}

impl ChangeSource {
    /// Classify a changeset by its definition file's path.
    pub fn from_path(path: &str) -> Self {
        if path.to_ascii_lowercase().ends_with(".sql") {
            Self::RawScript
        } else {
            Self::Structured
        }
    }
}

/// One unit of migration, read-only to this crate.
///
/// `C` is the engine's change type; the core never inspects it, only hands
/// it to the [`DialectSql`] generator.
#[derive(Debug, Clone)]
pub struct ChangeSet<C> {
    /// Identity within the migration plan, unique per definition file.
    pub id: String,
    pub source: ChangeSource,
    /// Forward changes in declared order.
    pub changes: Vec<C>,
    /// Custom-authored rollback changes. Authoritative when present, even
    /// if empty.
    pub rollback: Option<Vec<C>>,
}

/// A changeset the changelog records as applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RanChangeSet {
    pub id: String,
    /// Checksum recorded at application time. Absent for rows written by
    /// engines that did not record one.
    pub checksum: Option<Checksum>,
    /// Monotonic position assigned when the changeset was applied.
    pub execution_order: u32,
}

/// The migration engine's view of the plan and the changelog.
pub trait MigrationEngine {
    /// Opaque change type handed to the dialect generator.
    type Change;

    /// Changesets defined but not yet applied, in plan order.
    fn unrun_changesets(&self) -> Result<Vec<ChangeSet<Self::Change>>, EngineError>;

    /// Changesets recorded as applied that the current plan does not
    /// expect.
    fn unexpected_changesets(&self) -> Result<Vec<RanChangeSet>, EngineError>;

    /// Content checksum of a changeset under an explicit algorithm
    /// version. Never called with "whatever the engine defaults to";
    /// see [`IdentityResolver`](crate::identity::IdentityResolver).
    fn checksum(
        &self,
        changeset: &ChangeSet<Self::Change>,
        version: ChecksumVersion,
    ) -> Result<Checksum, EngineError>;
}

/// Dialect SQL generation for abstract changes.
pub trait DialectSql<C> {
    /// SQL realizing the change's forward effect. Also used to translate
    /// custom-authored rollback changes, which are forward changes that
    /// happen to undo something.
    fn forward_sql(&self, change: &C) -> Result<Vec<String>, SqlGenError>;

    /// SQL reversing the change's effect.
    /// [`SqlGenError::NotReversible`] when no mechanical reversal exists.
    fn rollback_sql(&self, change: &C) -> Result<Vec<String>, SqlGenError>;
}

/// A positional bind value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlParam<'a> {
    Text(&'a str),
    Int(i64),
}

/// Raw statement execution against the connection the migration run owns.
///
/// The run is single-writer and strictly sequential, so the executor is
/// borrowed mutably for each call and transaction control is explicit:
/// drivers call [`commit`](SqlExecutor::commit) once per changeset.
pub trait SqlExecutor {
    /// Execute a statement, returning the affected row count.
    fn execute(&mut self, sql: &str, params: &[SqlParam<'_>]) -> Result<u64, ExecutorError>;

    /// Run a query selecting a single text column, returning it row by row.
    fn query_text(&mut self, sql: &str, params: &[SqlParam<'_>]) -> Result<Vec<String>, ExecutorError>;

    /// Whether a table exists in the connection's default catalog/schema.
    fn table_exists(&mut self, table: &str) -> Result<bool, ExecutorError>;

    fn commit(&mut self) -> Result<(), ExecutorError>;

    fn rollback(&mut self) -> Result<(), ExecutorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_source_from_path() {
        assert_eq!(ChangeSource::from_path("db/changelog-1.xml"), ChangeSource::Structured);
        assert_eq!(ChangeSource::from_path("db/patch-7.sql"), ChangeSource::RawScript);
        assert_eq!(ChangeSource::from_path("db/PATCH-7.SQL"), ChangeSource::RawScript);
        assert_eq!(ChangeSource::from_path("db/sqlish.yaml"), ChangeSource::Structured);
    }
}
