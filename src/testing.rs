//! In-memory fakes shared by the unit tests. The integration suite under
//! `tests/` exercises the same flows against a real SQLite database.

use std::collections::VecDeque;

use crate::engine::{
    ChangeSet, DialectSql, MigrationEngine, RanChangeSet, SqlExecutor, SqlParam,
};
use crate::error::{EngineError, ExecutorError, SqlGenError};
use crate::identity::{Checksum, ChecksumVersion};

/// Everything a driver did to the executor, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Execute { sql: String, params: Vec<String> },
    Query { sql: String, params: Vec<String> },
    Commit,
    Rollback,
}

fn render_params(params: &[SqlParam<'_>]) -> Vec<String> {
    params
        .iter()
        .map(|p| match p {
            SqlParam::Text(s) => (*s).to_string(),
            SqlParam::Int(i) => i.to_string(),
        })
        .collect()
}

/// Recording executor with scripted responses and failure injection.
#[derive(Debug, Default)]
pub struct FakeExecutor {
    pub tables: Vec<String>,
    pub calls: Vec<Call>,
    /// One entry consumed per `query_text` call.
    pub query_results: VecDeque<Vec<String>>,
    /// Fail any `execute` whose SQL text or rendered bind params contain
    /// this fragment.
    pub fail_execute_containing: Option<String>,
    /// Fail `table_exists`.
    pub fail_table_exists: bool,
    /// Fail `rollback` after recording the call.
    pub fail_rollback: bool,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(table: &str) -> Self {
        Self { tables: vec![table.to_string()], ..Self::default() }
    }

    pub fn executed_sql(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Execute { sql, .. } => Some(sql.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn commits(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, Call::Commit)).count()
    }

    pub fn rollbacks(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, Call::Rollback)).count()
    }
}

impl SqlExecutor for FakeExecutor {
    fn execute(&mut self, sql: &str, params: &[SqlParam<'_>]) -> Result<u64, ExecutorError> {
        let rendered = render_params(params);
        let failing = self.fail_execute_containing.as_deref().is_some_and(|fragment| {
            sql.contains(fragment) || rendered.iter().any(|p| p.contains(fragment))
        });
        self.calls.push(Call::Execute { sql: sql.to_string(), params: rendered });
        if failing {
            return Err(ExecutorError::new(format!("injected failure for `{sql}`")));
        }
        Ok(1)
    }

    fn query_text(&mut self, sql: &str, params: &[SqlParam<'_>]) -> Result<Vec<String>, ExecutorError> {
        self.calls.push(Call::Query { sql: sql.to_string(), params: render_params(params) });
        Ok(self.query_results.pop_front().unwrap_or_default())
    }

    fn table_exists(&mut self, table: &str) -> Result<bool, ExecutorError> {
        if self.fail_table_exists {
            return Err(ExecutorError::new("introspection unavailable"));
        }
        Ok(self.tables.iter().any(|t| t == table))
    }

    fn commit(&mut self) -> Result<(), ExecutorError> {
        self.calls.push(Call::Commit);
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), ExecutorError> {
        self.calls.push(Call::Rollback);
        if self.fail_rollback {
            return Err(ExecutorError::new("rollback unavailable"));
        }
        Ok(())
    }
}

/// Minimal change vocabulary for driving the deriver in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestChange {
    AddColumn { table: String, column: String },
    DropColumn { table: String, column: String },
    /// Reversible forward, but has no mechanical reversal.
    Irreversible,
    /// Generator fails outright on this change.
    Broken,
}

impl TestChange {
    pub fn add(table: &str, column: &str) -> Self {
        Self::AddColumn { table: table.to_string(), column: column.to_string() }
    }

    pub fn drop(table: &str, column: &str) -> Self {
        Self::DropColumn { table: table.to_string(), column: column.to_string() }
    }
}

pub struct TestDialectSql;

impl DialectSql<TestChange> for TestDialectSql {
    fn forward_sql(&self, change: &TestChange) -> Result<Vec<String>, SqlGenError> {
        match change {
            TestChange::AddColumn { table, column } => {
                Ok(vec![format!("ALTER TABLE {table} ADD COLUMN {column} INT")])
            }
            TestChange::DropColumn { table, column } => {
                Ok(vec![format!("ALTER TABLE {table} DROP COLUMN {column}")])
            }
            TestChange::Irreversible => Ok(vec!["UPDATE t SET x = 1".to_string()]),
            TestChange::Broken => Err(SqlGenError::Failed("boom".to_string())),
        }
    }

    fn rollback_sql(&self, change: &TestChange) -> Result<Vec<String>, SqlGenError> {
        match change {
            TestChange::AddColumn { table, column } => {
                Ok(vec![format!("ALTER TABLE {table} DROP COLUMN {column}")])
            }
            TestChange::DropColumn { .. } | TestChange::Irreversible => {
                Err(SqlGenError::NotReversible)
            }
            TestChange::Broken => Err(SqlGenError::Failed("boom".to_string())),
        }
    }
}

/// Scripted engine: checksums are `"<id>-sum"` unless the id is listed in
/// `checksum_failures`.
#[derive(Debug, Default)]
pub struct FakeEngine {
    pub unrun: Vec<ChangeSet<TestChange>>,
    pub unexpected: Vec<RanChangeSet>,
    pub checksum_failures: Vec<String>,
}

impl FakeEngine {
    pub fn checksum_for(id: &str) -> Checksum {
        Checksum::new(format!("{id}-sum"))
    }
}

impl MigrationEngine for FakeEngine {
    type Change = TestChange;

    fn unrun_changesets(&self) -> Result<Vec<ChangeSet<TestChange>>, EngineError> {
        Ok(self.unrun.clone())
    }

    fn unexpected_changesets(&self) -> Result<Vec<RanChangeSet>, EngineError> {
        Ok(self.unexpected.clone())
    }

    fn checksum(
        &self,
        changeset: &ChangeSet<TestChange>,
        _version: ChecksumVersion,
    ) -> Result<Checksum, EngineError> {
        if self.checksum_failures.iter().any(|id| id == &changeset.id) {
            return Err(EngineError::message(format!("no checksum for {}", changeset.id)));
        }
        Ok(Self::checksum_for(&changeset.id))
    }
}
