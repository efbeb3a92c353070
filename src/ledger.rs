//! The rollback ledger: one row per compensating statement, keyed by
//! changeset id and checksum, ordered for replay.
//!
//! The ledger owns no transaction boundaries. Drivers commit once per
//! changeset so a compensation list is either fully visible or fully
//! absent to later readers.

use crate::config::Config;
use crate::engine::{SqlExecutor, SqlParam};
use crate::error::{Error, ExecutorError, Result};
use crate::identity::Checksum;
use crate::sql::stmt::{ColumnType, CreateIndex, CreateTable, Delete, Insert, Select};
use crate::sql::Dialect;

pub(crate) const COL_RECORD_ID: &str = "ID";
pub(crate) const COL_CHANGESET_ID: &str = "CHANGESETID";
pub(crate) const COL_CHANGESET_CHECKSUM: &str = "CHANGESETCHECKSUM";
pub(crate) const COL_STATEMENT: &str = "ROLLBACKSTMT";
pub(crate) const COL_STATEMENT_ORDER: &str = "ROLLBACKSTMTORDER";

#[derive(Debug, Clone)]
pub struct Ledger {
    table: String,
    dialect: Dialect,
    max_statement_len: usize,
}

impl Ledger {
    pub fn new(config: &Config, dialect: Dialect) -> Self {
        Self {
            table: config.ledger_table.clone(),
            dialect,
            max_statement_len: config.max_statement_len,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn store_unavailable(&self, source: ExecutorError) -> Error {
        Error::StoreUnavailable { table: self.table.clone(), source }
    }

    /// Create the ledger table and its unique composite index if absent.
    /// Returns whether this call created the table.
    pub fn ensure_table<X: SqlExecutor>(&self, executor: &mut X) -> Result<bool> {
        let exists = executor
            .table_exists(&self.table)
            .map_err(|e| self.store_unavailable(e))?;
        if exists {
            return Ok(false);
        }

        tracing::info!(table = %self.table, "creating rollback ledger table");
        let create = CreateTable::new(self.table.as_str(), COL_RECORD_ID)
            .column(COL_CHANGESET_ID, ColumnType::VarChar(255))
            .column(COL_CHANGESET_CHECKSUM, ColumnType::VarChar(100))
            .column(COL_STATEMENT, ColumnType::VarChar(self.max_statement_len))
            .column(COL_STATEMENT_ORDER, ColumnType::Int);
        let index = CreateIndex::unique(
            format!("IDX_{}_KEY", self.table),
            &self.table,
            &[COL_CHANGESET_ID, COL_CHANGESET_CHECKSUM, COL_STATEMENT_ORDER],
        );

        executor
            .execute(&create.to_sql(self.dialect), &[])
            .map_err(|e| self.store_unavailable(e))?;
        executor
            .execute(&index.to_sql(self.dialect), &[])
            .map_err(|e| self.store_unavailable(e))?;
        executor.commit().map_err(|e| self.store_unavailable(e))?;
        Ok(true)
    }

    /// Insert one row per statement, `ROLLBACKSTMTORDER` starting at 1 in
    /// the given order. The caller owns the commit. Statement length is
    /// checked in characters, matching the column's `VARCHAR` width.
    pub fn append<X: SqlExecutor>(
        &self,
        executor: &mut X,
        changeset_id: &str,
        checksum: &Checksum,
        statements: &[String],
    ) -> Result<usize> {
        let insert = Insert::new(self.table.as_str())
            .column(COL_CHANGESET_ID)
            .column(COL_CHANGESET_CHECKSUM)
            .column(COL_STATEMENT)
            .column(COL_STATEMENT_ORDER)
            .to_sql(self.dialect);

        for (index, statement) in statements.iter().enumerate() {
            let len = statement.chars().count();
            if len > self.max_statement_len {
                return Err(Error::StatementTooLong {
                    changeset: changeset_id.to_string(),
                    len,
                    max: self.max_statement_len,
                });
            }
            let inserted = executor
                .execute(
                    &insert,
                    &[
                        SqlParam::Text(changeset_id),
                        SqlParam::Text(checksum.as_str()),
                        SqlParam::Text(statement),
                        SqlParam::Int(index as i64 + 1),
                    ],
                )
                .map_err(|source| Error::Persist {
                    changeset: changeset_id.to_string(),
                    source,
                })?;
            tracing::debug!(changeset = changeset_id, rows = inserted, "ledger record inserted");
        }
        Ok(statements.len())
    }

    /// Rows matching the exact `(id, checksum)` key, in replay order.
    /// Empty is a valid outcome, not an error.
    pub fn fetch_ordered<X: SqlExecutor>(
        &self,
        executor: &mut X,
        changeset_id: &str,
        checksum: &Checksum,
    ) -> Result<Vec<String>> {
        let select = Select::new(self.table.as_str(), COL_STATEMENT)
            .filter(COL_CHANGESET_ID)
            .filter(COL_CHANGESET_CHECKSUM)
            .order_by(COL_STATEMENT_ORDER)
            .to_sql(self.dialect);
        executor
            .query_text(
                &select,
                &[SqlParam::Text(changeset_id), SqlParam::Text(checksum.as_str())],
            )
            .map_err(|e| self.store_unavailable(e))
    }

    /// Remove all rows for the key. Deleting zero rows is success.
    pub fn delete_entries<X: SqlExecutor>(
        &self,
        executor: &mut X,
        changeset_id: &str,
        checksum: &Checksum,
    ) -> Result<u64> {
        let delete = Delete::new(self.table.as_str())
            .filter(COL_CHANGESET_ID)
            .filter(COL_CHANGESET_CHECKSUM)
            .to_sql(self.dialect);
        executor
            .execute(
                &delete,
                &[SqlParam::Text(changeset_id), SqlParam::Text(checksum.as_str())],
            )
            .map_err(|source| Error::Persist {
                changeset: changeset_id.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::testing::{Call, FakeExecutor};

    fn ledger() -> Ledger {
        Ledger::new(&Config::default(), Dialect::Sqlite)
    }

    #[test]
    fn test_ensure_table_creates_table_and_index_then_commits() {
        let ledger = ledger();
        let mut executor = FakeExecutor::new();
        let created = ledger.ensure_table(&mut executor).unwrap();
        assert!(created);

        let executed = executor.executed_sql();
        assert_eq!(executed.len(), 2);
        assert!(executed[0].starts_with("CREATE TABLE \"DATABASECHANGELOGRB\""));
        assert!(executed[0].contains("\"ROLLBACKSTMT\" VARCHAR(4096) NOT NULL"));
        assert!(executed[1].starts_with("CREATE UNIQUE INDEX \"IDX_DATABASECHANGELOGRB_KEY\""));
        assert_eq!(executor.commits(), 1);
    }

    #[test]
    fn test_ensure_table_noop_when_present() {
        let ledger = ledger();
        let mut executor = FakeExecutor::with_table("DATABASECHANGELOGRB");
        assert!(!ledger.ensure_table(&mut executor).unwrap());
        assert!(executor.executed_sql().is_empty());
        assert_eq!(executor.commits(), 0);
    }

    #[test]
    fn test_ensure_table_introspection_failure_is_store_unavailable() {
        let ledger = ledger();
        let mut executor = FakeExecutor { fail_table_exists: true, ..FakeExecutor::new() };
        let err = ledger.ensure_table(&mut executor).unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable { .. }));
    }

    #[test]
    fn test_ensure_table_create_failure_is_store_unavailable() {
        let ledger = ledger();
        let mut executor = FakeExecutor {
            fail_execute_containing: Some("CREATE TABLE".to_string()),
            ..FakeExecutor::new()
        };
        let err = ledger.ensure_table(&mut executor).unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable { .. }));
    }

    #[test]
    fn test_append_assigns_one_based_order() {
        let ledger = ledger();
        let mut executor = FakeExecutor::new();
        let checksum = Checksum::new("C1");
        let statements = vec!["DROP COLUMN b".to_string(), "DROP COLUMN a".to_string()];
        let count = ledger.append(&mut executor, "ID-01", &checksum, &statements).unwrap();
        assert_eq!(count, 2);

        let params: Vec<Vec<String>> = executor
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Execute { params, .. } => Some(params.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(params[0], vec!["ID-01", "C1", "DROP COLUMN b", "1"]);
        assert_eq!(params[1], vec!["ID-01", "C1", "DROP COLUMN a", "2"]);
        // No commit here: the driver owns the transaction boundary.
        assert_eq!(executor.commits(), 0);
    }

    #[test]
    fn test_append_rejects_oversized_statement() {
        let config = Config { max_statement_len: 16, ..Config::default() };
        let ledger = Ledger::new(&config, Dialect::Sqlite);
        let mut executor = FakeExecutor::new();
        let statements = vec!["DROP COLUMN some_long_name".to_string()];
        let err = ledger
            .append(&mut executor, "ID-01", &Checksum::new("C1"), &statements)
            .unwrap_err();
        match err {
            Error::StatementTooLong { changeset, len, max } => {
                assert_eq!(changeset, "ID-01");
                assert_eq!(len, 26);
                assert_eq!(max, 16);
            }
            other => panic!("expected StatementTooLong, got {other:?}"),
        }
        assert!(executor.executed_sql().is_empty());
    }

    #[test]
    fn test_append_length_limit_counts_chars_not_bytes() {
        let config = Config { max_statement_len: 10, ..Config::default() };
        let ledger = Ledger::new(&config, Dialect::Sqlite);
        let mut executor = FakeExecutor::new();
        // 9 chars, 13 bytes; fits the 10-char column.
        let statements = vec!["déjà vu ↺".to_string()];
        let count = ledger
            .append(&mut executor, "ID-01", &Checksum::new("C1"), &statements)
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(executor.executed_sql().len(), 1);
    }

    #[test]
    fn test_fetch_ordered_binds_composite_key() {
        let ledger = ledger();
        let mut executor = FakeExecutor::new();
        executor.query_results.push_back(vec!["DROP COLUMN b".to_string()]);
        let rows = ledger
            .fetch_ordered(&mut executor, "ID-01", &Checksum::new("C1"))
            .unwrap();
        assert_eq!(rows, vec!["DROP COLUMN b".to_string()]);

        let Call::Query { sql, params } = &executor.calls[0] else {
            panic!("expected a query");
        };
        assert!(sql.contains("ORDER BY \"ROLLBACKSTMTORDER\""));
        assert_eq!(params, &vec!["ID-01".to_string(), "C1".to_string()]);
    }

    #[test]
    fn test_fetch_ordered_empty_is_ok() {
        let ledger = ledger();
        let mut executor = FakeExecutor::new();
        let rows = ledger
            .fetch_ordered(&mut executor, "ID-01", &Checksum::new("C1"))
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_delete_entries_binds_composite_key() {
        let ledger = ledger();
        let mut executor = FakeExecutor::new();
        ledger
            .delete_entries(&mut executor, "ID-01", &Checksum::new("C1"))
            .unwrap();
        let Call::Execute { sql, params } = &executor.calls[0] else {
            panic!("expected an execute");
        };
        assert_eq!(
            sql,
            "DELETE FROM \"DATABASECHANGELOGRB\" WHERE \"CHANGESETID\" = ? AND \"CHANGESETCHECKSUM\" = ?",
        );
        assert_eq!(params, &vec!["ID-01".to_string(), "C1".to_string()]);
    }
}
