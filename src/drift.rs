//! Drift reversal: undo changesets the changelog records as applied but
//! the current plan no longer expects.
//!
//! Unexpected changesets are processed in descending execution order, the
//! mirror image of forward application, and each one commits on its own.
//! A failure while undoing one changeset never rolls back the committed
//! undo of another.

use crate::config::{Config, ReplayFailurePolicy};
use crate::engine::{MigrationEngine, RanChangeSet, SqlExecutor, SqlParam};
use crate::error::{Error, Result};
use crate::identity::Checksum;
use crate::ledger::Ledger;
use crate::report::{Failed, RunReport, Skip, SkipReason};
use crate::sql::stmt::Delete;
use crate::sql::Dialect;

const COL_CHANGELOG_ID: &str = "ID";
const COL_CHANGELOG_CHECKSUM: &str = "MD5SUM";

pub fn run<E, X>(
    config: &Config,
    ledger: &Ledger,
    dialect: Dialect,
    engine: &E,
    executor: &mut X,
    report: &mut RunReport,
) -> Result<()>
where
    E: MigrationEngine,
    X: SqlExecutor,
{
    let mut unexpected = engine.unexpected_changesets()?;
    // Undo most recently applied first; later changesets may depend on
    // earlier ones.
    unexpected.sort_by(|a, b| b.execution_order.cmp(&a.execution_order));

    for ran in &unexpected {
        tracing::info!(
            changeset = %ran.id,
            execution_order = ran.execution_order,
            "unexpected changeset found",
        );

        let Some(checksum) = &ran.checksum else {
            tracing::info!(changeset = %ran.id, "no recorded checksum, skipping rollback");
            report.skipped.push(Skip {
                changeset_id: ran.id.clone(),
                reason: SkipReason::MissingChecksum,
            });
            continue;
        };

        let statements = ledger.fetch_ordered(executor, &ran.id, checksum)?;
        if statements.is_empty() {
            tracing::info!(
                changeset = %ran.id,
                checksum = %checksum,
                "no rollback statements recorded",
            );
            report.skipped.push(Skip {
                changeset_id: ran.id.clone(),
                reason: SkipReason::NothingToUndo,
            });
            continue;
        }

        match reverse_one(config, ledger, dialect, executor, ran, checksum, &statements) {
            Ok(()) => {
                tracing::info!(changeset = %ran.id, "changeset rolled back");
                report.reversed.push(ran.id.clone());
            }
            Err(err) => {
                if let Err(rollback_err) = executor.rollback() {
                    tracing::error!(
                        changeset = %ran.id,
                        error = %rollback_err,
                        "transaction rollback failed",
                    );
                }
                tracing::error!(
                    changeset = %ran.id,
                    error = %err,
                    "rollback failed, bookkeeping left intact for retry",
                );
                match config.on_replay_failure {
                    ReplayFailurePolicy::Abort => return Err(err),
                    ReplayFailurePolicy::Continue => {
                        report.failed.push(Failed {
                            changeset_id: ran.id.clone(),
                            error: err.to_string(),
                        });
                    }
                }
            }
        }
    }
    Ok(())
}

/// Replay one changeset's stored statements, then remove its changelog row
/// and ledger rows, in a single commit. Any error leaves the caller to
/// roll the transaction back with everything intact.
fn reverse_one<X: SqlExecutor>(
    config: &Config,
    ledger: &Ledger,
    dialect: Dialect,
    executor: &mut X,
    ran: &RanChangeSet,
    checksum: &Checksum,
    statements: &[String],
) -> Result<()> {
    for (index, statement) in statements.iter().enumerate() {
        tracing::info!(changeset = %ran.id, order = index + 1, "executing rollback statement");
        executor.execute(statement, &[]).map_err(|source| Error::Replay {
            changeset: ran.id.clone(),
            order: index + 1,
            source,
        })?;
    }

    let delete_changelog = Delete::new(config.changelog_table.as_str())
        .filter(COL_CHANGELOG_ID)
        .filter(COL_CHANGELOG_CHECKSUM)
        .to_sql(dialect);
    let deleted = executor
        .execute(
            &delete_changelog,
            &[SqlParam::Text(&ran.id), SqlParam::Text(checksum.as_str())],
        )
        .map_err(|source| Error::Persist { changeset: ran.id.clone(), source })?;
    tracing::info!(changeset = %ran.id, rows = deleted, "changelog records deleted");

    let deleted = ledger.delete_entries(executor, &ran.id, checksum)?;
    tracing::info!(changeset = %ran.id, rows = deleted, "ledger records deleted");

    executor
        .commit()
        .map_err(|source| Error::Persist { changeset: ran.id.clone(), source })
}
