//! Precomputation: derive and persist compensating statements for every
//! changeset the plan defines but has not yet applied.
//!
//! This runs before the engine applies anything, so the ledger always
//! holds a changeset's reversal before its effects exist. A later run can
//! then undo the changeset after it drifts out of the plan.

use crate::derive::derive_compensation;
use crate::engine::{DialectSql, MigrationEngine, SqlExecutor};
use crate::error::{Error, Result};
use crate::identity::IdentityResolver;
use crate::ledger::Ledger;
use crate::report::{Failed, Precomputed, RunReport};

pub fn run<E, G, X>(
    ledger: &Ledger,
    engine: &E,
    generator: &G,
    executor: &mut X,
    report: &mut RunReport,
) -> Result<()>
where
    E: MigrationEngine,
    G: DialectSql<E::Change>,
    X: SqlExecutor,
{
    let resolver = IdentityResolver::new();
    let changesets = engine.unrun_changesets()?;

    for changeset in &changesets {
        tracing::info!(changeset = %changeset.id, "precomputing rollback statements");
        let checksum = resolver.checksum_of(engine, changeset)?;
        let statements = derive_compensation(generator, changeset)?;
        if statements.is_empty() {
            tracing::debug!(changeset = %changeset.id, "no rollback statements derived");
            continue;
        }

        // A previous run may have persisted this changeset's compensations
        // and then crashed before the engine applied it. Re-appending would
        // trip the ledger's unique key; the rows already there are the ones
        // this run would derive.
        let existing = ledger.fetch_ordered(executor, &changeset.id, &checksum)?;
        if !existing.is_empty() {
            tracing::debug!(
                changeset = %changeset.id,
                checksum = %checksum,
                "rollback statements already persisted",
            );
            continue;
        }

        // One commit per changeset: the compensation list must be fully
        // visible or fully absent to drift reversal.
        let outcome = ledger
            .append(executor, &changeset.id, &checksum, &statements)
            .and_then(|count| {
                executor.commit().map_err(|source| Error::Persist {
                    changeset: changeset.id.clone(),
                    source,
                })?;
                Ok(count)
            });

        match outcome {
            Ok(count) => {
                tracing::info!(
                    changeset = %changeset.id,
                    checksum = %checksum,
                    statements = count,
                    "rollback statements persisted",
                );
                report.precomputed.push(Precomputed {
                    changeset_id: changeset.id.clone(),
                    checksum: checksum.as_str().to_string(),
                    statements: count,
                });
            }
            Err(err) => {
                tracing::error!(
                    changeset = %changeset.id,
                    error = %err,
                    "failed to persist rollback statements",
                );
                if let Err(rollback_err) = executor.rollback() {
                    tracing::error!(
                        changeset = %changeset.id,
                        error = %rollback_err,
                        "transaction rollback failed",
                    );
                }
                report.failed.push(Failed {
                    changeset_id: changeset.id.clone(),
                    error: err.to_string(),
                });
            }
        }
    }
    Ok(())
}
