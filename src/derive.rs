//! Derives the ordered compensating statements for one changeset.

use crate::engine::{ChangeSet, ChangeSource, DialectSql};
use crate::error::{Error, Result, SqlGenError};

/// Produce the compensation sequence for `changeset`. The returned order
/// is the replay order and defines `ROLLBACKSTMTORDER` when persisted.
///
/// Three cases, in precedence order:
/// 1. Custom-authored rollback changes translate in declared order and are
///    used as-is; a generation failure here is an error, not a skip.
/// 2. A raw-script changeset yields an empty list. Script text cannot be
///    introspected for reversal; a known limitation, not an error.
/// 3. Otherwise the forward changes are reversed (last applied, first
///    undone) and each reversal derived mechanically. A change with no
///    mechanical reversal is skipped with a warning; later changes cannot
///    depend on it having been undone, since it was applied earlier.
pub fn derive_compensation<C>(
    generator: &impl DialectSql<C>,
    changeset: &ChangeSet<C>,
) -> Result<Vec<String>> {
    if let Some(rollback) = &changeset.rollback {
        let mut statements = Vec::new();
        for change in rollback {
            let sql = generator.forward_sql(change).map_err(|source| Error::Generate {
                changeset: changeset.id.clone(),
                source,
            })?;
            statements.extend(sql);
        }
        return Ok(statements);
    }

    if changeset.source == ChangeSource::RawScript {
        tracing::info!(changeset = %changeset.id, "raw sql script, no mechanical reversal");
        return Ok(Vec::new());
    }

    let mut statements = Vec::new();
    for change in changeset.changes.iter().rev() {
        match generator.rollback_sql(change) {
            Ok(sql) => statements.extend(sql),
            Err(SqlGenError::NotReversible) => {
                tracing::warn!(
                    changeset = %changeset.id,
                    "change has no mechanical reversal, skipping",
                );
            }
            Err(source) => {
                return Err(Error::Generate { changeset: changeset.id.clone(), source });
            }
        }
    }
    Ok(statements)
}
