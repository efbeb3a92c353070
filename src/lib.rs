//! Automatic undo for forward-only schema migrations.
//!
//! Before a changeset is applied, its compensating (rollback) statements
//! are derived and recorded in a side table, the *ledger*. When the
//! migration engine later reports a previously applied changeset as no
//! longer part of the expected plan, the recorded statements are replayed
//! in stored order and the bookkeeping rows are removed, one transaction
//! per changeset.
//!
//! The migration engine, the dialect SQL generator, and the database
//! connection are collaborators the host supplies through the traits in
//! [`engine`]. This crate owns only the ledger table and the two
//! algorithms that populate and drain it.
//!
//! ```no_run
//! use unapply::{AutoRollback, Config, Dialect};
//! # use unapply::{ChangeSet, RanChangeSet, Checksum, ChecksumVersion};
//! # use unapply::engine::{MigrationEngine, DialectSql, SqlExecutor, SqlParam};
//! # use unapply::{EngineError, ExecutorError, SqlGenError};
//! # struct Engine; struct Generator; struct Conn;
//! # impl MigrationEngine for Engine {
//! #     type Change = ();
//! #     fn unrun_changesets(&self) -> Result<Vec<ChangeSet<()>>, EngineError> { Ok(vec![]) }
//! #     fn unexpected_changesets(&self) -> Result<Vec<RanChangeSet>, EngineError> { Ok(vec![]) }
//! #     fn checksum(&self, _: &ChangeSet<()>, _: ChecksumVersion) -> Result<Checksum, EngineError> {
//! #         Ok(Checksum::new("x"))
//! #     }
//! # }
//! # impl DialectSql<()> for Generator {
//! #     fn forward_sql(&self, _: &()) -> Result<Vec<String>, SqlGenError> { Ok(vec![]) }
//! #     fn rollback_sql(&self, _: &()) -> Result<Vec<String>, SqlGenError> { Ok(vec![]) }
//! # }
//! # impl SqlExecutor for Conn {
//! #     fn execute(&mut self, _: &str, _: &[SqlParam<'_>]) -> Result<u64, ExecutorError> { Ok(0) }
//! #     fn query_text(&mut self, _: &str, _: &[SqlParam<'_>]) -> Result<Vec<String>, ExecutorError> { Ok(vec![]) }
//! #     fn table_exists(&mut self, _: &str) -> Result<bool, ExecutorError> { Ok(true) }
//! #     fn commit(&mut self) -> Result<(), ExecutorError> { Ok(()) }
//! #     fn rollback(&mut self) -> Result<(), ExecutorError> { Ok(()) }
//! # }
//! # fn main() -> unapply::Result<()> {
//! # let (engine, generator, mut conn) = (Engine, Generator, Conn);
//! let hook = AutoRollback::new(Config::default(), Dialect::Postgres);
//! let report = hook.customize(&engine, &generator, &mut conn)?;
//! println!("reversed: {:?}", report.reversed);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod derive;
pub mod drift;
pub mod engine;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod precompute;
pub mod report;
pub mod sql;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{Config, ReplayFailurePolicy};
pub use engine::{ChangeSet, ChangeSource, DialectSql, MigrationEngine, RanChangeSet, SqlExecutor, SqlParam};
pub use error::{EngineError, Error, ExecutorError, Result, SqlGenError};
pub use identity::{Checksum, ChecksumVersion, IdentityResolver};
pub use ledger::Ledger;
pub use report::{Failed, Precomputed, RunReport, Skip, SkipReason};
pub use sql::Dialect;

/// Migration-run hook wiring the ledger, precomputation, and drift
/// reversal together. Invoke [`customize`](AutoRollback::customize) once
/// per migration run, before the engine applies forward changes.
#[derive(Debug, Clone)]
pub struct AutoRollback {
    config: Config,
    dialect: Dialect,
}

impl AutoRollback {
    pub fn new(config: Config, dialect: Dialect) -> Self {
        Self { config, dialect }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the full cycle: ensure the ledger table exists, precompute
    /// compensating statements for not-yet-applied changesets, then
    /// reverse whatever drifted out of the expected plan. Drift reversal
    /// consumes ledger entries written by *previous* runs; a changeset's
    /// compensations are always persisted before it is ever applied.
    pub fn customize<E, G, X>(
        &self,
        engine: &E,
        generator: &G,
        executor: &mut X,
    ) -> Result<RunReport>
    where
        E: MigrationEngine,
        G: DialectSql<E::Change>,
        X: SqlExecutor,
    {
        if !self.config.enabled {
            tracing::debug!("automatic rollback disabled by configuration");
            return Ok(RunReport::default());
        }

        tracing::info!("starting automatic rollback processing");
        let ledger = Ledger::new(&self.config, self.dialect);
        let mut report = RunReport::default();

        report.ledger_created = ledger.ensure_table(executor)?;
        precompute::run(&ledger, engine, generator, executor, &mut report)?;
        drift::run(&self.config, &ledger, self.dialect, engine, executor, &mut report)?;

        tracing::info!(
            precomputed = report.precomputed.len(),
            reversed = report.reversed.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "automatic rollback processing completed",
        );
        Ok(report)
    }
}
