//! Changeset identity.
//!
//! A ledger row is keyed by `(changeset id, checksum)`. The checksum side
//! of that key must be computed with a fixed algorithm version: if lookups
//! followed the engine's default and that default moved between runs,
//! every stored compensation would silently orphan.

use std::fmt;

use crate::engine::{ChangeSet, MigrationEngine};
use crate::error::EngineError;

/// Version of the checksum algorithm a [`Checksum`] was computed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumVersion {
    V1,
    V2,
}

impl ChecksumVersion {
    /// The newest algorithm version this crate knows about.
    pub const fn latest() -> Self {
        Self::V2
    }
}

/// Printable content checksum of one changeset version. Changes whenever
/// the changeset's definition changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Checksum(String);

impl Checksum {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Computes changeset checksums with an algorithm version pinned at
/// construction, so ledger lookups stay stable across engine upgrades.
#[derive(Debug, Clone, Copy)]
pub struct IdentityResolver {
    version: ChecksumVersion,
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityResolver {
    pub fn new() -> Self {
        Self { version: ChecksumVersion::latest() }
    }

    pub fn checksum_of<E: MigrationEngine>(
        &self,
        engine: &E,
        changeset: &ChangeSet<E::Change>,
    ) -> Result<Checksum, EngineError> {
        engine.checksum(changeset, self.version)
    }
}
