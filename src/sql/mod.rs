//! SQL text generation for the ledger's own statements.
//!
//! The handful of statement shapes the ledger and the drift driver need
//! are built here rather than written as string literals, so identifier
//! quoting and bind-placeholder style stay correct per dialect. Values
//! are always bound positionally, never spliced into the text.

pub mod dialect;
pub mod stmt;

pub use dialect::Dialect;
