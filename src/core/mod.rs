/// Per-owner balance aggregation
pub mod balance;

/// Cache-aside policy for derived rows
pub mod cache;

/// Read access to the ledger tables
pub mod ledger;

/// Optional external listings lookup
pub mod market;

/// Team performance profiles
pub mod performance;

/// Seat value prediction
pub mod prediction;

/// Season and multi-season financial reports
pub mod report;
