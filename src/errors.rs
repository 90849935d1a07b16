//! Unified error types for the ledger engine.
//!
//! Normal data sparsity (orphaned rows, empty denominators, expired caches,
//! an unconfigured market-data source) never surfaces here. Only malformed
//! input and lookups of entities that must exist become errors.

use thiserror::Error;

/// Errors returned by the ledger engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem
        message: String,
    },

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A requested team does not exist
    #[error("Team not found: {team_id}")]
    TeamNotFound {
        /// The missing team id
        team_id: i64,
    },

    /// A requested season does not exist
    #[error("Season not found: {season_id}")]
    SeasonNotFound {
        /// The missing season id
        season_id: i64,
    },

    /// A requested seat does not exist
    #[error("Seat not found: {seat_id}")]
    SeatNotFound {
        /// The missing seat id
        seat_id: i64,
    },

    /// A numeric ledger field held a non-finite value
    #[error("Invalid amount in {field}: {amount}")]
    InvalidAmount {
        /// Which field carried the value
        field: &'static str,
        /// The offending value
        amount: f64,
    },

    /// A payment row carried a type outside the known set
    #[error("Unknown payment type: {value}")]
    InvalidPaymentType {
        /// The raw type string
        value: String,
    },

    /// The external market-data source failed
    #[error("Market data error: {message}")]
    MarketData {
        /// Description of the failure
        message: String,
    },

    /// I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Self::MarketData {
            message: value.to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

/// Rejects NaN and infinite values read from the ledger.
pub(crate) fn ensure_finite(field: &'static str, amount: f64) -> Result<f64> {
    if amount.is_finite() {
        Ok(amount)
    } else {
        Err(Error::InvalidAmount { field, amount })
    }
}
