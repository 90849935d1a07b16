/// Database configuration and connection management
pub mod database;

/// Market-data source configuration from environment variables
pub mod market;

/// Application settings loading from ledger.toml
pub mod settings;
