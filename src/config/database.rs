//! Database configuration module for `SeasonLedger`.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs. Derived tables additionally get unique
//! indexes on their natural keys, which the upserts in `core` rely on.

use crate::entities::{
    Attendance, Game, GamePricing, Owner, Payment, Season, Seat, SeatOwnership,
    SeatValuePrediction, SeatValuePredictionColumn, Team, TeamPerformance,
    TeamPerformanceColumn,
};
use crate::errors::Result;
use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/season_ledger.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a default local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    ensure_sqlite_parent_dir(&database_url)?;
    debug!("Connecting to {database_url}");
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates the directory holding a file-backed `SQLite` database.
fn ensure_sqlite_parent_dir(database_url: &str) -> Result<()> {
    let Some(path) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or_default();
    if let Some(parent) = Path::new(path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Creates all tables and natural-key indexes if they do not already exist.
///
/// Ledger tables carry no foreign keys because partially entered ledgers are expected.
/// Derived tables cascade on delete of the rows they describe.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    create_table(db, &schema, Team).await?;
    create_table(db, &schema, Season).await?;
    create_table(db, &schema, Game).await?;
    create_table(db, &schema, Seat).await?;
    create_table(db, &schema, Owner).await?;
    create_table(db, &schema, SeatOwnership).await?;
    create_table(db, &schema, GamePricing).await?;
    create_table(db, &schema, Payment).await?;
    create_table(db, &schema, Attendance).await?;
    create_table(db, &schema, TeamPerformance).await?;
    create_table(db, &schema, SeatValuePrediction).await?;

    let performance_key = Index::create()
        .name("idx_team_performance_team_season")
        .table(TeamPerformance)
        .col(TeamPerformanceColumn::TeamId)
        .col(TeamPerformanceColumn::SeasonId)
        .unique()
        .if_not_exists()
        .to_owned();
    let prediction_key = Index::create()
        .name("idx_seat_value_prediction_seat_season")
        .table(SeatValuePrediction)
        .col(SeatValuePredictionColumn::SeatId)
        .col(SeatValuePredictionColumn::SeasonId)
        .unique()
        .if_not_exists()
        .to_owned();
    create_index(db, &performance_key).await?;
    create_index(db, &prediction_key).await?;

    info!("Database tables ensured.");
    Ok(())
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

async fn create_index(db: &DatabaseConnection, statement: &IndexCreateStatement) -> Result<()> {
    let builder = db.get_database_backend();
    db.execute(builder.build(statement)).await?;
    Ok(())
}
