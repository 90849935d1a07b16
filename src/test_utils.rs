//! Shared test utilities for `SeasonLedger`.
//!
//! This module provides an in-memory database setup, helpers that insert single
//! ledger rows with sensible defaults, and [`LedgerFixture`] for building a
//! whole ledger either as a [`LedgerSnapshot`] or as database rows.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::missing_panics_doc)]

use crate::{
    core::ledger::LedgerSnapshot,
    entities::{
        attendance, game, game_pricing, owner, payment, season, seat, seat_ownership, team,
    },
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all database tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Asserts two floats agree to within a cent fraction.
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

fn date(value: &str) -> NaiveDate {
    value.parse().expect("test dates use YYYY-MM-DD")
}

/// Creates a team.
pub async fn create_test_team(db: &DatabaseConnection, name: &str) -> Result<team::Model> {
    Ok(team::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

/// Creates a season of `team_id`.
pub async fn create_test_season(
    db: &DatabaseConnection,
    team_id: i64,
    year: i32,
) -> Result<season::Model> {
    Ok(season::ActiveModel {
        team_id: Set(team_id),
        year: Set(year),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

/// Creates a game on a `YYYY-MM-DD` date.
pub async fn create_test_game(
    db: &DatabaseConnection,
    season_id: i64,
    opponent: &str,
    on: &str,
) -> Result<game::Model> {
    Ok(game::ActiveModel {
        season_id: Set(season_id),
        opponent: Set(opponent.to_string()),
        date: Set(date(on)),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

/// Creates seat number "1" in the given section and row.
pub async fn create_test_seat(
    db: &DatabaseConnection,
    team_id: i64,
    section: &str,
    row: &str,
    license_cost: Option<f64>,
) -> Result<seat::Model> {
    Ok(seat::ActiveModel {
        team_id: Set(team_id),
        section: Set(section.to_string()),
        row: Set(row.to_string()),
        number: Set("1".to_string()),
        license_cost: Set(license_cost),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

/// Creates an owner without an email address.
pub async fn create_test_owner(db: &DatabaseConnection, name: &str) -> Result<owner::Model> {
    Ok(owner::ActiveModel {
        name: Set(name.to_string()),
        email: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

/// Assigns a seat to an owner for one season.
pub async fn create_test_ownership(
    db: &DatabaseConnection,
    seat_id: i64,
    season_id: i64,
    owner_id: i64,
) -> Result<seat_ownership::Model> {
    Ok(seat_ownership::ActiveModel {
        seat_id: Set(seat_id),
        season_id: Set(season_id),
        owner_id: Set(owner_id),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

/// Creates a pricing row for a seat at a game.
pub async fn create_test_pricing(
    db: &DatabaseConnection,
    game_id: i64,
    seat_id: i64,
    cost: f64,
    sold_price: Option<f64>,
) -> Result<game_pricing::Model> {
    Ok(game_pricing::ActiveModel {
        game_id: Set(game_id),
        seat_id: Set(seat_id),
        cost: Set(cost),
        sold_price: Set(sold_price),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

/// Records `count` anonymous attendance rows for a game.
pub async fn create_attendance(db: &DatabaseConnection, game_id: i64, count: usize) -> Result<()> {
    for _ in 0..count {
        attendance::ActiveModel {
            game_id: Set(game_id),
            seat_id: Set(None),
            owner_id: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

/// Builder for a whole ledger with explicit ids.
///
/// Ownership, pricing and payment rows are numbered in insertion order.
#[derive(Debug, Clone, Default)]
pub struct LedgerFixture {
    teams: Vec<team::Model>,
    seasons: Vec<season::Model>,
    games: Vec<game::Model>,
    seats: Vec<seat::Model>,
    owners: Vec<owner::Model>,
    ownerships: Vec<seat_ownership::Model>,
    pricing: Vec<game_pricing::Model>,
    payments: Vec<payment::Model>,
}

fn next_id(len: usize) -> i64 {
    i64::try_from(len).unwrap() + 1
}

impl LedgerFixture {
    /// Adds a team.
    #[must_use]
    pub fn team(mut self, id: i64, name: &str) -> Self {
        self.teams.push(team::Model {
            id,
            name: name.to_string(),
        });
        self
    }

    /// Adds a season.
    #[must_use]
    pub fn season(mut self, id: i64, team_id: i64, year: i32) -> Self {
        self.seasons.push(season::Model { id, team_id, year });
        self
    }

    /// Adds a game on a `YYYY-MM-DD` date.
    #[must_use]
    pub fn game(mut self, id: i64, season_id: i64, opponent: &str, on: &str) -> Self {
        self.games.push(game::Model {
            id,
            season_id,
            opponent: opponent.to_string(),
            date: date(on),
        });
        self
    }

    /// Adds a seat; its number is its id.
    #[must_use]
    pub fn seat(
        mut self,
        id: i64,
        team_id: i64,
        section: &str,
        row: &str,
        license_cost: Option<f64>,
    ) -> Self {
        self.seats.push(seat::Model {
            id,
            team_id,
            section: section.to_string(),
            row: row.to_string(),
            number: id.to_string(),
            license_cost,
        });
        self
    }

    /// Adds an owner.
    #[must_use]
    pub fn owner(mut self, id: i64, name: &str) -> Self {
        self.owners.push(owner::Model {
            id,
            name: name.to_string(),
            email: None,
        });
        self
    }

    /// Assigns a seat to an owner for a season.
    #[must_use]
    pub fn ownership(mut self, seat_id: i64, season_id: i64, owner_id: i64) -> Self {
        self.ownerships.push(seat_ownership::Model {
            id: next_id(self.ownerships.len()),
            seat_id,
            season_id,
            owner_id,
        });
        self
    }

    /// Prices a seat for a game.
    #[must_use]
    pub fn pricing(mut self, game_id: i64, seat_id: i64, cost: f64, sold_price: Option<f64>) -> Self {
        self.pricing.push(game_pricing::Model {
            id: next_id(self.pricing.len()),
            game_id,
            seat_id,
            cost,
            sold_price,
        });
        self
    }

    /// Adds an owner payment.
    #[must_use]
    pub fn payment(
        mut self,
        owner_id: Option<i64>,
        season_id: Option<i64>,
        amount: f64,
        payment_type: &str,
        category: &str,
    ) -> Self {
        self.payments.push(payment::Model {
            id: next_id(self.payments.len()),
            owner_id,
            team_id: None,
            season_id,
            amount,
            payment_type: payment_type.to_string(),
            category: category.to_string(),
            description: None,
        });
        self
    }

    /// Adds a payment between the group and a team.
    #[must_use]
    pub fn team_payment(
        mut self,
        team_id: i64,
        season_id: Option<i64>,
        amount: f64,
        payment_type: &str,
        category: &str,
    ) -> Self {
        self.payments.push(payment::Model {
            id: next_id(self.payments.len()),
            owner_id: None,
            team_id: Some(team_id),
            season_id,
            amount,
            payment_type: payment_type.to_string(),
            category: category.to_string(),
            description: None,
        });
        self
    }

    /// Builds the snapshot the database would load for these rows.
    #[must_use]
    pub fn snapshot(self) -> LedgerSnapshot {
        LedgerSnapshot::from_rows(
            self.teams,
            self.seasons,
            self.games,
            self.seats,
            self.owners,
            self.ownerships,
            self.pricing,
            self.payments,
        )
        .expect("fixture rows are valid")
    }

    /// Inserts every row, keeping the fixture's ids.
    pub async fn insert(self, db: &DatabaseConnection) -> Result<()> {
        for row in self.teams {
            team::ActiveModel::from(row).reset_all().insert(db).await?;
        }
        for row in self.seasons {
            season::ActiveModel::from(row).reset_all().insert(db).await?;
        }
        for row in self.games {
            game::ActiveModel::from(row).reset_all().insert(db).await?;
        }
        for row in self.seats {
            seat::ActiveModel::from(row).reset_all().insert(db).await?;
        }
        for row in self.owners {
            owner::ActiveModel::from(row).reset_all().insert(db).await?;
        }
        for row in self.ownerships {
            seat_ownership::ActiveModel::from(row).reset_all().insert(db).await?;
        }
        for row in self.pricing {
            game_pricing::ActiveModel::from(row).reset_all().insert(db).await?;
        }
        for row in self.payments {
            payment::ActiveModel::from(row).reset_all().insert(db).await?;
        }
        Ok(())
    }
}
