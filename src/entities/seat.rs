//! Seat entity - A physical seat in a team's venue.
//!
//! The license cost is a one-time fee tied to the seat itself and is never
//! scoped to a season.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Seat database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "seats")]
pub struct Model {
    /// Unique identifier for the seat
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Team whose venue holds the seat
    pub team_id: i64,
    /// Section label (e.g. "112")
    pub section: String,
    /// Row label
    pub row: String,
    /// Seat number within the row
    pub number: String,
    /// One-time seat license fee, if any
    pub license_cost: Option<f64>,
}

impl Model {
    /// License cost with a missing value read as zero.
    #[must_use]
    pub fn license_cost_or_zero(&self) -> f64 {
        self.license_cost.unwrap_or(0.0)
    }
}

/// Seats reference their team by id only; predictions cascade from `seat_value_prediction`.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
