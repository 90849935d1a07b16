//! Seat ownership entity - Assigns a seat to an owner for one season.
//!
//! `(seat_id, season_id)` should be unique in a clean dataset, but duplicates
//! happen during data entry, so the aggregators deduplicate by seat.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Seat ownership database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "seat_ownerships")]
pub struct Model {
    /// Unique identifier for the ownership row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Seat being held
    pub seat_id: i64,
    /// Season the assignment applies to
    pub season_id: i64,
    /// Holder of the seat for that season
    pub owner_id: i64,
}

/// References are resolved in application code; orphaned rows are tolerated.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
