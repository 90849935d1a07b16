//! Attendance entity - One attendee recorded at a game.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Attendance database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attendance")]
pub struct Model {
    /// Unique identifier for the attendance record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Game attended
    pub game_id: i64,
    /// Seat used, if recorded
    pub seat_id: Option<i64>,
    /// Owner who attended, if recorded
    pub owner_id: Option<i64>,
}

/// Attendance rows reference games, seats and owners by id only.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
