//! Game entity - A single home game. Each game belongs to exactly one season.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Game database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "games")]
pub struct Model {
    /// Unique identifier for the game
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Season the game is part of
    pub season_id: i64,
    /// Opposing team name, used to group opponent pricing trends
    pub opponent: String,
    /// Date the game is played
    pub date: Date,
}

/// Games reference their season by id; no foreign key is declared.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
