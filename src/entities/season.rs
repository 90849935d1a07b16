//! Season entity - One year of games for a team.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Season database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "seasons")]
pub struct Model {
    /// Unique identifier for the season
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Team that plays this season
    pub team_id: i64,
    /// Calendar year the season is reported under
    pub year: i32,
}

/// Seasons reference their team by id only.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
