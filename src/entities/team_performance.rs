//! Team performance entity - Derived win/loss/attendance/demand profile per team-season.
//!
//! One row per `(team_id, season_id)`; recomputation overwrites it in place.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Team performance database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "team_performance")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Team the profile describes
    pub team_id: i64,
    /// Season the profile describes
    pub season_id: i64,
    /// Games classified as wins
    pub wins: i32,
    /// Games classified as losses
    pub losses: i32,
    /// `wins / (wins + losses)`, in `[0, 1]`
    pub win_percentage: f64,
    /// Mean attendance per game, in `[0, 100000]`
    pub average_attendance: f64,
    /// Demand score in `[0, 10]`
    pub market_demand: f64,
    /// Playoff likelihood in `[0, 100]`
    pub playoff_probability: f64,
    /// When the profile was last computed
    pub calculated_at: DateTimeUtc,
}

/// Derived rows are removed together with their team or season
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each profile belongs to one team
    #[sea_orm(
        belongs_to = "super::team::Entity",
        from = "Column::TeamId",
        to = "super::team::Column::Id",
        on_delete = "Cascade"
    )]
    Team,
    /// Each profile belongs to one season
    #[sea_orm(
        belongs_to = "super::season::Entity",
        from = "Column::SeasonId",
        to = "super::season::Column::Id",
        on_delete = "Cascade"
    )]
    Season,
}

impl Related<super::team::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Team.def()
    }
}

impl Related<super::season::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Season.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
