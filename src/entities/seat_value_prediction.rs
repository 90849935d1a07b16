//! Seat value prediction entity - Cached predicted market value per seat-season.
//!
//! Rows are valid until `valid_until`; a read past that point recomputes the
//! whole season before returning.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Seat value prediction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "seat_value_predictions")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Seat being valued
    pub seat_id: i64,
    /// Season the value applies to
    pub season_id: i64,
    /// Final predicted value
    pub predicted_value: f64,
    /// Additive confidence scorecard
    pub confidence_score: f64,
    /// Blended baseline before multipliers
    pub baseline_value: f64,
    /// Multiplier from win percentage and demand
    pub performance_multiplier: f64,
    /// Multiplier from demand and attendance
    pub demand_multiplier: f64,
    /// Multiplier from similar-seat sales volume
    pub similar_seats_multiplier: f64,
    /// Comma-separated factor tags that contributed to the score
    pub factors_considered: String,
    /// When the prediction was computed
    pub calculated_at: DateTimeUtc,
    /// Expiry of the cached prediction
    pub valid_until: DateTimeUtc,
}

impl Model {
    /// Factor tags as a list, skipping empty entries.
    #[must_use]
    pub fn factor_tags(&self) -> Vec<&str> {
        self.factors_considered
            .split(',')
            .filter(|tag| !tag.is_empty())
            .collect()
    }
}

/// Derived rows are removed together with their seat or season
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each prediction belongs to one seat
    #[sea_orm(
        belongs_to = "super::seat::Entity",
        from = "Column::SeatId",
        to = "super::seat::Column::Id",
        on_delete = "Cascade"
    )]
    Seat,
    /// Each prediction belongs to one season
    #[sea_orm(
        belongs_to = "super::season::Entity",
        from = "Column::SeasonId",
        to = "super::season::Column::Id",
        on_delete = "Cascade"
    )]
    Season,
}

impl Related<super::seat::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Seat.def()
    }
}

impl Related<super::season::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Season.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
