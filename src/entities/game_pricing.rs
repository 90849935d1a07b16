//! Game pricing entity - Cost basis and realized sale price of one seat for one game.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Game pricing database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "game_pricing")]
pub struct Model {
    /// Unique identifier for the pricing row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Game being priced
    pub game_id: i64,
    /// Seat being priced
    pub seat_id: i64,
    /// What the seat cost for this game
    pub cost: f64,
    /// Realized sale price; `None` or zero means "not sold"
    pub sold_price: Option<f64>,
}

impl Model {
    /// Sale price with "not sold" read as zero.
    #[must_use]
    pub fn sold_or_zero(&self) -> f64 {
        self.sold_price.unwrap_or(0.0)
    }

    /// Whether this row records an actual sale.
    #[must_use]
    pub fn is_sold(&self) -> bool {
        self.sold_price.is_some_and(|price| price > 0.0)
    }
}

/// Pricing rows may point at games or seats that no longer exist.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
