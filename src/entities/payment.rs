//! Payment entity - Manual money movements between owners, the managing entity, and the team.
//!
//! `payment_type` is one of `"from_owner"`, `"to_owner"`, `"to_team"`, `"from_team"`.
//! `from_*` types are inflows to the managing entity, `to_*` types are outflows.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    /// Unique identifier for the payment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner involved, for owner payments
    pub owner_id: Option<i64>,
    /// Team involved, for team payments
    pub team_id: Option<i64>,
    /// Season the payment is booked against, if any
    pub season_id: Option<i64>,
    /// Amount moved
    pub amount: f64,
    /// Direction of the payment
    pub payment_type: String,
    /// Free-text category (e.g. `"seat_license"`)
    pub category: String,
    /// Optional note
    pub description: Option<String>,
}

/// Payments reference owners, teams and seasons by id only.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
