//! Team entity - A franchise whose season tickets are tracked.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Team database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "teams")]
pub struct Model {
    /// Unique identifier for the team
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (also used as the market-data search term)
    pub name: String,
}

/// Ledger rows reference teams by id only; see `team_performance` for the derived link.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
