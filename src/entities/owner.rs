//! Owner entity - A ticket holder who holds rights to seats.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Owner database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "owners")]
pub struct Model {
    /// Unique identifier for the owner
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// Contact address, if known
    pub email: Option<String>,
}

/// Owners have no declared relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
