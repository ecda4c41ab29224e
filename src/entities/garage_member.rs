//! Garage member entity - a non-owner user with a `partner` or `viewer` role in a garage.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Garage membership database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "garage_members")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Garage the membership belongs to
    pub garage_id: i64,
    /// Discord user ID of the member
    pub user_id: String,
    /// Membership role: `"partner"` or `"viewer"`
    pub role: String,
}

/// Defines relationships between `GarageMember` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each membership belongs to one garage
    #[sea_orm(
        belongs_to = "super::garage::Entity",
        from = "Column::GarageId",
        to = "super::garage::Column::Id"
    )]
    Garage,
}

impl Related<super::garage::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Garage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
