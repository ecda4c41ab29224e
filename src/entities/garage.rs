//! Garage entity - a workspace grouping cars, owned by one user and optionally
//! shared with a profit-splitting partner.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Garage database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "garages")]
pub struct Model {
    /// Unique identifier for the garage
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name, unique per owner
    pub name: String,
    /// Discord user ID of the owner
    pub owner_id: String,
    /// Whether profits are split with a partner
    pub has_partner: bool,
    /// Partner display name
    pub partner_name: Option<String>,
    /// Partner's Discord user ID, when the partner uses the bot
    pub partner_user_id: Option<String>,
    /// Owner's profit percentage (0-100)
    pub split_ratio: Option<i32>,
    /// When the garage was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Garage and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One garage has many cars
    #[sea_orm(has_many = "super::car::Entity")]
    Cars,
    /// One garage has many members
    #[sea_orm(has_many = "super::garage_member::Entity")]
    Members,
}

impl Related<super::car::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cars.def()
    }
}

impl Related<super::garage_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
