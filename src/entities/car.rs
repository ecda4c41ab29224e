//! Car entity - a vehicle tracked inside a garage.
//!
//! Status moves between `available` and `pending`; `sold` is only reached by recording
//! a sale, and cancelling the sale brings the car back to `available`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Car database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cars")]
pub struct Model {
    /// Unique identifier for the car
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Garage the car belongs to
    pub garage_id: i64,
    /// Display name (e.g. "2012 Civic")
    pub name: String,
    /// `"available"`, `"pending"` or `"sold"`
    pub status: String,
    /// When the car was added
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Car and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each car belongs to one garage
    #[sea_orm(
        belongs_to = "super::garage::Entity",
        from = "Column::GarageId",
        to = "super::garage::Column::Id"
    )]
    Garage,
    /// One car has many expenses
    #[sea_orm(has_many = "super::expense::Entity")]
    Expenses,
    /// A sold car has one sale record
    #[sea_orm(has_one = "super::sale::Entity")]
    Sale,
}

impl Related<super::garage::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Garage.def()
    }
}

impl Related<super::expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl Related<super::sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sale.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
