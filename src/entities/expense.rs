//! Expense entity - a ledger entry recorded against a car.
//!
//! `entry_type` is `"expense"` or `"income"`; only expenses count toward the car's cost
//! basis. `paid_by` (`"owner"` / `"partner"`) drives reimbursement at sale time.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Expense database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    /// Unique identifier for the expense
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Car this entry belongs to
    pub car_id: i64,
    /// Human-readable description
    pub description: String,
    /// Positive amount in dollars
    pub amount: f64,
    /// Date the money changed hands
    pub date: Date,
    /// `"expense"` or `"income"`
    pub entry_type: String,
    /// Free-form category (e.g. "parts", "labor")
    pub category: String,
    /// `"owner"` or `"partner"`
    pub paid_by: String,
    /// Discord user ID who recorded the entry
    pub user_id: String,
    /// When the entry was recorded
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Expense and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each expense belongs to one car
    #[sea_orm(
        belongs_to = "super::car::Entity",
        from = "Column::CarId",
        to = "super::car::Column::Id"
    )]
    Car,
}

impl Related<super::car::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Car.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
