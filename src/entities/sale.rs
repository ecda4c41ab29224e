//! Sale entity - the persisted settlement of a sold car.
//! Exactly one row per sold car; cancelling the sale deletes it.

use crate::core::settlement::Settlement;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sale database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// The sold car
    #[sea_orm(unique)]
    pub car_id: i64,
    /// Price the car sold for
    pub sale_price: f64,
    /// Sum of expense-type entries at sale time
    pub total_expenses: f64,
    /// `sale_price - total_expenses`
    pub total_profit: f64,
    /// Expenses attributed to the owner
    pub your_expenses: f64,
    /// Expenses attributed to the partner
    pub partner_expenses: f64,
    /// Owner's profit share
    pub your_profit: f64,
    /// Partner's profit share
    pub partner_profit: f64,
    /// Owner payout
    pub you_receive: f64,
    /// Partner payout
    pub partner_receives: f64,
    /// Partner at sale time; `None` for a solo sale
    pub partner_name: Option<String>,
    /// Discord user ID who recorded the sale
    pub sold_by: String,
    /// When the sale was recorded
    pub sold_at: DateTimeUtc,
}

/// Defines relationships between Sale and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each sale belongs to one car
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

impl From<&Model> for Settlement {
    fn from(sale: &Model) -> Self {
        Self {
            sale_price: sale.sale_price,
            total_expenses: sale.total_expenses,
            total_profit: sale.total_profit,
            your_expenses: sale.your_expenses,
            partner_expenses: sale.partner_expenses,
            your_profit: sale.your_profit,
            partner_profit: sale.partner_profit,
            you_receive: sale.you_receive,
            partner_receives: sale.partner_receives,
        }
    }
}
