//! Account entity - the subscription plan of a user.
//! Users without a row are on the free plan.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Discord user ID
    #[sea_orm(unique)]
    pub user_id: String,
    /// Plan role code (see `core::policy::Role::code`)
    pub role: i32,
    /// When the account row was created
    pub created_at: DateTimeUtc,
}

/// Accounts are looked up by `user_id` only and have no relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
