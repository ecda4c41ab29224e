//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod account;
pub mod car;
pub mod expense;
pub mod garage;
pub mod garage_member;
pub mod sale;

// Re-export specific types to avoid conflicts
pub use account::{Column as AccountColumn, Entity as Account, Model as AccountModel};
pub use car::{Column as CarColumn, Entity as Car, Model as CarModel};
pub use expense::{Column as ExpenseColumn, Entity as Expense, Model as ExpenseModel};
pub use garage::{Column as GarageColumn, Entity as Garage, Model as GarageModel};
pub use garage_member::{
    Column as GarageMemberColumn, Entity as GarageMember, Model as GarageMemberModel,
};
pub use sale::{Column as SaleColumn, Entity as Sale, Model as SaleModel};
