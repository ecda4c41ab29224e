//! Shared test utilities for `GarageBuddy`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        account, car,
        expense::{self, NewExpense},
        garage,
        policy::{AccessPolicy, Role},
        settlement::{EntryKind, Payer},
    },
    entities,
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a garage through the normal service path (owner's plan limits apply).
pub async fn create_test_garage(
    db: &DatabaseConnection,
    owner_id: &str,
    name: &str,
) -> Result<entities::garage::Model> {
    garage::create_garage(db, &AccessPolicy::standard(), owner_id, name).await
}

/// Adds a car to a garage on behalf of the garage owner.
pub async fn create_test_car(
    db: &DatabaseConnection,
    garage_id: i64,
    name: &str,
) -> Result<entities::car::Model> {
    let garage = garage::require_garage(db, garage_id).await?;
    car::create_car(db, &AccessPolicy::standard(), garage_id, &garage.owner_id, name).await
}

/// Builds an owner-paid expense entry.
///
/// # Defaults
/// * `date`: 2024-01-15
/// * `kind`: expense
/// * `category`: "general"
/// * `paid_by`: owner
#[must_use]
pub fn new_expense(description: &str, amount: f64) -> NewExpense {
    NewExpense {
        description: description.to_string(),
        amount,
        date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap_or_default(),
        kind: EntryKind::Expense,
        category: "general".to_string(),
        paid_by: Payer::Owner,
    }
}

/// Records an owner-paid expense on behalf of the garage owner.
pub async fn create_test_expense(
    db: &DatabaseConnection,
    car_id: i64,
    amount: f64,
) -> Result<entities::expense::Model> {
    let car = car::require_car(db, car_id).await?;
    let garage = garage::require_garage(db, car.garage_id).await?;
    expense::add_expense(db, car_id, &garage.owner_id, new_expense("Test expense", amount)).await
}

/// Records an expense paid by `paid_by`, entered by `actor_id`.
pub async fn add_paid_expense(
    db: &DatabaseConnection,
    car_id: i64,
    actor_id: &str,
    amount: f64,
    paid_by: Payer,
) -> Result<entities::expense::Model> {
    let mut entry = new_expense("Test expense", amount);
    entry.paid_by = paid_by;
    expense::add_expense(db, car_id, actor_id, entry).await
}

/// An unsaved expense row for pure conversion tests.
#[must_use]
pub fn sample_expense_model() -> entities::expense::Model {
    entities::expense::Model {
        id: 1,
        car_id: 1,
        description: "Sample".to_string(),
        amount: 10.0,
        date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap_or_default(),
        entry_type: "expense".to_string(),
        category: "general".to_string(),
        paid_by: "owner".to_string(),
        user_id: "owner".to_string(),
        created_at: chrono::Utc::now(),
    }
}

/// Sets up a database with a free-plan garage "Test Garage" owned by `"owner"`.
pub async fn setup_with_garage() -> Result<(DatabaseConnection, entities::garage::Model)> {
    let db = setup_test_db().await?;
    let garage = create_test_garage(&db, "owner", "Test Garage").await?;
    Ok((db, garage))
}

/// Sets up a solo garage owned by `"owner"` with one car.
/// Returns (db, garage, car).
pub async fn setup_with_car() -> Result<(
    DatabaseConnection,
    entities::garage::Model,
    entities::car::Model,
)> {
    let (db, garage) = setup_with_garage().await?;
    let car = create_test_car(&db, garage.id, "Test Car").await?;
    Ok((db, garage, car))
}

/// Sets up a starter-plan garage owned by `"owner"`, partnered with user `"partner"`
/// at the given owner ratio, with one car.
pub async fn setup_with_partnered_car(
    split_ratio: i32,
) -> Result<(
    DatabaseConnection,
    entities::garage::Model,
    entities::car::Model,
)> {
    let db = setup_test_db().await?;
    account::set_role(&db, "owner", Role::Starter).await?;
    let created = create_test_garage(&db, "owner", "Partner Garage").await?;
    let garage = garage::set_partner(
        &db,
        &AccessPolicy::standard(),
        created.id,
        "owner",
        "Partner",
        Some("partner"),
        split_ratio,
    )
    .await?;
    let car = create_test_car(&db, garage.id, "Test Car").await?;
    Ok((db, garage, car))
}
