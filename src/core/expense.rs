//! Expense business logic - the per-car ledger.
//!
//! Entries are validated on the way in (positive finite amount, non-empty description,
//! known type and payer), so stored rows always convert cleanly into settlement lines.
//! Who may add, edit, or delete entries is decided by garage membership. A sold car's
//! ledger cannot change until the sale is cancelled, so it always matches the stored
//! settlement.

use crate::{
    core::{
        car::{self, CarStatus},
        garage,
        policy::GarageAction,
        settlement::{EntryKind, ExpenseLine, Payer},
    },
    entities::{Expense, expense},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, prelude::*};
use std::collections::BTreeMap;
use tracing::info;

/// A ledger entry to record.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    /// What the money was for
    pub description: String,
    /// Positive amount
    pub amount: f64,
    /// When the money changed hands
    pub date: NaiveDate,
    /// Income or expense
    pub kind: EntryKind,
    /// Free-form category
    pub category: String,
    /// Who paid
    pub paid_by: Payer,
}

/// Changes to apply to an existing entry; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseUpdate {
    /// New description
    pub description: Option<String>,
    /// New amount
    pub amount: Option<f64>,
    /// New date
    pub date: Option<NaiveDate>,
    /// New type
    pub kind: Option<EntryKind>,
    /// New category
    pub category: Option<String>,
    /// New payer
    pub paid_by: Option<Payer>,
}

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<String> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation {
            message: "Expense description cannot be empty".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn normalize_category(category: &str) -> String {
    let trimmed = category.trim();
    if trimmed.is_empty() {
        "general".to_string()
    } else {
        trimmed.to_lowercase()
    }
}

fn ensure_payer_allowed(garage: &crate::entities::garage::Model, paid_by: Payer) -> Result<()> {
    if paid_by == Payer::Partner && !garage.has_partner {
        return Err(Error::Validation {
            message: format!(
                "Garage '{}' has no partner; entries must be paid by the owner",
                garage.name
            ),
        });
    }
    Ok(())
}

/// A sold car's ledger is frozen until its sale is cancelled.
fn ensure_not_sold(car: &crate::entities::car::Model) -> Result<()> {
    if car.status.parse::<CarStatus>()? == CarStatus::Sold {
        return Err(Error::AlreadySold {
            name: car.name.clone(),
        });
    }
    Ok(())
}

/// Records an entry against a car on behalf of `actor_id`.
pub async fn add_expense(
    db: &DatabaseConnection,
    car_id: i64,
    actor_id: &str,
    new_expense: NewExpense,
) -> Result<expense::Model> {
    validate_amount(new_expense.amount)?;
    let description = validate_description(&new_expense.description)?;

    let car = car::require_car(db, car_id).await?;
    let garage = garage::require_garage(db, car.garage_id).await?;
    garage::ensure_allowed(db, &garage, actor_id, GarageAction::AddExpenses).await?;
    ensure_not_sold(&car)?;
    ensure_payer_allowed(&garage, new_expense.paid_by)?;

    let expense = expense::ActiveModel {
        car_id: Set(car.id),
        description: Set(description),
        amount: Set(new_expense.amount),
        date: Set(new_expense.date),
        entry_type: Set(new_expense.kind.as_str().to_string()),
        category: Set(normalize_category(&new_expense.category)),
        paid_by: Set(new_expense.paid_by.as_str().to_string()),
        user_id: Set(actor_id.to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        "Recorded {} #{} of ${:.2} on car #{}",
        expense.entry_type, expense.id, expense.amount, car.id
    );
    Ok(expense)
}

/// Finds an entry by id.
pub async fn get_expense_by_id(
    db: &DatabaseConnection,
    expense_id: i64,
) -> Result<Option<expense::Model>> {
    Expense::find_by_id(expense_id)
        .one(db)
        .await
        .map_err(Into::into)
}

async fn require_expense(db: &DatabaseConnection, expense_id: i64) -> Result<expense::Model> {
    get_expense_by_id(db, expense_id)
        .await?
        .ok_or(Error::ExpenseNotFound { id: expense_id })
}

/// Lists the entries of a car, oldest first.
pub async fn get_expenses_for_car<C>(db: &C, car_id: i64) -> Result<Vec<expense::Model>>
where
    C: ConnectionTrait,
{
    Expense::find()
        .filter(expense::Column::CarId.eq(car_id))
        .order_by_asc(expense::Column::Date)
        .order_by_asc(expense::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies `update` to an entry on behalf of `actor_id`.
pub async fn update_expense(
    db: &DatabaseConnection,
    expense_id: i64,
    actor_id: &str,
    update: ExpenseUpdate,
) -> Result<expense::Model> {
    let expense = require_expense(db, expense_id).await?;
    let car = car::require_car(db, expense.car_id).await?;
    let garage = garage::require_garage(db, car.garage_id).await?;
    garage::ensure_allowed(db, &garage, actor_id, GarageAction::EditExpenses).await?;
    ensure_not_sold(&car)?;

    let mut active: expense::ActiveModel = expense.into();
    if let Some(description) = update.description {
        active.description = Set(validate_description(&description)?);
    }
    if let Some(amount) = update.amount {
        validate_amount(amount)?;
        active.amount = Set(amount);
    }
    if let Some(date) = update.date {
        active.date = Set(date);
    }
    if let Some(kind) = update.kind {
        active.entry_type = Set(kind.as_str().to_string());
    }
    if let Some(category) = update.category {
        active.category = Set(normalize_category(&category));
    }
    if let Some(paid_by) = update.paid_by {
        ensure_payer_allowed(&garage, paid_by)?;
        active.paid_by = Set(paid_by.as_str().to_string());
    }

    let updated = active.update(db).await?;
    info!("Updated expense #{} on car #{}", updated.id, car.id);
    Ok(updated)
}

/// Deletes an entry on behalf of `actor_id`.
pub async fn delete_expense(db: &DatabaseConnection, expense_id: i64, actor_id: &str) -> Result<()> {
    let expense = require_expense(db, expense_id).await?;
    let car = car::require_car(db, expense.car_id).await?;
    let garage = garage::require_garage(db, car.garage_id).await?;
    garage::ensure_allowed(db, &garage, actor_id, GarageAction::DeleteExpenses).await?;
    ensure_not_sold(&car)?;

    expense.delete(db).await?;
    info!("Deleted expense #{} from car #{}", expense_id, car.id);
    Ok(())
}

/// Converts stored entries into settlement lines.
pub fn to_lines(expenses: &[expense::Model]) -> Result<Vec<ExpenseLine>> {
    expenses.iter().map(ExpenseLine::try_from).collect()
}

impl TryFrom<&expense::Model> for ExpenseLine {
    type Error = Error;

    fn try_from(expense: &expense::Model) -> Result<Self> {
        Ok(Self {
            amount: expense.amount,
            kind: expense.entry_type.parse()?,
            paid_by: expense.paid_by.parse()?,
        })
    }
}

/// Sums expense-type entries per category.
#[must_use]
pub fn totals_by_category(expenses: &[expense::Model]) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for expense in expenses
        .iter()
        .filter(|e| e.entry_type == EntryKind::Expense.as_str())
    {
        *totals.entry(expense.category.clone()).or_insert(0.0) += expense.amount;
    }
    totals
}

/// Sums income-type entries.
#[must_use]
pub fn total_income(expenses: &[expense::Model]) -> f64 {
    expenses
        .iter()
        .filter(|e| e.entry_type == EntryKind::Income.as_str())
        .map(|e| e.amount)
        .sum()
}
