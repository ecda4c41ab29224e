//! Car business logic - inventory, status changes, and sales.
//!
//! Selling a car runs the settlement calculator over the car's ledger and the garage's
//! partnership, then stores the result and marks the car sold in one database
//! transaction. Cancelling a sale deletes the stored settlement; the ledger itself is
//! never touched by either operation.

use crate::{
    core::{
        account, expense, garage,
        policy::{AccessPolicy, GarageAction, ResourceKind, permission},
        settlement::{self, Partnership, Settlement},
    },
    entities::{Car, Garage, Sale, car, expense as expense_entity, garage as garage_entity, sale},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Lifecycle state of a car.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CarStatus {
    /// In stock
    Available,
    /// Deal in progress
    Pending,
    /// Sold; has a sale record
    Sold,
}

impl CarStatus {
    /// Stored string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Pending => "pending",
            Self::Sold => "sold",
        }
    }
}

impl fmt::Display for CarStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CarStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "available" => Ok(Self::Available),
            "pending" => Ok(Self::Pending),
            "sold" => Ok(Self::Sold),
            other => Err(Error::InvalidStatus {
                status: other.to_string(),
            }),
        }
    }
}

/// A car with its derived ledger figures.
#[derive(Debug, Clone)]
pub struct CarSummary {
    /// The car
    pub car: car::Model,
    /// Parsed status
    pub status: CarStatus,
    /// Every ledger entry, oldest first
    pub expenses: Vec<expense_entity::Model>,
    /// Sum of expense-type entries
    pub total_expenses: f64,
    /// Sum of income-type entries
    pub total_income: f64,
    /// Stored settlement, when sold
    pub settlement: Option<Settlement>,
    /// Partner recorded with the sale; `None` when unsold or sold solo
    pub sale_partner: Option<String>,
}

/// Adds a car to a garage.
///
/// The actor needs the add-cars capability in the garage, and the garage owner's plan
/// caps the number of cars across all of the owner's garages.
pub async fn create_car(
    db: &DatabaseConnection,
    policy: &AccessPolicy,
    garage_id: i64,
    actor_id: &str,
    name: &str,
) -> Result<car::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation {
            message: "Car name cannot be empty".to_string(),
        });
    }

    let garage = garage::require_garage(db, garage_id).await?;
    garage::ensure_allowed(db, &garage, actor_id, GarageAction::AddCars).await?;

    if get_car_by_name(db, garage.id, name).await?.is_some() {
        return Err(Error::Validation {
            message: format!("Garage '{}' already has a car named '{name}'", garage.name),
        });
    }

    let role = account::role_for(db, &garage.owner_id).await?;
    policy.ensure_permission(role, permission::MANAGE_CARS)?;
    let owned_cars = count_cars_owned_by(db, &garage.owner_id).await?;
    policy.ensure_limit(role, ResourceKind::Cars, owned_cars)?;

    let car = car::ActiveModel {
        garage_id: Set(garage.id),
        name: Set(name.to_string()),
        status: Set(CarStatus::Available.as_str().to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Added car '{}' (#{}) to garage #{}", car.name, car.id, garage.id);
    Ok(car)
}

/// Counts cars across every garage owned by `owner_id`.
pub async fn count_cars_owned_by(db: &DatabaseConnection, owner_id: &str) -> Result<u64> {
    let garage_ids: Vec<i64> = Garage::find()
        .filter(garage_entity::Column::OwnerId.eq(owner_id))
        .all(db)
        .await?
        .into_iter()
        .map(|g| g.id)
        .collect();

    Car::find()
        .filter(car::Column::GarageId.is_in(garage_ids))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Finds a car by id.
pub async fn get_car_by_id<C>(db: &C, car_id: i64) -> Result<Option<car::Model>>
where
    C: ConnectionTrait,
{
    Car::find_by_id(car_id).one(db).await.map_err(Into::into)
}

/// Finds a car by id, failing with [`Error::CarNotFound`].
pub async fn require_car<C>(db: &C, car_id: i64) -> Result<car::Model>
where
    C: ConnectionTrait,
{
    get_car_by_id(db, car_id)
        .await?
        .ok_or_else(|| Error::CarNotFound {
            name: car_id.to_string(),
        })
}

/// Finds a car in a garage by name (case-insensitive).
pub async fn get_car_by_name(
    db: &DatabaseConnection,
    garage_id: i64,
    name: &str,
) -> Result<Option<car::Model>> {
    let name = name.trim();
    Ok(get_cars_for_garage(db, garage_id)
        .await?
        .into_iter()
        .find(|car| car.name.eq_ignore_ascii_case(name)))
}

/// Lists the cars of a garage, alphabetically.
pub async fn get_cars_for_garage(db: &DatabaseConnection, garage_id: i64) -> Result<Vec<car::Model>> {
    Car::find()
        .filter(car::Column::GarageId.eq(garage_id))
        .order_by_asc(car::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Moves a car between `available` and `pending`.
///
/// `sold` is only reachable through [`sell_car`]; a sold car must have its sale
/// cancelled before its status can change.
pub async fn set_status(
    db: &DatabaseConnection,
    car_id: i64,
    actor_id: &str,
    status: CarStatus,
) -> Result<car::Model> {
    if status == CarStatus::Sold {
        return Err(Error::Validation {
            message: "Use the sell command to mark a car as sold".to_string(),
        });
    }

    let car = require_car(db, car_id).await?;
    let garage = garage::require_garage(db, car.garage_id).await?;
    garage::ensure_allowed(db, &garage, actor_id, GarageAction::EditCars).await?;

    if car.status.parse::<CarStatus>()? == CarStatus::Sold {
        return Err(Error::AlreadySold { name: car.name });
    }

    let mut active: car::ActiveModel = car.into();
    active.status = Set(status.as_str().to_string());
    let updated = active.update(db).await?;

    info!("Car #{} is now {}", updated.id, status);
    Ok(updated)
}

/// Records the sale of a car and returns its settlement.
///
/// The sale price must be finite and positive. The settlement is computed from the car's
/// current ledger and the garage's partnership, stored as the car's sale record, and the
/// car is marked sold, all in one transaction.
pub async fn sell_car(
    db: &DatabaseConnection,
    car_id: i64,
    actor_id: &str,
    sale_price: f64,
) -> Result<Settlement> {
    if !sale_price.is_finite() || sale_price <= 0.0 {
        return Err(Error::InvalidAmount { amount: sale_price });
    }

    let car = require_car(db, car_id).await?;
    let garage = garage::require_garage(db, car.garage_id).await?;
    garage::ensure_allowed(db, &garage, actor_id, GarageAction::SellCars).await?;

    let txn = db.begin().await?;

    let car = require_car(&txn, car.id).await?;
    if car.status.parse::<CarStatus>()? == CarStatus::Sold
        || get_sale(&txn, car.id).await?.is_some()
    {
        return Err(Error::AlreadySold { name: car.name });
    }

    let expenses = expense::get_expenses_for_car(&txn, car.id).await?;
    let lines = expense::to_lines(&expenses)?;
    let result = settlement::settle(&lines, Partnership::from(&garage), sale_price);

    sale::ActiveModel {
        car_id: Set(car.id),
        sale_price: Set(result.sale_price),
        total_expenses: Set(result.total_expenses),
        total_profit: Set(result.total_profit),
        your_expenses: Set(result.your_expenses),
        partner_expenses: Set(result.partner_expenses),
        your_profit: Set(result.your_profit),
        partner_profit: Set(result.partner_profit),
        you_receive: Set(result.you_receive),
        partner_receives: Set(result.partner_receives),
        partner_name: Set(garage.has_partner.then(|| {
            garage
                .partner_name
                .clone()
                .unwrap_or_else(|| "Partner".to_string())
        })),
        sold_by: Set(actor_id.to_string()),
        sold_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let car_name = car.name.clone();
    let mut active: car::ActiveModel = car.into();
    active.status = Set(CarStatus::Sold.as_str().to_string());
    active.update(&txn).await?;

    txn.commit().await?;

    info!(
        "Sold car '{}' (#{}) for ${:.2}, profit ${:.2}",
        car_name, car_id, result.sale_price, result.total_profit
    );
    Ok(result)
}

/// Cancels the sale of a car: deletes the sale record and returns it to `available`.
pub async fn cancel_sale(db: &DatabaseConnection, car_id: i64, actor_id: &str) -> Result<car::Model> {
    let car = require_car(db, car_id).await?;
    let garage = garage::require_garage(db, car.garage_id).await?;
    garage::ensure_allowed(db, &garage, actor_id, GarageAction::SellCars).await?;

    let txn = db.begin().await?;

    let car = require_car(&txn, car.id).await?;
    let Some(record) = get_sale(&txn, car.id).await? else {
        return Err(Error::NotSold { name: car.name });
    };
    record.delete(&txn).await?;

    let mut active: car::ActiveModel = car.into();
    active.status = Set(CarStatus::Available.as_str().to_string());
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    info!("Cancelled sale of car #{}", updated.id);
    Ok(updated)
}

/// Stored sale record of a car, if it has been sold.
pub async fn get_sale<C>(db: &C, car_id: i64) -> Result<Option<sale::Model>>
where
    C: ConnectionTrait,
{
    Sale::find()
        .filter(sale::Column::CarId.eq(car_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Stored settlement of a car, if it has been sold.
pub async fn get_settlement(db: &DatabaseConnection, car_id: i64) -> Result<Option<Settlement>> {
    Ok(get_sale(db, car_id)
        .await?
        .as_ref()
        .map(Settlement::from))
}

/// Loads a car's ledger and sale record and derives its totals.
pub async fn summarize_car(db: &DatabaseConnection, car: car::Model) -> Result<CarSummary> {
    let status = car.status.parse::<CarStatus>()?;
    let expenses = expense::get_expenses_for_car(db, car.id).await?;
    let lines = expense::to_lines(&expenses)?;
    let sale = get_sale(db, car.id).await?;

    Ok(CarSummary {
        total_expenses: settlement::total_expenses(&lines),
        total_income: expense::total_income(&expenses),
        car,
        status,
        expenses,
        settlement: sale.as_ref().map(Settlement::from),
        sale_partner: sale.and_then(|record| record.partner_name),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::policy::{MemberRole, Role};
    use crate::core::settlement::Payer;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_sell_car_rejects_bad_prices() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        for price in [0.0, -500.0, f64::NAN, f64::NEG_INFINITY] {
            let result = sell_car(&db, 1, "owner", price).await;
            assert!(matches!(result, Err(Error::InvalidAmount { .. })));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_create_car_integration() -> Result<()> {
        let (db, garage) = setup_with_garage().await?;
        let policy = AccessPolicy::standard();

        let car = create_car(&db, &policy, garage.id, "owner", " 2012 Civic ").await?;
        assert_eq!(car.name, "2012 Civic");
        assert_eq!(car.status, "available");
        assert_eq!(car.garage_id, garage.id);

        let duplicate = create_car(&db, &policy, garage.id, "owner", "2012 civic").await;
        assert!(matches!(duplicate, Err(Error::Validation { .. })));

        let empty = create_car(&db, &policy, garage.id, "owner", "  ").await;
        assert!(matches!(empty, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_free_plan_car_limit() -> Result<()> {
        let (db, garage) = setup_with_garage().await?;
        let policy = AccessPolicy::standard();

        for name in ["One", "Two", "Three"] {
            create_car(&db, &policy, garage.id, "owner", name).await?;
        }
        assert_eq!(count_cars_owned_by(&db, "owner").await?, 3);

        let fourth = create_car(&db, &policy, garage.id, "owner", "Four").await;
        assert!(matches!(
            fourth,
            Err(Error::LimitReached {
                resource: ResourceKind::Cars,
                limit: 3
            })
        ));

        account::set_role(&db, "owner", Role::Pro).await?;
        create_car(&db, &policy, garage.id, "owner", "Four").await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_members_cannot_add_cars() -> Result<()> {
        let (db, garage) = setup_with_garage().await?;
        let policy = AccessPolicy::standard();
        garage::add_member(&db, garage.id, "owner", "helper", MemberRole::Partner).await?;

        let result = create_car(&db, &policy, garage.id, "helper", "Civic").await;
        assert!(matches!(result, Err(Error::PermissionDenied { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_set_status_transitions() -> Result<()> {
        let (db, _garage, car) = setup_with_car().await?;

        let pending = set_status(&db, car.id, "owner", CarStatus::Pending).await?;
        assert_eq!(pending.status, "pending");
        let available = set_status(&db, car.id, "owner", CarStatus::Available).await?;
        assert_eq!(available.status, "available");

        let direct_sale = set_status(&db, car.id, "owner", CarStatus::Sold).await;
        assert!(matches!(direct_sale, Err(Error::Validation { .. })));

        sell_car(&db, car.id, "owner", 1000.0).await?;
        let after_sale = set_status(&db, car.id, "owner", CarStatus::Pending).await;
        assert!(matches!(after_sale, Err(Error::AlreadySold { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_sell_partnered_car_persists_settlement() -> Result<()> {
        let (db, garage, car) = setup_with_partnered_car(60).await?;

        add_paid_expense(&db, car.id, "owner", 300.0, Payer::Owner).await?;
        add_paid_expense(&db, car.id, "owner", 200.0, Payer::Partner).await?;

        let result = sell_car(&db, car.id, "owner", 1000.0).await?;
        assert_eq!(result.total_expenses, 500.0);
        assert_eq!(result.total_profit, 500.0);
        assert_eq!(result.your_profit, 300.0);
        assert_eq!(result.partner_profit, 200.0);
        assert_eq!(result.you_receive, 600.0);
        assert_eq!(result.partner_receives, 400.0);

        let stored = get_settlement(&db, car.id).await?.unwrap();
        assert_eq!(stored, result);

        let sold = require_car(&db, car.id).await?;
        assert_eq!(sold.status, "sold");
        assert_eq!(sold.garage_id, garage.id);

        let again = sell_car(&db, car.id, "owner", 1200.0).await;
        assert!(matches!(again, Err(Error::AlreadySold { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_sale_keeps_partner_after_partner_removed() -> Result<()> {
        let (db, garage, car) = setup_with_partnered_car(60).await?;
        add_paid_expense(&db, car.id, "owner", 300.0, Payer::Owner).await?;
        add_paid_expense(&db, car.id, "owner", 200.0, Payer::Partner).await?;
        sell_car(&db, car.id, "owner", 1000.0).await?;

        let solo = garage::remove_partner(&db, garage.id, "owner").await?;
        assert!(!solo.has_partner);

        let record = get_sale(&db, car.id).await?.unwrap();
        assert_eq!(record.partner_name.as_deref(), Some("Partner"));

        let summary = summarize_car(&db, require_car(&db, car.id).await?).await?;
        assert_eq!(summary.sale_partner.as_deref(), Some("Partner"));
        let settlement = summary.settlement.unwrap();
        assert_eq!(settlement.partner_receives, 400.0);
        assert_eq!(settlement.you_receive, 600.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_solo_sale_has_no_partner() -> Result<()> {
        let (db, _garage, car) = setup_with_car().await?;
        sell_car(&db, car.id, "owner", 500.0).await?;

        let record = get_sale(&db, car.id).await?.unwrap();
        assert!(record.partner_name.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_existing_sale_record_blocks_second_sale() -> Result<()> {
        let (db, _garage, car) = setup_with_car().await?;

        // Sale row written by another sale while this car still reads as available
        sale::ActiveModel {
            car_id: Set(car.id),
            sale_price: Set(800.0),
            total_expenses: Set(0.0),
            total_profit: Set(800.0),
            your_expenses: Set(0.0),
            partner_expenses: Set(0.0),
            your_profit: Set(800.0),
            partner_profit: Set(0.0),
            you_receive: Set(800.0),
            partner_receives: Set(0.0),
            partner_name: Set(None),
            sold_by: Set("owner".to_string()),
            sold_at: Set(chrono::Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await?;
        assert_eq!(require_car(&db, car.id).await?.status, "available");

        let result = sell_car(&db, car.id, "owner", 1000.0).await;
        assert!(matches!(result, Err(Error::AlreadySold { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_sell_solo_car() -> Result<()> {
        let (db, _garage, car) = setup_with_car().await?;
        create_test_expense(&db, car.id, 300.0).await?;
        create_test_expense(&db, car.id, 200.0).await?;

        let result = sell_car(&db, car.id, "owner", 1000.0).await?;
        assert_eq!(result.your_expenses, 500.0);
        assert_eq!(result.partner_expenses, 0.0);
        assert_eq!(result.your_profit, 500.0);
        assert_eq!(result.you_receive, 1000.0);
        assert_eq!(result.partner_receives, 0.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_sale_restores_car() -> Result<()> {
        let (db, _garage, car) = setup_with_car().await?;
        let expense = create_test_expense(&db, car.id, 250.0).await?;

        let not_sold = cancel_sale(&db, car.id, "owner").await;
        assert!(matches!(not_sold, Err(Error::NotSold { .. })));

        sell_car(&db, car.id, "owner", 900.0).await?;
        let restored = cancel_sale(&db, car.id, "owner").await?;
        assert_eq!(restored.status, "available");
        assert!(get_settlement(&db, car.id).await?.is_none());

        // Ledger untouched by sell/cancel
        let summary = summarize_car(&db, restored).await?;
        assert_eq!(summary.expenses.len(), 1);
        assert_eq!(summary.expenses[0].id, expense.id);
        assert_eq!(summary.total_expenses, 250.0);

        // Can be sold again at a different price
        let resold = sell_car(&db, car.id, "owner", 1100.0).await?;
        assert_eq!(resold.total_profit, 850.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_partner_member_cannot_sell() -> Result<()> {
        let (db, _garage, car) = setup_with_partnered_car(50).await?;

        let result = sell_car(&db, car.id, "partner", 1000.0).await;
        assert!(matches!(result, Err(Error::PermissionDenied { .. })));
        let result = cancel_sale(&db, car.id, "partner").await;
        assert!(matches!(result, Err(Error::PermissionDenied { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_summarize_car() -> Result<()> {
        let (db, _garage, car) = setup_with_car().await?;
        create_test_expense(&db, car.id, 120.0).await?;
        let mut rental = new_expense("Weekend rental", 75.0);
        rental.kind = crate::core::settlement::EntryKind::Income;
        expense::add_expense(&db, car.id, "owner", rental).await?;

        let summary = summarize_car(&db, car).await?;
        assert_eq!(summary.status, CarStatus::Available);
        assert_eq!(summary.total_expenses, 120.0);
        assert_eq!(summary.total_income, 75.0);
        assert!(summary.settlement.is_none());
        Ok(())
    }

    #[test]
    fn test_car_status_parsing() {
        assert_eq!("pending".parse::<CarStatus>().unwrap(), CarStatus::Pending);
        assert_eq!(CarStatus::Sold.to_string(), "sold");
        assert!(matches!(
            "scrapped".parse::<CarStatus>(),
            Err(Error::InvalidStatus { .. })
        ));
    }
}
