//! Report generation business logic.
//!
//! This module builds garage-level summaries (inventory, money tied up in unsold cars,
//! realized profit split between owner and partner) and the text formatting helpers the
//! bot layer uses to display amounts and settlements. Stored values are never rounded;
//! rounding to cents happens only here, at display time.

use crate::{
    core::{
        account,
        car::{self, CarStatus, CarSummary},
        expense, garage,
        policy::{AccessPolicy, GarageAction, feature, permission},
        settlement::Settlement,
    },
    entities::garage as garage_entity,
    errors::Result,
};
use sea_orm::DatabaseConnection;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Summary of a whole garage.
#[derive(Debug, Clone)]
pub struct GarageReport {
    /// The garage being reported on
    pub garage: garage_entity::Model,
    /// Every car with its derived figures
    pub cars: Vec<CarSummary>,
    /// Cars in stock
    pub available_count: usize,
    /// Cars with a deal in progress
    pub pending_count: usize,
    /// Cars sold
    pub sold_count: usize,
    /// Expenses sunk into cars that are not sold yet
    pub invested_in_stock: f64,
    /// Sum of sale prices
    pub total_revenue: f64,
    /// Sum of profits over sold cars
    pub realized_profit: f64,
    /// Owner's share of realized profit
    pub your_realized_profit: f64,
    /// Partner's share of realized profit
    pub partner_realized_profit: f64,
    /// Expense totals per category, when the plan includes category breakdowns
    pub category_totals: Option<BTreeMap<String, f64>>,
}

/// Generates the report of a garage for `actor_id`.
///
/// The actor needs the view-reports capability in the garage and the owner's plan must
/// include reports. Category breakdowns are added when the plan includes them.
pub async fn generate_garage_report(
    db: &DatabaseConnection,
    policy: &AccessPolicy,
    garage_id: i64,
    actor_id: &str,
) -> Result<GarageReport> {
    let garage = garage::require_garage(db, garage_id).await?;
    garage::ensure_allowed(db, &garage, actor_id, GarageAction::ViewReports).await?;

    let owner_role = account::role_for(db, &garage.owner_id).await?;
    policy.ensure_feature(owner_role, feature::REPORTS)?;
    policy.ensure_permission(owner_role, permission::VIEW_REPORTS)?;
    let with_categories =
        owner_role.is_some_and(|role| policy.has_feature(role, feature::EXPENSE_CATEGORIES));

    let mut cars = Vec::new();
    for model in car::get_cars_for_garage(db, garage.id).await? {
        cars.push(car::summarize_car(db, model).await?);
    }

    Ok(build_report(garage, cars, with_categories))
}

fn build_report(
    garage: garage_entity::Model,
    cars: Vec<CarSummary>,
    with_categories: bool,
) -> GarageReport {
    let count = |status: CarStatus| cars.iter().filter(|c| c.status == status).count();
    let available_count = count(CarStatus::Available);
    let pending_count = count(CarStatus::Pending);
    let sold_count = count(CarStatus::Sold);

    let invested_in_stock: f64 = cars
        .iter()
        .filter(|c| c.settlement.is_none())
        .map(|c| c.total_expenses)
        .sum();

    let settlements: Vec<&Settlement> = cars.iter().filter_map(|c| c.settlement.as_ref()).collect();
    let total_revenue: f64 = settlements.iter().map(|s| s.sale_price).sum();
    let realized_profit: f64 = settlements.iter().map(|s| s.total_profit).sum();
    let your_realized_profit: f64 = settlements.iter().map(|s| s.your_profit).sum();
    let partner_realized_profit: f64 = settlements.iter().map(|s| s.partner_profit).sum();

    let category_totals = with_categories.then(|| {
        let mut totals = BTreeMap::new();
        for summary in &cars {
            for (category, amount) in expense::totals_by_category(&summary.expenses) {
                *totals.entry(category).or_insert(0.0) += amount;
            }
        }
        totals
    });

    GarageReport {
        garage,
        cars,
        available_count,
        pending_count,
        sold_count,
        invested_in_stock,
        total_revenue,
        realized_profit,
        your_realized_profit,
        partner_realized_profit,
        category_totals,
    }
}

/// Rounds to the nearest cent for display.
#[must_use]
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Formats an amount as dollars with an explicit sign for negatives, e.g. `"-$25.50"`.
#[must_use]
pub fn format_amount(amount: f64) -> String {
    let rounded = round_cents(amount);
    if rounded < 0.0 {
        format!("-${:.2}", rounded.abs())
    } else {
        format!("${:.2}", rounded.abs())
    }
}

/// Multi-line breakdown of a settlement.
///
/// Partner lines are only included for partnered garages.
pub fn format_settlement(
    settlement: &Settlement,
    partner_name: Option<&str>,
) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "Sale price: {}", format_amount(settlement.sale_price))?;
    writeln!(
        out,
        "Total expenses: {}",
        format_amount(settlement.total_expenses)
    )?;
    let label = if settlement.total_profit < 0.0 {
        "Total loss"
    } else {
        "Total profit"
    };
    writeln!(out, "{label}: {}", format_amount(settlement.total_profit))?;

    match partner_name {
        Some(partner) => {
            writeln!(
                out,
                "You: expenses {} + profit {} = receive {}",
                format_amount(settlement.your_expenses),
                format_amount(settlement.your_profit),
                format_amount(settlement.you_receive)
            )?;
            write!(
                out,
                "{partner}: expenses {} + profit {} = receive {}",
                format_amount(settlement.partner_expenses),
                format_amount(settlement.partner_profit),
                format_amount(settlement.partner_receives)
            )?;
        }
        None => {
            write!(out, "You receive: {}", format_amount(settlement.you_receive))?;
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::policy::Role;
    use crate::core::settlement::{ExpenseLine, Partnership, Payer, settle};
    use crate::errors::Error;
    use crate::test_utils::*;

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(10.005_1), 10.01);
        assert_eq!(round_cents(-3.334), -3.33);
        assert_eq!(round_cents(99.999), 100.0);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(50.0), "$50.00");
        assert_eq!(format_amount(-25.5), "-$25.50");
        assert_eq!(format_amount(0.0), "$0.00");
        assert_eq!(format_amount(-0.001), "$0.00");
        assert_eq!(format_amount(1234.567), "$1234.57");
    }

    #[test]
    fn test_format_partnered_settlement() {
        let lines = vec![
            ExpenseLine::expense(300.0, Payer::Owner),
            ExpenseLine::expense(200.0, Payer::Partner),
        ];
        let settlement = settle(&lines, Partnership::with_partner(60), 1000.0);

        let text = format_settlement(&settlement, Some("Sam")).unwrap();
        assert!(text.contains("Sale price: $1000.00"));
        assert!(text.contains("Total profit: $500.00"));
        assert!(text.contains("You: expenses $300.00 + profit $300.00 = receive $600.00"));
        assert!(text.contains("Sam: expenses $200.00 + profit $200.00 = receive $400.00"));
    }

    #[test]
    fn test_format_solo_loss() {
        let lines = vec![ExpenseLine::expense(1200.0, Payer::Owner)];
        let settlement = settle(&lines, Partnership::solo(), 1000.0);

        let text = format_settlement(&settlement, None).unwrap();
        assert!(text.contains("Total loss: -$200.00"));
        assert!(text.contains("You receive: $1000.00"));
        assert!(!text.contains("receive $"));
    }

    #[tokio::test]
    async fn test_report_requires_reports_feature() -> Result<()> {
        let (db, garage, _car) = setup_with_car().await?;
        let policy = AccessPolicy::standard();

        let result = generate_garage_report(&db, &policy, garage.id, "owner").await;
        assert!(matches!(result, Err(Error::FeatureUnavailable { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_report_requires_membership() -> Result<()> {
        let (db, garage, _car) = setup_with_car().await?;
        let policy = AccessPolicy::standard();
        account::set_role(&db, "owner", Role::Starter).await?;

        let result = generate_garage_report(&db, &policy, garage.id, "stranger").await;
        assert!(matches!(result, Err(Error::PermissionDenied { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_garage_report_totals() -> Result<()> {
        let (db, garage, sold_car) = setup_with_partnered_car(60).await?;
        let policy = AccessPolicy::standard();

        add_paid_expense(&db, sold_car.id, "owner", 300.0, Payer::Owner).await?;
        add_paid_expense(&db, sold_car.id, "partner", 200.0, Payer::Partner).await?;
        car::sell_car(&db, sold_car.id, "owner", 1000.0).await?;

        let stock = create_test_car(&db, garage.id, "Stock Car").await?;
        create_test_expense(&db, stock.id, 150.0).await?;
        car::set_status(&db, stock.id, "owner", CarStatus::Pending).await?;

        // Partners may view reports
        let report = generate_garage_report(&db, &policy, garage.id, "partner").await?;
        assert_eq!(report.cars.len(), 2);
        assert_eq!(report.available_count, 0);
        assert_eq!(report.pending_count, 1);
        assert_eq!(report.sold_count, 1);
        assert_eq!(report.invested_in_stock, 150.0);
        assert_eq!(report.total_revenue, 1000.0);
        assert_eq!(report.realized_profit, 500.0);
        assert_eq!(report.your_realized_profit, 300.0);
        assert_eq!(report.partner_realized_profit, 200.0);

        let categories = report.category_totals.unwrap();
        assert_eq!(categories["general"], 650.0);
        Ok(())
    }
}
