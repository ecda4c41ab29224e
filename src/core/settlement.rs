//! Sale settlement - expense reimbursement and profit split for a sold car.
//!
//! [`settle`] is a pure function: it never fails and never rounds. Income entries
//! are ignored; only `expense` entries count toward the cost basis. Persisting the
//! result and flipping the car to `sold` is the caller's job (see `core::car`).

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Owner's profit percentage when a partnered garage has no explicit ratio.
pub const DEFAULT_SPLIT_RATIO: i32 = 50;

/// Whether a ledger entry is money in or money out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Money received (rental, parts resale, ...)
    Income,
    /// Money spent on the car
    Expense,
}

impl EntryKind {
    /// Stored string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(Error::Validation {
                message: format!("Unknown entry type '{other}'"),
            }),
        }
    }
}

/// Who fronted the money for an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Payer {
    /// The garage owner
    Owner,
    /// The garage partner
    Partner,
}

impl Payer {
    /// Stored string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Partner => "partner",
        }
    }
}

impl fmt::Display for Payer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Payer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "owner" => Ok(Self::Owner),
            "partner" => Ok(Self::Partner),
            other => Err(Error::Validation {
                message: format!("Unknown payer '{other}'"),
            }),
        }
    }
}

/// The parts of an expense the calculator needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpenseLine {
    /// Positive amount
    pub amount: f64,
    /// Income or expense
    pub kind: EntryKind,
    /// Who paid
    pub paid_by: Payer,
}

impl ExpenseLine {
    /// Shorthand for an expense-type line.
    #[must_use]
    pub const fn expense(amount: f64, paid_by: Payer) -> Self {
        Self {
            amount,
            kind: EntryKind::Expense,
            paid_by,
        }
    }
}

/// Partnership configuration of a garage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Partnership {
    /// Whether profits are shared
    pub has_partner: bool,
    /// Owner's share of profit in percent; [`DEFAULT_SPLIT_RATIO`] when absent
    pub split_ratio: Option<i32>,
}

impl Partnership {
    /// No partner.
    #[must_use]
    pub const fn solo() -> Self {
        Self {
            has_partner: false,
            split_ratio: None,
        }
    }

    /// Partner with the given owner percentage.
    #[must_use]
    pub const fn with_partner(split_ratio: i32) -> Self {
        Self {
            has_partner: true,
            split_ratio: Some(split_ratio),
        }
    }

    /// Owner percentage actually applied.
    #[must_use]
    pub fn owner_ratio(&self) -> i32 {
        self.split_ratio.unwrap_or(DEFAULT_SPLIT_RATIO)
    }
}

/// Outcome of selling a car.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    /// Price the car sold for
    pub sale_price: f64,
    /// Sum of all expense-type entries
    pub total_expenses: f64,
    /// `sale_price - total_expenses`; negative for a loss
    pub total_profit: f64,
    /// Expenses attributed to the owner
    pub your_expenses: f64,
    /// Expenses attributed to the partner
    pub partner_expenses: f64,
    /// Owner's share of the profit
    pub your_profit: f64,
    /// Partner's share of the profit
    pub partner_profit: f64,
    /// Owner payout
    pub you_receive: f64,
    /// Partner payout
    pub partner_receives: f64,
}

/// Sums expense-type amounts.
#[must_use]
pub fn total_expenses(lines: &[ExpenseLine]) -> f64 {
    lines
        .iter()
        .filter(|line| line.kind == EntryKind::Expense)
        .map(|line| line.amount)
        .sum()
}

/// Sums expense-type amounts paid by `payer`.
#[must_use]
pub fn expenses_paid_by(lines: &[ExpenseLine], payer: Payer) -> f64 {
    lines
        .iter()
        .filter(|line| line.kind == EntryKind::Expense && line.paid_by == payer)
        .map(|line| line.amount)
        .sum()
}

/// Computes the settlement for a sale.
///
/// Each party is first reimbursed the expenses they fronted, then the profit (or loss)
/// is split by the owner's ratio. Without a partner the owner carries every expense
/// and receives the whole sale price.
#[must_use]
pub fn settle(lines: &[ExpenseLine], partnership: Partnership, sale_price: f64) -> Settlement {
    let owner_paid = expenses_paid_by(lines, Payer::Owner);
    let partner_paid = expenses_paid_by(lines, Payer::Partner);
    let total_expenses = owner_paid + partner_paid;
    let total_profit = sale_price - total_expenses;

    if !partnership.has_partner {
        return Settlement {
            sale_price,
            total_expenses,
            total_profit,
            your_expenses: total_expenses,
            partner_expenses: 0.0,
            your_profit: total_profit,
            partner_profit: 0.0,
            you_receive: sale_price,
            partner_receives: 0.0,
        };
    }

    let ratio = partnership.owner_ratio();
    let your_profit = total_profit * f64::from(ratio) / 100.0;
    let partner_profit = total_profit * f64::from(100 - ratio) / 100.0;

    Settlement {
        sale_price,
        total_expenses,
        total_profit,
        your_expenses: owner_paid,
        partner_expenses: partner_paid,
        your_profit,
        partner_profit,
        you_receive: owner_paid + your_profit,
        partner_receives: partner_paid + partner_profit,
    }
}
