//! Core business logic - framework-agnostic settlement, access policy, and the
//! garage/car/expense services built on top of them.

/// Plan accounts
pub mod account;
/// Cars, status changes, sales
pub mod car;
/// Expense ledger
pub mod expense;
/// Garages, partners, membership
pub mod garage;
/// Plan roles, limits, feature gating, membership permissions
pub mod policy;
/// Garage reports and display formatting
pub mod report;
/// Sale settlement calculator
pub mod settlement;
