//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Admin-only commands
pub mod admin;

/// Car inventory and sale commands
pub mod car;

/// Expense ledger commands
pub mod expense;

/// Garage, partner and membership commands
pub mod garage;

/// General utility commands
pub mod general;

/// Garage report command
pub mod report;

// Export commands
pub use admin::*;
pub use car::*;
pub use expense::*;
pub use garage::*;
pub use general::*;
pub use report::*;
