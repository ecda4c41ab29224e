//! Unified error types and result handling for `GarageBuddy`.
//!
//! Pure computations (settlement, policy checks) never fail; everything that
//! touches the database or enforces a plan/membership rule returns [`Result`].

use crate::core::policy::ResourceKind;
use thiserror::Error;

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// User input failed a business rule (empty name, bad status, ...)
    #[error("Validation error: {message}")]
    Validation {
        /// What went wrong
        message: String,
    },

    /// Underlying `SeaORM` failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Required environment variable missing or not unicode
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Failure while building a text response
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// Amount is zero, negative, NaN or infinite
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// Split ratio outside 0..=100
    #[error("Invalid split ratio {ratio}: must be between 0 and 100")]
    InvalidSplitRatio {
        /// The rejected ratio
        ratio: i32,
    },

    /// Garage lookup miss
    #[error("Garage '{name}' not found")]
    GarageNotFound {
        /// Garage name or id
        name: String,
    },

    /// Car lookup miss
    #[error("Car '{name}' not found")]
    CarNotFound {
        /// Car name or id
        name: String,
    },

    /// Expense lookup miss
    #[error("Expense #{id} not found")]
    ExpenseNotFound {
        /// Expense id
        id: i64,
    },

    /// Stored status string is not a known car status
    #[error("Invalid car status '{status}'")]
    InvalidStatus {
        /// The rejected status
        status: String,
    },

    /// Car already has a sale record
    #[error("Car '{name}' is already sold")]
    AlreadySold {
        /// Car name
        name: String,
    },

    /// Car has no sale record to cancel
    #[error("Car '{name}' has not been sold")]
    NotSold {
        /// Car name
        name: String,
    },

    /// Plan usage cap hit
    #[error("Your plan allows at most {limit} {resource}")]
    LimitReached {
        /// Resource being counted
        resource: ResourceKind,
        /// The cap for the plan
        limit: u32,
    },

    /// Actor lacks the capability for this action
    #[error("You don't have permission to {action}")]
    PermissionDenied {
        /// Human-readable action, e.g. "sell cars"
        action: String,
    },

    /// Plan does not include the feature
    #[error("The '{feature}' feature is not included in your plan")]
    FeatureUnavailable {
        /// Feature tag
        feature: String,
    },

    /// Serenity/Poise framework error
    #[error("Discord framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

impl Error {
    /// Whether the error is caused by the user's request and can be shown to them as-is.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::InvalidAmount { .. }
                | Self::InvalidSplitRatio { .. }
                | Self::GarageNotFound { .. }
                | Self::CarNotFound { .. }
                | Self::ExpenseNotFound { .. }
                | Self::InvalidStatus { .. }
                | Self::AlreadySold { .. }
                | Self::NotSold { .. }
                | Self::LimitReached { .. }
                | Self::PermissionDenied { .. }
                | Self::FeatureUnavailable { .. }
        )
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_message_names_resource() {
        let error = Error::LimitReached {
            resource: ResourceKind::Cars,
            limit: 3,
        };
        assert_eq!(error.to_string(), "Your plan allows at most 3 cars");
        assert!(error.is_user_facing());
    }

    #[test]
    fn test_infrastructure_errors_are_not_user_facing() {
        let error = Error::Database(sea_orm::DbErr::Custom("boom".to_string()));
        assert!(!error.is_user_facing());
        assert!(!Error::Fmt(std::fmt::Error).is_user_facing());
    }
}
