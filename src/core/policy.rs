//! Access policy - plan roles, usage limits, feature gating and garage membership permissions.
//!
//! Plans are unordered tags: every check is an explicit allow-list lookup, never a rank
//! comparison. The role table is immutable and built once at startup, then shared through
//! the bot context. Lookup misses (a role absent from the table, an unknown stored role
//! code) always deny.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Capability tags checked with [`AccessPolicy::has_permission`].
pub mod permission {
    /// Wildcard granting every permission
    pub const ALL: &str = "all";
    /// See cars and their expenses
    pub const VIEW_CARS: &str = "view_cars";
    /// Create and edit cars
    pub const MANAGE_CARS: &str = "manage_cars";
    /// Record and edit expenses
    pub const MANAGE_EXPENSES: &str = "manage_expenses";
    /// Attach a partner to a garage
    pub const PARTNER_MANAGEMENT: &str = "partner_management";
    /// Open garage reports
    pub const VIEW_REPORTS: &str = "view_reports";
    /// Export reports
    pub const EXPORT_REPORTS: &str = "export_reports";
    /// Off-site backups
    pub const CLOUD_BACKUP: &str = "cloud_backup";
}

/// Feature tags checked with [`AccessPolicy::has_feature`].
pub mod feature {
    /// Wildcard granting every feature
    pub const ALL_FEATURES: &str = "all_features";
    /// Cars and expense logging
    pub const BASIC_TRACKING: &str = "basic_tracking";
    /// Per-category expense breakdowns
    pub const EXPENSE_CATEGORIES: &str = "expense_categories";
    /// Partnered garages with a profit split
    pub const PROFIT_SPLIT: &str = "profit_split";
    /// Garage reports
    pub const REPORTS: &str = "reports";
}

/// Subscription plan of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Operator account with every capability
    Admin,
    /// Default plan
    Free,
    /// Entry paid plan
    Starter,
    /// Top paid plan
    Pro,
}

impl Role {
    /// Every defined role
    pub const ALL: [Self; 4] = [Self::Admin, Self::Free, Self::Starter, Self::Pro];

    /// Integer code stored in the `accounts` table.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Admin => 0,
            Self::Free => 1,
            Self::Starter => 2,
            Self::Pro => 3,
        }
    }

    /// Resolves a stored code. Unknown codes resolve to `None` so callers deny.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Admin),
            1 => Some(Self::Free),
            2 => Some(Self::Starter),
            3 => Some(Self::Pro),
            _ => None,
        }
    }

    /// Lowercase plan name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Free => "free",
            Self::Starter => "starter",
            Self::Pro => "pro",
        }
    }

    /// True only for the admin role.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// True for admin or pro.
    #[must_use]
    pub const fn has_pro_access(self) -> bool {
        matches!(self, Self::Admin | Self::Pro)
    }

    /// True for admin, starter or pro. Free never qualifies.
    #[must_use]
    pub const fn has_starter_access(self) -> bool {
        matches!(self, Self::Admin | Self::Starter | Self::Pro)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::Validation {
                message: format!("Unknown plan '{s}'"),
            })
    }
}

/// Countable resources capped per plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Garages owned
    Garages,
    /// Cars across every owned garage
    Cars,
    /// Partnered garages
    Partners,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Garages => "garages",
            Self::Cars => "cars",
            Self::Partners => "partners",
        })
    }
}

/// Usage cap for one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// No cap
    Unlimited,
    /// Total count must stay below this value
    AtMost(u32),
}

impl Limit {
    /// Raw marker for an unlimited resource in plan tables.
    pub const UNLIMITED_RAW: i32 = -1;

    /// Builds a limit from its raw table value, where `-1` means unlimited.
    /// Any other negative value is treated as a cap of zero.
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        if raw == Self::UNLIMITED_RAW {
            Self::Unlimited
        } else if raw < 0 {
            Self::AtMost(0)
        } else {
            #[allow(clippy::cast_sign_loss)] // raw >= 0 here
            let max = raw as u32;
            Self::AtMost(max)
        }
    }

    /// Whether one more item may be created when `current_count` already exist.
    #[must_use]
    pub const fn allows(self, current_count: u64) -> bool {
        match self {
            Self::Unlimited => true,
            Self::AtMost(max) => current_count < max as u64,
        }
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlimited => f.write_str("unlimited"),
            Self::AtMost(max) => write!(f, "{max}"),
        }
    }
}

/// Numeric caps and feature allow-list of a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Owned garages
    pub garages: Limit,
    /// Cars across owned garages
    pub cars: Limit,
    /// Partnered garages
    pub partners: Limit,
    /// Feature tags
    pub features: &'static [&'static str],
}

impl Limits {
    /// Cap for a resource.
    #[must_use]
    pub const fn get(&self, resource: ResourceKind) -> Limit {
        match resource {
            ResourceKind::Garages => self.garages,
            ResourceKind::Cars => self.cars,
            ResourceKind::Partners => self.partners,
        }
    }
}

/// Permissions and limits attached to one role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDefinition {
    /// Capability tags
    pub permissions: &'static [&'static str],
    /// Usage caps and features
    pub limits: Limits,
}

impl RoleDefinition {
    fn has_permission(&self, tag: &str) -> bool {
        self.permissions
            .iter()
            .any(|p| *p == permission::ALL || *p == tag)
    }

    fn has_feature(&self, tag: &str) -> bool {
        self.limits
            .features
            .iter()
            .any(|f| *f == feature::ALL_FEATURES || *f == tag)
    }
}

const ADMIN: RoleDefinition = RoleDefinition {
    permissions: &[permission::ALL],
    limits: Limits {
        garages: Limit::from_raw(-1),
        cars: Limit::from_raw(-1),
        partners: Limit::from_raw(-1),
        features: &[feature::ALL_FEATURES],
    },
};

const FREE: RoleDefinition = RoleDefinition {
    permissions: &[
        permission::VIEW_CARS,
        permission::MANAGE_CARS,
        permission::MANAGE_EXPENSES,
    ],
    limits: Limits {
        garages: Limit::from_raw(1),
        cars: Limit::from_raw(3),
        partners: Limit::from_raw(0),
        features: &[feature::BASIC_TRACKING],
    },
};

const STARTER: RoleDefinition = RoleDefinition {
    permissions: &[
        permission::VIEW_CARS,
        permission::MANAGE_CARS,
        permission::MANAGE_EXPENSES,
        permission::PARTNER_MANAGEMENT,
        permission::VIEW_REPORTS,
    ],
    limits: Limits {
        garages: Limit::from_raw(2),
        cars: Limit::from_raw(15),
        partners: Limit::from_raw(1),
        features: &[
            feature::BASIC_TRACKING,
            feature::EXPENSE_CATEGORIES,
            feature::PROFIT_SPLIT,
            feature::REPORTS,
        ],
    },
};

const PRO: RoleDefinition = RoleDefinition {
    permissions: &[
        permission::VIEW_CARS,
        permission::MANAGE_CARS,
        permission::MANAGE_EXPENSES,
        permission::PARTNER_MANAGEMENT,
        permission::VIEW_REPORTS,
        permission::EXPORT_REPORTS,
        permission::CLOUD_BACKUP,
    ],
    limits: Limits {
        garages: Limit::from_raw(-1),
        cars: Limit::from_raw(-1),
        partners: Limit::from_raw(-1),
        features: &[feature::ALL_FEATURES],
    },
};

/// Read-only role table.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    roles: HashMap<Role, RoleDefinition>,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl AccessPolicy {
    /// The production plan table.
    #[must_use]
    pub fn standard() -> Self {
        Self::from_definitions([
            (Role::Admin, ADMIN),
            (Role::Free, FREE),
            (Role::Starter, STARTER),
            (Role::Pro, PRO),
        ])
    }

    /// Builds a table from explicit definitions. Roles left out deny everything.
    pub fn from_definitions<I>(definitions: I) -> Self
    where
        I: IntoIterator<Item = (Role, RoleDefinition)>,
    {
        Self {
            roles: definitions.into_iter().collect(),
        }
    }

    /// Definition for a role, if the table has one.
    #[must_use]
    pub fn definition(&self, role: Role) -> Option<&RoleDefinition> {
        self.roles.get(&role)
    }

    /// Cap for a resource, if the role is defined.
    #[must_use]
    pub fn limit(&self, role: Role, resource: ResourceKind) -> Option<Limit> {
        self.definition(role).map(|def| def.limits.get(resource))
    }

    /// Whether another `resource` may be created when `current_count` already exist.
    #[must_use]
    pub fn check_limit(&self, role: Role, resource: ResourceKind, current_count: u64) -> bool {
        self.limit(role, resource)
            .is_some_and(|limit| limit.allows(current_count))
    }

    /// Whether the role's permission set contains `"all"` or `tag`.
    #[must_use]
    pub fn has_permission(&self, role: Role, tag: &str) -> bool {
        self.definition(role)
            .is_some_and(|def| def.has_permission(tag))
    }

    /// Whether the role's feature set contains `"all_features"` or `tag`.
    #[must_use]
    pub fn has_feature(&self, role: Role, tag: &str) -> bool {
        self.definition(role).is_some_and(|def| def.has_feature(tag))
    }

    /// Errors with [`Error::LimitReached`] when the cap is hit.
    pub fn ensure_limit(
        &self,
        role: Option<Role>,
        resource: ResourceKind,
        current_count: u64,
    ) -> Result<()> {
        let limit = role.and_then(|r| self.limit(r, resource));
        match limit {
            Some(limit) if limit.allows(current_count) => Ok(()),
            Some(Limit::AtMost(max)) => Err(Error::LimitReached {
                resource,
                limit: max,
            }),
            _ => Err(Error::LimitReached { resource, limit: 0 }),
        }
    }

    /// Errors with [`Error::FeatureUnavailable`] unless the role has the feature.
    pub fn ensure_feature(&self, role: Option<Role>, tag: &str) -> Result<()> {
        if role.is_some_and(|r| self.has_feature(r, tag)) {
            Ok(())
        } else {
            Err(Error::FeatureUnavailable {
                feature: tag.to_string(),
            })
        }
    }

    /// Errors with [`Error::PermissionDenied`] unless the role has the permission.
    pub fn ensure_permission(&self, role: Option<Role>, tag: &str) -> Result<()> {
        if role.is_some_and(|r| self.has_permission(r, tag)) {
            Ok(())
        } else {
            Err(Error::PermissionDenied {
                action: tag.replace('_', " "),
            })
        }
    }
}

/// Role of a non-owner member inside a garage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    /// Co-investor sharing the profit
    Partner,
    /// Read-only member
    Viewer,
}

impl MemberRole {
    /// Stored string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Partner => "partner",
            Self::Viewer => "viewer",
        }
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "partner" => Ok(Self::Partner),
            "viewer" => Ok(Self::Viewer),
            other => Err(Error::Validation {
                message: format!("Unknown member role '{other}'"),
            }),
        }
    }
}

/// Actions gated by garage membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GarageAction {
    /// Record a new expense
    AddExpenses,
    /// Edit an existing expense
    EditExpenses,
    /// Delete an expense
    DeleteExpenses,
    /// Open garage reports
    ViewReports,
    /// Add a car
    AddCars,
    /// Rename a car or change its status
    EditCars,
    /// Sell a car or cancel its sale
    SellCars,
}

impl fmt::Display for GarageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AddExpenses => "add expenses",
            Self::EditExpenses => "edit expenses",
            Self::DeleteExpenses => "delete expenses",
            Self::ViewReports => "view reports",
            Self::AddCars => "add cars",
            Self::EditCars => "edit cars",
            Self::SellCars => "sell cars",
        })
    }
}

/// Per-garage capability bundle.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemberPermissions {
    /// May record expenses
    pub can_add_expenses: bool,
    /// May edit expenses
    pub can_edit_expenses: bool,
    /// May delete expenses
    pub can_delete_expenses: bool,
    /// May open reports
    pub can_view_reports: bool,
    /// May add cars
    pub can_add_cars: bool,
    /// May edit cars
    pub can_edit_cars: bool,
    /// May sell cars
    pub can_sell_cars: bool,
}

impl MemberPermissions {
    /// Everything allowed; held by the garage owner.
    #[must_use]
    pub const fn owner() -> Self {
        Self {
            can_add_expenses: true,
            can_edit_expenses: true,
            can_delete_expenses: true,
            can_view_reports: true,
            can_add_cars: true,
            can_edit_cars: true,
            can_sell_cars: true,
        }
    }

    /// Nothing allowed; held by non-members.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            can_add_expenses: false,
            can_edit_expenses: false,
            can_delete_expenses: false,
            can_view_reports: false,
            can_add_cars: false,
            can_edit_cars: false,
            can_sell_cars: false,
        }
    }

    /// Fixed default bundle for a membership role.
    #[must_use]
    pub const fn for_role(role: MemberRole) -> Self {
        match role {
            MemberRole::Partner => Self {
                can_add_expenses: true,
                can_edit_expenses: true,
                can_view_reports: true,
                ..Self::none()
            },
            MemberRole::Viewer => Self {
                can_view_reports: true,
                ..Self::none()
            },
        }
    }

    /// Whether the bundle covers `action`.
    #[must_use]
    pub const fn allows(&self, action: GarageAction) -> bool {
        match action {
            GarageAction::AddExpenses => self.can_add_expenses,
            GarageAction::EditExpenses => self.can_edit_expenses,
            GarageAction::DeleteExpenses => self.can_delete_expenses,
            GarageAction::ViewReports => self.can_view_reports,
            GarageAction::AddCars => self.can_add_cars,
            GarageAction::EditCars => self.can_edit_cars,
            GarageAction::SellCars => self.can_sell_cars,
        }
    }
}
