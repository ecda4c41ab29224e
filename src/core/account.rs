//! Account business logic - resolves and assigns subscription plans.

use crate::{
    config::accounts::AccountConfig,
    core::policy::Role,
    entities::{Account, account},
    errors::Result,
};
use sea_orm::{Set, prelude::*};
use tracing::{info, warn};

/// Finds the account row of a user.
pub async fn get_account<C>(db: &C, user_id: &str) -> Result<Option<account::Model>>
where
    C: ConnectionTrait,
{
    Account::find()
        .filter(account::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Resolves the plan role of a user.
///
/// Users without an account are on [`Role::Free`]. A stored code that matches no role
/// resolves to `None`, which every policy check treats as a denial.
pub async fn role_for<C>(db: &C, user_id: &str) -> Result<Option<Role>>
where
    C: ConnectionTrait,
{
    let Some(account) = get_account(db, user_id).await? else {
        return Ok(Some(Role::Free));
    };

    let role = Role::from_code(account.role);
    if role.is_none() {
        warn!(
            "Account {} has unknown role code {}",
            account.user_id, account.role
        );
    }
    Ok(role)
}

/// Sets the plan of a user, creating the account if needed.
pub async fn set_role(db: &DatabaseConnection, user_id: &str, role: Role) -> Result<account::Model> {
    let model = if let Some(existing) = get_account(db, user_id).await? {
        let mut active: account::ActiveModel = existing.into();
        active.role = Set(role.code());
        active.update(db).await?
    } else {
        account::ActiveModel {
            user_id: Set(user_id.to_string()),
            role: Set(role.code()),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?
    };

    info!("Set plan of {} to {}", user_id, role);
    Ok(model)
}

/// Applies the plan assignments from config.toml. Returns how many were applied.
pub async fn seed_accounts(db: &DatabaseConnection, accounts: &[AccountConfig]) -> Result<usize> {
    for entry in accounts {
        set_role(db, &entry.user_id, entry.plan).await?;
    }
    Ok(accounts.len())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_unknown_user_is_free() -> Result<()> {
        let db = setup_test_db().await?;
        assert_eq!(role_for(&db, "nobody").await?, Some(Role::Free));
        assert!(get_account(&db, "nobody").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_set_role_creates_then_updates() -> Result<()> {
        let db = setup_test_db().await?;

        let created = set_role(&db, "user1", Role::Starter).await?;
        assert_eq!(created.role, Role::Starter.code());
        assert_eq!(role_for(&db, "user1").await?, Some(Role::Starter));

        let updated = set_role(&db, "user1", Role::Pro).await?;
        assert_eq!(updated.id, created.id);
        assert_eq!(role_for(&db, "user1").await?, Some(Role::Pro));

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_role_code_resolves_to_none() -> Result<()> {
        let db = setup_test_db().await?;
        let account = set_role(&db, "user1", Role::Free).await?;

        let mut active: account::ActiveModel = account.into();
        active.role = Set(42);
        active.update(&db).await?;

        assert_eq!(role_for(&db, "user1").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_accounts() -> Result<()> {
        let db = setup_test_db().await?;
        let accounts = vec![
            AccountConfig {
                user_id: "admin".to_string(),
                plan: Role::Admin,
            },
            AccountConfig {
                user_id: "pro".to_string(),
                plan: Role::Pro,
            },
        ];

        assert_eq!(seed_accounts(&db, &accounts).await?, 2);
        assert_eq!(role_for(&db, "admin").await?, Some(Role::Admin));
        assert_eq!(role_for(&db, "pro").await?, Some(Role::Pro));

        // Re-seeding keeps a single row per user
        seed_accounts(&db, &accounts).await?;
        assert_eq!(Account::find().count(&db).await?, 2);
        Ok(())
    }
}
