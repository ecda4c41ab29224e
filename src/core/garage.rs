//! Garage business logic - garages, partners, and membership.
//!
//! Every mutation is restricted to the garage owner. Creating garages and attaching
//! partners is capped by the owner's plan through [`AccessPolicy`].

use crate::{
    core::{
        account,
        policy::{
            AccessPolicy, GarageAction, MemberPermissions, MemberRole, ResourceKind, feature,
            permission,
        },
        settlement::Partnership,
    },
    entities::{Garage, GarageMember, garage, garage_member},
    errors::{Error, Result},
};
use sea_orm::{Condition, PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info, warn};

impl From<&garage::Model> for Partnership {
    fn from(garage: &garage::Model) -> Self {
        Self {
            has_partner: garage.has_partner,
            split_ratio: garage.split_ratio,
        }
    }
}

/// Creates a garage owned by `owner_id`.
///
/// The name is trimmed and must be non-empty and unique among the owner's garages.
/// The owner's plan caps how many garages they may own.
pub async fn create_garage(
    db: &DatabaseConnection,
    policy: &AccessPolicy,
    owner_id: &str,
    name: &str,
) -> Result<garage::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation {
            message: "Garage name cannot be empty".to_string(),
        });
    }

    if get_owned_garage_by_name(db, owner_id, name).await?.is_some() {
        return Err(Error::Validation {
            message: format!("You already have a garage named '{name}'"),
        });
    }

    let role = account::role_for(db, owner_id).await?;
    let owned = Garage::find()
        .filter(garage::Column::OwnerId.eq(owner_id))
        .count(db)
        .await?;
    policy.ensure_limit(role, ResourceKind::Garages, owned)?;

    let garage = garage::ActiveModel {
        name: Set(name.to_string()),
        owner_id: Set(owner_id.to_string()),
        has_partner: Set(false),
        partner_name: Set(None),
        partner_user_id: Set(None),
        split_ratio: Set(None),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Created garage '{}' (#{}) for {}", garage.name, garage.id, owner_id);
    Ok(garage)
}

/// Finds a garage by id.
pub async fn get_garage_by_id<C>(db: &C, garage_id: i64) -> Result<Option<garage::Model>>
where
    C: ConnectionTrait,
{
    Garage::find_by_id(garage_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a garage by id, failing with [`Error::GarageNotFound`].
pub async fn require_garage<C>(db: &C, garage_id: i64) -> Result<garage::Model>
where
    C: ConnectionTrait,
{
    get_garage_by_id(db, garage_id)
        .await?
        .ok_or_else(|| Error::GarageNotFound {
            name: garage_id.to_string(),
        })
}

/// Lists the garages a user owns, alphabetically.
pub async fn get_owned_garages(
    db: &DatabaseConnection,
    owner_id: &str,
) -> Result<Vec<garage::Model>> {
    Garage::find()
        .filter(garage::Column::OwnerId.eq(owner_id))
        .order_by_asc(garage::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn get_owned_garage_by_name(
    db: &DatabaseConnection,
    owner_id: &str,
    name: &str,
) -> Result<Option<garage::Model>> {
    Garage::find()
        .filter(garage::Column::OwnerId.eq(owner_id))
        .filter(garage::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists the garages a user owns or is a member of, alphabetically.
pub async fn get_accessible_garages(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Vec<garage::Model>> {
    let member_garage_ids: Vec<i64> = GarageMember::find()
        .filter(garage_member::Column::UserId.eq(user_id))
        .all(db)
        .await?
        .into_iter()
        .map(|member| member.garage_id)
        .collect();

    Garage::find()
        .filter(
            Condition::any()
                .add(garage::Column::OwnerId.eq(user_id))
                .add(garage::Column::Id.is_in(member_garage_ids)),
        )
        .order_by_asc(garage::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds an accessible garage by name (case-insensitive), preferring the user's own.
pub async fn get_accessible_garage_by_name(
    db: &DatabaseConnection,
    user_id: &str,
    name: &str,
) -> Result<Option<garage::Model>> {
    let name = name.trim();
    let mut matching: Vec<garage::Model> = get_accessible_garages(db, user_id)
        .await?
        .into_iter()
        .filter(|garage| garage.name.eq_ignore_ascii_case(name))
        .collect();

    if let Some(pos) = matching.iter().position(|g| g.owner_id == user_id) {
        return Ok(Some(matching.swap_remove(pos)));
    }
    Ok(matching.into_iter().next())
}

/// Lists the members of a garage (owner excluded).
pub async fn get_members(
    db: &DatabaseConnection,
    garage_id: i64,
) -> Result<Vec<garage_member::Model>> {
    GarageMember::find()
        .filter(garage_member::Column::GarageId.eq(garage_id))
        .order_by_asc(garage_member::Column::UserId)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn get_membership<C>(
    db: &C,
    garage_id: i64,
    user_id: &str,
) -> Result<Option<garage_member::Model>>
where
    C: ConnectionTrait,
{
    GarageMember::find()
        .filter(garage_member::Column::GarageId.eq(garage_id))
        .filter(garage_member::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Membership role of a user in a garage. Unknown stored roles resolve to `None`.
pub async fn member_role<C>(db: &C, garage_id: i64, user_id: &str) -> Result<Option<MemberRole>>
where
    C: ConnectionTrait,
{
    let Some(member) = get_membership(db, garage_id, user_id).await? else {
        return Ok(None);
    };

    match member.role.parse::<MemberRole>() {
        Ok(role) => Ok(Some(role)),
        Err(_) => {
            warn!(
                "Membership #{} has unknown role '{}'",
                member.id, member.role
            );
            Ok(None)
        }
    }
}

/// Capabilities of a user inside a garage: everything for the owner, the role bundle
/// for members, nothing for anyone else.
pub async fn permissions_for<C>(
    db: &C,
    garage: &garage::Model,
    user_id: &str,
) -> Result<MemberPermissions>
where
    C: ConnectionTrait,
{
    if garage.owner_id == user_id {
        return Ok(MemberPermissions::owner());
    }

    Ok(member_role(db, garage.id, user_id)
        .await?
        .map_or_else(MemberPermissions::none, MemberPermissions::for_role))
}

/// Errors with [`Error::PermissionDenied`] unless the user may perform `action`.
pub async fn ensure_allowed<C>(
    db: &C,
    garage: &garage::Model,
    user_id: &str,
    action: GarageAction,
) -> Result<()>
where
    C: ConnectionTrait,
{
    if permissions_for(db, garage, user_id).await?.allows(action) {
        Ok(())
    } else {
        debug!("{} denied '{}' in garage #{}", user_id, action, garage.id);
        Err(Error::PermissionDenied {
            action: action.to_string(),
        })
    }
}

fn ensure_owner(garage: &garage::Model, user_id: &str, action: &str) -> Result<()> {
    if garage.owner_id == user_id {
        Ok(())
    } else {
        Err(Error::PermissionDenied {
            action: action.to_string(),
        })
    }
}

async fn upsert_membership<C>(
    db: &C,
    garage_id: i64,
    user_id: &str,
    role: MemberRole,
) -> Result<garage_member::Model>
where
    C: ConnectionTrait,
{
    if let Some(existing) = get_membership(db, garage_id, user_id).await? {
        let mut active: garage_member::ActiveModel = existing.into();
        active.role = Set(role.as_str().to_string());
        return active.update(db).await.map_err(Into::into);
    }

    garage_member::ActiveModel {
        garage_id: Set(garage_id),
        user_id: Set(user_id.to_string()),
        role: Set(role.as_str().to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Attaches (or reconfigures) the partner of a garage.
///
/// Only the owner may do this. `split_ratio` is the owner's profit percentage and must be
/// within 0..=100. The owner's plan must include profit splitting, and attaching a partner
/// to a garage that had none counts against the plan's partner cap. When the partner has a
/// Discord account they become a `partner` member of the garage.
pub async fn set_partner(
    db: &DatabaseConnection,
    policy: &AccessPolicy,
    garage_id: i64,
    actor_id: &str,
    partner_name: &str,
    partner_user_id: Option<&str>,
    split_ratio: i32,
) -> Result<garage::Model> {
    let garage = require_garage(db, garage_id).await?;
    ensure_owner(&garage, actor_id, "manage partners")?;

    if !(0..=100).contains(&split_ratio) {
        return Err(Error::InvalidSplitRatio { ratio: split_ratio });
    }

    let partner_name = partner_name.trim();
    if partner_name.is_empty() {
        return Err(Error::Validation {
            message: "Partner name cannot be empty".to_string(),
        });
    }
    if partner_user_id == Some(garage.owner_id.as_str()) {
        return Err(Error::Validation {
            message: "You cannot be your own partner".to_string(),
        });
    }

    let role = account::role_for(db, &garage.owner_id).await?;
    policy.ensure_feature(role, feature::PROFIT_SPLIT)?;
    policy.ensure_permission(role, permission::PARTNER_MANAGEMENT)?;

    if !garage.has_partner {
        let partnered = Garage::find()
            .filter(garage::Column::OwnerId.eq(garage.owner_id.as_str()))
            .filter(garage::Column::HasPartner.eq(true))
            .count(db)
            .await?;
        policy.ensure_limit(role, ResourceKind::Partners, partnered)?;
    }

    let txn = db.begin().await?;

    let previous_partner = garage.partner_user_id.clone();
    if let Some(previous) = previous_partner.as_deref() {
        if Some(previous) != partner_user_id {
            GarageMember::delete_many()
                .filter(garage_member::Column::GarageId.eq(garage.id))
                .filter(garage_member::Column::UserId.eq(previous))
                .exec(&txn)
                .await?;
        }
    }

    let mut active: garage::ActiveModel = garage.into();
    active.has_partner = Set(true);
    active.partner_name = Set(Some(partner_name.to_string()));
    active.partner_user_id = Set(partner_user_id.map(str::to_string));
    active.split_ratio = Set(Some(split_ratio));
    let updated = active.update(&txn).await?;

    if let Some(user_id) = partner_user_id {
        upsert_membership(&txn, updated.id, user_id, MemberRole::Partner).await?;
    }

    txn.commit().await?;

    info!(
        "Garage #{} now split {}/{} with {}",
        updated.id,
        split_ratio,
        100 - split_ratio,
        partner_name
    );
    Ok(updated)
}

/// Detaches the partner of a garage and drops their membership.
pub async fn remove_partner(
    db: &DatabaseConnection,
    garage_id: i64,
    actor_id: &str,
) -> Result<garage::Model> {
    let garage = require_garage(db, garage_id).await?;
    ensure_owner(&garage, actor_id, "manage partners")?;

    if !garage.has_partner {
        return Err(Error::Validation {
            message: format!("Garage '{}' has no partner", garage.name),
        });
    }

    let txn = db.begin().await?;

    if let Some(partner_id) = garage.partner_user_id.as_deref() {
        GarageMember::delete_many()
            .filter(garage_member::Column::GarageId.eq(garage.id))
            .filter(garage_member::Column::UserId.eq(partner_id))
            .exec(&txn)
            .await?;
    }

    let mut active: garage::ActiveModel = garage.into();
    active.has_partner = Set(false);
    active.partner_name = Set(None);
    active.partner_user_id = Set(None);
    active.split_ratio = Set(None);
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    info!("Removed partner from garage #{}", updated.id);
    Ok(updated)
}

/// Adds a member to a garage, or changes the role of an existing member.
pub async fn add_member(
    db: &DatabaseConnection,
    garage_id: i64,
    actor_id: &str,
    user_id: &str,
    role: MemberRole,
) -> Result<garage_member::Model> {
    let garage = require_garage(db, garage_id).await?;
    ensure_owner(&garage, actor_id, "manage members")?;

    if user_id == garage.owner_id {
        return Err(Error::Validation {
            message: "The owner is already part of the garage".to_string(),
        });
    }

    let member = upsert_membership(db, garage.id, user_id, role).await?;
    info!("Added {} to garage #{} as {}", user_id, garage.id, role);
    Ok(member)
}

/// Removes a member from a garage. The active partner must be removed with
/// [`remove_partner`] instead.
pub async fn remove_member(
    db: &DatabaseConnection,
    garage_id: i64,
    actor_id: &str,
    user_id: &str,
) -> Result<()> {
    let garage = require_garage(db, garage_id).await?;
    ensure_owner(&garage, actor_id, "manage members")?;

    if garage.partner_user_id.as_deref() == Some(user_id) {
        return Err(Error::Validation {
            message: "This user is the garage partner; remove the partner instead".to_string(),
        });
    }

    let Some(member) = get_membership(db, garage.id, user_id).await? else {
        return Err(Error::Validation {
            message: format!("User {user_id} is not a member of '{}'", garage.name),
        });
    };

    member.delete(db).await?;
    info!("Removed {} from garage #{}", user_id, garage.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::policy::Role;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_garage_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let policy = AccessPolicy::standard();

        let result = create_garage(&db, &policy, "owner", "   ").await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_free_plan_garage_limit() -> Result<()> {
        let db = setup_test_db().await?;
        let policy = AccessPolicy::standard();

        let garage = create_garage(&db, &policy, "owner", " Main Lot ").await?;
        assert_eq!(garage.name, "Main Lot");
        assert!(!garage.has_partner);

        let second = create_garage(&db, &policy, "owner", "Second").await;
        assert!(matches!(
            second,
            Err(Error::LimitReached {
                resource: ResourceKind::Garages,
                limit: 1
            })
        ));

        // Another user has their own allowance
        create_garage(&db, &policy, "someone_else", "Main Lot").await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_garage_name_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let policy = AccessPolicy::standard();
        account::set_role(&db, "owner", Role::Pro).await?;

        create_garage(&db, &policy, "owner", "Lot").await?;
        let duplicate = create_garage(&db, &policy, "owner", "Lot").await;
        assert!(matches!(duplicate, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_set_partner_requires_profit_split_feature() -> Result<()> {
        let db = setup_test_db().await?;
        let policy = AccessPolicy::standard();
        let garage = create_test_garage(&db, "owner", "Lot").await?;

        let result = set_partner(&db, &policy, garage.id, "owner", "Sam", None, 60).await;
        assert!(matches!(result, Err(Error::FeatureUnavailable { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_set_partner_validates_ratio_and_owner() -> Result<()> {
        let db = setup_test_db().await?;
        let policy = AccessPolicy::standard();
        account::set_role(&db, "owner", Role::Starter).await?;
        let garage = create_test_garage(&db, "owner", "Lot").await?;

        let result = set_partner(&db, &policy, garage.id, "owner", "Sam", None, 101).await;
        assert!(matches!(result, Err(Error::InvalidSplitRatio { ratio: 101 })));

        let result = set_partner(&db, &policy, garage.id, "owner", "Sam", None, -5).await;
        assert!(matches!(result, Err(Error::InvalidSplitRatio { ratio: -5 })));

        let result = set_partner(&db, &policy, garage.id, "intruder", "Sam", None, 50).await;
        assert!(matches!(result, Err(Error::PermissionDenied { .. })));

        let result =
            set_partner(&db, &policy, garage.id, "owner", "Me", Some("owner"), 50).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_set_partner_registers_membership() -> Result<()> {
        let db = setup_test_db().await?;
        let policy = AccessPolicy::standard();
        account::set_role(&db, "owner", Role::Starter).await?;
        let garage = create_test_garage(&db, "owner", "Lot").await?;

        let updated =
            set_partner(&db, &policy, garage.id, "owner", "Sam", Some("sam"), 60).await?;
        assert!(updated.has_partner);
        assert_eq!(updated.split_ratio, Some(60));
        assert_eq!(updated.partner_name.as_deref(), Some("Sam"));
        assert_eq!(
            member_role(&db, garage.id, "sam").await?,
            Some(MemberRole::Partner)
        );

        let partnership = Partnership::from(&updated);
        assert_eq!(partnership, Partnership::with_partner(60));

        // Reconfiguring the same garage does not count against the partner cap
        let again = set_partner(&db, &policy, garage.id, "owner", "Sam", Some("sam"), 55).await?;
        assert_eq!(again.split_ratio, Some(55));

        // Switching partner drops the old membership
        set_partner(&db, &policy, garage.id, "owner", "Alex", Some("alex"), 50).await?;
        assert_eq!(member_role(&db, garage.id, "sam").await?, None);
        assert_eq!(
            member_role(&db, garage.id, "alex").await?,
            Some(MemberRole::Partner)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_partner_limit() -> Result<()> {
        let db = setup_test_db().await?;
        let policy = AccessPolicy::standard();
        account::set_role(&db, "owner", Role::Starter).await?;
        let first = create_test_garage(&db, "owner", "First").await?;
        let second = create_test_garage(&db, "owner", "Second").await?;

        set_partner(&db, &policy, first.id, "owner", "Sam", None, 50).await?;
        let result = set_partner(&db, &policy, second.id, "owner", "Alex", None, 50).await;
        assert!(matches!(
            result,
            Err(Error::LimitReached {
                resource: ResourceKind::Partners,
                limit: 1
            })
        ));

        // Freeing the slot allows the second garage to partner up
        remove_partner(&db, first.id, "owner").await?;
        set_partner(&db, &policy, second.id, "owner", "Alex", None, 50).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_partner_clears_configuration() -> Result<()> {
        let db = setup_test_db().await?;
        let policy = AccessPolicy::standard();
        account::set_role(&db, "owner", Role::Pro).await?;
        let garage = create_test_garage(&db, "owner", "Lot").await?;

        let result = remove_partner(&db, garage.id, "owner").await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        set_partner(&db, &policy, garage.id, "owner", "Sam", Some("sam"), 70).await?;
        let cleared = remove_partner(&db, garage.id, "owner").await?;
        assert!(!cleared.has_partner);
        assert_eq!(cleared.split_ratio, None);
        assert_eq!(cleared.partner_user_id, None);
        assert_eq!(member_role(&db, garage.id, "sam").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_membership_permissions() -> Result<()> {
        let db = setup_test_db().await?;
        let garage = create_test_garage(&db, "owner", "Lot").await?;

        add_member(&db, garage.id, "owner", "viewer", MemberRole::Viewer).await?;
        add_member(&db, garage.id, "owner", "helper", MemberRole::Partner).await?;

        assert_eq!(
            permissions_for(&db, &garage, "owner").await?,
            MemberPermissions::owner()
        );
        assert_eq!(
            permissions_for(&db, &garage, "viewer").await?,
            MemberPermissions::for_role(MemberRole::Viewer)
        );
        assert_eq!(
            permissions_for(&db, &garage, "stranger").await?,
            MemberPermissions::none()
        );

        ensure_allowed(&db, &garage, "helper", GarageAction::AddExpenses).await?;
        let denied = ensure_allowed(&db, &garage, "helper", GarageAction::DeleteExpenses).await;
        assert!(matches!(denied, Err(Error::PermissionDenied { .. })));
        let denied = ensure_allowed(&db, &garage, "viewer", GarageAction::AddExpenses).await;
        assert!(matches!(denied, Err(Error::PermissionDenied { .. })));

        // Members cannot manage membership
        let result = add_member(&db, garage.id, "helper", "friend", MemberRole::Viewer).await;
        assert!(matches!(result, Err(Error::PermissionDenied { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_add_member_updates_role_and_remove_member() -> Result<()> {
        let db = setup_test_db().await?;
        let garage = create_test_garage(&db, "owner", "Lot").await?;

        let first = add_member(&db, garage.id, "owner", "pat", MemberRole::Viewer).await?;
        let second = add_member(&db, garage.id, "owner", "pat", MemberRole::Partner).await?;
        assert_eq!(first.id, second.id);
        assert_eq!(get_members(&db, garage.id).await?.len(), 1);

        let result = add_member(&db, garage.id, "owner", "owner", MemberRole::Viewer).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        remove_member(&db, garage.id, "owner", "pat").await?;
        assert!(get_members(&db, garage.id).await?.is_empty());

        let result = remove_member(&db, garage.id, "owner", "pat").await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_accessible_garages() -> Result<()> {
        let db = setup_test_db().await?;
        let own = create_test_garage(&db, "pat", "Pat's Lot").await?;
        let shared = create_test_garage(&db, "owner", "Shared Lot").await?;
        create_test_garage(&db, "other", "Hidden Lot").await?;

        add_member(&db, shared.id, "owner", "pat", MemberRole::Viewer).await?;

        let accessible = get_accessible_garages(&db, "pat").await?;
        let ids: Vec<i64> = accessible.iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![own.id, shared.id]);

        let found = get_accessible_garage_by_name(&db, "pat", "shared lot").await?;
        assert_eq!(found.map(|g| g.id), Some(shared.id));
        assert!(
            get_accessible_garage_by_name(&db, "pat", "Hidden Lot")
                .await?
                .is_none()
        );
        Ok(())
    }
}
