//! License key business logic - Minting, lookup and revocation.
//!
//! Keys are never deleted. Revocation is a one-way flag; expiry is derived at
//! read time from `expiry_date` and never stored.

use crate::{
    entities::{Game, LicenseKey, license_key},
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::Expr};
use serde::Deserialize;
use tracing::{debug, info};

/// A fully resolved key ready to be stored.
///
/// Expiry defaults and game parsing happen before this point; see
/// [`crate::core::validation::KeyRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewKey {
    /// The key handed to the end user; must be unique
    pub key_string: String,
    /// Game the key unlocks
    pub game: Game,
    /// Owning reseller; must reference an existing reseller
    pub reseller_id: i64,
    /// Instant at which the key stops being active
    pub expiry_date: DateTime<Utc>,
    /// Maximum number of devices that may bind
    pub device_limit: i32,
}

/// Stores a new, unrevoked key created now.
pub async fn create_key<C>(db: &C, new_key: NewKey) -> Result<license_key::Model>
where
    C: ConnectionTrait,
{
    let model = license_key::ActiveModel {
        key_string: Set(new_key.key_string),
        game: Set(new_key.game),
        reseller_id: Set(new_key.reseller_id),
        created_at: Set(Utc::now()),
        expiry_date: Set(new_key.expiry_date),
        device_limit: Set(new_key.device_limit),
        is_revoked: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        "Created key {} for reseller {} ({}, expires {})",
        model.key_string, model.reseller_id, model.game, model.expiry_date
    );
    Ok(model)
}

/// Finds a key by ID.
pub async fn get_key_by_id<C>(db: &C, id: i64) -> Result<Option<license_key::Model>>
where
    C: ConnectionTrait,
{
    LicenseKey::find_by_id(id).one(db).await.map_err(Into::into)
}

/// Finds a key by its exact key string.
pub async fn get_key<C>(db: &C, key_string: &str) -> Result<Option<license_key::Model>>
where
    C: ConnectionTrait,
{
    LicenseKey::find()
        .filter(license_key::Column::KeyString.eq(key_string))
        .one(db)
        .await
        .map_err(Into::into)
}

/// All keys owned by a reseller, in insertion order.
pub async fn get_keys_by_reseller_id<C>(
    db: &C,
    reseller_id: i64,
) -> Result<Vec<license_key::Model>>
where
    C: ConnectionTrait,
{
    LicenseKey::find()
        .filter(license_key::Column::ResellerId.eq(reseller_id))
        .order_by_asc(license_key::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Every key in insertion order.
pub async fn get_all_keys<C>(db: &C) -> Result<Vec<license_key::Model>>
where
    C: ConnectionTrait,
{
    LicenseKey::find()
        .order_by_asc(license_key::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Revokes a key. Revoking an already revoked key changes nothing.
///
/// Returns `None` if the key does not exist, otherwise the revoked record.
pub async fn revoke_key<C>(db: &C, id: i64) -> Result<Option<license_key::Model>>
where
    C: ConnectionTrait,
{
    let result = LicenseKey::update_many()
        .col_expr(license_key::Column::IsRevoked, Expr::value(true))
        .filter(license_key::Column::Id.eq(id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        debug!("Revoke skipped, key {} not found", id);
        return Ok(None);
    }

    info!("Revoked key {}", id);
    get_key_by_id(db, id).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::KeyStatus;
    use crate::errors::Error;
    use crate::test_utils::{create_test_key, create_test_reseller, new_key, setup_test_db};
    use chrono::Duration;

    #[tokio::test]
    async fn test_create_key_defaults() -> Result<()> {
        let db = setup_test_db().await?;
        let bob = create_test_reseller(&db, "bob").await?;

        let before = Utc::now();
        let key = create_test_key(&db, bob.id, "K1").await?;
        assert_eq!(key.key_string, "K1");
        assert_eq!(key.reseller_id, bob.id);
        assert!(!key.is_revoked);
        assert!(key.created_at >= before);
        assert_eq!(key.status_at(Utc::now()), KeyStatus::Active);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_key_requires_existing_reseller() -> Result<()> {
        let db = setup_test_db().await?;
        let result = create_test_key(&db, 404, "K1").await;
        assert!(matches!(result, Err(Error::Database(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_key_string_is_unique() -> Result<()> {
        let db = setup_test_db().await?;
        let bob = create_test_reseller(&db, "bob").await?;
        create_test_key(&db, bob.id, "K1").await?;
        assert!(create_test_key(&db, bob.id, "K1").await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_get_key_by_string() -> Result<()> {
        let db = setup_test_db().await?;
        let bob = create_test_reseller(&db, "bob").await?;
        let key = create_test_key(&db, bob.id, "K1").await?;

        assert_eq!(get_key(&db, "K1").await?, Some(key));
        assert!(get_key(&db, "K2").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_keys_filtered_by_reseller_in_insertion_order() -> Result<()> {
        let db = setup_test_db().await?;
        let bob = create_test_reseller(&db, "bob").await?;
        let carol = create_test_reseller(&db, "carol").await?;

        let b1 = create_test_key(&db, bob.id, "B-2").await?;
        let c1 = create_test_key(&db, carol.id, "C-1").await?;
        let b2 = create_test_key(&db, bob.id, "B-1").await?;

        assert_eq!(get_keys_by_reseller_id(&db, bob.id).await?, vec![b1.clone(), b2.clone()]);
        assert_eq!(get_keys_by_reseller_id(&db, carol.id).await?, vec![c1.clone()]);
        assert!(get_keys_by_reseller_id(&db, 999).await?.is_empty());
        assert_eq!(get_all_keys(&db).await?, vec![b1, c1, b2]);
        Ok(())
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let bob = create_test_reseller(&db, "bob").await?;
        let key = create_test_key(&db, bob.id, "K1").await?;

        let first = revoke_key(&db, key.id).await?.unwrap();
        let second = revoke_key(&db, key.id).await?.unwrap();
        assert!(first.is_revoked);
        assert_eq!(first, second);
        assert_eq!(second.status_at(Utc::now()), KeyStatus::Revoked);
        Ok(())
    }

    #[tokio::test]
    async fn test_revoke_missing_key_returns_none() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(revoke_key(&db, 7).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_expired_key_keeps_stored_fields() -> Result<()> {
        let db = setup_test_db().await?;
        let bob = create_test_reseller(&db, "bob").await?;

        let mut request = new_key(bob.id, "OLD");
        request.expiry_date = Utc::now() - Duration::days(1);
        let key = create_key(&db, request).await?;

        assert!(!key.is_revoked);
        assert_eq!(key.status_at(Utc::now()), KeyStatus::Expired);
        Ok(())
    }
}
