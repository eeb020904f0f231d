//! Reseller business logic - Registration, credit accounting and suspension.
//!
//! Credits only ever move by a signed delta applied in a single
//! `UPDATE resellers SET credits = credits + ?` statement. No floor is enforced:
//! callers must check affordability before applying a negative delta. The
//! statement only matches rows with headroom for the delta, so a balance never
//! leaves the `i64` range.

use crate::{
    core::token::use_token,
    entities::{Reseller, reseller},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Fields supplied by the caller when creating a reseller
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReseller {
    /// Login name
    pub username: String,
    /// Password, stored as supplied
    pub password: String,
    /// The referral token redeemed for this account
    pub referral_token: String,
}

/// Finds a reseller by ID.
pub async fn get_reseller<C>(db: &C, id: i64) -> Result<Option<reseller::Model>>
where
    C: ConnectionTrait,
{
    Reseller::find_by_id(id).one(db).await.map_err(Into::into)
}

/// Finds the first reseller (lowest ID) with the given username.
pub async fn get_reseller_by_username<C>(
    db: &C,
    username: &str,
) -> Result<Option<reseller::Model>>
where
    C: ConnectionTrait,
{
    Reseller::find()
        .filter(reseller::Column::Username.eq(username))
        .order_by_asc(reseller::Column::Id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Every reseller in insertion order, active or not.
pub async fn get_all_resellers<C>(db: &C) -> Result<Vec<reseller::Model>>
where
    C: ConnectionTrait,
{
    Reseller::find()
        .order_by_asc(reseller::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Stores a new reseller with zero credits, active, registered now.
///
/// Neither the username nor the referral token is checked here; see
/// [`register_reseller`] for the checked flow.
pub async fn create_reseller<C>(db: &C, new_reseller: NewReseller) -> Result<reseller::Model>
where
    C: ConnectionTrait,
{
    let model = reseller::ActiveModel {
        username: Set(new_reseller.username),
        password: Set(new_reseller.password),
        credits: Set(0),
        registration_date: Set(chrono::Utc::now()),
        is_active: Set(true),
        referral_token: Set(new_reseller.referral_token),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Created reseller {} ({})", model.id, model.username);
    Ok(model)
}

/// Registers a reseller by redeeming a referral token.
///
/// Rejects a username already held by a reseller, then consumes the token and
/// creates the account inside one database transaction. Either both happen or
/// neither does.
pub async fn register_reseller(
    db: &DatabaseConnection,
    new_reseller: NewReseller,
) -> Result<reseller::Model> {
    let txn = db.begin().await?;

    if get_reseller_by_username(&txn, &new_reseller.username)
        .await?
        .is_some()
    {
        return Err(Error::UsernameTaken {
            username: new_reseller.username,
        });
    }

    if use_token(&txn, &new_reseller.referral_token, &new_reseller.username)
        .await?
        .is_none()
    {
        return Err(Error::TokenUnavailable {
            token: new_reseller.referral_token,
        });
    }

    let created = create_reseller(&txn, new_reseller).await?;
    txn.commit().await?;

    Ok(created)
}

/// Adds a signed `delta` to the reseller's credits.
///
/// Returns `None` if the reseller does not exist, otherwise the updated record.
/// A delta that would overflow the balance fails with
/// [`Error::CreditOverflow`] and leaves the row untouched.
pub async fn update_reseller_credits<C>(
    db: &C,
    id: i64,
    delta: i64,
) -> Result<Option<reseller::Model>>
where
    C: ConnectionTrait,
{
    // SQLite silently promotes an overflowing sum to REAL
    let headroom = if delta >= 0 {
        reseller::Column::Credits.lte(i64::MAX - delta)
    } else {
        reseller::Column::Credits.gte(i64::MIN - delta)
    };

    let result = Reseller::update_many()
        .col_expr(
            reseller::Column::Credits,
            Expr::col(reseller::Column::Credits).add(delta),
        )
        .filter(reseller::Column::Id.eq(id))
        .filter(headroom)
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        if get_reseller(db, id).await?.is_some() {
            warn!("Credit change of {} would overflow reseller {}", delta, id);
            return Err(Error::CreditOverflow {
                reseller_id: id,
                delta,
            });
        }
        debug!("Credit update skipped, reseller {} not found", id);
        return Ok(None);
    }

    let updated = get_reseller(db, id).await?;
    if let Some(reseller) = &updated {
        info!(
            "Reseller {} credits changed by {} to {}",
            id, delta, reseller.credits
        );
    }
    Ok(updated)
}

/// Sets whether the reseller is active.
///
/// Returns `None` if the reseller does not exist, otherwise the updated record.
pub async fn update_reseller_status<C>(
    db: &C,
    id: i64,
    is_active: bool,
) -> Result<Option<reseller::Model>>
where
    C: ConnectionTrait,
{
    let result = Reseller::update_many()
        .col_expr(reseller::Column::IsActive, Expr::value(is_active))
        .filter(reseller::Column::Id.eq(id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Ok(None);
    }

    info!("Reseller {} active = {}", id, is_active);
    get_reseller(db, id).await
}
