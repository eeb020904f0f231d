//! Admin business logic - Lookup and creation of admin accounts.
//!
//! Username uniqueness is not enforced here; [`seed_admin`] is the only caller
//! that checks for an existing account first.

use crate::{
    entities::{Admin, admin},
    errors::Result,
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::info;

/// Fields supplied by the caller when creating an admin
#[derive(Debug, Clone, Deserialize)]
pub struct NewAdmin {
    /// Login name
    pub username: String,
    /// Password, stored as supplied
    pub password: String,
}

/// Finds an admin by ID.
pub async fn get_admin<C>(db: &C, id: i64) -> Result<Option<admin::Model>>
where
    C: ConnectionTrait,
{
    Admin::find_by_id(id).one(db).await.map_err(Into::into)
}

/// Finds the first admin (lowest ID) with the given username.
pub async fn get_admin_by_username<C>(db: &C, username: &str) -> Result<Option<admin::Model>>
where
    C: ConnectionTrait,
{
    Admin::find()
        .filter(admin::Column::Username.eq(username))
        .order_by_asc(admin::Column::Id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Stores a new admin under the next ID and returns the full record.
pub async fn create_admin<C>(db: &C, new_admin: NewAdmin) -> Result<admin::Model>
where
    C: ConnectionTrait,
{
    let model = admin::ActiveModel {
        username: Set(new_admin.username),
        password: Set(new_admin.password),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Created admin {} ({})", model.id, model.username);
    Ok(model)
}

/// Creates the bootstrap admin unless an admin with that username already exists.
pub async fn seed_admin<C>(db: &C, seed: NewAdmin) -> Result<admin::Model>
where
    C: ConnectionTrait,
{
    if let Some(existing) = get_admin_by_username(db, &seed.username).await? {
        info!("Admin {} already present, skipping seed", existing.username);
        return Ok(existing);
    }
    create_admin(db, seed).await
}
