//! Admin entity - Accounts allowed to issue referral tokens and grant credits.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Admin database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "admins")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier, assigned in insertion order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login name. Not unique at the table level; callers check before inserting.
    pub username: String,
    /// Stored as supplied; hashing is the caller's concern
    pub password: String,
}

/// Admins have no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
