//! Referral token entity - Single-use codes that gate reseller registration.
//!
//! A token moves from unused to used exactly once. Once `is_used` is set,
//! `used_by` holds the redeeming username and neither field changes again.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Referral token database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tokens")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier, assigned in insertion order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Token string in the form `REF-XXXXXXXXXX`
    #[sea_orm(unique)]
    pub token: String,
    /// When the admin issued the token
    pub created_at: DateTimeUtc,
    /// Username of the reseller who redeemed the token, if any
    pub used_by: Option<String>,
    /// Whether the token has been redeemed
    pub is_used: bool,
}

/// Tokens are referenced by value from resellers, not by relation
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
