//! Reseller entity - Accounts that spend credits to mint license keys.
//!
//! Resellers are never deleted; `is_active` suspends or reinstates them while
//! keeping their key history intact.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Reseller database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "resellers")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier, assigned in insertion order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login name. Uniqueness is checked by the registration flow, not the table.
    pub username: String,
    /// Stored as supplied; hashing is the caller's concern
    pub password: String,
    /// Credit balance. Only ever changed by a signed delta and may go negative
    /// if a caller skips the affordability check.
    pub credits: i64,
    /// When the reseller redeemed their referral token
    pub registration_date: DateTimeUtc,
    /// Suspended resellers have `is_active = false`
    pub is_active: bool,
    /// The referral token consumed at registration
    pub referral_token: String,
}

/// Defines relationships between Reseller and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One reseller owns many license keys
    #[sea_orm(has_many = "super::license_key::Entity")]
    LicenseKeys,
}

impl Related<super::license_key::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LicenseKeys.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
