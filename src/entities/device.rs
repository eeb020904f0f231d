//! Device entity - A client device bound to a license key.
//!
//! Each row counts against the owning key's `device_limit`. The limit itself is
//! checked by the binding flow before a row is inserted.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Device database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "devices")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier, assigned in insertion order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the license key this device is bound to
    pub key_id: i64,
    /// External identifier reported by the client
    pub device_id: String,
    /// When the device first bound to the key
    pub first_connected: DateTimeUtc,
}

/// Defines relationships between Device and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each device belongs to one license key
    #[sea_orm(
        belongs_to = "super::license_key::Entity",
        from = "Column::KeyId",
        to = "super::license_key::Column::Id"
    )]
    LicenseKey,
}

impl Related<super::license_key::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LicenseKey.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
