//! License key entity - Keys minted by resellers for a specific game.
//!
//! A key is created active and can only ever move to revoked. Expiry is not a
//! stored transition: [`Model::status_at`] derives it from `expiry_date` at read
//! time, so no row changes when a key runs out.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::errors::Error;

/// Games a key can be minted for
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum Game {
    /// PUBG Mobile
    #[sea_orm(string_value = "PUBG MOBILE")]
    #[serde(rename = "PUBG MOBILE")]
    PubgMobile,
    /// Last Island of Survival
    #[sea_orm(string_value = "LAST ISLAND OF SURVIVAL")]
    #[serde(rename = "LAST ISLAND OF SURVIVAL")]
    LastIslandOfSurvival,
    /// Standoff 2
    #[sea_orm(string_value = "STANDOFF2")]
    #[serde(rename = "STANDOFF2")]
    Standoff2,
}

impl Game {
    /// Wire name of the game, exactly as clients send it
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PubgMobile => "PUBG MOBILE",
            Self::LastIslandOfSurvival => "LAST ISLAND OF SURVIVAL",
            Self::Standoff2 => "STANDOFF2",
        }
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Game {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "PUBG MOBILE" => Ok(Self::PubgMobile),
            "LAST ISLAND OF SURVIVAL" => Ok(Self::LastIslandOfSurvival),
            "STANDOFF2" => Ok(Self::Standoff2),
            other => Err(Error::InvalidGame {
                value: other.to_string(),
            }),
        }
    }
}

/// Status of a key as seen at a given instant
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyStatus {
    /// Not revoked and not yet expired
    Active,
    /// Not revoked, but `expiry_date` is at or before the query time
    Expired,
    /// Revoked by its owner or an admin; terminal
    Revoked,
}

/// License key database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "keys")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier, assigned in insertion order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// The key handed to the end user
    #[sea_orm(unique)]
    pub key_string: String,
    /// Game the key unlocks
    pub game: Game,
    /// ID of the reseller who minted the key
    pub reseller_id: i64,
    /// When the key was minted
    pub created_at: DateTimeUtc,
    /// The key is active strictly before this instant
    pub expiry_date: DateTimeUtc,
    /// Maximum number of devices that may bind to this key
    pub device_limit: i32,
    /// Once set, never cleared
    pub is_revoked: bool,
}

impl Model {
    /// A key is active iff it is not revoked and `now` is strictly before its expiry.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked && self.expiry_date > now
    }

    /// Derives the key's status at `now`. Revocation wins over expiry.
    #[must_use]
    pub fn status_at(&self, now: DateTime<Utc>) -> KeyStatus {
        if self.is_revoked {
            KeyStatus::Revoked
        } else if self.expiry_date > now {
            KeyStatus::Active
        } else {
            KeyStatus::Expired
        }
    }
}

/// Defines relationships between `LicenseKey` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each key belongs to one reseller
    #[sea_orm(
        belongs_to = "super::reseller::Entity",
        from = "Column::ResellerId",
        to = "super::reseller::Column::Id"
    )]
    Reseller,
    /// One key has many bound devices
    #[sea_orm(has_many = "super::device::Entity")]
    Devices,
}

impl Related<super::reseller::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reseller.def()
    }
}

impl Related<super::device::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Devices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
