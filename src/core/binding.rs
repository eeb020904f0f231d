//! Key verification and device binding.
//!
//! This is where a key's device limit is enforced: the device count is read and
//! the new binding inserted inside one database transaction. Every refusal is
//! reported as a [`BindOutcome`] rather than an error.

use crate::{
    core::{
        device::{NewDevice, add_device, find_device, get_devices_by_key_id},
        key::get_key,
        validation::VerifiedRequest,
    },
    entities::{KeyStatus, device, license_key},
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::Serialize;
use tracing::{debug, info};

/// Result of verifying a key for a device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BindOutcome {
    /// The device was bound to the key just now
    Bound {
        /// The verified key
        key: license_key::Model,
        /// The new binding
        device: device::Model,
    },
    /// The device was already bound to this key
    AlreadyBound {
        /// The verified key
        key: license_key::Model,
        /// The existing binding
        device: device::Model,
    },
    /// No key with that string exists
    KeyNotFound,
    /// The key exists but was minted for another game
    WrongGame {
        /// The refused key
        key: license_key::Model,
    },
    /// The key has been revoked
    Revoked {
        /// The refused key
        key: license_key::Model,
    },
    /// The key's expiry date has passed
    Expired {
        /// The refused key
        key: license_key::Model,
    },
    /// The key already has `device_limit` devices bound
    DeviceLimitReached {
        /// The refused key
        key: license_key::Model,
    },
}

impl BindOutcome {
    /// Whether the device may use the key
    #[must_use]
    pub const fn is_granted(&self) -> bool {
        matches!(self, Self::Bound { .. } | Self::AlreadyBound { .. })
    }
}

/// Verifies `request` against the key it names and binds the device if allowed.
pub async fn verify_and_bind(
    db: &DatabaseConnection,
    request: &VerifiedRequest,
    now: DateTime<Utc>,
) -> Result<BindOutcome> {
    let txn = db.begin().await?;

    let Some(key) = get_key(&txn, &request.key).await? else {
        debug!("Verification for unknown key {}", request.key);
        return Ok(BindOutcome::KeyNotFound);
    };

    if key.game != request.game {
        return Ok(BindOutcome::WrongGame { key });
    }

    match key.status_at(now) {
        KeyStatus::Revoked => return Ok(BindOutcome::Revoked { key }),
        KeyStatus::Expired => return Ok(BindOutcome::Expired { key }),
        KeyStatus::Active => {}
    }

    if let Some(device) = find_device(&txn, &request.device_id, key.id).await? {
        return Ok(BindOutcome::AlreadyBound { key, device });
    }

    let bound = get_devices_by_key_id(&txn, key.id).await?.len();
    if bound >= usize::try_from(key.device_limit).unwrap_or(0) {
        info!(
            "Key {} refused device {}: limit of {} reached",
            key.key_string, request.device_id, key.device_limit
        );
        return Ok(BindOutcome::DeviceLimitReached { key });
    }

    let device = add_device(
        &txn,
        NewDevice {
            key_id: key.id,
            device_id: request.device_id.clone(),
        },
    )
    .await?;
    txn.commit().await?;

    Ok(BindOutcome::Bound { key, device })
}
