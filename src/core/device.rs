//! Device business logic - Binding and unbinding client devices to keys.
//!
//! The store does not check a key's device limit when inserting; the binding
//! flow in [`crate::core::binding`] does that before calling [`add_device`].

use crate::{
    entities::{Device, device},
    errors::Result,
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::{debug, info};

/// Fields supplied by the caller when binding a device
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDevice {
    /// Key the device binds to
    pub key_id: i64,
    /// External device identifier
    pub device_id: String,
}

/// Stores a new device binding, first connected now.
pub async fn add_device<C>(db: &C, new_device: NewDevice) -> Result<device::Model>
where
    C: ConnectionTrait,
{
    let model = device::ActiveModel {
        key_id: Set(new_device.key_id),
        device_id: Set(new_device.device_id),
        first_connected: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Bound device {} to key {}", model.device_id, model.key_id);
    Ok(model)
}

/// All devices bound to a key, in insertion order.
pub async fn get_devices_by_key_id<C>(db: &C, key_id: i64) -> Result<Vec<device::Model>>
where
    C: ConnectionTrait,
{
    Device::find()
        .filter(device::Column::KeyId.eq(key_id))
        .order_by_asc(device::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds the earliest binding of `device_id` to `key_id`.
pub async fn find_device<C>(db: &C, device_id: &str, key_id: i64) -> Result<Option<device::Model>>
where
    C: ConnectionTrait,
{
    Device::find()
        .filter(device::Column::DeviceId.eq(device_id))
        .filter(device::Column::KeyId.eq(key_id))
        .order_by_asc(device::Column::Id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Unbinds `device_id` from `key_id`.
///
/// Removes exactly one matching row and returns `true`, or returns `false`
/// and leaves the collection untouched when nothing matches.
pub async fn remove_device<C>(db: &C, device_id: &str, key_id: i64) -> Result<bool>
where
    C: ConnectionTrait,
{
    let Some(device) = find_device(db, device_id, key_id).await? else {
        debug!("No device {} bound to key {}", device_id, key_id);
        return Ok(false);
    };

    let result = Device::delete_by_id(device.id).exec(db).await?;
    if result.rows_affected > 0 {
        info!("Unbound device {} from key {}", device_id, key_id);
    }
    Ok(result.rows_affected > 0)
}
