//! Entity module - Contains all SeaORM entity definitions for the store.
//! These entities represent the five collections the store manages.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod admin;
pub mod device;
pub mod license_key;
pub mod reseller;
pub mod token;

// Re-export specific types to avoid conflicts
pub use admin::{Column as AdminColumn, Entity as Admin, Model as AdminModel};
pub use device::{Column as DeviceColumn, Entity as Device, Model as DeviceModel};
pub use license_key::{
    Column as LicenseKeyColumn, Entity as LicenseKey, Game, KeyStatus, Model as LicenseKeyModel,
};
pub use reseller::{Column as ResellerColumn, Entity as Reseller, Model as ResellerModel};
pub use token::{Column as TokenColumn, Entity as Token, Model as TokenModel};
