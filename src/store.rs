//! The store handle.
//!
//! [`Store`] is built once at startup and passed to every consumer. It owns the
//! database connection and an optional [`MirrorSender`]. Each mutation commits to
//! the database first and only then notifies the mirror, so a failing mirror can
//! neither block nor undo a write.

use crate::{
    config::settings::AppConfig,
    core::{
        admin::{self, NewAdmin},
        binding::{self, BindOutcome},
        device::{self, NewDevice},
        key::{self, NewKey},
        reseller::{self, NewReseller},
        stats::{self, Stats},
        token,
        validation::{AddCredits, KeyRequest, KeyVerification},
    },
    entities::{AdminModel, DeviceModel, LicenseKeyModel, ResellerModel, TokenModel},
    errors::Result,
    mirror::{MirrorEvent, MirrorSender},
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use tracing::{instrument, warn};

/// Handle over the admin, token, reseller, key and device collections
#[derive(Debug, Clone)]
pub struct Store {
    db: DatabaseConnection,
    mirror: Option<MirrorSender>,
    default_key_days: i64,
}

impl Store {
    /// Wraps a connection whose tables already exist. No mirror is attached.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            mirror: None,
            default_key_days: AppConfig::default().keys.default_days,
        }
    }

    /// Attaches a mirror that receives reseller and key creation events
    #[must_use]
    pub fn with_mirror(mut self, mirror: MirrorSender) -> Self {
        self.mirror = Some(mirror);
        self
    }

    /// Overrides the validity period used for key requests without an expiry
    #[must_use]
    pub const fn with_default_key_days(mut self, days: i64) -> Self {
        self.default_key_days = days;
        self
    }

    /// The underlying connection
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Seeds the configured admin if it is not present yet.
    #[instrument(skip(self, seed), fields(username = %seed.username))]
    pub async fn bootstrap(&self, seed: NewAdmin) -> Result<AdminModel> {
        admin::seed_admin(&self.db, seed).await
    }

    // --- Admins ---

    /// Finds an admin by ID.
    pub async fn get_admin(&self, id: i64) -> Result<Option<AdminModel>> {
        admin::get_admin(&self.db, id).await
    }

    /// Finds the first admin with the given username.
    pub async fn get_admin_by_username(&self, username: &str) -> Result<Option<AdminModel>> {
        admin::get_admin_by_username(&self.db, username).await
    }

    /// Stores a new admin.
    pub async fn create_admin(&self, new_admin: NewAdmin) -> Result<AdminModel> {
        admin::create_admin(&self.db, new_admin).await
    }

    // --- Referral tokens ---

    /// Issues a fresh unused referral token.
    pub async fn create_token(&self) -> Result<TokenModel> {
        token::create_token(&self.db).await
    }

    /// Every token, used or not, in issue order.
    pub async fn get_all_tokens(&self) -> Result<Vec<TokenModel>> {
        token::get_all_tokens(&self.db).await
    }

    /// Finds a token by its exact string.
    pub async fn get_token(&self, token_string: &str) -> Result<Option<TokenModel>> {
        token::get_token(&self.db, token_string).await
    }

    /// Redeems a token for `username`; `None` if it is unknown or already used.
    pub async fn use_token(&self, token_string: &str, username: &str) -> Result<Option<TokenModel>> {
        token::use_token(&self.db, token_string, username).await
    }

    // --- Resellers ---

    /// Finds a reseller by ID.
    pub async fn get_reseller(&self, id: i64) -> Result<Option<ResellerModel>> {
        reseller::get_reseller(&self.db, id).await
    }

    /// Finds the first reseller with the given username.
    pub async fn get_reseller_by_username(&self, username: &str) -> Result<Option<ResellerModel>> {
        reseller::get_reseller_by_username(&self.db, username).await
    }

    /// Every reseller in registration order.
    pub async fn get_all_resellers(&self) -> Result<Vec<ResellerModel>> {
        reseller::get_all_resellers(&self.db).await
    }

    /// Creates a reseller and starts its mirror document.
    pub async fn create_reseller(&self, new_reseller: NewReseller) -> Result<ResellerModel> {
        let created = reseller::create_reseller(&self.db, new_reseller).await?;
        self.mirror_reseller(&created);
        Ok(created)
    }

    /// Checked registration: unique username, token consumed, reseller created.
    pub async fn register_reseller(&self, new_reseller: NewReseller) -> Result<ResellerModel> {
        let created = reseller::register_reseller(&self.db, new_reseller).await?;
        self.mirror_reseller(&created);
        Ok(created)
    }

    /// Applies a signed credit delta; `None` if the reseller does not exist.
    pub async fn update_reseller_credits(
        &self,
        id: i64,
        delta: i64,
    ) -> Result<Option<ResellerModel>> {
        reseller::update_reseller_credits(&self.db, id, delta).await
    }

    /// Suspends or reinstates a reseller.
    pub async fn update_reseller_status(
        &self,
        id: i64,
        is_active: bool,
    ) -> Result<Option<ResellerModel>> {
        reseller::update_reseller_status(&self.db, id, is_active).await
    }

    /// Validates an admin credit grant, then adds it to the reseller's balance.
    pub async fn add_credits(&self, request: AddCredits) -> Result<Option<ResellerModel>> {
        let request = request.validate()?;
        reseller::update_reseller_credits(&self.db, request.reseller_id, request.amount).await
    }

    // --- License keys ---

    /// Creates a key and appends it to its owner's mirror document.
    pub async fn create_key(&self, new_key: NewKey) -> Result<LicenseKeyModel> {
        let created = key::create_key(&self.db, new_key).await?;

        if let Some(mirror) = &self.mirror {
            match reseller::get_reseller(&self.db, created.reseller_id).await {
                Ok(Some(owner)) => mirror.notify(MirrorEvent::KeyCreated {
                    username: owner.username,
                    key: created.clone(),
                }),
                Ok(None) => warn!("Key {} has no owner to mirror to", created.key_string),
                Err(e) => warn!("Could not look up owner of key {}: {}", created.key_string, e),
            }
        }

        Ok(created)
    }

    /// Validates a raw request, resolving its expiry, then creates the key.
    pub async fn create_key_from_request(&self, request: KeyRequest) -> Result<LicenseKeyModel> {
        let new_key = request.resolve(Utc::now(), self.default_key_days)?;
        self.create_key(new_key).await
    }

    /// Finds a key by its key string.
    pub async fn get_key(&self, key_string: &str) -> Result<Option<LicenseKeyModel>> {
        key::get_key(&self.db, key_string).await
    }

    /// Keys minted by one reseller.
    pub async fn get_keys_by_reseller_id(&self, reseller_id: i64) -> Result<Vec<LicenseKeyModel>> {
        key::get_keys_by_reseller_id(&self.db, reseller_id).await
    }

    /// Every key in creation order.
    pub async fn get_all_keys(&self) -> Result<Vec<LicenseKeyModel>> {
        key::get_all_keys(&self.db).await
    }

    /// Revokes a key. Revoking twice is harmless.
    pub async fn revoke_key(&self, id: i64) -> Result<Option<LicenseKeyModel>> {
        key::revoke_key(&self.db, id).await
    }

    // --- Devices ---

    /// Binds a device to a key without checking the device limit.
    pub async fn add_device(&self, new_device: NewDevice) -> Result<DeviceModel> {
        device::add_device(&self.db, new_device).await
    }

    /// Devices bound to a key.
    pub async fn get_devices_by_key_id(&self, key_id: i64) -> Result<Vec<DeviceModel>> {
        device::get_devices_by_key_id(&self.db, key_id).await
    }

    /// Unbinds the earliest matching device; `false` if none matched.
    pub async fn remove_device(&self, device_id: &str, key_id: i64) -> Result<bool> {
        device::remove_device(&self.db, device_id, key_id).await
    }

    /// Validates a verification request and binds the device if the key allows it.
    pub async fn verify_key(&self, request: KeyVerification) -> Result<BindOutcome> {
        let request = request.validate()?;
        binding::verify_and_bind(&self.db, &request, Utc::now()).await
    }

    // --- Stats ---

    /// Dashboard counts as of now.
    pub async fn get_stats(&self) -> Result<Stats> {
        stats::get_stats(&self.db).await
    }

    fn mirror_reseller(&self, created: &ResellerModel) {
        if let Some(mirror) = &self.mirror {
            mirror.notify(MirrorEvent::ResellerCreated {
                reseller_id: created.id,
                username: created.username.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::token::insert_token;
    use crate::entities::Game;
    use crate::errors::Error;
    use crate::mirror::{ResellerDocument, spawn_json_mirror};
    use crate::test_utils::{init_test_tracing, setup_test_db};
    use chrono::Duration;

    #[tokio::test]
    async fn test_end_to_end_reseller_flow() -> Result<()> {
        init_test_tracing();
        let store = Store::new(setup_test_db().await?);
        insert_token(store.connection(), "REF-ABC1234567".to_string()).await?;

        let token = store.use_token("REF-ABC1234567", "bob").await?.unwrap();
        assert!(token.is_used);
        assert!(store.use_token("REF-ABC1234567", "bob").await?.is_none());

        let bob = store
            .create_reseller(NewReseller {
                username: "bob".to_string(),
                password: "x".to_string(),
                referral_token: "REF-ABC1234567".to_string(),
            })
            .await?;

        let bob = store.update_reseller_credits(bob.id, 50).await?.unwrap();
        assert_eq!(bob.credits, 50);

        let key = store
            .create_key(NewKey {
                key_string: "K1".to_string(),
                game: Game::Standoff2,
                reseller_id: bob.id,
                expiry_date: Utc::now() + Duration::days(30),
                device_limit: 2,
            })
            .await?;

        let keys = store.get_keys_by_reseller_id(bob.id).await?;
        assert_eq!(keys.len(), 1);
        assert!(!keys[0].is_revoked);

        for device_id in ["D1", "D2"] {
            store
                .add_device(NewDevice {
                    key_id: key.id,
                    device_id: device_id.to_string(),
                })
                .await?;
        }
        assert_eq!(store.get_devices_by_key_id(key.id).await?.len(), 2);

        assert!(store.remove_device("D1", key.id).await?);
        let remaining = store.get_devices_by_key_id(key.id).await?;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].device_id, "D2");

        let stats = store.get_stats().await?;
        assert_eq!(stats.total_resellers, 1);
        assert_eq!(stats.active_keys, 1);
        assert_eq!(stats.available_tokens, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_credits_validates_before_applying() -> Result<()> {
        let store = Store::new(setup_test_db().await?);
        let bob = store
            .create_reseller(NewReseller {
                username: "bob".to_string(),
                password: "x".to_string(),
                referral_token: "REF-UNCHECKED0".to_string(),
            })
            .await?;

        let granted = store
            .add_credits(AddCredits {
                reseller_id: bob.id,
                amount: 25,
            })
            .await?
            .unwrap();
        assert_eq!(granted.credits, 25);

        for amount in [0, -5] {
            let rejected = store
                .add_credits(AddCredits {
                    reseller_id: bob.id,
                    amount,
                })
                .await;
            assert!(matches!(
                rejected,
                Err(Error::InvalidAmount {
                    field: "amount",
                    ..
                })
            ));
        }
        assert_eq!(store.get_reseller(bob.id).await?.unwrap().credits, 25);

        let missing = store
            .add_credits(AddCredits {
                reseller_id: 999,
                amount: 5,
            })
            .await?;
        assert!(missing.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_bootstrap_seeds_default_admin_once() -> Result<()> {
        let store = Store::new(setup_test_db().await?);
        let seed = || NewAdmin {
            username: "admin".to_string(),
            password: "admin123".to_string(),
        };

        let admin = store.bootstrap(seed()).await?;
        store.bootstrap(seed()).await?;

        assert_eq!(store.get_admin(admin.id).await?, Some(admin.clone()));
        assert_eq!(store.get_admin_by_username("admin").await?, Some(admin));
        Ok(())
    }

    #[tokio::test]
    async fn test_mirror_receives_resellers_and_keys() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (sender, handle) = spawn_json_mirror(dir.path().to_path_buf());
        let store = Store::new(setup_test_db().await?).with_mirror(sender);

        let token = store.create_token().await?;
        let bob = store
            .register_reseller(NewReseller {
                username: "bob".to_string(),
                password: "x".to_string(),
                referral_token: token.token,
            })
            .await?;
        store
            .create_key_from_request(KeyRequest {
                key_string: "K1".to_string(),
                game: "STANDOFF2".to_string(),
                reseller_id: bob.id,
                expiry_date: None,
                days: None,
                device_limit: 1,
            })
            .await?;

        drop(store);
        handle.await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("bob.json"))?;
        let document: ResellerDocument = serde_json::from_str(&raw)?;
        assert_eq!(document.reseller_id, bob.id);
        assert_eq!(document.keys.len(), 1);
        assert_eq!(document.keys[0].key_string, "K1");
        assert_eq!(document.keys[0].game, Game::Standoff2);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_mirror_does_not_affect_writes() -> Result<()> {
        let dir = tempfile::tempdir()?;
        // A regular file where the data directory should be makes every write fail
        let blocked = dir.path().join("blocked");
        std::fs::write(&blocked, b"")?;

        let (sender, handle) = spawn_json_mirror(blocked);
        let store = Store::new(setup_test_db().await?).with_mirror(sender);

        let bob = store
            .create_reseller(NewReseller {
                username: "bob".to_string(),
                password: "x".to_string(),
                referral_token: "REF-UNCHECKED0".to_string(),
            })
            .await?;
        assert_eq!(store.get_reseller(bob.id).await?, Some(bob));

        drop(store);
        handle.await.unwrap();
        Ok(())
    }

    #[tokio::test]
    async fn test_create_key_from_request_applies_default_days() -> Result<()> {
        let store = Store::new(setup_test_db().await?).with_default_key_days(10);
        let bob = store
            .create_reseller(NewReseller {
                username: "bob".to_string(),
                password: "x".to_string(),
                referral_token: "REF-UNCHECKED0".to_string(),
            })
            .await?;

        let before = Utc::now();
        let key = store
            .create_key_from_request(KeyRequest {
                key_string: "K1".to_string(),
                game: "PUBG MOBILE".to_string(),
                reseller_id: bob.id,
                expiry_date: None,
                days: None,
                device_limit: 1,
            })
            .await?;
        let after = Utc::now();

        assert!(key.expiry_date >= before + Duration::days(10));
        assert!(key.expiry_date <= after + Duration::days(10));

        let rejected = store
            .create_key_from_request(KeyRequest {
                key_string: "K2".to_string(),
                game: "TETRIS".to_string(),
                reseller_id: bob.id,
                expiry_date: None,
                days: None,
                device_limit: 1,
            })
            .await;
        assert!(matches!(rejected, Err(Error::InvalidGame { .. })));
        assert!(store.get_key("K2").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_verify_key_binds_and_revocation_blocks() -> Result<()> {
        let store = Store::new(setup_test_db().await?);
        let bob = store
            .create_reseller(NewReseller {
                username: "bob".to_string(),
                password: "x".to_string(),
                referral_token: "REF-UNCHECKED0".to_string(),
            })
            .await?;
        let key = store
            .create_key(NewKey {
                key_string: "K1".to_string(),
                game: Game::LastIslandOfSurvival,
                reseller_id: bob.id,
                expiry_date: Utc::now() + Duration::days(1),
                device_limit: 1,
            })
            .await?;

        let request = || KeyVerification {
            key: "K1".to_string(),
            device_id: "D1".to_string(),
            game: "LAST ISLAND OF SURVIVAL".to_string(),
        };

        assert!(store.verify_key(request()).await?.is_granted());
        assert_eq!(store.get_devices_by_key_id(key.id).await?.len(), 1);

        let revoked = store.revoke_key(key.id).await?.unwrap();
        assert!(revoked.is_revoked);
        assert!(matches!(
            store.verify_key(request()).await?,
            BindOutcome::Revoked { .. }
        ));
        assert_eq!(store.get_stats().await?.active_keys, 0);
        Ok(())
    }
}
