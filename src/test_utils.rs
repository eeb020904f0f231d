//! Shared test utilities for the reseller key store.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    config::database::{create_connection, create_tables},
    core::{
        key::{NewKey, create_key},
        reseller::{NewReseller, create_reseller},
    },
    entities::{Game, license_key, reseller},
    errors::Result,
};
use chrono::{Duration, Utc};
use sea_orm::DatabaseConnection;
use tracing_subscriber::EnvFilter;

/// Installs a test-writer subscriber once; later calls are no-ops.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = create_connection("sqlite::memory:").await?;
    create_tables(&db).await?;
    Ok(db)
}

/// Registration payload with a placeholder token.
///
/// # Defaults
/// * `password`: `"secret"`
/// * `referral_token`: `"REF-TESTTOKEN0"` (not present in the tokens table)
pub fn new_reseller(username: &str) -> NewReseller {
    NewReseller {
        username: username.to_string(),
        password: "secret".to_string(),
        referral_token: "REF-TESTTOKEN0".to_string(),
    }
}

/// Creates a reseller directly, bypassing token redemption.
pub async fn create_test_reseller(
    db: &DatabaseConnection,
    username: &str,
) -> Result<reseller::Model> {
    create_reseller(db, new_reseller(username)).await
}

/// Key payload with sensible defaults.
///
/// # Defaults
/// * `game`: `STANDOFF2`
/// * `expiry_date`: 30 days from now
/// * `device_limit`: 2
pub fn new_key(reseller_id: i64, key_string: &str) -> NewKey {
    NewKey {
        key_string: key_string.to_string(),
        game: Game::Standoff2,
        reseller_id,
        expiry_date: Utc::now() + Duration::days(30),
        device_limit: 2,
    }
}

/// Creates a key with the defaults from [`new_key`].
pub async fn create_test_key(
    db: &DatabaseConnection,
    reseller_id: i64,
    key_string: &str,
) -> Result<license_key::Model> {
    create_key(db, new_key(reseller_id, key_string)).await
}
