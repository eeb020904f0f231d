//! Database configuration module for the reseller key store.
//!
//! The store keeps its collections in an embedded `SQLite` database opened through
//! `SeaORM`. By default the database lives in memory for the lifetime of the
//! process; `DATABASE_URL` may point at a file instead. Tables are generated from
//! the entity definitions with `Schema::create_table_from_entity`, so the schema
//! always matches the Rust structs.

use crate::entities::{Admin, Device, LicenseKey, Reseller, Token};
use crate::errors::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use std::time::Duration;
use tracing::{debug, info};

/// Database used when `DATABASE_URL` is not set
pub const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";

// An in-memory database disappears with its last connection.
const IN_MEMORY_CONNECTION_LIFETIME: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// Gets the database URL from the environment or returns the in-memory default.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Opens a connection to `database_url`.
///
/// In-memory databases are pinned to a single long-lived pooled connection so
/// that every caller sees the same data and writes are serialised.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options.sqlx_logging(false);

    if database_url.contains(":memory:") || database_url.contains("mode=memory") {
        debug!("Pinning in-memory database to a single connection");
        options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(IN_MEMORY_CONNECTION_LIFETIME)
            .max_lifetime(IN_MEMORY_CONNECTION_LIFETIME);
    }

    let db = Database::connect(options).await?;
    info!("Connected to database at {}", database_url);
    Ok(db)
}

/// Creates the admins, tokens, resellers, keys and devices tables.
///
/// Parents are created before children so the foreign keys on
/// `keys.reseller_id` and `devices.key_id` resolve.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let admin_table = schema.create_table_from_entity(Admin);
    let token_table = schema.create_table_from_entity(Token);
    let reseller_table = schema.create_table_from_entity(Reseller);
    let key_table = schema.create_table_from_entity(LicenseKey);
    let device_table = schema.create_table_from_entity(Device);

    db.execute(builder.build(&admin_table)).await?;
    db.execute(builder.build(&token_table)).await?;
    db.execute(builder.build(&reseller_table)).await?;
    db.execute(builder.build(&key_table)).await?;
    db.execute(builder.build(&device_table)).await?;

    debug!("Store tables created");
    Ok(())
}
