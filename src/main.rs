use dotenvy::dotenv;
use reseller_keystore::{
    config::{database, settings},
    core::admin::NewAdmin,
    errors::Result,
    mirror::spawn_json_mirror,
    store::Store,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load settings
    let app_config = settings::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;

    // 4. Open the database and create the tables
    let database_url = database::get_database_url();
    let db = database::create_connection(&database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Build the store, with the mirror worker if enabled
    let mut store = Store::new(db).with_default_key_days(app_config.keys.default_days);
    let mirror_handle = if app_config.mirror.enabled {
        let (sender, handle) = spawn_json_mirror(app_config.mirror.data_dir.clone());
        store = store.with_mirror(sender);
        Some(handle)
    } else {
        info!("Mirror disabled");
        None
    };

    // 6. Seed the bootstrap admin
    let admin = store
        .bootstrap(NewAdmin {
            username: app_config.admin.username.clone(),
            password: app_config.admin.password.clone(),
        })
        .await?;
    info!("Bootstrap admin ready: {}", admin.username);

    let stats = store.get_stats().await?;
    info!(
        "Store ready: {} resellers, {} active keys, {} available tokens",
        stats.total_resellers, stats.active_keys, stats.available_tokens
    );

    // 7. Serve until interrupted, then let the mirror drain
    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    drop(store);
    if let Some(handle) = mirror_handle {
        if let Err(e) = handle.await {
            error!("Mirror worker ended abnormally: {}", e);
        }
    }

    Ok(())
}
