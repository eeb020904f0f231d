/// Database configuration and connection management
pub mod database;

/// Store settings loaded from config.toml
pub mod settings;
