//! Unified error types for the reseller key store.
//!
//! Absence is never an error here: lookups return `Option` and removals return
//! `bool`. The variants below cover infrastructure failures and the checks the
//! validation helpers and composite flows perform before touching the store.

use thiserror::Error;

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what went wrong
        message: String,
    },

    /// Underlying `SeaORM` / `SQLite` failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Game name outside the supported set
    #[error("Invalid game: {value}")]
    InvalidGame {
        /// The rejected input
        value: String,
    },

    /// Validity period in days must be positive
    #[error("Invalid number of days: {days}")]
    InvalidDays {
        /// The rejected input
        days: i64,
    },

    /// Amount (credits, device limit, identifier) must be positive
    #[error("Invalid amount for {field}: {amount}")]
    InvalidAmount {
        /// Name of the rejected field
        field: &'static str,
        /// The rejected value
        amount: i64,
    },

    /// Applying a credit delta would overflow the balance
    #[error("Credit change of {delta} would overflow reseller {reseller_id}'s balance")]
    CreditOverflow {
        /// The reseller whose balance was left unchanged
        reseller_id: i64,
        /// The rejected delta
        delta: i64,
    },

    /// Required text field was empty
    #[error("{field} is required")]
    MissingField {
        /// Name of the empty field
        field: &'static str,
    },

    /// Could not produce a token string that is not already in use
    #[error("Failed to generate a unique token after {attempts} attempts")]
    TokenGeneration {
        /// How many candidates were tried
        attempts: usize,
    },

    /// Referral token does not exist or was already redeemed
    #[error("Referral token {token} is invalid or already used")]
    TokenUnavailable {
        /// The token string presented
        token: String,
    },

    /// A reseller with this username already exists
    #[error("Username {username} is already taken")]
    UsernameTaken {
        /// The requested username
        username: String,
    },
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
