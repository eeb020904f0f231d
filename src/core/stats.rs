//! Dashboard statistics.
//!
//! Recomputed from scratch on every call; nothing is cached or maintained
//! incrementally.

use crate::{
    entities::{LicenseKey, Reseller, Token, license_key, token},
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::{PaginatorTrait, prelude::*};
use serde::Serialize;

/// Aggregate counts shown on the admin dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// All resellers, suspended ones included
    pub total_resellers: u64,
    /// Keys that are neither revoked nor expired
    pub active_keys: u64,
    /// Tokens not yet redeemed
    pub available_tokens: u64,
}

/// Computes the dashboard counts as of `now`.
pub async fn get_stats_at<C>(db: &C, now: DateTime<Utc>) -> Result<Stats>
where
    C: ConnectionTrait,
{
    let total_resellers = Reseller::find().count(db).await?;

    // Expiry is compared in Rust: SQLite stores the dates as text
    let unrevoked = LicenseKey::find()
        .filter(license_key::Column::IsRevoked.eq(false))
        .all(db)
        .await?;
    let active_keys = unrevoked.iter().filter(|k| k.is_active_at(now)).count() as u64;

    let available_tokens = Token::find()
        .filter(token::Column::IsUsed.eq(false))
        .count(db)
        .await?;

    Ok(Stats {
        total_resellers,
        active_keys,
        available_tokens,
    })
}

/// Computes the dashboard counts as of the current time.
pub async fn get_stats<C>(db: &C) -> Result<Stats>
where
    C: ConnectionTrait,
{
    get_stats_at(db, Utc::now()).await
}
