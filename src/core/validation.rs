//! Request validation helpers used in front of the store.
//!
//! The store trusts its inputs. These helpers turn raw request payloads into the
//! resolved records the store expects, rejecting unknown games, non-positive
//! amounts and empty identifiers on the way.

use crate::{
    core::key::NewKey,
    entities::Game,
    errors::{Error, Result},
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

/// Raw key creation request as received from a reseller
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyRequest {
    /// The key handed to the end user
    pub key_string: String,
    /// Game name as sent by the client
    pub game: String,
    /// Owning reseller
    pub reseller_id: i64,
    /// Explicit expiry; takes precedence over `days`
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,
    /// Validity period counted from now
    #[serde(default)]
    pub days: Option<i64>,
    /// Maximum number of devices that may bind
    pub device_limit: i32,
}

impl KeyRequest {
    /// Resolves the request into a [`NewKey`].
    ///
    /// Expiry is the explicit date if given, else `now + days`, else
    /// `now + default_days`.
    pub fn resolve(self, now: DateTime<Utc>, default_days: i64) -> Result<NewKey> {
        require_non_empty("keyString", &self.key_string)?;
        let game: Game = self.game.parse()?;
        require_positive("deviceLimit", i64::from(self.device_limit))?;

        let expiry_date = match (self.expiry_date, self.days) {
            (Some(date), _) => date,
            (None, Some(days)) => expiry_after(now, days)?,
            (None, None) => expiry_after(now, default_days)?,
        };

        Ok(NewKey {
            key_string: self.key_string,
            game,
            reseller_id: self.reseller_id,
            expiry_date,
            device_limit: self.device_limit,
        })
    }
}

/// `now + days`, rejecting non-positive counts and dates past chrono's range.
pub fn expiry_after(now: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>> {
    if days <= 0 {
        return Err(Error::InvalidDays { days });
    }
    Duration::try_days(days)
        .and_then(|period| now.checked_add_signed(period))
        .ok_or(Error::InvalidDays { days })
}

/// Admin request to grant credits to a reseller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCredits {
    /// Reseller receiving the credits
    pub reseller_id: i64,
    /// Credits to add
    pub amount: i64,
}

impl AddCredits {
    /// Both the reseller ID and the amount must be positive.
    pub fn validate(self) -> Result<Self> {
        require_positive("resellerId", self.reseller_id)?;
        require_positive("amount", self.amount)?;
        Ok(self)
    }
}

/// Client request to verify a key and bind its device
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyVerification {
    /// Key string presented by the client
    pub key: String,
    /// Client device identifier
    pub device_id: String,
    /// Game name as sent by the client
    pub game: String,
}

/// A [`KeyVerification`] whose fields have been checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedRequest {
    /// Key string presented by the client
    pub key: String,
    /// Client device identifier
    pub device_id: String,
    /// Parsed game
    pub game: Game,
}

impl KeyVerification {
    /// Key and device ID must be non-empty and the game must be supported.
    pub fn validate(self) -> Result<VerifiedRequest> {
        require_non_empty("key", &self.key)?;
        require_non_empty("deviceId", &self.device_id)?;
        let game = self.game.parse()?;
        Ok(VerifiedRequest {
            key: self.key,
            device_id: self.device_id,
            game,
        })
    }
}

fn require_non_empty(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::MissingField { field });
    }
    Ok(())
}

fn require_positive(field: &'static str, amount: i64) -> Result<()> {
    if amount <= 0 {
        return Err(Error::InvalidAmount { field, amount });
    }
    Ok(())
}
