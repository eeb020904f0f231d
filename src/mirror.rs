//! Per-reseller JSON mirror.
//!
//! The store announces reseller and key creation as [`MirrorEvent`]s on an
//! unbounded channel once the in-memory commit is done. A background task
//! turns them into one `<username>.json` document per reseller:
//!
//! ```json
//! { "resellerId": 1, "username": "bob", "keys": [ { "keyString": "K1", ... } ] }
//! ```
//!
//! The documents are write-only. Nothing reads them back, and every failure is
//! logged and dropped so it can never affect the store.

use crate::entities::{Game, license_key};
use crate::errors::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Something the mirror should record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorEvent {
    /// A reseller was created; start an empty document
    ResellerCreated {
        /// ID of the new reseller
        reseller_id: i64,
        /// Username, also the document's file stem
        username: String,
    },
    /// A key was created; append it to its owner's document
    KeyCreated {
        /// Username of the key's owner
        username: String,
        /// The stored key
        key: license_key::Model,
    },
}

/// One reseller's mirror document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResellerDocument {
    /// ID of the reseller
    pub reseller_id: i64,
    /// Username of the reseller
    pub username: String,
    /// Keys in creation order
    pub keys: Vec<MirroredKey>,
}

/// A key as written to the mirror, dates in ISO-8601
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MirroredKey {
    /// Key ID
    pub id: i64,
    /// The key handed to the end user
    pub key_string: String,
    /// Game the key unlocks
    pub game: Game,
    /// Owning reseller
    pub reseller_id: i64,
    /// When the key was minted
    pub created_at: DateTime<Utc>,
    /// When the key stops being active
    pub expiry_date: DateTime<Utc>,
    /// Maximum number of bound devices
    pub device_limit: i32,
    /// Revocation flag as of creation
    pub is_revoked: bool,
}

impl From<license_key::Model> for MirroredKey {
    fn from(key: license_key::Model) -> Self {
        Self {
            id: key.id,
            key_string: key.key_string,
            game: key.game,
            reseller_id: key.reseller_id,
            created_at: key.created_at,
            expiry_date: key.expiry_date,
            device_limit: key.device_limit,
            is_revoked: key.is_revoked,
        }
    }
}

/// Sending half of the mirror channel held by the store
#[derive(Debug, Clone)]
pub struct MirrorSender {
    tx: mpsc::UnboundedSender<MirrorEvent>,
}

impl MirrorSender {
    /// Wraps an existing channel sender
    #[must_use]
    pub const fn new(tx: mpsc::UnboundedSender<MirrorEvent>) -> Self {
        Self { tx }
    }

    /// Queues an event. A stopped worker is logged, never reported to the caller.
    pub fn notify(&self, event: MirrorEvent) {
        if let Err(e) = self.tx.send(event) {
            warn!("Mirror worker is gone, dropping event: {:?}", e.0);
        }
    }
}

/// Starts the mirror worker writing documents under `data_dir`.
///
/// The worker runs until every [`MirrorSender`] is dropped, then drains the
/// remaining events and exits; await the handle to wait for that.
#[must_use]
pub fn spawn_json_mirror(data_dir: PathBuf) -> (MirrorSender, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(run_mirror(data_dir, rx));
    (MirrorSender::new(tx), handle)
}

async fn run_mirror(data_dir: PathBuf, mut rx: mpsc::UnboundedReceiver<MirrorEvent>) {
    info!("Mirror worker writing to {}", data_dir.display());
    while let Some(event) = rx.recv().await {
        if let Err(e) = apply_event(&data_dir, &event).await {
            error!("Failed to mirror {:?}: {}", event, e);
        }
    }
    debug!("Mirror worker stopped");
}

/// Applies one event to the documents under `data_dir`.
pub async fn apply_event(data_dir: &Path, event: &MirrorEvent) -> Result<()> {
    match event {
        MirrorEvent::ResellerCreated {
            reseller_id,
            username,
        } => {
            let Some(path) = document_path(data_dir, username) else {
                warn!("Not mirroring reseller with unsafe username {:?}", username);
                return Ok(());
            };
            tokio::fs::create_dir_all(data_dir).await?;
            let document = ResellerDocument {
                reseller_id: *reseller_id,
                username: username.clone(),
                keys: Vec::new(),
            };
            write_document(&path, &document).await?;
            info!("Created key file for reseller: {}", username);
        }
        MirrorEvent::KeyCreated { username, key } => {
            let Some(path) = document_path(data_dir, username) else {
                warn!("Not mirroring key for unsafe username {:?}", username);
                return Ok(());
            };
            if !tokio::fs::try_exists(&path).await? {
                debug!("No mirror document for {}, skipping key", username);
                return Ok(());
            }
            let contents = tokio::fs::read_to_string(&path).await?;
            let mut document: ResellerDocument = serde_json::from_str(&contents)?;
            document.keys.push(MirroredKey::from(key.clone()));
            write_document(&path, &document).await?;
            info!("Added key to {}'s file: {}", username, key.key_string);
        }
    }
    Ok(())
}

async fn write_document(path: &Path, document: &ResellerDocument) -> Result<()> {
    let json = serde_json::to_string_pretty(document)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

/// `<data_dir>/<username>.json`, or `None` if the username would leave `data_dir`.
fn document_path(data_dir: &Path, username: &str) -> Option<PathBuf> {
    let unsafe_name = username.is_empty()
        || username == "."
        || username == ".."
        || username.contains(['/', '\\', '\0']);
    if unsafe_name {
        return None;
    }
    Some(data_dir.join(format!("{username}.json")))
}
