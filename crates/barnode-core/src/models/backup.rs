use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Article, MissingItem};

/// The backup row is a singleton: every snapshot upserts this fixed id, so
/// the store keeps exactly one (the latest) full-state backup.
pub const SINGLETON_BACKUP_ID: Uuid = Uuid::from_u128(1);

/// Full application state captured in one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupPayload {
    pub articles: Vec<Article>,
    pub missing_items: Vec<MissingItem>,
}

impl BackupPayload {
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty() && self.missing_items.is_empty()
    }
}

/// A stored snapshot: payload plus the moment it was taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupSnapshot {
    pub id: Uuid,
    pub payload: BackupPayload,
    pub created_at: DateTime<Utc>,
}
