use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Matter, MatterId};

/// Storage abstraction so the matter service can be exercised in isolation.
pub trait MatterRepository: Send + Sync {
    fn insert(&self, matter: Matter) -> Result<Matter, RepositoryError>;
    fn fetch(&self, id: &MatterId) -> Result<Option<Matter>, RepositoryError>;
    /// Single-row write of the matter, milestones included. Succeeds only while the stored
    /// row is still at `matter.version` and returns the version now stored.
    fn save(&self, matter: &Matter) -> Result<u64, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record changed since it was read")]
    Stale,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    FilingWindowOpen,
}

/// Follow-up nudge keyed by matter and kind; rescheduling replaces the earlier entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub matter_id: MatterId,
    pub kind: ReminderKind,
    pub due_at: DateTime<Utc>,
}

/// Outbound reminder hook (e-mail queue, SMS, calendar).
pub trait ReminderScheduler: Send + Sync {
    fn schedule(&self, reminder: Reminder) -> Result<(), ReminderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ReminderError {
    #[error("reminder transport unavailable: {0}")]
    Transport(String),
}
