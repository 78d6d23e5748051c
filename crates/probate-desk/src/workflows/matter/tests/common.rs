use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};

use crate::workflows::documents::{
    DocumentGenerator, DocumentService, HtmlRenderer, RenderError,
};
use crate::workflows::estate::RawMatterRecord;
use crate::workflows::fees::FeeSchedule;
use crate::workflows::matter::domain::{Actor, ActorRole, Matter, MatterId};
use crate::workflows::matter::repository::{
    MatterRepository, Reminder, ReminderError, ReminderScheduler, RepositoryError,
};
use crate::workflows::matter::{matter_router, MatterService, MatterState};

pub(super) const MATTER: &str = "m-100";

pub(super) fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, day, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn client() -> Actor {
    Actor {
        user_id: "client-1".to_string(),
        role: ActorRole::Client,
    }
}

pub(super) fn admin() -> Actor {
    Actor {
        user_id: "admin-1".to_string(),
        role: ActorRole::Admin,
    }
}

pub(super) fn intake() -> RawMatterRecord {
    RawMatterRecord::from_json(&json!({
        "caseCode": "PP-100",
        "deceased": {
            "firstName": "Walter",
            "lastName": "Grange",
            "dateOfDeath": "2023-11-02",
            "address": {
                "street": "5 Beach Dr",
                "city": "Kelowna",
                "province": "BC",
                "postalCode": "V1Y 1A1"
            }
        },
        "executors": [{
            "fullName": "Iris Grange",
            "isPrimary": true,
            "address": { "street": "5 Beach Dr", "city": "Kelowna", "postalCode": "V1Y 1A1" }
        }],
        "beneficiaries": [{ "fullName": "Iris Grange", "relationship": "spouse" }],
        "assets": [{ "description": "Savings", "value": 80000 }],
        "registry": "Kelowna",
        "willDate": "2010-01-20"
    }))
}

pub(super) fn seeded_repository() -> Arc<MemoryRepository> {
    let repository = Arc::new(MemoryRepository::default());
    repository
        .insert(
            Matter::new(MatterId(MATTER.to_string()), "PP-100", "client-1")
                .with_intake(intake()),
        )
        .expect("seed matter");
    repository
}

pub(super) fn build_service() -> (
    MatterService<MemoryRepository, MemoryReminders>,
    Arc<MemoryRepository>,
    Arc<MemoryReminders>,
) {
    let repository = seeded_repository();
    let reminders = Arc::new(MemoryReminders::default());
    let service = MatterService::new(repository.clone(), reminders.clone());
    (service, repository, reminders)
}

pub(super) fn build_router(repository: Arc<MemoryRepository>) -> axum::Router {
    let reminders = Arc::new(MemoryReminders::default());
    let generator = DocumentGenerator::new(FeeSchedule::default(), Arc::new(StubRenderer));
    matter_router(MatterState {
        matters: Arc::new(MatterService::new(repository.clone(), reminders)),
        documents: Arc::new(DocumentService::new(repository, generator)),
    })
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    records: Mutex<HashMap<MatterId, Matter>>,
}

impl MemoryRepository {
    pub(super) fn stored(&self, id: &str) -> Matter {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .get(&MatterId(id.to_string()))
            .cloned()
            .expect("matter stored")
    }

    pub(super) fn replace(&self, matter: Matter) {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .insert(matter.id.clone(), matter);
    }
}

impl MatterRepository for MemoryRepository {
    fn insert(&self, matter: Matter) -> Result<Matter, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&matter.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(matter.id.clone(), matter.clone());
        Ok(matter)
    }

    fn fetch(&self, id: &MatterId) -> Result<Option<Matter>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn save(&self, matter: &Matter) -> Result<u64, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let stored = guard.get(&matter.id).ok_or(RepositoryError::NotFound)?;
        if stored.version != matter.version {
            return Err(RepositoryError::Stale);
        }
        let mut next = matter.clone();
        next.version += 1;
        let version = next.version;
        guard.insert(matter.id.clone(), next);
        Ok(version)
    }
}

/// Reads succeed, writes fail.
pub(super) struct ReadOnlyRepository {
    pub(super) inner: Arc<MemoryRepository>,
}

impl MatterRepository for ReadOnlyRepository {
    fn insert(&self, _matter: Matter) -> Result<Matter, RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn fetch(&self, id: &MatterId) -> Result<Option<Matter>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn save(&self, _matter: &Matter) -> Result<u64, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemoryReminders {
    scheduled: Mutex<Vec<Reminder>>,
}

impl MemoryReminders {
    pub(super) fn scheduled(&self) -> Vec<Reminder> {
        self.scheduled
            .lock()
            .expect("reminder mutex poisoned")
            .clone()
    }
}

impl ReminderScheduler for MemoryReminders {
    fn schedule(&self, reminder: Reminder) -> Result<(), ReminderError> {
        let mut guard = self.scheduled.lock().expect("reminder mutex poisoned");
        guard.retain(|existing| {
            existing.matter_id != reminder.matter_id || existing.kind != reminder.kind
        });
        guard.push(reminder);
        Ok(())
    }
}

pub(super) struct FailingReminders;

impl ReminderScheduler for FailingReminders {
    fn schedule(&self, _reminder: Reminder) -> Result<(), ReminderError> {
        Err(ReminderError::Transport("queue offline".to_string()))
    }
}

pub(super) struct StubRenderer;

impl HtmlRenderer for StubRenderer {
    fn render_pdf(&self, _html: &str) -> Result<Vec<u8>, RenderError> {
        Ok(b"%PDF-1.4 stub".to_vec())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
