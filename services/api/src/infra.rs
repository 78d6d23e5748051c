use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use probate_desk::integrations::{
    CallEvent, CallEventSink, CallEventSinkError, ChatCompletion, LlmError,
};
use probate_desk::workflows::matter::{
    Matter, MatterId, MatterRepository, Reminder, ReminderError, ReminderKind, ReminderScheduler,
    RepositoryError,
};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryMatterRepository {
    records: Arc<Mutex<HashMap<MatterId, Matter>>>,
}

impl MatterRepository for InMemoryMatterRepository {
    fn insert(&self, matter: Matter) -> Result<Matter, RepositoryError> {
        let mut guard = lock(&self.records);
        if guard.contains_key(&matter.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(matter.id.clone(), matter.clone());
        Ok(matter)
    }

    fn fetch(&self, id: &MatterId) -> Result<Option<Matter>, RepositoryError> {
        Ok(lock(&self.records).get(id).cloned())
    }

    fn save(&self, matter: &Matter) -> Result<u64, RepositoryError> {
        let mut guard = lock(&self.records);
        let stored = guard.get(&matter.id).ok_or(RepositoryError::NotFound)?;
        if stored.version != matter.version {
            return Err(RepositoryError::Stale);
        }
        let version = matter.version + 1;
        guard.insert(
            matter.id.clone(),
            Matter {
                version,
                ..matter.clone()
            },
        );
        Ok(version)
    }
}

/// Keeps one pending reminder per matter and kind; a reschedule replaces the earlier one.
#[derive(Default, Clone)]
pub(crate) struct InMemoryReminderScheduler {
    pending: Arc<Mutex<HashMap<(MatterId, ReminderKind), DateTime<Utc>>>>,
}

impl ReminderScheduler for InMemoryReminderScheduler {
    fn schedule(&self, reminder: Reminder) -> Result<(), ReminderError> {
        lock(&self.pending).insert((reminder.matter_id, reminder.kind), reminder.due_at);
        Ok(())
    }
}

impl InMemoryReminderScheduler {
    pub(crate) fn due_at(&self, matter_id: &MatterId, kind: ReminderKind) -> Option<DateTime<Utc>> {
        lock(&self.pending).get(&(matter_id.clone(), kind)).copied()
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryCallEventSink {
    events: Arc<Mutex<Vec<CallEvent>>>,
}

impl CallEventSink for InMemoryCallEventSink {
    fn record(&self, event: CallEvent) -> Result<(), CallEventSinkError> {
        lock(&self.events).push(event);
        Ok(())
    }
}

#[cfg(test)]
impl InMemoryCallEventSink {
    pub(crate) fn events(&self) -> Vec<CallEvent> {
        lock(&self.events).clone()
    }
}

/// Stand-in when no LLM endpoint is configured; extraction then always falls back to empty.
pub(crate) struct DisabledChat;

#[async_trait]
impl ChatCompletion for DisabledChat {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
        Err(LlmError::NotConfigured)
    }
}
