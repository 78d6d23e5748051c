use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::domain::{Actor, ActorRole, Matter, MatterAction, MatterId, Milestone};
use super::repository::{
    MatterRepository, Reminder, ReminderKind, ReminderScheduler, RepositoryError,
};
use super::status::{
    apply_action, correct_milestone, earliest_filing_at, MatterTimeline, Transition,
    TransitionError,
};

/// Service composing the repository, the status rules, and reminder scheduling.
pub struct MatterService<R, S> {
    repository: Arc<R>,
    reminders: Arc<S>,
}

impl<R, S> MatterService<R, S>
where
    R: MatterRepository + 'static,
    S: ReminderScheduler + 'static,
{
    pub fn new(repository: Arc<R>, reminders: Arc<S>) -> Self {
        Self {
            repository,
            reminders,
        }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub fn get(&self, matter_id: &MatterId) -> Result<Matter, MatterServiceError> {
        self.repository
            .fetch(matter_id)?
            .ok_or(MatterServiceError::Repository(RepositoryError::NotFound))
    }

    pub fn timeline(
        &self,
        matter_id: &MatterId,
        now: DateTime<Utc>,
    ) -> Result<MatterTimeline, MatterServiceError> {
        let matter = self.get(matter_id)?;
        Ok(MatterTimeline::for_matter(&matter, now))
    }

    /// Apply a user-confirmed action and persist the stamped milestone.
    pub fn perform(
        &self,
        matter_id: &MatterId,
        action: MatterAction,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<MatterTimeline, MatterServiceError> {
        let mut matter = self.get(matter_id)?;
        let transition = apply_action(&mut matter, action, now)?;
        matter.version = self.repository.save(&matter)?;

        log_transition(&matter.id, actor, &transition, "milestone confirmed");

        if transition.milestone == Milestone::NoticesMailed {
            self.schedule_filing_reminder(&matter, now);
        }

        Ok(MatterTimeline::for_matter(&matter, now))
    }

    /// Set or clear a milestone outside the normal sequence. Admins only.
    pub fn correct(
        &self,
        matter_id: &MatterId,
        milestone: Milestone,
        value: Option<DateTime<Utc>>,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<MatterTimeline, MatterServiceError> {
        if actor.role != ActorRole::Admin {
            return Err(MatterServiceError::Forbidden);
        }

        let mut matter = self.get(matter_id)?;
        let transition = correct_milestone(&mut matter, milestone, value);
        matter.version = self.repository.save(&matter)?;

        log_transition(&matter.id, actor, &transition, "milestone corrected");

        if milestone == Milestone::NoticesMailed && value.is_some() {
            self.schedule_filing_reminder(&matter, now);
        }

        Ok(MatterTimeline::for_matter(&matter, now))
    }

    /// Best-effort: the milestone write has already succeeded and stays authoritative.
    fn schedule_filing_reminder(&self, matter: &Matter, now: DateTime<Utc>) {
        let Some(mailed_at) = matter.milestones.notices_mailed_at else {
            return;
        };
        let due_at = earliest_filing_at(mailed_at).max(now);
        let reminder = Reminder {
            matter_id: matter.id.clone(),
            kind: ReminderKind::FilingWindowOpen,
            due_at,
        };

        if let Err(err) = self.reminders.schedule(reminder) {
            warn!(matter_id = %matter.id, error = %err, "filing reminder not scheduled");
        }
    }
}

fn log_transition(matter_id: &MatterId, actor: &Actor, transition: &Transition, message: &str) {
    info!(
        matter_id = %matter_id,
        user_id = %actor.user_id,
        milestone = transition.milestone.label(),
        status_before = transition.status_before.label(),
        status_after = transition.status_after.label(),
        reconfirmed = transition.reconfirmed(),
        "{}",
        message
    );
}

/// Error raised by the matter service.
#[derive(Debug, thiserror::Error)]
pub enum MatterServiceError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("only administrators may correct milestones")]
    Forbidden,
}
