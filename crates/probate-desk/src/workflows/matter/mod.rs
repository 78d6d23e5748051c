//! Matter lifecycle: milestone confirmations, the 21-day notice countdown, administrative
//! corrections, and the HTTP routes that expose them alongside document generation.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod status;

#[cfg(test)]
mod tests;

pub use domain::{
    Actor, ActorRole, Matter, MatterAction, MatterId, Milestone, Milestones, PortalStatus,
};
pub use repository::{
    MatterRepository, Reminder, ReminderError, ReminderKind, ReminderScheduler, RepositoryError,
};
pub use router::{matter_router, MatterState, USER_ID_HEADER, USER_ROLE_HEADER};
pub use service::{MatterService, MatterServiceError};
pub use status::{
    apply_action, correct_milestone, days_remaining, derive_status, earliest_filing_at,
    MatterTimeline, Transition, TransitionError, NOTICE_WAITING_DAYS,
};
