use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use super::domain::{Matter, MatterAction, MatterId, Milestone, Milestones, PortalStatus};

/// Statutory wait between mailing P1 notices and filing.
pub const NOTICE_WAITING_DAYS: i64 = 21;

/// Why a confirmation was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error(
        "cannot confirm {} before the matter reaches '{}' (currently '{}')",
        .milestone.label(),
        .required.label(),
        .current.label()
    )]
    OutOfSequence {
        milestone: Milestone,
        current: PortalStatus,
        required: PortalStatus,
    },
    #[error("notices must be mailed before filing")]
    NoticesNotMailed,
    #[error(
        "filing opens {earliest_filing_date}: {days_remaining} day(s) of the notice period remain"
    )]
    WaitingPeriodActive {
        days_remaining: i64,
        earliest_filing_date: NaiveDate,
    },
}

/// Record of an applied confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub milestone: Milestone,
    /// `None` when a correction cleared the milestone.
    pub stamped_at: Option<DateTime<Utc>>,
    pub previous_timestamp: Option<DateTime<Utc>>,
    pub status_before: PortalStatus,
    pub status_after: PortalStatus,
}

impl Transition {
    pub fn reconfirmed(&self) -> bool {
        self.previous_timestamp.is_some()
    }
}

/// Whole days left in the notice period; never negative.
pub fn days_remaining(notices_mailed_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let elapsed = (now - notices_mailed_at).num_days();
    (NOTICE_WAITING_DAYS - elapsed).max(0)
}

pub fn earliest_filing_at(notices_mailed_at: DateTime<Utc>) -> DateTime<Utc> {
    notices_mailed_at + Duration::days(NOTICE_WAITING_DAYS)
}

/// Apply a confirmation action, stamping its milestone with `now`.
///
/// Re-confirming an already stamped milestone moves its timestamp but never lowers the
/// status. Filing is refused while the notice period is still running.
pub fn apply_action(
    matter: &mut Matter,
    action: MatterAction,
    now: DateTime<Utc>,
) -> Result<Transition, TransitionError> {
    let milestone = action.milestone();
    let current = matter.portal_status;

    if current < milestone.prerequisite() {
        return Err(TransitionError::OutOfSequence {
            milestone,
            current,
            required: milestone.prerequisite(),
        });
    }

    if milestone == Milestone::ProbateFiled {
        let mailed_at = matter
            .milestones
            .notices_mailed_at
            .ok_or(TransitionError::NoticesNotMailed)?;
        let remaining = days_remaining(mailed_at, now);
        if remaining > 0 {
            return Err(TransitionError::WaitingPeriodActive {
                days_remaining: remaining,
                earliest_filing_date: earliest_filing_at(mailed_at).date_naive(),
            });
        }
    }

    let previous_timestamp = matter.milestones.slot(milestone).replace(now);
    matter.portal_status = current.max(milestone.reaches());

    Ok(Transition {
        milestone,
        stamped_at: Some(now),
        previous_timestamp,
        status_before: current,
        status_after: matter.portal_status,
    })
}

/// Administrative correction: set or clear one timestamp and recompute the status from the
/// contiguous run of stamped milestones. This is the only path that can lower the status.
pub fn correct_milestone(
    matter: &mut Matter,
    milestone: Milestone,
    value: Option<DateTime<Utc>>,
) -> Transition {
    let status_before = matter.portal_status;
    let previous_timestamp = std::mem::replace(matter.milestones.slot(milestone), value);
    matter.portal_status = derive_status(&matter.milestones);

    Transition {
        milestone,
        stamped_at: value,
        previous_timestamp,
        status_before,
        status_after: matter.portal_status,
    }
}

pub fn derive_status(milestones: &Milestones) -> PortalStatus {
    Milestone::ordered()
        .into_iter()
        .take_while(|milestone| milestones.get(*milestone).is_some())
        .last()
        .map(Milestone::reaches)
        .unwrap_or(PortalStatus::Intake)
}

/// Derived, read-only view of where a matter stands and what unlocks next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatterTimeline {
    pub matter_id: MatterId,
    pub status: PortalStatus,
    pub status_label: &'static str,
    pub milestones: Milestones,
    pub next_action: Option<MatterAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_remaining: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earliest_filing_date: Option<NaiveDate>,
    pub can_file: bool,
}

impl MatterTimeline {
    pub fn for_matter(matter: &Matter, now: DateTime<Utc>) -> Self {
        let notices = matter.milestones.notices_mailed_at;
        let days_remaining = notices.map(|mailed_at| days_remaining(mailed_at, now));
        let can_file = matter.portal_status == PortalStatus::NoticesWaiting21Days
            && days_remaining == Some(0);

        Self {
            matter_id: matter.id.clone(),
            status: matter.portal_status,
            status_label: matter.portal_status.label(),
            milestones: matter.milestones.clone(),
            next_action: MatterAction::next_for(matter.portal_status),
            days_remaining,
            earliest_filing_date: notices
                .map(|mailed_at| earliest_filing_at(mailed_at).date_naive()),
            can_file,
        }
    }
}
