use super::common::*;
use chrono::Duration;
use std::sync::Arc;

use crate::workflows::matter::domain::{MatterAction, MatterId, Milestone, PortalStatus};
use crate::workflows::matter::repository::{MatterRepository, ReminderKind, RepositoryError};
use crate::workflows::matter::status::TransitionError;
use crate::workflows::matter::{MatterService, MatterServiceError};

const SEQUENCE: [MatterAction; 4] = [
    MatterAction::CompleteIntake,
    MatterAction::ConfirmWillSearchMailed,
    MatterAction::ConfirmWillSearchResults,
    MatterAction::ConfirmNoticesMailed,
];

fn id() -> MatterId {
    MatterId(MATTER.to_string())
}

#[test]
fn perform_persists_milestones_and_schedules_filing_reminder() {
    let (service, repository, reminders) = build_service();

    for action in SEQUENCE {
        service
            .perform(&id(), action, &client(), at(1))
            .expect("sequence applies");
    }

    let stored = repository.stored(MATTER);
    assert_eq!(stored.portal_status, PortalStatus::NoticesWaiting21Days);
    assert_eq!(stored.milestones.notices_mailed_at, Some(at(1)));

    let scheduled = reminders.scheduled();
    assert_eq!(scheduled.len(), 1);
    assert_eq!(scheduled[0].kind, ReminderKind::FilingWindowOpen);
    assert_eq!(scheduled[0].due_at, at(22));
}

#[test]
fn remailing_notices_replaces_the_reminder() {
    let (service, _, reminders) = build_service();
    for action in SEQUENCE {
        service
            .perform(&id(), action, &client(), at(1))
            .expect("sequence applies");
    }

    let timeline = service
        .perform(&id(), MatterAction::ConfirmNoticesMailed, &client(), at(5))
        .expect("re-confirmation accepted");

    assert_eq!(timeline.days_remaining, Some(21));
    let scheduled = reminders.scheduled();
    assert_eq!(scheduled.len(), 1);
    assert_eq!(scheduled[0].due_at, at(26));
}

#[test]
fn filing_is_refused_until_the_waiting_period_ends() {
    let (service, repository, _) = build_service();
    for action in SEQUENCE {
        service
            .perform(&id(), action, &client(), at(1))
            .expect("sequence applies");
    }

    match service.perform(&id(), MatterAction::ConfirmProbateFiled, &client(), at(21)) {
        Err(MatterServiceError::Transition(TransitionError::WaitingPeriodActive {
            days_remaining,
            ..
        })) => assert_eq!(days_remaining, 1),
        other => panic!("expected waiting period refusal, got {other:?}"),
    }
    assert_eq!(repository.stored(MATTER).milestones.probate_filed_at, None);

    let timeline = service
        .perform(&id(), MatterAction::ConfirmProbateFiled, &client(), at(22))
        .expect("filing allowed");
    assert_eq!(timeline.status, PortalStatus::ProbateFiled);
}

#[test]
fn reminder_failures_do_not_fail_the_confirmation() {
    let repository = seeded_repository();
    let service = MatterService::new(repository.clone(), Arc::new(FailingReminders));

    for action in SEQUENCE {
        service
            .perform(&id(), action, &client(), at(1))
            .expect("reminder failure is best effort");
    }
    assert_eq!(
        repository.stored(MATTER).portal_status,
        PortalStatus::NoticesWaiting21Days
    );
}

#[test]
fn write_failures_surface_as_repository_errors() {
    let inner = seeded_repository();
    let service = MatterService::new(
        Arc::new(ReadOnlyRepository {
            inner: inner.clone(),
        }),
        Arc::new(MemoryReminders::default()),
    );

    match service.perform(&id(), MatterAction::CompleteIntake, &client(), at(1)) {
        Err(MatterServiceError::Repository(RepositoryError::Unavailable(_))) => {}
        other => panic!("expected repository failure, got {other:?}"),
    }
    assert_eq!(inner.stored(MATTER).portal_status, PortalStatus::Intake);
}

#[test]
fn stale_writes_are_rejected() {
    let (service, repository, _) = build_service();
    let before = repository.stored(MATTER);

    service
        .perform(&id(), MatterAction::CompleteIntake, &client(), at(1))
        .expect("intake completes");
    let after = repository.stored(MATTER);
    assert_eq!(after.version, before.version + 1);

    let mut racing = before;
    racing.milestones.intake_completed_at = Some(at(2));
    assert!(matches!(
        repository.save(&racing),
        Err(RepositoryError::Stale)
    ));
    assert_eq!(
        repository.stored(MATTER).milestones.intake_completed_at,
        Some(at(1))
    );

    service
        .perform(&id(), MatterAction::ConfirmWillSearchMailed, &client(), at(2))
        .expect("fresh read saves");
    assert_eq!(repository.stored(MATTER).version, after.version + 1);
}

#[test]
fn corrections_require_admin_and_may_lower_status() {
    let (service, repository, _) = build_service();
    for action in SEQUENCE {
        service
            .perform(&id(), action, &client(), at(1))
            .expect("sequence applies");
    }

    assert!(matches!(
        service.correct(&id(), Milestone::NoticesMailed, None, &client(), at(2)),
        Err(MatterServiceError::Forbidden)
    ));

    let timeline = service
        .correct(&id(), Milestone::NoticesMailed, None, &admin(), at(2))
        .expect("admin correction");
    assert_eq!(timeline.status, PortalStatus::NoticesReady);
    assert_eq!(timeline.days_remaining, None);
    assert_eq!(
        repository.stored(MATTER).portal_status,
        PortalStatus::NoticesReady
    );
}

#[test]
fn backdated_notice_correction_opens_filing_window() {
    let (service, _, reminders) = build_service();
    for action in SEQUENCE {
        service
            .perform(&id(), action, &client(), at(25))
            .expect("sequence applies");
    }

    let backdated = at(25) - Duration::days(30);
    let timeline = service
        .correct(&id(), Milestone::NoticesMailed, Some(backdated), &admin(), at(25))
        .expect("admin correction");

    assert!(timeline.can_file);
    assert_eq!(timeline.days_remaining, Some(0));
    assert_eq!(reminders.scheduled()[0].due_at, at(25));
}

#[test]
fn unknown_matter_is_not_found() {
    let (service, _, _) = build_service();
    assert!(matches!(
        service.timeline(&MatterId("missing".to_string()), at(1)),
        Err(MatterServiceError::Repository(RepositoryError::NotFound))
    ));
}
