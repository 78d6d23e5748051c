use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::workflows::estate::RawMatterRecord;

/// Identifier wrapper for matters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatterId(pub String);

impl fmt::Display for MatterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Portal progression. Variant order is the legal sequence; comparisons rely on it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PortalStatus {
    #[default]
    Intake,
    WillSearchReady,
    WillSearchSent,
    NoticesReady,
    NoticesWaiting21Days,
    ProbateFiled,
    GrantIssued,
}

impl PortalStatus {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::Intake,
            Self::WillSearchReady,
            Self::WillSearchSent,
            Self::NoticesReady,
            Self::NoticesWaiting21Days,
            Self::ProbateFiled,
            Self::GrantIssued,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Intake => "Intake",
            Self::WillSearchReady => "Will search ready",
            Self::WillSearchSent => "Will search sent",
            Self::NoticesReady => "Notices ready",
            Self::NoticesWaiting21Days => "Waiting 21 days after notices",
            Self::ProbateFiled => "Probate filed",
            Self::GrantIssued => "Grant issued",
        }
    }
}

/// Timestamped checkpoints stamped by explicit user confirmations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    IntakeCompleted,
    WillSearchMailed,
    WillSearchResultsReceived,
    NoticesMailed,
    ProbateFiled,
    GrantIssued,
}

impl Milestone {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::IntakeCompleted,
            Self::WillSearchMailed,
            Self::WillSearchResultsReceived,
            Self::NoticesMailed,
            Self::ProbateFiled,
            Self::GrantIssued,
        ]
    }

    /// Status the matter must already have reached before this milestone can be confirmed.
    pub const fn prerequisite(self) -> PortalStatus {
        match self {
            Self::IntakeCompleted => PortalStatus::Intake,
            Self::WillSearchMailed => PortalStatus::WillSearchReady,
            Self::WillSearchResultsReceived => PortalStatus::WillSearchSent,
            Self::NoticesMailed => PortalStatus::NoticesReady,
            Self::ProbateFiled => PortalStatus::NoticesWaiting21Days,
            Self::GrantIssued => PortalStatus::ProbateFiled,
        }
    }

    /// Status reached once this milestone is stamped.
    pub const fn reaches(self) -> PortalStatus {
        match self {
            Self::IntakeCompleted => PortalStatus::WillSearchReady,
            Self::WillSearchMailed => PortalStatus::WillSearchSent,
            Self::WillSearchResultsReceived => PortalStatus::NoticesReady,
            Self::NoticesMailed => PortalStatus::NoticesWaiting21Days,
            Self::ProbateFiled => PortalStatus::ProbateFiled,
            Self::GrantIssued => PortalStatus::GrantIssued,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::IntakeCompleted => "intake completed",
            Self::WillSearchMailed => "will search mailed",
            Self::WillSearchResultsReceived => "will search results received",
            Self::NoticesMailed => "notices mailed",
            Self::ProbateFiled => "probate filed",
            Self::GrantIssued => "grant issued",
        }
    }
}

/// User confirmation actions, one per milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatterAction {
    CompleteIntake,
    ConfirmWillSearchMailed,
    ConfirmWillSearchResults,
    ConfirmNoticesMailed,
    ConfirmProbateFiled,
    ConfirmGrantIssued,
}

impl MatterAction {
    pub const fn milestone(self) -> Milestone {
        match self {
            Self::CompleteIntake => Milestone::IntakeCompleted,
            Self::ConfirmWillSearchMailed => Milestone::WillSearchMailed,
            Self::ConfirmWillSearchResults => Milestone::WillSearchResultsReceived,
            Self::ConfirmNoticesMailed => Milestone::NoticesMailed,
            Self::ConfirmProbateFiled => Milestone::ProbateFiled,
            Self::ConfirmGrantIssued => Milestone::GrantIssued,
        }
    }

    /// Action that moves a matter out of `status`, if any remains.
    pub const fn next_for(status: PortalStatus) -> Option<Self> {
        match status {
            PortalStatus::Intake => Some(Self::CompleteIntake),
            PortalStatus::WillSearchReady => Some(Self::ConfirmWillSearchMailed),
            PortalStatus::WillSearchSent => Some(Self::ConfirmWillSearchResults),
            PortalStatus::NoticesReady => Some(Self::ConfirmNoticesMailed),
            PortalStatus::NoticesWaiting21Days => Some(Self::ConfirmProbateFiled),
            PortalStatus::ProbateFiled => Some(Self::ConfirmGrantIssued),
            PortalStatus::GrantIssued => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestones {
    pub intake_completed_at: Option<DateTime<Utc>>,
    pub will_search_mailed_at: Option<DateTime<Utc>>,
    pub will_search_results_at: Option<DateTime<Utc>>,
    pub notices_mailed_at: Option<DateTime<Utc>>,
    pub probate_filed_at: Option<DateTime<Utc>>,
    pub grant_issued_at: Option<DateTime<Utc>>,
}

impl Milestones {
    pub fn get(&self, milestone: Milestone) -> Option<DateTime<Utc>> {
        match milestone {
            Milestone::IntakeCompleted => self.intake_completed_at,
            Milestone::WillSearchMailed => self.will_search_mailed_at,
            Milestone::WillSearchResultsReceived => self.will_search_results_at,
            Milestone::NoticesMailed => self.notices_mailed_at,
            Milestone::ProbateFiled => self.probate_filed_at,
            Milestone::GrantIssued => self.grant_issued_at,
        }
    }

    pub(crate) fn slot(&mut self, milestone: Milestone) -> &mut Option<DateTime<Utc>> {
        match milestone {
            Milestone::IntakeCompleted => &mut self.intake_completed_at,
            Milestone::WillSearchMailed => &mut self.will_search_mailed_at,
            Milestone::WillSearchResultsReceived => &mut self.will_search_results_at,
            Milestone::NoticesMailed => &mut self.notices_mailed_at,
            Milestone::ProbateFiled => &mut self.probate_filed_at,
            Milestone::GrantIssued => &mut self.grant_issued_at,
        }
    }
}

/// Case record: identity, milestone timestamps, portal status, and the intake snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matter {
    pub id: MatterId,
    pub case_code: String,
    pub client_key: String,
    pub portal_status: PortalStatus,
    pub milestones: Milestones,
    pub intake: RawMatterRecord,
    /// Bumped on every save; a write against an older version is rejected.
    #[serde(default)]
    pub version: u64,
}

impl Matter {
    pub fn new(id: MatterId, case_code: impl Into<String>, client_key: impl Into<String>) -> Self {
        Self {
            id,
            case_code: case_code.into(),
            client_key: client_key.into(),
            portal_status: PortalStatus::Intake,
            milestones: Milestones::default(),
            intake: RawMatterRecord::default(),
            version: 0,
        }
    }

    pub fn with_intake(mut self, intake: RawMatterRecord) -> Self {
        self.intake = intake;
        self
    }
}

/// Role supplied by the upstream authentication provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Client,
    Staff,
    Admin,
}

impl ActorRole {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "client" | "user" => Some(Self::Client),
            "staff" | "ops" => Some(Self::Staff),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Already-authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    pub role: ActorRole,
}
