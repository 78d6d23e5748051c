use serde::{Deserialize, Serialize};

/// Answers gathered by the screening questionnaire or voice intake.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualificationFlags {
    pub estate_outside_bc: bool,
    pub caller_not_executor: bool,
    pub expected_dispute: bool,
    pub foreign_assets: bool,
    pub minor_beneficiaries: bool,
    pub business_ownership: bool,
    pub missing_original_will: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Hard,
    Soft,
}

/// Every screening factor, hard disqualifiers first. Reasons are reported in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualificationFactor {
    EstateOutsideBc,
    CallerNotExecutor,
    ExpectedDispute,
    ForeignAssets,
    MinorBeneficiaries,
    BusinessOwnership,
    MissingOriginalWill,
}

impl QualificationFactor {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::EstateOutsideBc,
            Self::CallerNotExecutor,
            Self::ExpectedDispute,
            Self::ForeignAssets,
            Self::MinorBeneficiaries,
            Self::BusinessOwnership,
            Self::MissingOriginalWill,
        ]
    }

    pub const fn severity(self) -> Severity {
        match self {
            Self::EstateOutsideBc
            | Self::CallerNotExecutor
            | Self::ExpectedDispute
            | Self::ForeignAssets => Severity::Hard,
            Self::MinorBeneficiaries | Self::BusinessOwnership | Self::MissingOriginalWill => {
                Severity::Soft
            }
        }
    }

    pub const fn is_set(self, flags: &QualificationFlags) -> bool {
        match self {
            Self::EstateOutsideBc => flags.estate_outside_bc,
            Self::CallerNotExecutor => flags.caller_not_executor,
            Self::ExpectedDispute => flags.expected_dispute,
            Self::ForeignAssets => flags.foreign_assets,
            Self::MinorBeneficiaries => flags.minor_beneficiaries,
            Self::BusinessOwnership => flags.business_ownership,
            Self::MissingOriginalWill => flags.missing_original_will,
        }
    }

    pub const fn message(self) -> &'static str {
        match self {
            Self::EstateOutsideBc => "the deceased did not live in British Columbia",
            Self::CallerNotExecutor => "the caller is not named as executor",
            Self::ExpectedDispute => "a dispute over the estate is expected",
            Self::ForeignAssets => "the estate holds assets outside Canada",
            Self::MinorBeneficiaries => "a beneficiary is under 19",
            Self::BusinessOwnership => "the deceased owned a business interest",
            Self::MissingOriginalWill => "the original signed will cannot be located",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QualificationReason {
    pub factor: QualificationFactor,
    pub severity: Severity,
    pub message: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualificationStatus {
    Fit,
    NeedsReview,
    NotFit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    ReferToLawyer,
    BookReviewCall,
    StartApplication,
}

impl From<QualificationStatus> for RecommendedAction {
    fn from(status: QualificationStatus) -> Self {
        match status {
            QualificationStatus::NotFit => Self::ReferToLawyer,
            QualificationStatus::NeedsReview => Self::BookReviewCall,
            QualificationStatus::Fit => Self::StartApplication,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualificationResult {
    pub result: QualificationStatus,
    pub reasons: Vec<QualificationReason>,
    pub recommended_action: RecommendedAction,
}

/// Hard disqualifiers force `NotFit`; soft flags can only raise `Fit` to `NeedsReview`.
/// Every matching reason is reported either way.
pub fn evaluate_qualification(flags: &QualificationFlags) -> QualificationResult {
    let reasons: Vec<QualificationReason> = QualificationFactor::ordered()
        .into_iter()
        .filter(|factor| factor.is_set(flags))
        .map(|factor| QualificationReason {
            factor,
            severity: factor.severity(),
            message: factor.message(),
        })
        .collect();

    let result = reasons
        .iter()
        .map(|reason| match reason.severity {
            Severity::Hard => QualificationStatus::NotFit,
            Severity::Soft => QualificationStatus::NeedsReview,
        })
        .max()
        .unwrap_or(QualificationStatus::Fit);

    QualificationResult {
        result,
        reasons,
        recommended_action: result.into(),
    }
}
