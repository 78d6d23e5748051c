//! Intake screening: whether a caller's estate fits the self-serve service, and which
//! service tier to recommend.

mod rules;
mod tier;

pub use rules::{
    evaluate_qualification, QualificationFactor, QualificationFlags, QualificationReason,
    QualificationResult, QualificationStatus, RecommendedAction, Severity,
};
pub use tier::{
    calculate_tier_recommendation, CollectedData, Tier, TierPricing, TierRecommendation,
    PREMIUM_THRESHOLD, STANDARD_THRESHOLD,
};
