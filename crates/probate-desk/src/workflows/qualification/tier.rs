use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::rules::QualificationFlags;
use crate::workflows::estate::GrantType;
use crate::workflows::fees::format_money;

/// Estate values at or above this start at `Standard`.
pub const STANDARD_THRESHOLD: Decimal = Decimal::from_parts(100_000, 0, 0, false, 0);
/// Estate values above this start at `Premium`.
pub const PREMIUM_THRESHOLD: Decimal = Decimal::from_parts(500_000, 0, 0, false, 0);

const MANY_BENEFICIARIES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Basic,
    Standard,
    Premium,
}

impl Tier {
    pub const fn label(self) -> &'static str {
        match self {
            Tier::Basic => "Basic",
            Tier::Standard => "Standard",
            Tier::Premium => "Premium",
        }
    }

    pub fn for_estate_value(value: Decimal) -> Self {
        if value > PREMIUM_THRESHOLD {
            Tier::Premium
        } else if value >= STANDARD_THRESHOLD {
            Tier::Standard
        } else {
            Tier::Basic
        }
    }
}

/// Intake answers relevant to pricing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectedData {
    pub estate_value: Decimal,
    pub has_real_property: bool,
    pub beneficiary_count: u32,
    pub grant_type: GrantType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierPricing {
    pub basic: Decimal,
    pub standard: Decimal,
    pub premium: Decimal,
}

impl Default for TierPricing {
    fn default() -> Self {
        Self {
            basic: Decimal::from(799),
            standard: Decimal::from(1_499),
            premium: Decimal::from(2_499),
        }
    }
}

impl TierPricing {
    pub fn price(&self, tier: Tier) -> Decimal {
        match tier {
            Tier::Basic => self.basic,
            Tier::Standard => self.standard,
            Tier::Premium => self.premium,
        }
    }

    /// Value-derived baseline, then each complexity factor may raise the tier but never lower it.
    pub fn recommend(
        &self,
        data: &CollectedData,
        flags: &QualificationFlags,
    ) -> TierRecommendation {
        let baseline = Tier::for_estate_value(data.estate_value);
        let mut reasoning = vec![format!(
            "estate value {} sets a {} baseline",
            format_money(data.estate_value),
            baseline.label()
        )];

        let factors = [
            (data.has_real_property, Tier::Standard, "real property must be transmitted"),
            (
                data.beneficiary_count > MANY_BENEFICIARIES,
                Tier::Standard,
                "more than three beneficiaries must be notified",
            ),
            (
                data.grant_type == GrantType::Administration,
                Tier::Standard,
                "administration without a will needs additional affidavits",
            ),
            (
                flags.minor_beneficiaries,
                Tier::Standard,
                "minor beneficiaries require notice to the Public Guardian and Trustee",
            ),
            (
                flags.business_ownership,
                Tier::Premium,
                "a business interest must be valued",
            ),
            (
                flags.foreign_assets,
                Tier::Premium,
                "assets outside Canada add reporting",
            ),
        ];

        let mut tier = baseline;
        for (applies, minimum, why) in factors {
            if !applies {
                continue;
            }
            if minimum > tier {
                reasoning.push(format!("{why}: raised to {}", minimum.label()));
                tier = minimum;
            } else {
                reasoning.push(format!("{why}: already covered by {}", tier.label()));
            }
        }

        TierRecommendation {
            tier,
            price: self.price(tier),
            reasoning,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRecommendation {
    pub tier: Tier,
    pub price: Decimal,
    pub reasoning: Vec<String>,
}

pub fn calculate_tier_recommendation(
    data: &CollectedData,
    flags: &QualificationFlags,
) -> TierRecommendation {
    TierPricing::default().recommend(data, flags)
}
