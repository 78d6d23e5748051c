//! Probate fee schedule for British Columbia estate grants.
//!
//! The bracket thresholds and per-$1,000 rates are court-schedule constants. They live in a
//! [`FeeSchedule`] value so deployments can load the table from the legal-compliance CSV
//! instead of editing code.

mod schedule;

pub use schedule::FeeScheduleError;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One band of the bracketed probate fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBracket {
    pub label: String,
    pub lower: Decimal,
    /// `None` marks the open-ended final bracket.
    pub upper: Option<Decimal>,
    pub rate_per_thousand: Decimal,
}

impl FeeBracket {
    /// The share of `value` that falls inside this bracket.
    fn portion_of(&self, value: Decimal) -> Decimal {
        if value <= self.lower {
            return Decimal::ZERO;
        }
        let ceiling = match self.upper {
            Some(upper) if value > upper => upper,
            _ => value,
        };
        ceiling - self.lower
    }
}

/// Contribution of a single bracket to the probate fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketFee {
    pub label: String,
    pub amount: Decimal,
    pub detail: String,
}

/// Itemized fee calculation. `brackets` sum plus `filing_fee` equals `total`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub estate_value: Decimal,
    pub brackets: Vec<BracketFee>,
    pub filing_fee: Decimal,
    pub probate_fee: Decimal,
    pub total: Decimal,
}

impl FeeBreakdown {
    fn zero(estate_value: Decimal) -> Self {
        Self {
            estate_value,
            brackets: Vec::new(),
            filing_fee: Decimal::ZERO,
            probate_fee: Decimal::ZERO,
            total: Decimal::ZERO,
        }
    }
}

/// Flat filing fee plus bracketed per-$1,000 probate fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub filing_fee: Decimal,
    pub brackets: Vec<FeeBracket>,
}

const THOUSAND: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

impl FeeSchedule {
    /// Probate Fee Act schedule: nothing on the first $25,000, $6 per $1,000 up to $50,000,
    /// $14 per $1,000 above that, plus the $200 filing fee.
    pub fn british_columbia() -> Self {
        Self {
            filing_fee: Decimal::from(200),
            brackets: vec![
                FeeBracket {
                    label: "First $25,000".to_string(),
                    lower: Decimal::ZERO,
                    upper: Some(Decimal::from(25_000)),
                    rate_per_thousand: Decimal::ZERO,
                },
                FeeBracket {
                    label: "$25,000 to $50,000".to_string(),
                    lower: Decimal::from(25_000),
                    upper: Some(Decimal::from(50_000)),
                    rate_per_thousand: Decimal::from(6),
                },
                FeeBracket {
                    label: "Over $50,000".to_string(),
                    lower: Decimal::from(50_000),
                    upper: None,
                    rate_per_thousand: Decimal::from(14),
                },
            ],
        }
    }

    pub fn with_filing_fee(mut self, filing_fee: Decimal) -> Self {
        self.filing_fee = filing_fee;
        self
    }

    /// Apply the schedule to an estate value.
    ///
    /// Each bracket charges its rate on every started $1,000 of the portion inside it: the
    /// unit count is rounded up, never down.
    pub fn calculate(&self, estate_value: Decimal) -> FeeBreakdown {
        if estate_value <= Decimal::ZERO {
            return FeeBreakdown::zero(estate_value);
        }

        let mut brackets = Vec::new();
        let mut probate_fee = Decimal::ZERO;

        for bracket in &self.brackets {
            let portion = bracket.portion_of(estate_value);
            if portion <= Decimal::ZERO {
                continue;
            }

            let units = (portion / THOUSAND).ceil();
            let amount = units.saturating_mul(bracket.rate_per_thousand);
            probate_fee = probate_fee.saturating_add(amount);

            brackets.push(BracketFee {
                label: bracket.label.clone(),
                amount,
                detail: format!(
                    "{} x ${} per $1,000 on ${}",
                    units.normalize(),
                    bracket.rate_per_thousand.normalize(),
                    portion.normalize()
                ),
            });
        }

        FeeBreakdown {
            estate_value,
            brackets,
            filing_fee: self.filing_fee,
            probate_fee,
            total: probate_fee.saturating_add(self.filing_fee),
        }
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self::british_columbia()
    }
}

/// `$1,234,567.89`; negatives keep a leading minus.
pub fn format_money(value: Decimal) -> String {
    let rounded = format!("{:.2}", value.abs().round_dp(2));
    let (whole, cents) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value.is_sign_negative() && !value.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}${grouped}.{cents}")
}

/// Fee breakdown under the default British Columbia schedule.
pub fn calculate_probate_fees(estate_value: Decimal) -> FeeBreakdown {
    FeeSchedule::british_columbia().calculate(estate_value)
}
