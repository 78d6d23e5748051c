use super::{FeeBracket, FeeSchedule};
use crate::config::FeeConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::io::Read;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum FeeScheduleError {
    #[error("failed to read fee schedule: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid fee schedule CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("fee schedule has no brackets")]
    Empty,
    #[error("first bracket must start at 0 (found {0})")]
    NonZeroStart(Decimal),
    #[error(
        "bracket starting at {lower} does not continue from the previous upper bound {expected}"
    )]
    Gap { expected: Decimal, lower: Decimal },
    #[error("bracket starting at {0} has an upper bound at or below its lower bound")]
    InvertedBounds(Decimal),
    #[error("only the final bracket may be open-ended")]
    OpenEndedBeforeLast,
    #[error("final bracket must be open-ended")]
    ClosedFinalBracket,
    #[error("bracket starting at {0} has a negative rate")]
    NegativeRate(Decimal),
}

#[derive(Debug, Deserialize)]
struct BracketRow {
    lower: Decimal,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    upper: Option<Decimal>,
    rate_per_thousand: Decimal,
    #[serde(default)]
    label: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

impl FeeSchedule {
    /// Load brackets from a `lower,upper,rate_per_thousand[,label]` CSV.
    pub fn from_csv_reader<R: Read>(
        reader: R,
        filing_fee: Decimal,
    ) -> Result<Self, FeeScheduleError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut brackets = Vec::new();
        for row in csv_reader.deserialize::<BracketRow>() {
            let row = row?;
            let label = row
                .label
                .filter(|label| !label.is_empty())
                .unwrap_or_else(|| default_label(row.lower, row.upper));
            brackets.push(FeeBracket {
                label,
                lower: row.lower,
                upper: row.upper,
                rate_per_thousand: row.rate_per_thousand,
            });
        }

        validate_brackets(&brackets)?;

        Ok(Self {
            filing_fee,
            brackets,
        })
    }

    pub fn from_path<P: AsRef<Path>>(
        path: P,
        filing_fee: Decimal,
    ) -> Result<Self, FeeScheduleError> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file, filing_fee)
    }

    /// Configured table when a path is set, otherwise the built-in schedule.
    pub fn from_config(config: &FeeConfig) -> Result<Self, FeeScheduleError> {
        match &config.schedule_path {
            Some(path) => Self::from_path(path, config.filing_fee),
            None => Ok(Self::british_columbia().with_filing_fee(config.filing_fee)),
        }
    }
}

fn default_label(lower: Decimal, upper: Option<Decimal>) -> String {
    match upper {
        Some(upper) => format!("${} to ${}", lower.normalize(), upper.normalize()),
        None => format!("Over ${}", lower.normalize()),
    }
}

fn validate_brackets(brackets: &[FeeBracket]) -> Result<(), FeeScheduleError> {
    let first = brackets.first().ok_or(FeeScheduleError::Empty)?;
    if !first.lower.is_zero() {
        return Err(FeeScheduleError::NonZeroStart(first.lower));
    }

    let last_index = brackets.len() - 1;
    let mut expected = Decimal::ZERO;

    for (index, bracket) in brackets.iter().enumerate() {
        if bracket.lower != expected {
            return Err(FeeScheduleError::Gap {
                expected,
                lower: bracket.lower,
            });
        }
        if bracket.rate_per_thousand.is_sign_negative() {
            return Err(FeeScheduleError::NegativeRate(bracket.lower));
        }

        match bracket.upper {
            Some(upper) if upper <= bracket.lower => {
                return Err(FeeScheduleError::InvertedBounds(bracket.lower));
            }
            Some(_) if index == last_index => return Err(FeeScheduleError::ClosedFinalBracket),
            Some(upper) => expected = upper,
            None if index != last_index => return Err(FeeScheduleError::OpenEndedBeforeLast),
            None => {}
        }
    }

    Ok(())
}
