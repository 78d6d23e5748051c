use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::{Applicant, EstateData};
use super::registry::{canonical_registry, RegistryMatch};

/// Estate data with parties cleaned up, one primary executor resolved, and totals computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEstateData {
    #[serde(flatten)]
    pub estate: EstateData,
    pub registry_recognized: bool,
    pub gross_value: Decimal,
    pub total_liabilities: Decimal,
}

impl NormalizedEstateData {
    pub fn primary_applicant(&self) -> Option<&Applicant> {
        self.estate
            .applicants
            .iter()
            .find(|applicant| applicant.flags.primary)
    }

    /// Applicants who will actually apply: not renouncing and not deceased.
    pub fn acting_applicants(&self) -> impl Iterator<Item = &Applicant> {
        self.estate
            .applicants
            .iter()
            .filter(|applicant| !applicant.flags.renouncing && !applicant.flags.deceased)
    }

    pub fn net_value(&self) -> Decimal {
        self.gross_value.saturating_sub(self.total_liabilities)
    }
}

pub fn transform_estate_data(mut estate: EstateData) -> NormalizedEstateData {
    estate
        .applicants
        .retain(|applicant| !(applicant.name.is_empty() && applicant.address.is_empty()));
    estate
        .beneficiaries
        .retain(|beneficiary| !beneficiary.display_name().trim().is_empty());
    estate.assets.retain(|asset| {
        !(asset.description.is_empty() && asset.value.is_none() && asset.category.is_none())
    });
    estate
        .liabilities
        .retain(|liability| !(liability.description.is_empty() && liability.amount.is_none()));

    resolve_primary_applicant(&mut estate.applicants);

    let registry_recognized = match estate.registry.as_deref().map(canonical_registry) {
        Some(RegistryMatch::Known(name)) => {
            estate.registry = Some(name.to_string());
            true
        }
        _ => false,
    };

    let gross_value = saturating_total(
        "assets",
        estate
            .assets
            .iter()
            .filter_map(|asset| parse_amount(asset.value.as_deref())),
    );
    let total_liabilities = saturating_total(
        "liabilities",
        estate
            .liabilities
            .iter()
            .filter_map(|liability| parse_amount(liability.amount.as_deref())),
    );

    NormalizedEstateData {
        estate,
        registry_recognized,
        gross_value,
        total_liabilities,
    }
}

fn parse_amount(value: Option<&str>) -> Option<Decimal> {
    value.and_then(|raw| raw.parse::<Decimal>().ok())
}

/// Sums amounts, pinning the result at `Decimal::MAX` instead of overflowing.
fn saturating_total(kind: &'static str, amounts: impl Iterator<Item = Decimal>) -> Decimal {
    let mut total = Decimal::ZERO;
    for amount in amounts {
        match total.checked_add(amount) {
            Some(next) => total = next,
            None => {
                warn!(kind, "estate total exceeds representable range; capping");
                return Decimal::MAX;
            }
        }
    }
    total
}

/// Exactly one primary executor when any exist: the first flagged one, else the first
/// capable executor, else the first listed.
fn resolve_primary_applicant(applicants: &mut [Applicant]) {
    for applicant in applicants.iter_mut() {
        if applicant.flags.renouncing || applicant.flags.deceased {
            applicant.flags.primary = false;
        }
    }

    let chosen = applicants
        .iter()
        .position(|applicant| applicant.flags.primary)
        .or_else(|| {
            applicants.iter().position(|applicant| {
                !applicant.flags.renouncing
                    && !applicant.flags.deceased
                    && !applicant.flags.minor
                    && !applicant.flags.alternate
            })
        })
        .or(if applicants.is_empty() { None } else { Some(0) });

    for (index, applicant) in applicants.iter_mut().enumerate() {
        applicant.flags.primary = Some(index) == chosen;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::estate::domain::{ApplicantFlags, Asset, Liability, PersonName};

    fn applicant(first: &str, flags: ApplicantFlags) -> Applicant {
        Applicant {
            name: PersonName {
                first: first.to_string(),
                middle: String::new(),
                last: "Doe".to_string(),
            },
            flags,
            ..Applicant::default()
        }
    }

    #[test]
    fn keeps_only_first_flagged_primary() {
        let primary = ApplicantFlags {
            primary: true,
            ..ApplicantFlags::default()
        };
        let estate = EstateData {
            applicants: vec![
                applicant("A", ApplicantFlags::default()),
                applicant("B", primary),
                applicant("C", primary),
            ],
            ..EstateData::default()
        };

        let normalized = transform_estate_data(estate);
        let flagged: Vec<_> = normalized
            .estate
            .applicants
            .iter()
            .filter(|a| a.flags.primary)
            .map(|a| a.name.first.as_str())
            .collect();
        assert_eq!(flagged, vec!["B"]);
    }

    #[test]
    fn renouncing_executor_cannot_remain_primary() {
        let estate = EstateData {
            applicants: vec![
                applicant(
                    "A",
                    ApplicantFlags {
                        primary: true,
                        renouncing: true,
                        ..ApplicantFlags::default()
                    },
                ),
                applicant(
                    "B",
                    ApplicantFlags {
                        minor: true,
                        ..ApplicantFlags::default()
                    },
                ),
                applicant("C", ApplicantFlags::default()),
            ],
            ..EstateData::default()
        };

        let normalized = transform_estate_data(estate);
        let primary = normalized.primary_applicant().expect("primary resolved");
        assert_eq!(primary.name.first, "C");
        assert_eq!(normalized.acting_applicants().count(), 2);
    }

    #[test]
    fn totals_assets_and_liabilities() {
        let estate = EstateData {
            assets: vec![
                Asset {
                    description: "House".to_string(),
                    value: Some("650000".to_string()),
                    ..Asset::default()
                },
                Asset {
                    description: "Savings".to_string(),
                    value: Some("12500.50".to_string()),
                    ..Asset::default()
                },
                Asset {
                    description: "Jewellery".to_string(),
                    value: None,
                    ..Asset::default()
                },
            ],
            liabilities: vec![Liability {
                description: "Line of credit".to_string(),
                amount: Some("2500.50".to_string()),
            }],
            registry: Some("  vancouver ".to_string()),
            ..EstateData::default()
        };

        let normalized = transform_estate_data(estate);
        assert_eq!(normalized.gross_value, Decimal::new(66250050, 2));
        assert_eq!(normalized.net_value(), Decimal::from(660_000));
        assert_eq!(normalized.estate.assets.len(), 3);
        assert!(normalized.registry_recognized);
        assert_eq!(normalized.estate.registry.as_deref(), Some("Vancouver"));
    }

    #[test]
    fn oversized_values_cap_the_total() {
        let huge = Asset {
            description: "Holding company".to_string(),
            value: Some(Decimal::MAX.to_string()),
            ..Asset::default()
        };
        let estate = EstateData {
            assets: vec![huge.clone(), huge],
            liabilities: vec![Liability {
                description: "Mortgage".to_string(),
                amount: Some("1000".to_string()),
            }],
            ..EstateData::default()
        };

        let normalized = transform_estate_data(estate);
        assert_eq!(normalized.gross_value, Decimal::MAX);
        assert_eq!(normalized.net_value(), Decimal::MAX - Decimal::from(1000));
    }

    #[test]
    fn drops_blank_parties() {
        let estate = EstateData {
            applicants: vec![Applicant::default()],
            ..EstateData::default()
        };
        let normalized = transform_estate_data(estate);
        assert!(normalized.estate.applicants.is_empty());
        assert!(normalized.primary_applicant().is_none());
    }
}
