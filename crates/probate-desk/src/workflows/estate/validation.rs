use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Address, Beneficiary, BeneficiaryStatus};
use super::normalize::NormalizedEstateData;

/// Field-level finding. `field` uses dotted paths such as `applicants[0].address.city`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

impl FieldIssue {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors block generation; warnings let it proceed but flag the document for review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<FieldIssue>,
    pub warnings: Vec<FieldIssue>,
}

impl ValidationReport {
    pub fn has_error_for(&self, field: &str) -> bool {
        self.errors.iter().any(|issue| issue.field == field)
    }
}

pub fn validate_estate_data_detailed(data: &NormalizedEstateData) -> ValidationReport {
    validate_estate_data_as_of(data, Utc::now().date_naive())
}

pub fn validate_estate_data_as_of(
    data: &NormalizedEstateData,
    today: NaiveDate,
) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let estate = &data.estate;

    let deceased = &estate.deceased;
    if deceased.name.first.is_empty() {
        errors.push(FieldIssue::new(
            "deceased.firstName",
            "first name of the deceased is required",
        ));
    }
    if deceased.name.last.is_empty() {
        errors.push(FieldIssue::new("deceased.lastName", "last name of the deceased is required"));
    }

    let date_of_death = parse_iso(deceased.date_of_death.as_deref());
    let date_of_birth = parse_iso(deceased.date_of_birth.as_deref());
    match date_of_death {
        None => errors.push(FieldIssue::new("deceased.dateOfDeath", "date of death is required")),
        Some(death) if death > today => errors.push(FieldIssue::new(
            "deceased.dateOfDeath",
            "date of death cannot be in the future",
        )),
        Some(death) => {
            if let Some(birth) = date_of_birth {
                if birth > death {
                    errors.push(FieldIssue::new(
                        "deceased.dateOfBirth",
                        "date of birth is after the date of death",
                    ));
                }
            }
        }
    }
    if date_of_birth.is_none() {
        warnings.push(FieldIssue::new("deceased.dateOfBirth", "date of birth is missing"));
    }

    match &estate.registry {
        None => errors.push(FieldIssue::new("registry", "a filing registry must be selected")),
        Some(registry) if !data.registry_recognized => warnings.push(FieldIssue::new(
            "registry",
            format!("'{registry}' is not a recognized BC probate registry"),
        )),
        Some(_) => {}
    }

    if estate.applicants.is_empty() {
        errors.push(FieldIssue::new("applicants", "at least one executor is required"));
    }
    for (index, applicant) in estate.applicants.iter().enumerate() {
        let prefix = format!("applicants[{index}]");
        if applicant.name.first.is_empty() {
            errors.push(FieldIssue::new(format!("{prefix}.firstName"), "first name is required"));
        }
        if applicant.name.last.is_empty() {
            errors.push(FieldIssue::new(format!("{prefix}.lastName"), "last name is required"));
        }
        if applicant.flags.renouncing {
            warnings.push(FieldIssue::new(
                format!("{prefix}.renouncing"),
                "executor is renouncing; a renunciation must be filed",
            ));
            continue;
        }
        if applicant.flags.minor {
            warnings.push(FieldIssue::new(
                format!("{prefix}.minor"),
                "a minor cannot act as executor",
            ));
        }
        require_mailing_address(&applicant.address, &prefix, &mut errors);
    }
    if !estate.applicants.is_empty() && data.acting_applicants().next().is_none() {
        errors.push(FieldIssue::new(
            "applicants",
            "every listed executor is renouncing or deceased",
        ));
    }

    if estate.beneficiaries.is_empty() {
        warnings.push(FieldIssue::new("beneficiaries", "no beneficiaries have been entered"));
    }
    for (index, beneficiary) in estate.beneficiaries.iter().enumerate() {
        let prefix = format!("beneficiaries[{index}]");
        match beneficiary {
            Beneficiary::Organization { name, .. } if name.trim().is_empty() => {
                errors.push(FieldIssue::new(
                    format!("{prefix}.name"),
                    "organization name is required",
                ));
            }
            Beneficiary::Person { name, status, minor, .. } => {
                if name.last.is_empty() {
                    errors.push(FieldIssue::new(
                        format!("{prefix}.lastName"),
                        "last name is required",
                    ));
                }
                if *minor {
                    warnings.push(FieldIssue::new(
                        format!("{prefix}.minor"),
                        "minor beneficiary: notice must also go to the Public Guardian and Trustee",
                    ));
                }
                if *status == BeneficiaryStatus::DeceasedBeforeWill {
                    warnings.push(FieldIssue::new(
                        format!("{prefix}.status"),
                        "beneficiary died before the will was made; gift may lapse",
                    ));
                }
            }
            Beneficiary::Organization { .. } => {}
        }
    }

    for (index, asset) in estate.assets.iter().enumerate() {
        if asset.value.is_none() {
            warnings.push(FieldIssue::new(
                format!("assets[{index}].value"),
                "asset has no value; it will be listed at $0",
            ));
        }
    }

    if data.total_liabilities > data.gross_value {
        warnings.push(FieldIssue::new(
            "liabilities",
            "liabilities exceed assets; the estate may be insolvent",
        ));
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

fn require_mailing_address(address: &Address, prefix: &str, errors: &mut Vec<FieldIssue>) {
    if address.street.is_none() {
        errors.push(FieldIssue::new(
            format!("{prefix}.address.street"),
            "street address is required",
        ));
    }
    if address.city.is_none() {
        errors.push(FieldIssue::new(format!("{prefix}.address.city"), "city is required"));
    }
    if address.postal_code.is_none() {
        errors.push(FieldIssue::new(
            format!("{prefix}.address.postalCode"),
            "postal code is required",
        ));
    }
}

fn parse_iso(value: Option<&str>) -> Option<NaiveDate> {
    value.and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::estate::domain::{
        Address, Applicant, ApplicantFlags, Deceased, EstateData, PersonName,
    };
    use crate::workflows::estate::normalize::transform_estate_data;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date")
    }

    fn complete_estate() -> EstateData {
        EstateData {
            deceased: Deceased {
                name: PersonName {
                    first: "Mary".to_string(),
                    middle: String::new(),
                    last: "Watson".to_string(),
                },
                date_of_birth: Some("1941-03-04".to_string()),
                date_of_death: Some("2024-03-02".to_string()),
                ..Deceased::default()
            },
            applicants: vec![Applicant {
                name: PersonName {
                    first: "Peter".to_string(),
                    middle: String::new(),
                    last: "Parker".to_string(),
                },
                address: Address {
                    street: Some("20 Ingram St".to_string()),
                    city: Some("Victoria".to_string()),
                    province: Some("BC".to_string()),
                    postal_code: Some("V8W 1A1".to_string()),
                    country: None,
                },
                flags: ApplicantFlags::default(),
                ..Applicant::default()
            }],
            registry: Some("Victoria".to_string()),
            ..EstateData::default()
        }
    }

    #[test]
    fn complete_estate_is_valid_with_warnings() {
        let report = validate_estate_data_as_of(&transform_estate_data(complete_estate()), today());
        assert!(report.valid, "unexpected errors: {:?}", report.errors);
        assert!(report.warnings.iter().any(|w| w.field == "beneficiaries"));
    }

    #[test]
    fn missing_last_name_blocks_generation() {
        let mut estate = complete_estate();
        estate.deceased.name.last.clear();
        let report = validate_estate_data_as_of(&transform_estate_data(estate), today());
        assert!(!report.valid);
        assert!(report.has_error_for("deceased.lastName"));
    }

    #[test]
    fn future_date_of_death_is_rejected() {
        let mut estate = complete_estate();
        estate.deceased.date_of_death = Some("2030-01-01".to_string());
        let report = validate_estate_data_as_of(&transform_estate_data(estate), today());
        assert!(report.has_error_for("deceased.dateOfDeath"));
    }

    #[test]
    fn executor_without_address_is_itemized() {
        let mut estate = complete_estate();
        estate.applicants[0].address = Address::default();
        let report = validate_estate_data_as_of(&transform_estate_data(estate), today());
        assert!(report.has_error_for("applicants[0].address.street"));
        assert!(report.has_error_for("applicants[0].address.city"));
        assert!(report.has_error_for("applicants[0].address.postalCode"));
    }

    #[test]
    fn renouncing_only_executor_is_an_error() {
        let mut estate = complete_estate();
        estate.applicants[0].flags.renouncing = true;
        let report = validate_estate_data_as_of(&transform_estate_data(estate), today());
        assert!(!report.valid);
        assert!(report.warnings.iter().any(|w| w.field == "applicants[0].renouncing"));
    }
}
