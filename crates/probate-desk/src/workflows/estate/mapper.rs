use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;

use super::domain::{
    Address, Applicant, ApplicantFlags, Asset, Beneficiary, BeneficiaryStatus, Deceased,
    EstateData, GrantType, Liability,
};
use super::names::resolve_name;
use super::raw::{
    RawAddress, RawAsset, RawBeneficiary, RawDeceased, RawExecutor, RawLiability,
    RawMatterRecord,
};

/// Map an intake record onto the estate model. Total: missing or malformed values become
/// `None` or empty collections, never errors.
pub fn map_to_estate_data(record: &RawMatterRecord) -> EstateData {
    let grant_type = match record.has_will {
        Some(false) => GrantType::Administration,
        _ => GrantType::Probate,
    };

    let beneficiary_rows = match grant_type {
        GrantType::Administration if record.beneficiaries.is_empty() => &record.intestate_heirs,
        _ => &record.beneficiaries,
    };

    EstateData {
        case_code: text(record.case_code.as_deref()),
        deceased: map_deceased(&record.deceased),
        applicants: record.executors.iter().map(map_applicant).collect(),
        beneficiaries: beneficiary_rows.iter().map(map_beneficiary).collect(),
        assets: record.assets.iter().map(map_asset).collect(),
        liabilities: record.liabilities.iter().map(map_liability).collect(),
        registry: text(record.registry.as_deref()),
        will_date: normalize_date(record.will_date.as_deref()),
        grant_type,
    }
}

fn map_deceased(raw: &RawDeceased) -> Deceased {
    Deceased {
        name: resolve_name(
            raw.full_name.as_deref(),
            raw.first_name.as_deref(),
            raw.middle_name.as_deref(),
            raw.last_name.as_deref(),
        ),
        other_names: text(raw.other_names.as_deref()),
        date_of_birth: normalize_date(raw.date_of_birth.as_deref()),
        date_of_death: normalize_date(raw.date_of_death.as_deref()),
        occupation: text(raw.occupation.as_deref()),
        address: map_address(raw.address.as_ref()),
    }
}

fn map_applicant(raw: &RawExecutor) -> Applicant {
    Applicant {
        name: resolve_name(
            raw.full_name.as_deref(),
            raw.first_name.as_deref(),
            raw.middle_name.as_deref(),
            raw.last_name.as_deref(),
        ),
        email: text(raw.email.as_deref()),
        phone: text(raw.phone.as_deref()),
        relationship: text(raw.relationship.as_deref()),
        address: map_address(raw.address.as_ref()),
        flags: ApplicantFlags {
            primary: raw.is_primary.unwrap_or(false),
            alternate: raw.is_alternate.unwrap_or(false),
            renouncing: raw.is_renouncing.unwrap_or(false),
            minor: raw.is_minor.unwrap_or(false),
            deceased: raw.is_deceased.unwrap_or(false),
        },
    }
}

fn map_beneficiary(raw: &RawBeneficiary) -> Beneficiary {
    let is_organization = raw
        .kind
        .as_deref()
        .map(|kind| kind.trim().eq_ignore_ascii_case("organization"))
        .unwrap_or(false)
        || (raw.organization_name.is_some()
            && raw.first_name.is_none()
            && raw.last_name.is_none()
            && raw.full_name.is_none());

    let address = map_address(raw.address.as_ref());

    if is_organization {
        let name = text(raw.organization_name.as_deref())
            .or_else(|| text(raw.full_name.as_deref()))
            .unwrap_or_default();
        return Beneficiary::Organization { name, address };
    }

    Beneficiary::Person {
        name: resolve_name(
            raw.full_name.as_deref(),
            raw.first_name.as_deref(),
            raw.middle_name.as_deref(),
            raw.last_name.as_deref(),
        ),
        relationship: text(raw.relationship.as_deref()),
        status: BeneficiaryStatus::parse(raw.status.as_deref()),
        minor: raw.is_minor.unwrap_or(false),
        address,
    }
}

fn map_asset(raw: &RawAsset) -> Asset {
    Asset {
        category: text(raw.category.as_deref()),
        description: text(raw.description.as_deref()).unwrap_or_default(),
        value: normalize_money(raw.value.as_deref()),
        real_property: raw.is_real_property.unwrap_or(false),
        located_in_bc: raw.located_in_bc.unwrap_or(true),
    }
}

fn map_liability(raw: &RawLiability) -> Liability {
    Liability {
        description: text(raw.description.as_deref()).unwrap_or_default(),
        amount: normalize_money(raw.amount.as_deref()),
    }
}

fn map_address(raw: Option<&RawAddress>) -> Address {
    let Some(raw) = raw else {
        return Address::default();
    };
    Address {
        street: text(raw.street.as_deref()),
        city: text(raw.city.as_deref()),
        province: text(raw.province.as_deref()),
        postal_code: text(raw.postal_code.as_deref()).map(|code| code.to_ascii_uppercase()),
        country: text(raw.country.as_deref()),
    }
}

fn text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Strip currency formatting and render a plain non-negative decimal string.
pub fn normalize_money(raw: Option<&str>) -> Option<String> {
    let cleaned: String = raw?
        .chars()
        .filter(|ch| !matches!(ch, '$' | ',' | ' ' | '_'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let amount = cleaned.parse::<Decimal>().ok()?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return None;
    }
    Some(amount.normalize().to_string())
}

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y", "%b %d, %Y"];

/// Accept the date shapes the intake forms produce and render them as `YYYY-MM-DD`.
pub fn normalize_date(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.date_naive().format("%Y-%m-%d").to_string());
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .map(|date| date.format("%Y-%m-%d").to_string())
}
