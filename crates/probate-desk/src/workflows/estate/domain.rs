use serde::{Deserialize, Serialize};

/// Generator-ready estate model. Money fields are non-negative decimal strings, dates are
/// ISO-8601 (`YYYY-MM-DD`); either may be `None` while intake is still in progress.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EstateData {
    pub case_code: Option<String>,
    pub deceased: Deceased,
    pub applicants: Vec<Applicant>,
    pub beneficiaries: Vec<Beneficiary>,
    pub assets: Vec<Asset>,
    pub liabilities: Vec<Liability>,
    pub registry: Option<String>,
    pub will_date: Option<String>,
    pub grant_type: GrantType,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    #[default]
    Probate,
    Administration,
}

impl GrantType {
    pub const fn label(self) -> &'static str {
        match self {
            GrantType::Probate => "Grant of Probate",
            GrantType::Administration => "Grant of Administration without Will Annexed",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName {
    pub first: String,
    pub middle: String,
    pub last: String,
}

impl PersonName {
    pub fn is_empty(&self) -> bool {
        self.first.is_empty() && self.middle.is_empty() && self.last.is_empty()
    }

    pub fn display(&self) -> String {
        [self.first.as_str(), self.middle.as_str(), self.last.as_str()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl Address {
    pub fn is_empty(&self) -> bool {
        self.street.is_none()
            && self.city.is_none()
            && self.province.is_none()
            && self.postal_code.is_none()
            && self.country.is_none()
    }

    /// Single-line mailing form used on court forms and letters.
    pub fn one_line(&self) -> String {
        let city_line = match (&self.city, &self.province) {
            (Some(city), Some(province)) => Some(format!("{city}, {province}")),
            (Some(city), None) => Some(city.clone()),
            (None, Some(province)) => Some(province.clone()),
            (None, None) => None,
        };
        [
            self.street.clone(),
            city_line,
            self.postal_code.clone(),
            self.country.clone(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(", ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Deceased {
    pub name: PersonName,
    pub other_names: Option<String>,
    pub date_of_birth: Option<String>,
    pub date_of_death: Option<String>,
    pub occupation: Option<String>,
    pub address: Address,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Applicant {
    pub name: PersonName,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub relationship: Option<String>,
    pub address: Address,
    pub flags: ApplicantFlags,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantFlags {
    pub primary: bool,
    pub alternate: bool,
    pub renouncing: bool,
    pub minor: bool,
    pub deceased: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeneficiaryStatus {
    #[default]
    Active,
    DeceasedBeforeWill,
    DeceasedAfterWill,
}

impl BeneficiaryStatus {
    pub(crate) fn parse(raw: Option<&str>) -> Self {
        let normalized = raw
            .map(|value| value.trim().to_ascii_lowercase().replace(['-', ' '], "_"))
            .unwrap_or_default();
        match normalized.as_str() {
            "deceased_before_will" | "predeceased" => Self::DeceasedBeforeWill,
            "deceased_after_will" | "deceased" => Self::DeceasedAfterWill,
            _ => Self::Active,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "living",
            Self::DeceasedBeforeWill => "deceased before the will was made",
            Self::DeceasedAfterWill => "deceased after the will was made",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Beneficiary {
    Person {
        name: PersonName,
        relationship: Option<String>,
        status: BeneficiaryStatus,
        minor: bool,
        address: Address,
    },
    Organization {
        name: String,
        address: Address,
    },
}

impl Beneficiary {
    pub fn display_name(&self) -> String {
        match self {
            Beneficiary::Person { name, .. } => name.display(),
            Beneficiary::Organization { name, .. } => name.clone(),
        }
    }

    pub fn address(&self) -> &Address {
        match self {
            Beneficiary::Person { address, .. } | Beneficiary::Organization { address, .. } => {
                address
            }
        }
    }

    pub fn is_minor(&self) -> bool {
        matches!(self, Beneficiary::Person { minor: true, .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub category: Option<String>,
    pub description: String,
    pub value: Option<String>,
    pub real_property: bool,
    pub located_in_bc: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Liability {
    pub description: String,
    pub amount: Option<String>,
}
