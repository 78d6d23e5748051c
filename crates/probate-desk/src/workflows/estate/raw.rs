//! Intake wizard records as persisted: every field optional, scalar types tolerated loosely.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::lenient::{lenient_bool, lenient_string, lenient_struct, lenient_vec};

/// Snapshot of a matter and its related rows as the intake wizard left them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawMatterRecord {
    #[serde(deserialize_with = "lenient_string")]
    pub case_code: Option<String>,
    #[serde(deserialize_with = "lenient_struct")]
    pub deceased: RawDeceased,
    #[serde(deserialize_with = "lenient_vec")]
    pub executors: Vec<RawExecutor>,
    #[serde(deserialize_with = "lenient_vec")]
    pub beneficiaries: Vec<RawBeneficiary>,
    #[serde(deserialize_with = "lenient_vec")]
    pub intestate_heirs: Vec<RawBeneficiary>,
    #[serde(deserialize_with = "lenient_vec")]
    pub assets: Vec<RawAsset>,
    #[serde(deserialize_with = "lenient_vec")]
    pub liabilities: Vec<RawLiability>,
    #[serde(deserialize_with = "lenient_string")]
    pub registry: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub will_date: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    pub has_will: Option<bool>,
}

impl RawMatterRecord {
    /// Decode a stored intake document. Fields of the wrong shape are dropped one by one;
    /// only a document that is not an object yields the empty record.
    pub fn from_json(value: &Value) -> Self {
        match Self::deserialize(value) {
            Ok(record) => record,
            Err(err) => {
                warn!(error = %err, "intake record could not be decoded; using empty record");
                Self::default()
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawAddress {
    #[serde(deserialize_with = "lenient_string")]
    pub street: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub city: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub province: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub postal_code: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawDeceased {
    #[serde(deserialize_with = "lenient_string")]
    pub full_name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub first_name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub middle_name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub last_name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub other_names: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub date_of_birth: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub date_of_death: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub occupation: Option<String>,
    #[serde(deserialize_with = "lenient_struct")]
    pub address: Option<RawAddress>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawExecutor {
    #[serde(deserialize_with = "lenient_string")]
    pub full_name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub first_name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub middle_name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub last_name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub phone: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub relationship: Option<String>,
    #[serde(deserialize_with = "lenient_struct")]
    pub address: Option<RawAddress>,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_primary: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_alternate: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_renouncing: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_minor: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_deceased: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawBeneficiary {
    /// `person` or `organization`; anything else is treated as a person.
    #[serde(deserialize_with = "lenient_string")]
    pub kind: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub full_name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub first_name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub middle_name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub last_name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub organization_name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub relationship: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_minor: Option<bool>,
    #[serde(deserialize_with = "lenient_struct")]
    pub address: Option<RawAddress>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawAsset {
    #[serde(deserialize_with = "lenient_string")]
    pub category: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub value: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_real_property: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    pub located_in_bc: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawLiability {
    #[serde(deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub amount: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tolerates_mixed_scalar_types() {
        let record = RawMatterRecord::from_json(&json!({
            "caseCode": 1042,
            "deceased": { "fullName": "Mary Jane Watson", "dateOfDeath": "2024-03-02" },
            "executors": [{ "fullName": "Peter Parker", "isPrimary": "yes" }],
            "assets": [{ "description": "Chequing", "value": 1500.5 }],
            "hasWill": 1
        }));

        assert_eq!(record.case_code.as_deref(), Some("1042"));
        assert_eq!(record.executors[0].is_primary, Some(true));
        assert_eq!(record.assets[0].value.as_deref(), Some("1500.5"));
        assert_eq!(record.has_will, Some(true));
    }

    #[test]
    fn unexpected_shapes_become_missing_values() {
        let record = RawMatterRecord::from_json(&json!({
            "registry": { "name": "Vancouver" },
            "deceased": { "firstName": ["Mary"] }
        }));

        assert!(record.registry.is_none());
        assert!(record.deceased.first_name.is_none());
    }

    #[test]
    fn null_lists_keep_the_rest_of_the_record() {
        let record = RawMatterRecord::from_json(&json!({
            "deceased": { "fullName": "Mary Watson" },
            "executors": null,
            "assets": "see attached",
            "liabilities": [null, { "amount": "120" }]
        }));

        assert_eq!(record.deceased.full_name.as_deref(), Some("Mary Watson"));
        assert!(record.executors.is_empty());
        assert!(record.assets.is_empty());
        assert_eq!(record.liabilities.len(), 1);
        assert_eq!(record.liabilities[0].amount.as_deref(), Some("120"));
    }

    #[test]
    fn null_deceased_keeps_the_rest_of_the_record() {
        let record = RawMatterRecord::from_json(&json!({
            "caseCode": "PP-1",
            "deceased": null,
            "executors": [{ "fullName": "Peter Parker", "address": null }]
        }));

        assert_eq!(record.case_code.as_deref(), Some("PP-1"));
        assert_eq!(record.deceased, RawDeceased::default());
        assert_eq!(record.executors[0].full_name.as_deref(), Some("Peter Parker"));
        assert!(record.executors[0].address.is_none());
    }

    #[test]
    fn non_object_document_yields_empty_record() {
        let record = RawMatterRecord::from_json(&json!("Peter Parker, executor"));
        assert_eq!(record, RawMatterRecord::default());
    }
}
