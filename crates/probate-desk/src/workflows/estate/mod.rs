//! Estate data pipeline: intake record -> mapped estate -> normalized estate -> validation.
//!
//! Mapping and normalization are total so partially completed intakes can still be shown
//! for review. Validation is the explicit gate in front of document generation.

pub mod domain;
mod mapper;
mod names;
mod normalize;
pub mod raw;
pub mod registry;
mod validation;

pub use domain::{
    Address, Applicant, ApplicantFlags, Asset, Beneficiary, BeneficiaryStatus, Deceased,
    EstateData, GrantType, Liability, PersonName,
};
pub use mapper::{map_to_estate_data, normalize_date, normalize_money};
pub use names::split_name;
pub use normalize::{transform_estate_data, NormalizedEstateData};
pub use raw::RawMatterRecord;
pub use validation::{
    validate_estate_data_as_of, validate_estate_data_detailed, FieldIssue, ValidationReport,
};

/// Map, normalize, and validate in one step.
pub fn prepare_estate_data(record: &RawMatterRecord) -> (NormalizedEstateData, ValidationReport) {
    let normalized = transform_estate_data(map_to_estate_data(record));
    let report = validate_estate_data_detailed(&normalized);
    (normalized, report)
}
