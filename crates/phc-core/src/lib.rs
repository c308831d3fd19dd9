//! Star-schema core of the PHC warehouse.
//!
//! Raw exports flow through four stages:
//!
//! 1. [`preprocess`]: each export becomes a [`FactFrame`] with standard
//!    geography columns and its measures.
//! 2. [`dimension`]: the Facility, Doctor and Date dimensions are derived from
//!    all preprocessed facts. This stage may only start once every fact has
//!    been preprocessed.
//! 3. [`transform`]: descriptive fact columns are replaced by surrogate keys.
//! 4. [`transform::check_missing_keys`] reports fact rows whose keys stayed
//!    null.

pub mod age;
pub mod data_utils;
pub mod datetime;
pub mod dimension;
pub mod error;
pub mod frame;
pub mod frame_builder;
pub mod preprocess;
pub mod table;
pub mod transform;

pub use age::{AgeBands, UNKNOWN_AGE_GROUP, categorize_age};
pub use dimension::{
    fact_data, generate_date, generate_doctor, generate_doctor_with_config, generate_facility,
    hub_rng,
};
pub use error::{Result, WarehouseError};
pub use frame::{DimensionFrame, Dimensions, FactFrame};
pub use preprocess::{FactPreprocessor, PreprocessorRegistry, default_registry};
pub use transform::{
    MissingKeyCount, check_missing_keys, key_columns_for, transform_appointment,
    transform_consultation, transform_fact, transform_patient_registration, transform_phc_login,
};

use phc_model::{FactKind, WarehouseConfig};

/// Order in which fact tables feed the Facility and Doctor generators.
/// Surrogate keys follow first-seen order, so this fixes which facility or
/// doctor gets ID 1.
pub const DIMENSION_INPUT_ORDER: [FactKind; 4] = [
    FactKind::Consultation,
    FactKind::PatientRegistration,
    FactKind::Appointment,
    FactKind::PhcLogin,
];

fn dimension_rank(kind: FactKind) -> usize {
    DIMENSION_INPUT_ORDER
        .iter()
        .position(|candidate| *candidate == kind)
        .unwrap_or(DIMENSION_INPUT_ORDER.len())
}

/// Generates all three dimensions from the complete set of preprocessed facts.
///
/// Facts are consumed in [`DIMENSION_INPUT_ORDER`] regardless of the order
/// they are passed in; facts of the same kind keep their relative order.
pub fn generate_dimensions(facts: &[FactFrame], config: &WarehouseConfig) -> Result<Dimensions> {
    let mut ordered: Vec<&FactFrame> = facts.iter().collect();
    ordered.sort_by_key(|fact| dimension_rank(fact.kind));

    let all = fact_data(ordered.iter().copied());
    let with_doctor = fact_data(ordered.iter().copied().filter(|fact| fact.kind.has_doctor()));
    Ok(Dimensions {
        facility: generate_facility(&all, &config.facility)?,
        doctor: generate_doctor_with_config(&with_doctor, &config.doctor)?,
        date: generate_date(&all)?,
    })
}
