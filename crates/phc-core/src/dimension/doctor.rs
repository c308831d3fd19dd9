//! Doctor dimension.

use phc_model::columns::{DOCTOR_ID, DOCTOR_KEY, HUB};
use phc_model::{DimensionKind, DoctorConfig};
use polars::prelude::DataFrame;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::{distinct_keys, key_columns, surrogate_keys, validate_inputs};
use crate::error::{Result, WarehouseError};
use crate::frame::DimensionFrame;
use crate::frame_builder::{ColumnValues, FrameBuilder};

/// Random source for hub assignment: seeded when `seed` is set, OS entropy
/// otherwise.
pub fn hub_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// One row per distinct (Doctor, Specialization) with `DoctorID` and a `Hub`
/// drawn uniformly from `hubs`.
pub fn generate_doctor<R: Rng + ?Sized>(
    inputs: &[&DataFrame],
    hubs: &[String],
    rng: &mut R,
) -> Result<DimensionFrame> {
    let kind = DimensionKind::Doctor;
    if hubs.is_empty() {
        return Err(WarehouseError::Config {
            message: "doctor hub list is empty".to_string(),
        });
    }
    validate_inputs(kind, inputs, &DOCTOR_KEY)?;

    let keys = distinct_keys(inputs, &DOCTOR_KEY)?;
    let height = keys.len();
    let assigned: Vec<Option<String>> = (0..height)
        .map(|_| hubs.choose(&mut *rng).cloned())
        .collect();

    let mut builder = FrameBuilder::new(height);
    for (name, values) in DOCTOR_KEY.iter().zip(key_columns(&keys, DOCTOR_KEY.len())) {
        builder.set(*name, ColumnValues::Str(values));
    }
    builder
        .set(DOCTOR_ID, ColumnValues::Int(surrogate_keys(height)))
        .set(HUB, ColumnValues::Str(assigned));

    debug!(dimension = %kind, rows = height, "dimension generated");
    Ok(DimensionFrame::new(kind, builder.build()?))
}

/// [`generate_doctor`] with hubs and seed taken from configuration.
pub fn generate_doctor_with_config(
    inputs: &[&DataFrame],
    config: &DoctorConfig,
) -> Result<DimensionFrame> {
    let mut rng = hub_rng(config.seed);
    generate_doctor(inputs, &config.hubs, &mut rng)
}
