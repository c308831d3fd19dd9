//! Facility (PHC) dimension.

use phc_model::columns::{COUNTRY, DIVISION, FACILITY_KEY, PHC_ID, STATE};
use phc_model::{DimensionKind, FacilityConfig, QualityReport};
use polars::prelude::DataFrame;
use tracing::{debug, warn};

use super::{distinct_keys, key_columns, surrogate_keys, validate_inputs};
use crate::error::Result;
use crate::frame::DimensionFrame;
use crate::frame_builder::{ColumnValues, FrameBuilder};

/// One row per distinct (DistrictName, BlockName, PHCName) with `PHCID`,
/// static `State`/`Country` and the district's `Division`.
pub fn generate_facility(inputs: &[&DataFrame], config: &FacilityConfig) -> Result<DimensionFrame> {
    let kind = DimensionKind::Facility;
    validate_inputs(kind, inputs, &FACILITY_KEY)?;

    let keys = distinct_keys(inputs, &FACILITY_KEY)?;
    let height = keys.len();
    let columns = key_columns(&keys, FACILITY_KEY.len());

    let lookup = config.district_to_division();
    let divisions: Vec<Option<String>> = columns[0]
        .iter()
        .map(|district| {
            district
                .as_deref()
                .and_then(|name| lookup.get(name))
                .cloned()
        })
        .collect();

    let mut quality = QualityReport::new();
    let unmapped = divisions.iter().filter(|d| d.is_none()).count();
    if unmapped > 0 {
        warn!(
            dimension = %kind,
            unmapped,
            "districts without a division"
        );
    }
    quality.record_unmapped(
        kind.as_str(),
        DIVISION,
        "district not in division table",
        unmapped,
    );

    let mut builder = FrameBuilder::new(height);
    for (name, values) in FACILITY_KEY.iter().zip(columns) {
        builder.set(*name, ColumnValues::Str(values));
    }
    builder
        .set(PHC_ID, ColumnValues::Int(surrogate_keys(height)))
        .set(STATE, ColumnValues::Str(vec![Some(config.state.clone()); height]))
        .set(
            COUNTRY,
            ColumnValues::Str(vec![Some(config.country.clone()); height]),
        )
        .set(DIVISION, ColumnValues::Str(divisions));

    debug!(dimension = %kind, rows = height, "dimension generated");
    Ok(DimensionFrame::new(kind, builder.build()?).with_quality(quality))
}
