mod common;

use chrono::NaiveDate;
use common::{ints, names, owned, strings};
use phc_core::dimension::{generate_date, generate_doctor, generate_facility, hub_rng};
use phc_core::frame_builder::{ColumnValues, FrameBuilder};
use phc_core::{
    Dimensions, FactFrame, WarehouseError, check_missing_keys, transform_appointment,
    transform_fact, transform_phc_login,
};
use phc_model::{FacilityConfig, FactKind, QualityKind};
use polars::prelude::*;

fn day(d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(2024, 1, d)
}

fn text(values: &[&str]) -> ColumnValues {
    ColumnValues::Str(owned(values))
}

/// Preprocessed appointment-shaped fact rows.
fn appointment_fact() -> DataFrame {
    FrameBuilder::new(4)
        .with("Date", ColumnValues::Date(vec![day(1), day(3), day(1), day(2)]))
        .with("DistrictName", text(&["Bhopal", "Dewas", "Bhopal", "Bhopal"]))
        .with("BlockName", text(&["B1", "B2", "B1", "B1"]))
        .with("PHCName", text(&["P1", "P2", "P1", "P1"]))
        .with("Doctor", text(&["Dr X", "Dr Y", "Dr Z", "Dr X"]))
        .with("Specialization", text(&["ENT", "General", "ENT", "ENT"]))
        .with(
            "Count: Appointments",
            ColumnValues::Int(vec![Some(1), Some(2), Some(3), Some(4)]),
        )
        .build()
        .unwrap()
}

fn login_fact(phc_names: &[&str]) -> DataFrame {
    let n = phc_names.len();
    FrameBuilder::new(n)
        .with("Date", ColumnValues::Date(vec![day(1); n]))
        .with("DistrictName", ColumnValues::Str(vec![Some("Bhopal".to_string()); n]))
        .with("BlockName", ColumnValues::Str(vec![Some("B1".to_string()); n]))
        .with("PHCName", text(phc_names))
        .with("PHC Uptime", ColumnValues::Int(vec![Some(60); n]))
        .build()
        .unwrap()
}

#[test]
fn appointment_keys_replace_descriptive_columns() {
    let fact = appointment_fact();
    let facility = generate_facility(&[&fact], &FacilityConfig::default()).unwrap();
    let date = generate_date(&[&fact]).unwrap();
    let doctor_source = fact.select(["Doctor", "Specialization"]).unwrap().head(Some(2));
    let doctor = generate_doctor(
        &[&doctor_source],
        &["Pune".to_string()],
        &mut hub_rng(Some(3)),
    )
    .unwrap();

    let out = transform_appointment(&fact, &facility.data, &date.data, &doctor.data).unwrap();

    assert_eq!(
        names(&out),
        vec!["Count: Appointments", "PHCID", "DateID", "DoctorID"]
    );
    assert_eq!(ints(&out, "PHCID"), vec![Some(1), Some(2), Some(1), Some(1)]);
    assert_eq!(
        ints(&out, "DateID"),
        vec![
            Some(20_240_101),
            Some(20_240_103),
            Some(20_240_101),
            Some(20_240_102)
        ]
    );
    // "Dr Z" never reached the doctor dimension.
    assert_eq!(ints(&out, "DoctorID"), vec![Some(1), Some(2), None, Some(1)]);
    assert_eq!(
        ints(&out, "Count: Appointments"),
        vec![Some(1), Some(2), Some(3), Some(4)]
    );
}

#[test]
fn joining_back_on_surrogate_keys_recovers_descriptive_values() {
    let fact = appointment_fact();
    let facility = generate_facility(&[&fact], &FacilityConfig::default()).unwrap();
    let date = generate_date(&[&fact]).unwrap();
    let doctor = generate_doctor(&[&fact], &["Agra".to_string()], &mut hub_rng(Some(9))).unwrap();

    let out = transform_appointment(&fact, &facility.data, &date.data, &doctor.data).unwrap();

    let phc_ids = ints(&out, "PHCID");
    let dim_ids = ints(&facility.data, "PHCID");
    let dim_names = strings(&facility.data, "PHCName");
    let original = strings(&fact, "PHCName");
    for (row, id) in phc_ids.iter().enumerate() {
        let id = id.expect("every facility matched");
        let pos = dim_ids.iter().position(|d| *d == Some(id)).unwrap();
        assert_eq!(dim_names[pos], original[row]);
    }

    let doctor_ids = ints(&out, "DoctorID");
    let dim_doctor_ids = ints(&doctor.data, "DoctorID");
    let dim_doctors = strings(&doctor.data, "Doctor");
    let original_doctors = strings(&fact, "Doctor");
    for (row, id) in doctor_ids.iter().enumerate() {
        let id = id.expect("every doctor matched");
        let pos = dim_doctor_ids.iter().position(|d| *d == Some(id)).unwrap();
        assert_eq!(dim_doctors[pos], original_doctors[row]);
    }

    let date_ids = ints(&out, "DateID");
    let dim_date_ids = ints(&date.data, "DateID");
    let dim_dates = strings(&date.data, "Date");
    let original_dates = strings(&fact, "Date");
    for (row, id) in date_ids.iter().enumerate() {
        let pos = dim_date_ids.iter().position(|d| d == id).unwrap();
        assert_eq!(dim_dates[pos], original_dates[row]);
    }
}

#[test]
fn facility_join_uses_the_full_geography_triple() {
    let dimension_source = FrameBuilder::new(2)
        .with("DistrictName", text(&["Bhopal", "Dewas"]))
        .with("BlockName", text(&["B1", "B9"]))
        .with("PHCName", text(&["Shared", "Shared"]))
        .build()
        .unwrap();
    let facility = generate_facility(&[&dimension_source], &FacilityConfig::default()).unwrap();
    let fact = login_fact(&["Shared", "Shared"]);
    let date = generate_date(&[&fact]).unwrap();

    let out = transform_phc_login(&fact, &facility.data, &date.data).unwrap();

    assert_eq!(out.height(), 2);
    assert_eq!(ints(&out, "PHCID"), vec![Some(1), Some(1)]);
    assert_eq!(names(&out), vec!["PHC Uptime", "PHCID", "DateID"]);
}

#[test]
fn diagnostic_reports_unmatched_rows_without_failing() {
    let known = login_fact(&["P1"]);
    let facility = generate_facility(&[&known], &FacilityConfig::default()).unwrap();
    let fact = login_fact(&[
        "P1", "P1", "Gone", "P1", "P1", "Gone", "P1", "P1", "Gone", "P1",
    ]);
    let date = generate_date(&[&fact]).unwrap();

    let out = transform_phc_login(&fact, &facility.data, &date.data).unwrap();
    let report = check_missing_keys(&out, &["PHCID", "DateID", "DoctorID"]);

    assert_eq!(out.height(), 10);
    assert_eq!(report[0].column, "PHCID");
    assert_eq!(report[0].unmatched, 3);
    assert_eq!(report[0].total, 10);
    assert!(report[1].is_clean());
    // An absent key column counts every row.
    assert_eq!(report[2].unmatched, 10);
}

#[test]
fn transform_fact_records_unmatched_keys_in_quality() {
    let known = login_fact(&["P1"]);
    let facility = generate_facility(&[&known], &FacilityConfig::default()).unwrap();
    let fact = login_fact(&["P1", "Gone"]);
    let date = generate_date(&[&fact]).unwrap();
    let doctor_source = FrameBuilder::new(1)
        .with("Doctor", text(&["Dr X"]))
        .with("Specialization", text(&["ENT"]))
        .build()
        .unwrap();
    let doctor = generate_doctor(&[&doctor_source], &["Pune".to_string()], &mut hub_rng(Some(1)))
        .unwrap();
    let dimensions = Dimensions {
        facility,
        doctor,
        date,
    };

    let out = transform_fact(&FactFrame::new(FactKind::PhcLogin, fact), &dimensions).unwrap();

    assert_eq!(out.kind, FactKind::PhcLogin);
    assert_eq!(out.quality.rows_of_kind(QualityKind::Unmatched), 1);
    assert_eq!(out.quality.entries[0].step, "PHCID");
    assert!(out.data.column("DoctorID").is_err());
}

#[test]
fn transform_requires_descriptive_columns() {
    let fact = login_fact(&["P1"]);
    let facility = generate_facility(&[&fact], &FacilityConfig::default()).unwrap();
    let date = generate_date(&[&fact]).unwrap();
    let without_block = fact.drop("BlockName").unwrap();

    let err = transform_phc_login(&without_block, &facility.data, &date.data).unwrap_err();

    match err {
        WarehouseError::MissingColumns { dataset, columns } => {
            assert_eq!(dataset, "PHCLogin");
            assert_eq!(columns, vec!["BlockName".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}
