mod common;

use common::{floats, ints, names, owned, repeat, some, strings, text_frame};
use phc_core::preprocess::{
    AppointmentPreprocessor, ConsultationPreprocessor, FactPreprocessor,
    PatientRegistrationPreprocessor, PhcLoginPreprocessor,
};
use phc_core::{WarehouseError, default_registry};
use phc_model::{FactKind, QualityKind, WarehouseConfig};
use polars::prelude::*;

fn appointment_raw(dates: &[&'static str], statuses: &[&'static str]) -> DataFrame {
    let n = dates.len();
    text_frame(&[
        ("AppointmentTime", some(dates)),
        ("DistrictName", repeat("Bhopal", n)),
        ("BlockName", repeat("Berasia", n)),
        ("PHCName", repeat("PHC A", n)),
        ("Doctor", repeat("Dr X", n)),
        ("Specialization", repeat("ENT", n)),
        ("ConsultStatus", some(statuses)),
    ])
}

#[test]
fn appointment_pivots_statuses_into_counts() {
    let raw = text_frame(&[
        (
            "AppointmentTime",
            some(&["01-01-2024", "01-01-2024", "01-01-2024", "02-01-2024"]),
        ),
        ("DistrictName", repeat("Bhopal", 4)),
        ("BlockName", repeat("Berasia", 4)),
        ("PHCName", repeat("PHC A", 4)),
        ("Doctor", some(&["Dr X", "Dr X", "Dr X", "Dr Y"])),
        ("Specialization", some(&["ENT", "ENT", "ENT", "General"])),
        (
            "ConsultStatus",
            some(&["Completed", "Cancelled", "Completed", "No Show"]),
        ),
        ("PatientName", vec![Some("P1"), Some("P2"), Some("P3"), None]),
        ("WorkbookName", repeat("appointments.csv", 4)),
    ]);

    let fact = AppointmentPreprocessor
        .preprocess(&raw, &WarehouseConfig::default())
        .unwrap();

    assert_eq!(
        names(&fact.data),
        vec![
            "Date",
            "DistrictName",
            "BlockName",
            "PHCName",
            "Doctor",
            "Specialization",
            "Cancelled",
            "Completed",
            "Count: Appointments",
        ]
    );
    assert_eq!(fact.data.height(), 1);
    assert_eq!(ints(&fact.data, "Completed"), vec![Some(2)]);
    assert_eq!(ints(&fact.data, "Cancelled"), vec![Some(1)]);
    assert_eq!(ints(&fact.data, "Count: Appointments"), vec![Some(3)]);
    assert_eq!(fact.data.column("Date").unwrap().dtype(), &DataType::Date);
    assert_eq!(fact.quality.excluded_rows(), 1);
}

#[test]
fn appointment_zero_fills_statuses_and_sorts_groups() {
    let raw = appointment_raw(
        &["03-01-2024", "01-01-2024", "03-01-2024"],
        &["Completed", "Cancelled", "Completed"],
    );
    let fact = AppointmentPreprocessor
        .preprocess(&raw, &WarehouseConfig::default())
        .unwrap();
    assert_eq!(
        strings(&fact.data, "Date"),
        owned(&["2024-01-01", "2024-01-03"])
    );
    assert_eq!(ints(&fact.data, "Cancelled"), vec![Some(1), Some(0)]);
    assert_eq!(ints(&fact.data, "Completed"), vec![Some(0), Some(2)]);
    assert_eq!(
        ints(&fact.data, "Count: Appointments"),
        vec![Some(1), Some(2)]
    );
}

#[test]
fn appointment_accepts_renamed_date_column() {
    let raw = appointment_raw(&["05-06-2024"], &["Completed"]);
    let mut raw = raw;
    raw.rename("AppointmentTime", "Date".into()).unwrap();
    let fact = AppointmentPreprocessor
        .preprocess(&raw, &WarehouseConfig::default())
        .unwrap();
    assert_eq!(strings(&fact.data, "Date"), owned(&["2024-06-05"]));
}

#[test]
fn appointment_unparseable_date_fails_the_run() {
    let raw = appointment_raw(&["01-01-2024", "2024/01/02"], &["Completed", "Completed"]);
    let err = AppointmentPreprocessor
        .preprocess(&raw, &WarehouseConfig::default())
        .unwrap_err();
    match err {
        WarehouseError::Parse { column, sample, .. } => {
            assert_eq!(column, "AppointmentTime");
            assert_eq!(sample, "2024/01/02");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn appointment_missing_status_column_is_reported() {
    let raw = text_frame(&[
        ("AppointmentTime", some(&["01-01-2024"])),
        ("DistrictName", some(&["Bhopal"])),
        ("BlockName", some(&["Berasia"])),
        ("PHCName", some(&["PHC A"])),
        ("Doctor", some(&["Dr X"])),
        ("Specialization", some(&["ENT"])),
    ]);
    let err = AppointmentPreprocessor
        .preprocess(&raw, &WarehouseConfig::default())
        .unwrap_err();
    match err {
        WarehouseError::MissingColumns { dataset, columns } => {
            assert_eq!(dataset, "Appointment");
            assert_eq!(columns, vec!["ConsultStatus".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn appointment_status_named_like_a_key_column_is_rejected() {
    let raw = appointment_raw(&["01-01-2024", "01-01-2024"], &["Doctor", "Completed"]);
    let err = AppointmentPreprocessor
        .preprocess(&raw, &WarehouseConfig::default())
        .unwrap_err();
    match err {
        WarehouseError::Validation { message } => {
            assert!(message.contains("'Doctor'"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn consultation_raw() -> DataFrame {
    text_frame(&[
        ("SrNo", some(&["1", "2", "3", "4", "5", "6", "7"])),
        (
            "ConsultDate",
            some(&[
                "05-02-2024",
                "05-02-2024",
                "05-02-2024",
                "05-02-2024",
                "05-02-2024",
                "bad date",
                "06-02-2024",
            ]),
        ),
        (
            "StartTime",
            some(&[
                "09:10:00", "23:30:00", "09:10:00", "11:00:00", "12:00:00", "12:00:00", "10:00 AM",
            ]),
        ),
        (
            "EndTime",
            some(&[
                "09:15:00", "23:31:00", "09:20:00", "11:10:00", "12:10:00", "12:10:00", "10:30 AM",
            ]),
        ),
        (
            "Age",
            some(&[
                "34 Years", "200 days", "34 Years", "20 Years", "unknown", "20 Years", "70 years",
            ]),
        ),
        (
            "PatientCaseID",
            some(&["C1", "C2", "C1", "C4", "C5", "C6", "C7"]),
        ),
        ("OPDNo", some(&["101", "102", "103", "abc", "105", "106", "101"])),
        ("District", repeat("Dewas", 7)),
        ("Block", repeat("Sonkatch", 7)),
        ("PHC", repeat("PHC B", 7)),
        ("Doctor", repeat("Dr Z", 7)),
        ("Specialization", repeat("Medicine", 7)),
        ("Patient", repeat("Someone", 7)),
        ("WorkbookName", repeat("consultations.csv", 7)),
    ])
}

#[test]
fn consultation_derives_measures_and_drops_identifiers() {
    let fact = ConsultationPreprocessor
        .preprocess(&consultation_raw(), &WarehouseConfig::default())
        .unwrap();

    assert_eq!(
        names(&fact.data),
        vec![
            "Date",
            "Hour",
            "OPDNo",
            "DistrictName",
            "BlockName",
            "PHCName",
            "Doctor",
            "Specialization",
            "Call Duration",
            "Status: Consultation",
            "Age_grp",
        ]
    );
    assert_eq!(
        floats(&fact.data, "Call Duration"),
        vec![Some(300.0), Some(60.0), Some(1800.0)]
    );
    assert_eq!(
        strings(&fact.data, "Status: Consultation"),
        owned(&["Valid Call", "Invalid Call", "Valid Call"])
    );
    assert_eq!(
        strings(&fact.data, "Hour"),
        owned(&["09 - 10", "23 - 00", "10 - 11"])
    );
    assert_eq!(
        strings(&fact.data, "Age_grp"),
        owned(&["Adult", "Infant", "Senior"])
    );
    assert_eq!(ints(&fact.data, "OPDNo"), vec![Some(1), Some(2), Some(1)]);
    assert_eq!(
        strings(&fact.data, "Date"),
        owned(&["2024-02-05", "2024-02-05", "2024-02-06"])
    );
}

#[test]
fn consultation_records_each_exclusion_step() {
    let fact = ConsultationPreprocessor
        .preprocess(&consultation_raw(), &WarehouseConfig::default())
        .unwrap();
    let steps: Vec<(&str, usize)> = fact
        .quality
        .entries
        .iter()
        .map(|entry| (entry.step.as_str(), entry.rows))
        .collect();
    assert_eq!(
        steps,
        vec![
            ("consult_date", 1),
            ("age", 1),
            ("dedupe_case_id", 1),
            ("visit_number", 1),
        ]
    );
    assert!(
        fact.quality
            .entries
            .iter()
            .all(|entry| entry.kind == QualityKind::Excluded && entry.dataset == "Consultation")
    );
}

#[test]
fn consultation_threshold_comes_from_config() {
    let mut config = WarehouseConfig::default();
    config.consultation.valid_call_threshold_secs = 30.0;
    let fact = ConsultationPreprocessor
        .preprocess(&consultation_raw(), &config)
        .unwrap();
    assert_eq!(
        strings(&fact.data, "Status: Consultation"),
        owned(&["Valid Call", "Valid Call", "Valid Call"])
    );
}

#[test]
fn consultation_without_any_parseable_date_is_a_parse_error() {
    let mut raw = consultation_raw();
    raw.with_column(Series::new("ConsultDate".into(), vec!["2024-02-05"; 7]))
        .unwrap();
    let err = ConsultationPreprocessor
        .preprocess(&raw, &WarehouseConfig::default())
        .unwrap_err();
    assert!(matches!(
        err,
        WarehouseError::Parse { ref column, .. } if column == "ConsultDate"
    ));
}

#[test]
fn consultation_without_any_parseable_age_is_a_parse_error() {
    let mut raw = consultation_raw();
    raw.with_column(Series::new("Age".into(), vec!["N/A"; 7])).unwrap();
    let err = ConsultationPreprocessor
        .preprocess(&raw, &WarehouseConfig::default())
        .unwrap_err();
    match err {
        WarehouseError::Parse { column, sample, .. } => {
            assert_eq!(column, "Age");
            assert_eq!(sample, "N/A");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn registration_without_any_parseable_age_is_a_parse_error() {
    let raw = text_frame(&[
        ("Age", some(&["N/A", "N/A"])),
        (
            "Registration Date",
            some(&["01-03-2024 09:15:00 AM", "01-03-2024 09:45:00 AM"]),
        ),
        ("District", repeat("Indore", 2)),
        ("Block", repeat("Mhow", 2)),
        ("PHC", repeat("PHC C", 2)),
        ("Gender", some(&["M", "F"])),
        ("Patient Name", some(&["A", "B"])),
    ]);
    let err = PatientRegistrationPreprocessor
        .preprocess(&raw, &WarehouseConfig::default())
        .unwrap_err();
    assert!(matches!(
        err,
        WarehouseError::Parse { ref column, .. } if column == "Age"
    ));
}

#[test]
fn registration_counts_by_group_and_drops_unknown_ages() {
    let raw = text_frame(&[
        (
            "Age",
            some(&["30 Years", "31 years", "10 Days", "-5 years", "abc", "40 Years"]),
        ),
        (
            "Registration Date",
            some(&[
                "01-03-2024 09:15:00 AM",
                "01-03-2024 09:45:00 AM",
                "01-03-2024 02:05:00 PM",
                "01-03-2024 09:15:00 AM",
                "01-03-2024 09:15:00 AM",
                "2024-03-01 10:00",
            ]),
        ),
        ("District", repeat("Indore", 6)),
        ("Block", repeat("Mhow", 6)),
        ("PHC", repeat("PHC C", 6)),
        ("Gender", some(&["M", "M", "F", "M", "M", "M"])),
        ("Patient Name", some(&["A", "B", "C", "D", "E", "F"])),
    ]);

    let fact = PatientRegistrationPreprocessor
        .preprocess(&raw, &WarehouseConfig::default())
        .unwrap();

    assert_eq!(
        names(&fact.data),
        vec![
            "Date",
            "DistrictName",
            "BlockName",
            "PHCName",
            "Gender",
            "Age_grp",
            "Hour",
            "Count: Patient Registered",
        ]
    );
    assert_eq!(strings(&fact.data, "Gender"), owned(&["F", "M"]));
    assert_eq!(strings(&fact.data, "Age_grp"), owned(&["Infant", "Adult"]));
    assert_eq!(strings(&fact.data, "Hour"), owned(&["14 - 15", "09 - 10"]));
    assert_eq!(
        ints(&fact.data, "Count: Patient Registered"),
        vec![Some(1), Some(2)]
    );
    let reasons: Vec<&str> = fact
        .quality
        .entries
        .iter()
        .map(|entry| entry.reason.as_str())
        .collect();
    assert_eq!(
        reasons,
        vec![
            "unparseable age",
            "unknown age group",
            "unparseable registration date"
        ]
    );
}

#[test]
fn login_computes_uptime_and_renames_geography() {
    let raw = text_frame(&[
        ("SL No.", some(&["1", "2", "3"])),
        ("Date", some(&["01-01-2024", "01-01-2024", "02-01-2024"])),
        ("Login Time", some(&["09:00:00", "bad", "10:00:00"])),
        ("Logout Time", some(&["17:00:00", "17:00:00", "10:30:00"])),
        ("District", repeat("Gwalior", 3)),
        ("Block", repeat("Dabra", 3)),
        ("PHC", vec![Some("PHC D"), Some("PHC D"), None]),
        ("Remark", repeat("ok", 3)),
        ("Operator", some(&["u1", "u2", "u3"])),
    ]);

    let fact = PhcLoginPreprocessor
        .preprocess(&raw, &WarehouseConfig::default())
        .unwrap();

    assert_eq!(
        names(&fact.data),
        vec![
            "Date",
            "DistrictName",
            "BlockName",
            "PHCName",
            "Operator",
            "PHC Uptime",
        ]
    );
    assert_eq!(ints(&fact.data, "PHC Uptime"), vec![Some(28_800)]);
    assert_eq!(strings(&fact.data, "Operator"), owned(&["u1"]));
    assert_eq!(fact.quality.excluded_rows(), 2);
    assert_eq!(fact.quality.for_dataset("PHCLogin").count(), 2);
}

#[test]
fn login_without_any_parseable_login_time_is_a_parse_error() {
    let raw = text_frame(&[
        ("Date", some(&["01-01-2024"])),
        ("Login Time", some(&["9am"])),
        ("Logout Time", some(&["17:00:00"])),
        ("District", some(&["Gwalior"])),
        ("Block", some(&["Dabra"])),
        ("PHC", some(&["PHC D"])),
    ]);
    let err = PhcLoginPreprocessor
        .preprocess(&raw, &WarehouseConfig::default())
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "PHCLogin: cannot parse column 'Login Time' (value '9am'): no value matches %H:%M:%S"
    );
}

#[test]
fn registry_runs_each_raw_table_in_order() {
    let raws = vec![
        (
            FactKind::Appointment,
            appointment_raw(&["01-01-2024"], &["Completed"]),
        ),
        (FactKind::Consultation, consultation_raw()),
    ];
    let facts = default_registry()
        .preprocess_all(&raws, &WarehouseConfig::default())
        .unwrap();
    let kinds: Vec<FactKind> = facts.iter().map(|fact| fact.kind).collect();
    assert_eq!(kinds, vec![FactKind::Appointment, FactKind::Consultation]);
    assert_eq!(facts[1].record_count(), 3);
}
