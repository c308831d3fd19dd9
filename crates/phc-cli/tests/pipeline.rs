use std::fs::{self, File};
use std::path::{Path, PathBuf};

use phc_cli::build::{BuildOptions, build_warehouse};
use phc_cli::types::TableRole;
use phc_model::WarehouseConfig;
use phc_output::OutputFormat;
use polars::prelude::*;
use tempfile::TempDir;

const APPOINTMENTS: &str = "\
AppointmentTime,DistrictName,BlockName,PHCName,Doctor,Specialization,ConsultStatus,PatientName
01-01-2024,Bhopal,Berasia,PHC A,Dr X,ENT,Completed,Asha
01-01-2024,Bhopal,Berasia,PHC A,Dr X,ENT,Cancelled,Ravi
02-01-2024,Dewas,Sonkatch,PHC B,Dr Y,General,Completed,Meena
";

const REGISTRATIONS: &str = "\
Age,Registration Date,District,Block,PHC,Gender,Patient Name
30 Years,01-01-2024 09:15:00 AM,Bhopal,Berasia,PHC A,F,Asha
45 Years,02-01-2024 10:30:00 AM,Dewas,Sonkatch,PHC B,M,Ravi
";

const CONSULTATIONS: &str = "\
SrNo,ConsultDate,StartTime,EndTime,Age,PatientCaseID,OPDNo,District,Block,PHC,Doctor,Specialization,PatientName
1,01-01-2024,09:10:00,09:20:00,30 Years,C1,101,Bhopal,Berasia,PHC A,Dr X,ENT,Asha
2,02-01-2024,10:00:00,10:01:00,45 Years,C2,102,Dewas,Sonkatch,PHC B,Dr Y,General,Ravi
";

const LOGINS: &str = "\
Date,Login Time,Logout Time,District,Block,PHC,Operator
01-01-2024,09:00:00,11:00:00,Bhopal,Berasia,PHC A,op1
";

fn write_source(raw_dir: &Path, folder: &str, file: &str, contents: &str) {
    let dir = raw_dir.join(folder);
    fs::create_dir_all(&dir).expect("create source folder");
    fs::write(dir.join(file), contents).expect("write source file");
}

/// `<tmp>/RAW` with one export per source folder.
fn raw_tree(tmp: &TempDir) -> PathBuf {
    let raw_dir = tmp.path().join("RAW");
    write_source(&raw_dir, "Appointment Reports", "appointments.csv", APPOINTMENTS);
    write_source(&raw_dir, "Patient Registration", "registrations.csv", REGISTRATIONS);
    write_source(&raw_dir, "Consultation Reports", "consultations.csv", CONSULTATIONS);
    write_source(&raw_dir, "PHC Login Report", "logins.csv", LOGINS);
    raw_dir
}

fn seeded_config() -> WarehouseConfig {
    let mut config = WarehouseConfig::default();
    config.doctor.seed = Some(42);
    config
}

fn read_parquet(path: &Path) -> DataFrame {
    let file = File::open(path).expect("open parquet");
    ParquetReader::new(file).finish().expect("read parquet")
}

fn strings(df: &DataFrame, name: &str) -> Vec<String> {
    df.column(name)
        .expect("column")
        .as_materialized_series()
        .str()
        .expect("string column")
        .into_iter()
        .map(|value| value.unwrap_or_default().to_string())
        .collect()
}

#[test]
fn build_writes_every_table_next_to_the_raw_folder() {
    let tmp = TempDir::new().expect("tempdir");
    let raw_dir = raw_tree(&tmp);

    let result = build_warehouse(&BuildOptions::new(&raw_dir, seeded_config())).expect("build");

    let output_dir = tmp.path().join("Processed");
    assert_eq!(result.output_dir, output_dir);
    for name in [
        "Processed_Appointment",
        "Processed_Patientreg",
        "Processed_Consultation",
        "Processed_PHCLogin",
        "Processed_Dim_PHC",
        "Processed_Dim_Doctor",
        "Processed_Dim_Date",
    ] {
        let path = output_dir.join(format!("{name}.parquet"));
        assert!(path.is_file(), "{name} not written");
    }
    let report = result.quality_report.as_ref().expect("quality report path");
    assert!(report.is_file());
    assert_eq!(
        result
            .tables
            .iter()
            .filter(|table| table.role == TableRole::Fact)
            .count(),
        4
    );
    assert_eq!(result.total_unmatched(), 0);
}

#[test]
fn dimension_names_are_anonymised_by_default() {
    let tmp = TempDir::new().expect("tempdir");
    let raw_dir = raw_tree(&tmp);

    build_warehouse(&BuildOptions::new(&raw_dir, seeded_config())).expect("build");

    let facilities = read_parquet(&tmp.path().join("Processed/Processed_Dim_PHC.parquet"));
    let mut names = strings(&facilities, "PHCName");
    names.sort();
    assert_eq!(names, vec!["PHC 01", "PHC 02"]);

    let doctors = read_parquet(&tmp.path().join("Processed/Processed_Dim_Doctor.parquet"));
    let mut names = strings(&doctors, "Doctor");
    names.sort();
    assert_eq!(names, vec!["Doctor 01", "Doctor 02"]);
}

#[test]
fn real_names_are_kept_when_anonymisation_is_off() {
    let tmp = TempDir::new().expect("tempdir");
    let raw_dir = raw_tree(&tmp);
    let mut options = BuildOptions::new(&raw_dir, seeded_config());
    options.anonymize = false;
    options.format = OutputFormat::Csv;

    build_warehouse(&options).expect("build");

    let csv = fs::read_to_string(tmp.path().join("Processed/Processed_Dim_PHC.csv"))
        .expect("read facility csv");
    assert!(csv.contains("PHC A"));
    assert!(csv.contains("PHC B"));
}

#[test]
fn dry_run_writes_nothing() {
    let tmp = TempDir::new().expect("tempdir");
    let raw_dir = raw_tree(&tmp);
    let mut options = BuildOptions::new(&raw_dir, seeded_config());
    options.dry_run = true;

    let result = build_warehouse(&options).expect("build");

    assert!(result.dry_run);
    assert!(result.quality_report.is_none());
    assert!(result.tables.iter().all(|table| table.output.is_none()));
    assert!(!tmp.path().join("Processed").exists());
    assert_eq!(result.tables.len(), 7);
}

#[test]
fn missing_source_folder_fails_before_writing() {
    let tmp = TempDir::new().expect("tempdir");
    let raw_dir = raw_tree(&tmp);
    fs::remove_dir_all(raw_dir.join("PHC Login Report")).expect("remove login folder");

    let err = build_warehouse(&BuildOptions::new(&raw_dir, seeded_config())).unwrap_err();

    assert!(format!("{err:#}").contains("PHC Login Report"));
    assert!(!tmp.path().join("Processed").exists());
}

#[test]
fn explicit_output_dir_is_used() {
    let tmp = TempDir::new().expect("tempdir");
    let raw_dir = raw_tree(&tmp);
    let mut options = BuildOptions::new(&raw_dir, seeded_config());
    options.output_dir = Some(tmp.path().join("warehouse"));

    let result = build_warehouse(&options).expect("build");

    assert_eq!(result.output_dir, tmp.path().join("warehouse"));
    assert!(
        tmp.path()
            .join("warehouse/Processed_Appointment.parquet")
            .is_file()
    );
}
