//! Tests for loading warehouse configuration files.

use std::io::Write;

use phc_model::{FactKind, ModelError, WarehouseConfig};
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn partial_file_keeps_defaults() {
    let file = write_config(
        r#"
[doctor]
hubs = ["Bhopal", "Jabalpur"]
seed = 7
"#,
    );

    let config = WarehouseConfig::load(file.path()).unwrap();

    assert_eq!(config.doctor.hubs, vec!["Bhopal", "Jabalpur"]);
    assert_eq!(config.doctor.seed, Some(7));
    assert_eq!(config.facility.state, "Madhya Pradesh");
    assert_eq!(config.age_bands.len(), 6);
    assert_eq!(config.consultation.valid_call_threshold_secs, 120.0);
}

#[test]
fn overrides_age_bands_and_sources() {
    let file = write_config(
        r#"
display_name_width = 3

[[age_bands]]
min = 0
max = 17
label = "Minor"

[[age_bands]]
min = 18
label = "Adult"

[sources]
appointment = "appointments"
"#,
    );

    let config = WarehouseConfig::load(file.path()).unwrap();

    assert_eq!(config.display_name_width, 3);
    assert_eq!(config.age_bands.len(), 2);
    assert_eq!(config.age_bands[1].max, None);
    assert_eq!(config.sources.dir_for(FactKind::Appointment), "appointments");
    assert_eq!(
        config.sources.dir_for(FactKind::PhcLogin),
        "PHC Login Report"
    );
}

#[test]
fn invalid_toml_is_reported_with_path() {
    let file = write_config("[doctor\nhubs = 3");

    let err = WarehouseConfig::load(file.path()).unwrap_err();

    assert!(matches!(err, ModelError::Toml { .. }));
    assert!(err.to_string().contains("failed to parse TOML config"));
}

#[test]
fn empty_hub_list_fails_validation() {
    let file = write_config("[doctor]\nhubs = []\n");

    let err = WarehouseConfig::load(file.path()).unwrap_err();

    assert!(matches!(err, ModelError::InvalidConfig { .. }));
}

#[test]
fn missing_file_is_io_error() {
    let err = WarehouseConfig::load(std::path::Path::new("/nonexistent/phc.toml")).unwrap_err();
    assert!(matches!(err, ModelError::Io { .. }));
}
