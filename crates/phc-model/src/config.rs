//! Deployment configuration for the warehouse build.
//!
//! Every constant the transforms depend on (hub list, district to division
//! table, static State/Country, age bands, call validity threshold, source
//! directory names) lives here so a deployment can swap them with a TOML file
//! instead of a code change. `Default` reproduces the reference deployment.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::kinds::FactKind;

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarehouseConfig {
    pub facility: FacilityConfig,
    pub doctor: DoctorConfig,
    pub age_bands: Vec<AgeBand>,
    pub consultation: ConsultationConfig,
    pub sources: SourceDirs,
    /// Zero-padding width of synthetic display names ("PHC 01").
    pub display_name_width: usize,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            facility: FacilityConfig::default(),
            doctor: DoctorConfig::default(),
            age_bands: default_age_bands(),
            consultation: ConsultationConfig::default(),
            sources: SourceDirs::default(),
            display_name_width: 2,
        }
    }
}

impl WarehouseConfig {
    /// Load a configuration file. Sections absent from the file keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ModelError::io(path, e))?;
        let config: WarehouseConfig =
            toml::from_str(&contents).map_err(|e| ModelError::Toml {
                path: path.to_path_buf(),
                source: e,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the transforms cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.doctor.hubs.is_empty() {
            return Err(ModelError::InvalidConfig {
                message: "doctor.hubs must list at least one hub".to_string(),
            });
        }
        if self.age_bands.is_empty() {
            return Err(ModelError::InvalidConfig {
                message: "age_bands must define at least one band".to_string(),
            });
        }
        for band in &self.age_bands {
            if let Some(max) = band.max
                && max < band.min
            {
                return Err(ModelError::InvalidConfig {
                    message: format!(
                        "age band '{}' has max {max} below min {}",
                        band.label, band.min
                    ),
                });
            }
        }
        if self.consultation.valid_call_threshold_secs < 0.0 {
            return Err(ModelError::InvalidConfig {
                message: "consultation.valid_call_threshold_secs must not be negative"
                    .to_string(),
            });
        }
        Ok(())
    }
}

/// Static facility attributes and the district to division lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacilityConfig {
    pub state: String,
    pub country: String,
    /// Division name to the districts it contains.
    pub divisions: BTreeMap<String, Vec<String>>,
}

impl Default for FacilityConfig {
    fn default() -> Self {
        let mut divisions = BTreeMap::new();
        divisions.insert(
            "Bhopal".to_string(),
            owned(&[
                "Betul",
                "Bhopal",
                "Harda",
                "Hoshangabad",
                "Raisen",
                "Rajgarh",
                "Sehore",
                "Vidisha",
            ]),
        );
        divisions.insert(
            "Ujjain".to_string(),
            owned(&[
                "Agar Malwa",
                "Dewas",
                "Mandsaur",
                "Shajapur",
                "Ujjain",
                "Neemuch",
                "Ratlam",
            ]),
        );
        divisions.insert(
            "Indore".to_string(),
            owned(&[
                "Dhar",
                "Indore",
                "Khargone",
                "EAST NIMAR",
                "Barwani",
                "Burhanpur",
                "Jhabua",
                "Alirajpur",
            ]),
        );
        divisions.insert(
            "Gwalior".to_string(),
            owned(&[
                "Guna",
                "Gwalior",
                "Morena",
                "Sheopur",
                "Shivpuri",
                "Ashoknagar",
                "Bhind",
                "Datia",
            ]),
        );
        Self {
            state: "Madhya Pradesh".to_string(),
            country: "India".to_string(),
            divisions,
        }
    }
}

impl FacilityConfig {
    /// Reverse the division table into district -> division.
    ///
    /// A district listed under several divisions resolves to the first division
    /// in name order.
    pub fn district_to_division(&self) -> BTreeMap<String, String> {
        let mut lookup = BTreeMap::new();
        for (division, districts) in &self.divisions {
            for district in districts {
                lookup
                    .entry(district.clone())
                    .or_insert_with(|| division.clone());
            }
        }
        lookup
    }
}

/// Doctor dimension enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoctorConfig {
    pub hubs: Vec<String>,
    /// Seed for hub assignment. `None` draws from OS entropy, so hubs differ run to run.
    pub seed: Option<u64>,
}

impl Default for DoctorConfig {
    fn default() -> Self {
        Self {
            hubs: owned(&["Indore", "Delhi", "Pune", "Agra", "Nagpur"]),
            seed: None,
        }
    }
}

/// One inclusive age band. `max = None` means unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeBand {
    pub min: i64,
    pub max: Option<i64>,
    pub label: String,
}

impl AgeBand {
    pub fn new(min: i64, max: Option<i64>, label: impl Into<String>) -> Self {
        Self {
            min,
            max,
            label: label.into(),
        }
    }

    pub fn contains(&self, age: i64) -> bool {
        age >= self.min && self.max.is_none_or(|max| age <= max)
    }
}

pub fn default_age_bands() -> Vec<AgeBand> {
    vec![
        AgeBand::new(0, Some(2), "Infant"),
        AgeBand::new(3, Some(5), "Preschool child"),
        AgeBand::new(6, Some(13), "Child"),
        AgeBand::new(14, Some(18), "Adolescent"),
        AgeBand::new(19, Some(64), "Adult"),
        AgeBand::new(65, None, "Senior"),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsultationConfig {
    /// Calls shorter than this many seconds are classified "Invalid Call".
    pub valid_call_threshold_secs: f64,
}

impl Default for ConsultationConfig {
    fn default() -> Self {
        Self {
            valid_call_threshold_secs: 120.0,
        }
    }
}

/// Sub-directories of the raw data root holding each export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceDirs {
    pub appointment: String,
    pub consultation: String,
    pub patient_registration: String,
    pub phc_login: String,
}

impl Default for SourceDirs {
    fn default() -> Self {
        Self {
            appointment: "Appointment Reports".to_string(),
            consultation: "Consultation Reports".to_string(),
            patient_registration: "Patient Registration".to_string(),
            phc_login: "PHC Login Report".to_string(),
        }
    }
}

impl SourceDirs {
    pub fn dir_for(&self, kind: FactKind) -> &str {
        match kind {
            FactKind::Appointment => &self.appointment,
            FactKind::Consultation => &self.consultation,
            FactKind::PatientRegistration => &self.patient_registration,
            FactKind::PhcLogin => &self.phc_login,
        }
    }
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(WarehouseConfig::default().validate().is_ok());
    }

    #[test]
    fn district_lookup_covers_every_listed_district() {
        let lookup = FacilityConfig::default().district_to_division();
        assert_eq!(lookup.get("Bhopal").map(String::as_str), Some("Bhopal"));
        assert_eq!(lookup.get("EAST NIMAR").map(String::as_str), Some("Indore"));
        assert_eq!(lookup.get("Datia").map(String::as_str), Some("Gwalior"));
        assert_eq!(lookup.get("Neemuch").map(String::as_str), Some("Ujjain"));
        assert!(!lookup.contains_key("Jabalpur"));
        assert_eq!(lookup.len(), 31);
    }

    #[test]
    fn open_band_contains_large_ages() {
        let senior = AgeBand::new(65, None, "Senior");
        assert!(senior.contains(65));
        assert!(senior.contains(120));
        assert!(!senior.contains(64));
    }

    #[test]
    fn rejects_empty_hubs() {
        let mut config = WarehouseConfig::default();
        config.doctor.hubs.clear();
        assert!(matches!(
            config.validate(),
            Err(ModelError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn rejects_inverted_band() {
        let mut config = WarehouseConfig::default();
        config.age_bands.push(AgeBand::new(10, Some(5), "Broken"));
        assert!(config.validate().is_err());
    }
}
