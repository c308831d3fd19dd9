//! Fact and dimension table kinds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four operational exports that become fact tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactKind {
    Appointment,
    Consultation,
    PatientRegistration,
    PhcLogin,
}

impl FactKind {
    /// All fact kinds in processing order.
    pub const ALL: [FactKind; 4] = [
        FactKind::Appointment,
        FactKind::PatientRegistration,
        FactKind::Consultation,
        FactKind::PhcLogin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FactKind::Appointment => "Appointment",
            FactKind::Consultation => "Consultation",
            FactKind::PatientRegistration => "PatientRegistration",
            FactKind::PhcLogin => "PHCLogin",
        }
    }

    /// File stem used when the final fact table is persisted.
    pub fn output_name(&self) -> &'static str {
        match self {
            FactKind::Appointment => "Processed_Appointment",
            FactKind::Consultation => "Processed_Consultation",
            FactKind::PatientRegistration => "Processed_Patientreg",
            FactKind::PhcLogin => "Processed_PHCLogin",
        }
    }

    /// Whether the fact table carries doctor attributes and receives a `DoctorID`.
    pub fn has_doctor(&self) -> bool {
        matches!(self, FactKind::Appointment | FactKind::Consultation)
    }
}

impl fmt::Display for FactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a fact kind name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown fact kind: {0}")]
pub struct UnknownFactKind(pub String);

impl FromStr for FactKind {
    type Err = UnknownFactKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|ch| ch.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "appointment" | "appointments" => Ok(FactKind::Appointment),
            "consultation" | "consultations" => Ok(FactKind::Consultation),
            "patientregistration" | "patientreg" => Ok(FactKind::PatientRegistration),
            "phclogin" | "login" => Ok(FactKind::PhcLogin),
            _ => Err(UnknownFactKind(s.to_string())),
        }
    }
}

/// The three dimensions derived from the preprocessed facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionKind {
    Facility,
    Doctor,
    Date,
}

impl DimensionKind {
    pub const ALL: [DimensionKind; 3] = [
        DimensionKind::Facility,
        DimensionKind::Doctor,
        DimensionKind::Date,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DimensionKind::Facility => "Facility",
            DimensionKind::Doctor => "Doctor",
            DimensionKind::Date => "Date",
        }
    }

    pub fn output_name(&self) -> &'static str {
        match self {
            DimensionKind::Facility => "Processed_Dim_PHC",
            DimensionKind::Doctor => "Processed_Dim_Doctor",
            DimensionKind::Date => "Processed_Dim_Date",
        }
    }
}

impl fmt::Display for DimensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
