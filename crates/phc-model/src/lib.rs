//! Shared data model for the PHC warehouse build.

pub mod columns;
pub mod config;
pub mod error;
pub mod kinds;
pub mod quality;

pub use config::{
    AgeBand, ConsultationConfig, DoctorConfig, FacilityConfig, SourceDirs, WarehouseConfig,
    default_age_bands,
};
pub use error::{ModelError, Result};
pub use kinds::{DimensionKind, FactKind, UnknownFactKind};
pub use quality::{QualityEntry, QualityKind, QualityReport};
