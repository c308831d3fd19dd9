//! Column names shared by preprocessed facts, dimensions and final facts.

// Standardized geography and time columns present on every preprocessed fact.
pub const DATE: &str = "Date";
pub const DISTRICT_NAME: &str = "DistrictName";
pub const BLOCK_NAME: &str = "BlockName";
pub const PHC_NAME: &str = "PHCName";

pub const DOCTOR: &str = "Doctor";
pub const SPECIALIZATION: &str = "Specialization";
pub const HOUR: &str = "Hour";
pub const AGE_GROUP: &str = "Age_grp";
pub const GENDER: &str = "Gender";

/// Provenance column added by ingestion.
pub const WORKBOOK_NAME: &str = "WorkbookName";

// Surrogate keys.
pub const PHC_ID: &str = "PHCID";
pub const DOCTOR_ID: &str = "DoctorID";
pub const DATE_ID: &str = "DateID";

// Facility dimension attributes.
pub const STATE: &str = "State";
pub const COUNTRY: &str = "Country";
pub const DIVISION: &str = "Division";

// Doctor dimension attributes.
pub const HUB: &str = "Hub";

// Date dimension attributes.
pub const YEAR: &str = "Year";
pub const MONTH: &str = "Month";
pub const MONTH_NAME: &str = "MonthName";
pub const DAY: &str = "Day";
pub const DAY_NAME: &str = "DayName";
pub const WEEK: &str = "Week";
pub const WEEKDAY: &str = "Weekday";
pub const QUARTER: &str = "Quarter";
pub const YEAR_MONTH: &str = "YearMonth";
pub const YEAR_MONTH_NAME: &str = "YearMonthName";
pub const MONTH_YEAR: &str = "Month Year";

// Fact measures.
pub const COUNT_APPOINTMENTS: &str = "Count: Appointments";
pub const COUNT_PATIENT_REGISTERED: &str = "Count: Patient Registered";
pub const CALL_DURATION: &str = "Call Duration";
pub const CONSULTATION_STATUS: &str = "Status: Consultation";
pub const PHC_UPTIME: &str = "PHC Uptime";
pub const OPD_NO: &str = "OPDNo";

/// Columns superseded by surrogate keys on every fact table.
pub const FACILITY_DESCRIPTIVE: [&str; 4] = [PHC_NAME, DATE, DISTRICT_NAME, BLOCK_NAME];

/// Columns superseded by `DoctorID` on doctor-bearing fact tables.
pub const DOCTOR_DESCRIPTIVE: [&str; 2] = [DOCTOR, SPECIALIZATION];

/// Natural key of the facility dimension.
pub const FACILITY_KEY: [&str; 3] = [DISTRICT_NAME, BLOCK_NAME, PHC_NAME];

/// Natural key of the doctor dimension.
pub const DOCTOR_KEY: [&str; 2] = [DOCTOR, SPECIALIZATION];
