//! Column names the pipeline knows about.
//!
//! Two families live here: exact names (matched case-sensitively, as they
//! appear in the published datasets) and candidate lists fed to the column
//! resolver to tolerate schema drift between dataset vintages.

// ============================================================================
// Candidate lists (resolved fuzzily, in order)
// ============================================================================

pub const PURPOSE_CANDIDATES: &[&str] = &["PURPOSE"];

pub const APOGEE_CANDIDATES: &[&str] = &["APOGEE", "APOGEE (KM)"];

pub const PERIGEE_CANDIDATES: &[&str] = &["PERIGEE", "PERIGEE (KM)"];

pub const LAUNCH_DATE_CANDIDATES: &[&str] = &["LAUNCH_DATE", "DATE OF LAUNCH", "LAUNCH"];

pub const DECAY_DATE_CANDIDATES: &[&str] = &[
    "DECAY_DATE",
    "DATE OF DECAY",
    "REENTRY",
    "RE-ENTRY",
    "DEORBIT",
    "DECAY",
];

pub const LIFETIME_CANDIDATES: &[&str] = &[
    "LIFETIME",
    "EXPECTED LIFETIME",
    "LIFETIME (YRS)",
    "LIFE (YRS)",
];

// ============================================================================
// Exact names
// ============================================================================

/// Operational status code (SATCAT).
pub const OPS_STATUS_CODE: &str = "OPS_STATUS_CODE";

/// Categorical columns counted towards `capabilities_count`.
pub const CAPABILITY_COLUMNS: &[&str] = &[
    "OBJECT_TYPE",
    OPS_STATUS_CODE,
    "ORBIT_TYPE",
    "ORBIT_CENTER",
    "DATA_STATUS_CODE",
];

/// Label column attached to every classified row.
pub const SUSTAINABILITY_CLASS: &str = "SUSTAINABILITY_CLASS";

/// Purpose column searched by the query layer.
pub const PURPOSE: &str = "Purpose";

/// Searched instead of [`PURPOSE`] when a table has no purpose column.
pub const PURPOSE_FALLBACK_COLUMNS: &[&str] = &["OBJECT_NAME", "OBJECT_TYPE", "ORBIT_TYPE"];

/// Display fields of a shaped satellite record (UCS vintage names).
pub mod display {
    pub const FULL_NAME: &str = "Name of Satellite, Alternate Names";
    pub const CURRENT_NAME: &str = "Current Official Name of Satellite";
    pub const COUNTRY_UN_REGISTRY: &str = "Country/Org of UN Registry";
    pub const COUNTRY_OPERATOR_OWNER: &str = "Country of Operator/Owner";
    pub const OPERATOR_OWNER: &str = "Operator/Owner";
    pub const PURPOSE: &str = "Purpose";
    pub const DETAILED_PURPOSE: &str = "Detailed Purpose";
}

/// Name column of the pending feed.
pub const PENDING_NAME: &str = "name";
