//! Feature engineering: raw satellite rows → fixed-schema feature vectors.
//!
//! Total over its input. Malformed cells degrade to neutral defaults
//! (`0`, the column median, or `"UNKNOWN"`), so every output field is populated.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::columns;
use crate::data::model::{CellValue, RawTable};
use crate::data::resolver::find_column;

pub const UNKNOWN: &str = "UNKNOWN";

const DAYS_PER_YEAR: f64 = 365.25;

/// Engineered features for one satellite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Uppercased, trimmed purpose text or `UNKNOWN`.
    pub purpose: String,
    pub lifetime_years: f64,
    pub capabilities_count: u32,
    /// Apogee + perigee, a proxy for environmental impact.
    pub env_impact_score: f64,
    pub ops_status_code: String,
}

/// Derive features for every row, measuring open-ended lifetimes up to today (UTC).
pub fn engineer_features(table: &RawTable) -> Vec<FeatureVector> {
    engineer_features_at(table, Utc::now().date_naive())
}

/// [`engineer_features`] with an explicit "today".
pub fn engineer_features_at(table: &RawTable, today: NaiveDate) -> Vec<FeatureVector> {
    let purpose_col = find_column(&table.columns, columns::PURPOSE_CANDIDATES).map(|m| m.index);
    let apogee_col = find_column(&table.columns, columns::APOGEE_CANDIDATES).map(|m| m.index);
    let perigee_col = find_column(&table.columns, columns::PERIGEE_CANDIDATES).map(|m| m.index);
    let ops_col = table.column_index(columns::OPS_STATUS_CODE);

    let apogee_median = column_median(table, apogee_col);
    let perigee_median = column_median(table, perigee_col);

    let lifetimes = lifetime_years(table, today);

    let capability_cols: Vec<usize> = columns::CAPABILITY_COLUMNS
        .iter()
        .filter_map(|name| table.column_index(name))
        .collect();

    (0..table.len())
        .map(|row| {
            let numeric = |col: Option<usize>, median: f64| {
                col.and_then(|c| table.cell(row, c).as_f64()).unwrap_or(median)
            };

            FeatureVector {
                purpose: purpose_col
                    .and_then(|c| table.cell(row, c).as_text())
                    .map(|p| normalize_purpose(&p))
                    .unwrap_or_else(|| UNKNOWN.to_string()),
                lifetime_years: lifetimes[row],
                capabilities_count: capability_cols
                    .iter()
                    .filter(|&&c| !table.cell(row, c).is_missing())
                    .count() as u32,
                env_impact_score: numeric(apogee_col, apogee_median)
                    + numeric(perigee_col, perigee_median),
                ops_status_code: ops_col
                    .and_then(|c| table.cell(row, c).as_text())
                    .unwrap_or_else(|| UNKNOWN.to_string()),
            }
        })
        .collect()
}

fn normalize_purpose(text: &str) -> String {
    let p = text.trim().to_uppercase();
    if p.is_empty() {
        UNKNOWN.to_string()
    } else {
        p
    }
}

/// Median over the numeric cells of a column; `0.0` when the column is
/// absent or holds no numbers.
fn column_median(table: &RawTable, col: Option<usize>) -> f64 {
    let Some(col) = col else {
        return 0.0;
    };
    let values: Vec<f64> = table.column(col).filter_map(CellValue::as_f64).collect();
    median(values).unwrap_or(0.0)
}

pub(crate) fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

/// Lifetime per row, in years, floored at zero.
///
/// With a launch-date column: `(decay or today) - launch`. A row whose launch
/// date does not parse gets 0. Without one, a stated-lifetime column is read
/// as a number, else 0.
fn lifetime_years(table: &RawTable, today: NaiveDate) -> Vec<f64> {
    if let Some(launch) = find_column(&table.columns, columns::LAUNCH_DATE_CANDIDATES) {
        let decay = find_column(&table.columns, columns::DECAY_DATE_CANDIDATES).map(|m| m.index);
        let today = today.and_time(chrono::NaiveTime::MIN);

        return (0..table.len())
            .map(|row| {
                let Some(start) = parse_date(table.cell(row, launch.index)) else {
                    return 0.0;
                };
                let end = decay
                    .and_then(|c| parse_date(table.cell(row, c)))
                    .unwrap_or(today);
                let days = (end - start).num_days() as f64;
                (days / DAYS_PER_YEAR).max(0.0)
            })
            .collect();
    }

    match find_column(&table.columns, columns::LIFETIME_CANDIDATES) {
        Some(life) => table
            .column(life.index)
            .map(|cell| cell.as_f64().unwrap_or(0.0).max(0.0))
            .collect(),
        None => vec![0.0; table.len()],
    }
}

const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%d.%m.%Y"];

/// Parse a date-like cell. Numbers and unrecognised text read as missing.
pub fn parse_date(cell: &CellValue) -> Option<NaiveDateTime> {
    let text = match cell {
        CellValue::Date(s) | CellValue::String(s) => s.trim(),
        _ => return None,
    };
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(text, f).ok())
                .map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
}

// ---------------------------------------------------------------------------
// Ad-hoc input
// ---------------------------------------------------------------------------

/// Values learnt at training time and used to complete partial inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureDefaults {
    pub env_impact_score_median: f64,
}

impl FeatureDefaults {
    pub fn from_features(features: &[FeatureVector]) -> Self {
        FeatureDefaults {
            env_impact_score_median: median(
                features.iter().map(|f| f.env_impact_score).collect(),
            )
            .unwrap_or(0.0),
        }
    }
}

/// A satellite described by whatever the caller knows about it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SatelliteInput {
    pub object_name: Option<String>,
    pub purpose: Option<String>,
    pub ops_status_code: Option<String>,
    pub launch_date: Option<String>,
    pub lifetime_years: Option<f64>,
    pub capabilities_count: Option<u32>,
    pub env_impact_score: Option<f64>,
}

impl SatelliteInput {
    /// Complete the input into a feature vector.
    ///
    /// Lifetime comes from `lifetime_years`, else from `launch_date` up to
    /// `today`, else 0. Capabilities default to 0, impact to the training
    /// median, categoricals to `UNKNOWN`.
    pub fn to_features(&self, defaults: &FeatureDefaults, today: NaiveDate) -> FeatureVector {
        let lifetime = self
            .lifetime_years
            .filter(|v| v.is_finite())
            .or_else(|| {
                let launch = parse_date(&CellValue::String(self.launch_date.clone()?))?;
                let days = (today.and_time(chrono::NaiveTime::MIN) - launch).num_days() as f64;
                Some(days / DAYS_PER_YEAR)
            })
            .unwrap_or(0.0)
            .max(0.0);

        FeatureVector {
            purpose: self
                .purpose
                .as_deref()
                .map(normalize_purpose)
                .unwrap_or_else(|| UNKNOWN.to_string()),
            lifetime_years: lifetime,
            capabilities_count: self.capabilities_count.unwrap_or(0),
            env_impact_score: self
                .env_impact_score
                .filter(|v| v.is_finite())
                .unwrap_or(defaults.env_impact_score_median),
            ops_status_code: self
                .ops_status_code
                .clone()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }
}
