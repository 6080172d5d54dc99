use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::{ClassifiedCache, PendingSource};
use crate::data::columns::{self, display};
use crate::data::model::RawTable;
use crate::error::Result;
use crate::model::labels::{PENDING_LABEL, Tier, is_pending};

/// Field value of a pending record; distinct from `null` so callers can tell
/// "not yet classified" from "classified, value unknown".
pub const PENDING_SENTINEL: &str = "--";

// ---------------------------------------------------------------------------
// Request / response shapes
// ---------------------------------------------------------------------------

/// Query parameters. Blank strings count as "not given". An absent `limit`
/// takes the service default; `Some(0)` means no limit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterRequest {
    pub classification: Option<String>,
    pub purpose: Option<String>,
    pub limit: Option<usize>,
}

/// A satellite shaped for transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SatelliteRecord {
    pub name_of_satellite: Option<String>,
    pub alternate_names: Option<String>,
    pub country_un_registry: Option<String>,
    pub country_operator_owner: Option<String>,
    pub operator_owner: Option<String>,
    pub purpose: Option<String>,
    pub detailed_purpose: Option<String>,
    pub sustainability_class: Option<String>,
}

impl SatelliteRecord {
    pub fn pending() -> Self {
        let sentinel = || Some(PENDING_SENTINEL.to_string());
        SatelliteRecord {
            name_of_satellite: sentinel(),
            alternate_names: sentinel(),
            country_un_registry: sentinel(),
            country_operator_owner: sentinel(),
            operator_owner: sentinel(),
            purpose: sentinel(),
            detailed_purpose: sentinel(),
            sustainability_class: Some(PENDING_LABEL.to_string()),
        }
    }

    fn from_row(table: &RawTable, row: usize) -> Self {
        let field = |name: &str| table.value(row, name).and_then(|v| v.to_transport());

        let full_name = field(display::FULL_NAME);
        let current_name = field(display::CURRENT_NAME);
        let alternate_names = if full_name != current_name {
            full_name.clone()
        } else {
            None
        };

        SatelliteRecord {
            name_of_satellite: current_name.or(full_name),
            alternate_names,
            country_un_registry: field(display::COUNTRY_UN_REGISTRY),
            country_operator_owner: field(display::COUNTRY_OPERATOR_OWNER),
            operator_owner: field(display::OPERATOR_OWNER),
            purpose: field(display::PURPOSE),
            detailed_purpose: field(display::DETAILED_PURPOSE),
            sustainability_class: field(columns::SUSTAINABILITY_CLASS),
        }
    }
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

fn given(arg: Option<&str>) -> Option<&str> {
    arg.map(str::trim).filter(|s| !s.is_empty())
}

fn label_matches(label: &str, wanted: &str) -> bool {
    match (Tier::parse(wanted), Tier::parse(label)) {
        (Some(w), Some(l)) => w == l,
        _ => label.trim().to_uppercase() == wanted.to_uppercase(),
    }
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Row indices passing both filters, in table order.
///
/// The purpose filter looks at the `Purpose` column; without one it searches
/// the fallback columns; without those it lets every row through.
pub fn matching_rows(
    table: &RawTable,
    classification: Option<&str>,
    purpose: Option<&str>,
) -> Vec<usize> {
    let class_col = table.column_index(columns::SUSTAINABILITY_CLASS);
    let purpose_cols: Option<Vec<usize>> = given(purpose).map(|_| {
        match table.column_index(columns::PURPOSE) {
            Some(col) => vec![col],
            None => columns::PURPOSE_FALLBACK_COLUMNS
                .iter()
                .filter_map(|c| table.column_index(c))
                .collect(),
        }
    });
    let needle = given(purpose).map(str::to_lowercase);

    (0..table.len())
        .filter(|&row| match given(classification) {
            None => true,
            Some(wanted) => class_col
                .and_then(|c| table.cell(row, c).as_text())
                .is_some_and(|label| label_matches(&label, wanted)),
        })
        .filter(|&row| match (&purpose_cols, &needle) {
            (Some(cols), Some(needle)) if !cols.is_empty() => cols.iter().any(|&c| {
                table
                    .cell(row, c)
                    .as_text()
                    .is_some_and(|text| contains_ci(&text, needle))
            }),
            _ => true,
        })
        .collect()
}

/// Filter a classified table and shape the first `limit` hits.
pub fn filter_table(
    table: &RawTable,
    classification: Option<&str>,
    purpose: Option<&str>,
    limit: usize,
) -> Vec<SatelliteRecord> {
    let mut rows = matching_rows(table, classification, purpose);
    if limit > 0 {
        rows.truncate(limit);
    }
    rows.into_iter()
        .map(|row| SatelliteRecord::from_row(table, row))
        .collect()
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Answers filter queries against the classified cache, or the pending feed
/// when the pending sentinel is requested.
#[derive(Debug, Clone)]
pub struct QueryService {
    classified: Arc<ClassifiedCache>,
    pending: Arc<PendingSource>,
    default_limit: usize,
}

impl QueryService {
    pub fn new(
        classified: Arc<ClassifiedCache>,
        pending: Arc<PendingSource>,
        default_limit: usize,
    ) -> Self {
        Self {
            classified,
            pending,
            default_limit,
        }
    }

    pub fn filter(
        &self,
        classification: Option<&str>,
        purpose: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SatelliteRecord>> {
        if given(classification).is_some_and(is_pending) {
            let pending = self.pending.records(limit)?;
            return Ok(pending.iter().map(|_| SatelliteRecord::pending()).collect());
        }
        let table = self.classified.get_classified(false)?;
        Ok(filter_table(&table, classification, purpose, limit))
    }

    pub fn filter_request(&self, request: &FilterRequest) -> Result<Vec<SatelliteRecord>> {
        self.filter(
            request.classification.as_deref(),
            request.purpose.as_deref(),
            request.limit.unwrap_or(self.default_limit),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CellValue;

    fn s(v: &str) -> CellValue {
        CellValue::String(v.to_string())
    }

    /// Blank text stands for a null cell.
    fn row(full: &str, current: &str, purpose: &str, owner: &str, class: &str) -> Vec<CellValue> {
        [full, current, purpose, owner, class]
            .into_iter()
            .map(|v| if v.is_empty() { CellValue::Null } else { s(v) })
            .collect()
    }

    fn ucs_table() -> RawTable {
        let mut table = RawTable::from_rows(
            vec![
                display::FULL_NAME.into(),
                display::CURRENT_NAME.into(),
                display::PURPOSE.into(),
                display::OPERATOR_OWNER.into(),
                columns::SUSTAINABILITY_CLASS.into(),
            ],
            vec![
                row("NOAA-20 (JPSS-1)", "NOAA-20", "Earth Observation/Weather", "NOAA", "GOLD"),
                row("GOES 16", "GOES 16", "Weather", "", "gold"),
                row("Intelsat 901", "Intelsat 901", "Communications", "Intelsat", "BRONZE"),
                row("", "Sentinel-6", "", "ESA", "GOLD"),
                row("Landsat 9", "", "Earth Observation", "USGS", "OURO"),
            ],
        );
        table.rows[1][3] = CellValue::Float(f64::NAN);
        table
    }

    #[test]
    fn classification_and_purpose_compose() {
        let out = filter_table(&ucs_table(), Some("Gold"), Some("WEATHER"), 5);
        assert_eq!(out.len(), 2);
        for rec in &out {
            let class = rec.sustainability_class.as_deref().map(str::to_uppercase);
            assert_eq!(class.as_deref(), Some("GOLD"));
            assert!(rec.purpose.as_deref().unwrap().to_lowercase().contains("weather"));
        }
    }

    #[test]
    fn missing_purpose_never_matches_a_keyword() {
        let rows = matching_rows(&ucs_table(), None, Some("o"));
        assert!(!rows.contains(&3));
    }

    #[test]
    fn limit_truncates_in_table_order() {
        let table = ucs_table();
        let out = filter_table(&table, None, None, 2);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].name_of_satellite.as_deref(), Some("NOAA-20"));
        assert_eq!(out[1].name_of_satellite.as_deref(), Some("GOES 16"));
        assert_eq!(filter_table(&table, None, None, 0).len(), 5);
    }

    #[test]
    fn localized_tier_names_match_canonical_labels() {
        let rows = matching_rows(&ucs_table(), Some("ouro"), None);
        assert_eq!(rows, vec![0, 1, 3, 4]);
        let rows = matching_rows(&ucs_table(), Some("platinum"), None);
        assert!(rows.is_empty());
    }

    #[test]
    fn shaping_prefers_current_name_and_nulls_non_finite() {
        let out = filter_table(&ucs_table(), None, None, 0);
        assert_eq!(out[0].name_of_satellite.as_deref(), Some("NOAA-20"));
        assert_eq!(out[0].alternate_names.as_deref(), Some("NOAA-20 (JPSS-1)"));
        assert_eq!(out[1].alternate_names, None);
        assert_eq!(out[1].operator_owner, None);
        assert_eq!(out[3].alternate_names, None);
        assert_eq!(out[4].name_of_satellite.as_deref(), Some("Landsat 9"));
        assert_eq!(out[4].alternate_names.as_deref(), Some("Landsat 9"));
        // columns the table does not have render as null
        assert_eq!(out[0].country_un_registry, None);
        assert_eq!(out[0].detailed_purpose, None);
    }

    #[test]
    fn purpose_falls_back_to_object_columns_then_everything() {
        let satcat = RawTable::from_rows(
            vec![
                "OBJECT_NAME".into(),
                "OBJECT_TYPE".into(),
                columns::SUSTAINABILITY_CLASS.into(),
            ],
            vec![
                vec![s("METEOSAT 11"), s("PAY"), s("SILVER")],
                vec![s("SL-4 R/B"), s("R/B"), s("BRONZE")],
            ],
        );
        assert_eq!(matching_rows(&satcat, None, Some("meteo")), vec![0]);
        assert_eq!(matching_rows(&satcat, None, Some("r/b")), vec![1]);

        let bare = RawTable::from_rows(
            vec!["NORAD_CAT_ID".into()],
            vec![vec![CellValue::Integer(1)], vec![CellValue::Integer(2)]],
        );
        assert_eq!(matching_rows(&bare, None, Some("anything")), vec![0, 1]);
    }

    #[test]
    fn blank_arguments_are_ignored() {
        assert_eq!(matching_rows(&ucs_table(), Some("  "), Some("")).len(), 5);
    }

    #[test]
    fn purpose_match_is_literal_not_a_pattern() {
        assert!(matching_rows(&ucs_table(), None, Some("weath.r")).is_empty());
    }

    #[test]
    fn omitted_limit_is_left_to_the_service() {
        let req: FilterRequest = serde_json::from_str(r#"{"classification": "GOLD"}"#).unwrap();
        assert_eq!(req.limit, None);
        let req: FilterRequest = serde_json::from_str(r#"{"limit": 0}"#).unwrap();
        assert_eq!(req.limit, Some(0));
    }

    #[test]
    fn pending_record_shape() {
        let rec = SatelliteRecord::pending();
        assert_eq!(rec.sustainability_class.as_deref(), Some(PENDING_LABEL));
        assert_eq!(rec.purpose.as_deref(), Some(PENDING_SENTINEL));
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["name_of_satellite"], "--");
    }
}
