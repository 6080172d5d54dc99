use std::path::{Path, PathBuf};
use std::sync::Arc;

use orbithub::config::OrbitConfig;
use orbithub::data::columns::{self, display};
use orbithub::data::model::{CellValue, RawTable};
use orbithub::features::SatelliteInput;
use orbithub::query::{FilterRequest, PENDING_SENTINEL};
use orbithub::{AppState, OrbitError, Tier, TierModel};

fn s(v: &str) -> CellValue {
    CellValue::String(v.to_string())
}

/// Three well separated groups of ten satellites each.
fn catalogue() -> RawTable {
    let columns = [
        display::FULL_NAME,
        display::CURRENT_NAME,
        display::OPERATOR_OWNER,
        display::PURPOSE,
        display::DETAILED_PURPOSE,
        "APOGEE",
        "PERIGEE",
        "LAUNCH_DATE",
        columns::OPS_STATUS_CODE,
        "OBJECT_TYPE",
        "ORBIT_TYPE",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect();

    let groups = [
        ("EO", "Earth Observation/Weather", "NOAA", 830.0, 815.0, 2000, "LEO"),
        ("NAV", "Navigation", "USSF", 20_200.0, 20_180.0, 2010, "MEO"),
        ("COM", "Communications", "Intelsat", 35_800.0, 35_770.0, 2020, "GEO"),
    ];

    let mut rows = Vec::new();
    for (prefix, purpose, operator, apogee, perigee, year, orbit) in groups {
        for i in 0..10 {
            let name = format!("{prefix}-{i}");
            rows.push(vec![
                s(&format!("{name} ({orbit})")),
                s(&name),
                s(operator),
                s(purpose),
                // numeric-looking text must survive the snapshot unchanged
                s(&format!("{:04}", i * 7)),
                CellValue::Float(apogee + i as f64),
                CellValue::Float(perigee + i as f64),
                s(&format!("{year}-0{}-15", 1 + i % 9)),
                s("+"),
                s("PAY"),
                s(orbit),
            ]);
        }
    }
    RawTable::from_rows(columns, rows)
}

/// Raw catalogue as JSON records, so text cells keep their exact form.
fn write_json_records(path: &Path, table: &RawTable) {
    let records: Vec<serde_json::Value> = table
        .rows
        .iter()
        .map(|row| {
            let record = table
                .columns
                .iter()
                .zip(row)
                .map(|(name, cell)| {
                    let value = match cell {
                        CellValue::Float(v) => serde_json::json!(v),
                        CellValue::Null => serde_json::Value::Null,
                        other => serde_json::json!(other.to_string()),
                    };
                    (name.clone(), value)
                })
                .collect::<serde_json::Map<_, _>>();
            serde_json::Value::Object(record)
        })
        .collect();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, serde_json::to_vec(&records).unwrap()).unwrap();
}

fn setup(dir: &Path) -> OrbitConfig {
    let mut cfg = OrbitConfig::default().with_data_dir(dir);
    cfg.raw_candidates = vec![PathBuf::from("raw/satcat.json")];

    write_json_records(&dir.join("raw").join("satcat.json"), &catalogue());
    std::fs::write(
        cfg.pending_feed_path(),
        "name;norad_id\nP-1;90001\nP-2;90002\nP-3;90003\nP-4;90004\nP-5;90005\n",
    )
    .unwrap();
    cfg
}

fn labels(table: &RawTable) -> Vec<String> {
    let col = table.column_index(columns::SUSTAINABILITY_CLASS).unwrap();
    table.column(col).map(|c| c.to_string()).collect()
}

#[test]
fn train_materialize_and_query() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = setup(dir.path());
    let state = AppState::init(cfg.clone());

    let model = state.train().unwrap();
    assert!(cfg.model_path().is_file());
    assert_eq!(model.training_rows, 30);
    assert_eq!(model.label_map.len(), 3);

    // first read runs the pipeline and persists the snapshot
    let first = state.materialize(false).unwrap();
    assert!(cfg.snapshot_path().is_file());
    assert_eq!(first.len(), 30);
    for label in labels(&first) {
        assert!(Tier::parse(&label).is_some(), "unexpected label {label}");
    }

    // second read is served from memory
    let again = state.materialize(false).unwrap();
    assert!(Arc::ptr_eq(&first, &again));

    // a fresh process reads the snapshot back
    let cold = AppState::init(cfg.clone());
    let from_disk = cold.materialize(false).unwrap();
    assert_eq!(from_disk.columns, first.columns);
    assert_eq!(labels(&from_disk), labels(&first));

    // forced recompute keeps schema and row count
    let forced = state.materialize(true).unwrap();
    assert!(!Arc::ptr_eq(&first, &forced));
    assert_eq!(forced.columns, first.columns);
    assert_eq!(forced.len(), first.len());
    assert_eq!(labels(&forced), labels(&first));

    // warm and cold reads serve identical records
    let warm_records = state.query().filter(None, None, 0).unwrap();
    let cold_records = AppState::init(cfg.clone())
        .query()
        .filter(None, None, 0)
        .unwrap();
    assert_eq!(warm_records.len(), 30);
    assert_eq!(warm_records, cold_records);
    assert_eq!(warm_records[1].detailed_purpose.as_deref(), Some("0007"));

    // long-lived environmental group ranks GOLD
    let gold = state
        .filter(&FilterRequest {
            classification: Some("gold".into()),
            purpose: Some("WEATHER".into()),
            limit: Some(5),
        })
        .unwrap();
    assert_eq!(gold.len(), 5);
    for rec in &gold {
        assert_eq!(rec.sustainability_class.as_deref(), Some("GOLD"));
        assert!(rec.purpose.as_deref().unwrap().contains("Weather"));
        assert!(rec.name_of_satellite.as_deref().unwrap().starts_with("EO-"));
        assert!(rec.alternate_names.as_deref().unwrap().ends_with("(LEO)"));
    }
    assert_eq!(
        state.query().filter(Some("OURO"), None, 0).unwrap().len(),
        10
    );

    // an omitted limit takes the configured default, zero lifts it
    let mut capped_cfg = cfg.clone();
    capped_cfg.query.default_limit = 4;
    let capped = AppState::init(capped_cfg);
    assert_eq!(capped.filter(&FilterRequest::default()).unwrap().len(), 4);
    let unlimited = FilterRequest {
        limit: Some(0),
        ..Default::default()
    };
    assert_eq!(capped.filter(&unlimited).unwrap().len(), 30);

    // ad-hoc classification agrees with the dataset path
    let tiers = state
        .classify_adhoc(&[SatelliteInput {
            purpose: Some("Earth Observation/Weather".into()),
            launch_date: Some("2000-03-15".into()),
            env_impact_score: Some(1650.0),
            capabilities_count: Some(3),
            ops_status_code: Some("+".into()),
            ..Default::default()
        }])
        .unwrap();
    assert_eq!(tiers, vec![Tier::Gold]);

    state.teardown();
}

#[test]
fn pending_queries_never_touch_the_model() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = setup(dir.path());
    let state = AppState::init(cfg.clone());

    let pending = state.query().filter(Some("Pendente"), Some("ignored"), 3).unwrap();
    assert_eq!(pending.len(), 3);
    for rec in &pending {
        assert_eq!(rec.sustainability_class.as_deref(), Some("PENDING"));
        assert_eq!(rec.name_of_satellite.as_deref(), Some(PENDING_SENTINEL));
    }
    assert!(!cfg.model_path().exists());
    assert_eq!(state.pending(0).unwrap().len(), 5);
}

#[test]
fn missing_inputs_surface_as_typed_errors() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = setup(dir.path());

    let state = AppState::init(cfg.clone());
    assert!(matches!(
        state.query().filter(Some("GOLD"), None, 5),
        Err(OrbitError::ModelArtifactMissing { .. })
    ));

    let model = state.train().unwrap();
    let empty = tempfile::tempdir().unwrap();
    let mut bare = OrbitConfig::default().with_data_dir(empty.path());
    bare.raw_candidates = vec![PathBuf::from("raw/satcat.json")];
    model.save(&bare.model_path()).unwrap();

    let state = AppState::init(bare.clone());
    match state.materialize(false) {
        Err(OrbitError::DatasetNotFound { searched }) => {
            assert_eq!(searched, bare.raw_candidate_paths())
        }
        other => panic!("expected DatasetNotFound, got {other:?}"),
    }
    assert!(TierModel::load(&bare.model_path()).is_ok());
}
