//! Writes a synthetic satellite catalogue and pending feed under a data
//! directory (first argument, default `data`).

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};

use orbithub::data::columns::{self, display};
use orbithub::data::loader::write_csv;
use orbithub::data::model::{CellValue, RawTable};
use orbithub::model::rng::SimpleRng;

struct Archetype {
    purpose: &'static str,
    detailed: &'static str,
    operator: &'static str,
    orbit: &'static str,
    /// Mean apogee / perigee in km
    altitude: (f64, f64),
    spread: f64,
    /// Launch window as (first year, span in years)
    launched: (i32, i64),
    decay_chance: f64,
}

const ARCHETYPES: &[Archetype] = &[
    Archetype {
        purpose: "Earth Observation",
        detailed: "Weather/Climate Monitoring",
        operator: "NOAA",
        orbit: "LEO",
        altitude: (830.0, 815.0),
        spread: 15.0,
        launched: (2000, 20),
        decay_chance: 0.05,
    },
    Archetype {
        purpose: "Earth Science",
        detailed: "Ocean and Atmosphere Remote Sensing",
        operator: "ESA",
        orbit: "LEO",
        altitude: (705.0, 700.0),
        spread: 10.0,
        launched: (2005, 15),
        decay_chance: 0.05,
    },
    Archetype {
        purpose: "Navigation/Global Positioning",
        detailed: "",
        operator: "US Space Force",
        orbit: "MEO",
        altitude: (20_200.0, 20_180.0),
        spread: 40.0,
        launched: (2008, 12),
        decay_chance: 0.0,
    },
    Archetype {
        purpose: "Communications",
        detailed: "Broadband",
        operator: "Intelsat",
        orbit: "GEO",
        altitude: (35_800.0, 35_770.0),
        spread: 20.0,
        launched: (2015, 8),
        decay_chance: 0.1,
    },
    Archetype {
        purpose: "Technology Development",
        detailed: "",
        operator: "University CubeSat Team",
        orbit: "LEO",
        altitude: (520.0, 480.0),
        spread: 60.0,
        launched: (2018, 5),
        decay_chance: 0.6,
    },
];

const COUNTRIES: &[&str] = &["USA", "ESA", "Brazil", "Japan", "India"];

fn s(v: impl Into<String>) -> CellValue {
    let v = v.into();
    if v.is_empty() {
        CellValue::Null
    } else {
        CellValue::String(v)
    }
}

fn generate_catalogue(rows: usize, rng: &mut SimpleRng) -> Result<RawTable> {
    let columns: Vec<String> = [
        display::FULL_NAME,
        display::CURRENT_NAME,
        display::COUNTRY_UN_REGISTRY,
        display::COUNTRY_OPERATOR_OWNER,
        display::OPERATOR_OWNER,
        display::PURPOSE,
        display::DETAILED_PURPOSE,
        "APOGEE",
        "PERIGEE",
        "LAUNCH_DATE",
        "DECAY_DATE",
        columns::OPS_STATUS_CODE,
        "OBJECT_TYPE",
        "ORBIT_TYPE",
        "ORBIT_CENTER",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect();

    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).context("invalid epoch")?;
    let mut out = Vec::with_capacity(rows);
    for i in 0..rows {
        let arch = &ARCHETYPES[rng.below(ARCHETYPES.len())];
        let country = COUNTRIES[rng.below(COUNTRIES.len())];

        let launch_year = NaiveDate::from_ymd_opt(arch.launched.0, 1, 1).unwrap_or(epoch);
        let offset = rng.below((arch.launched.1 * 365) as usize) as i64;
        let launch = launch_year + Duration::days(offset);
        let decayed = rng.next_f64() < arch.decay_chance;
        let decay = decayed.then(|| launch + Duration::days(200 + rng.below(1500) as i64));

        let current = format!("{}-{}", arch.operator.split(' ').next().unwrap_or("SAT"), i + 1);
        let full = if rng.next_f64() < 0.3 {
            format!("{current} ({})", arch.orbit)
        } else {
            current.clone()
        };

        // sprinkle missing apogees so median imputation has work to do
        let apogee = if rng.next_f64() < 0.05 {
            CellValue::Null
        } else {
            CellValue::Float(rng.gauss(arch.altitude.0, arch.spread).round())
        };

        out.push(vec![
            s(full),
            s(current),
            s(country),
            s(country),
            s(arch.operator),
            s(arch.purpose),
            s(arch.detailed),
            apogee,
            CellValue::Float(rng.gauss(arch.altitude.1, arch.spread).round()),
            CellValue::Date(launch.format("%Y-%m-%d").to_string()),
            decay.map_or(CellValue::Null, |d| CellValue::Date(d.format("%Y-%m-%d").to_string())),
            s(if decayed { "D" } else { "+" }),
            s("PAY"),
            s(arch.orbit),
            s("EA"),
        ]);
    }
    Ok(RawTable::from_rows(columns, out))
}

fn write_pending_feed(path: &PathBuf, rows: usize) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let mut writer = csv::WriterBuilder::new().delimiter(b';').from_path(path)?;
    writer.write_record([columns::PENDING_NAME, "norad_id"])?;
    for i in 0..rows {
        writer.write_record([format!("PENDING-SAT-{}", i + 1), (90_000 + i).to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let data_dir = PathBuf::from(std::env::args().nth(1).unwrap_or_else(|| "data".into()));
    let mut rng = SimpleRng::new(42);

    let catalogue = generate_catalogue(600, &mut rng)?;
    let catalogue_path = data_dir.join("raw").join("satcat.csv");
    write_csv(&catalogue_path, &catalogue)?;

    let pending_path = data_dir.join("raw").join("pending_satellites.csv");
    write_pending_feed(&pending_path, 25)?;

    println!(
        "Wrote {} satellites to {} and 25 pending entries to {}",
        catalogue.len(),
        catalogue_path.display(),
        pending_path.display()
    );
    Ok(())
}
