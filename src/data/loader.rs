use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use arrow::util::display::array_value_to_string;
use calamine::{Data, Reader, open_workbook_auto};
use chrono::{Duration, NaiveDate};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, RawTable};
use crate::error::OrbitError;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Return the first candidate that exists on disk, in priority order.
pub fn locate_dataset(candidates: &[PathBuf]) -> crate::Result<PathBuf> {
    candidates
        .iter()
        .find(|p| p.is_file())
        .cloned()
        .ok_or_else(|| OrbitError::DatasetNotFound {
            searched: candidates.to_vec(),
        })
}

/// Locate the raw dataset and parse it.
pub fn load_dataset(candidates: &[PathBuf]) -> crate::Result<(RawTable, PathBuf)> {
    let path = locate_dataset(candidates)?;
    let table = load_file(&path)?;
    log::info!(
        "loaded {} ({} rows, {} columns)",
        path.display(),
        table.len(),
        table.columns.len()
    );
    Ok((table, path))
}

/// Load a table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xls` / `.ods` – first worksheet, first row is the header
/// * `.parquet` – any flat schema
/// * `.json`    – `[{ "col": value, ... }, ...]`
/// * `.csv`     – comma-delimited with a header row
pub fn load_file(path: &Path) -> crate::Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let loaded = match ext.as_str() {
        "xlsx" | "xlsm" | "xls" | "ods" => load_spreadsheet(path),
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_delimited_inner(path, b',', guess_cell_type),
        other => Err(anyhow::anyhow!("Unsupported file extension: .{other}")),
    };
    loaded.map_err(|e| OrbitError::parse(path, format!("{e:#}")))
}

/// Load a delimited text file (the pending feed is `;`-separated).
pub fn load_delimited(path: &Path, delimiter: u8) -> crate::Result<RawTable> {
    load_delimited_inner(path, delimiter, guess_cell_type)
        .map_err(|e| OrbitError::parse(path, format!("{e:#}")))
}

/// Read back a table written by [`write_csv`]. Cells stay text, so values
/// such as `"0042"` come back exactly as they were served before.
pub fn load_snapshot(path: &Path) -> crate::Result<RawTable> {
    load_delimited_inner(path, b',', text_cell)
        .map_err(|e| OrbitError::parse(path, format!("{e:#}")))
}

/// Write a table as CSV. The file is written beside its destination and
/// renamed into place so readers never see a half-written snapshot.
///
/// Missing cells and non-finite numbers are written empty.
pub fn write_csv(path: &Path, table: &RawTable) -> crate::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let tmp = path.with_extension("csv.tmp");
    {
        let mut writer = csv::Writer::from_path(&tmp)?;
        writer.write_record(&table.columns)?;
        for row in &table.rows {
            writer.write_record(row.iter().map(|cell| cell.to_transport().unwrap_or_default()))?;
        }
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

fn load_spreadsheet(path: &Path) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path).context("opening workbook")?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .context("workbook has no worksheets")?;
    let range = workbook
        .worksheet_range(&sheet)
        .with_context(|| format!("reading worksheet '{sheet}'"))?;

    let mut rows = range.rows();
    let columns: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(|c| c.to_string().trim().to_string()).collect(),
        None => bail!("worksheet '{sheet}' is empty"),
    };

    let body = rows
        .map(|row| row.iter().map(spreadsheet_cell).collect())
        .collect();

    Ok(RawTable::from_rows(columns, body))
}

fn spreadsheet_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Null,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Float(f) => CellValue::Float(*f),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64()),
        Data::DateTimeIso(s) => CellValue::Date(s.clone()),
        Data::DurationIso(s) => CellValue::String(s.clone()),
    }
}

/// Excel serial day number (1900 system) → ISO text.
fn excel_serial_to_date(serial: f64) -> CellValue {
    let Some(epoch) = NaiveDate::from_ymd_opt(1899, 12, 30).and_then(|d| d.and_hms_opt(0, 0, 0))
    else {
        return CellValue::Null;
    };
    if !serial.is_finite() {
        return CellValue::Null;
    }
    let millis = (serial * 86_400_000.0).round() as i64;
    match epoch.checked_add_signed(Duration::milliseconds(millis)) {
        Some(dt) if dt.time() == chrono::NaiveTime::MIN => {
            CellValue::Date(dt.format("%Y-%m-%d").to_string())
        }
        Some(dt) => CellValue::Date(dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
        None => CellValue::Null,
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "OBJECT_NAME": "AQUA", "APOGEE": 702, "PURPOSE": "Earth Science" },
///   ...
/// ]
/// ```
///
/// Columns are ordered by first appearance across records.
fn load_json(path: &Path) -> Result<RawTable> {
    let text = fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    let mut parsed: Vec<BTreeMap<String, CellValue>> = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let mut row = BTreeMap::new();
        for (key, val) in obj {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
            row.insert(key.clone(), json_to_cell(val));
        }
        parsed.push(row);
    }

    let rows = parsed
        .into_iter()
        .map(|mut row| {
            columns
                .iter()
                .map(|c| row.remove(c).unwrap_or(CellValue::Null))
                .collect()
        })
        .collect();

    Ok(RawTable::from_rows(columns, rows))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Delimited text loader
// ---------------------------------------------------------------------------

fn load_delimited_inner(
    path: &Path,
    delimiter: u8,
    parse_cell: fn(&str) -> CellValue,
) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .context("opening delimited file")?;
    let columns: Vec<String> = reader
        .headers()
        .context("reading header row")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("row {row_no}"))?;
        rows.push(record.iter().map(parse_cell).collect());
    }

    Ok(RawTable::from_rows(columns, rows))
}

fn text_cell(s: &str) -> CellValue {
    if s.is_empty() {
        CellValue::Null
    } else {
        CellValue::String(s.to_string())
    }
}

fn guess_cell_type(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with a flat schema. Works with files written by both
/// **Pandas** (`df.to_parquet()`) and **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<RawTable> {
    let file = fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            rows.push(
                batch
                    .columns()
                    .iter()
                    .map(|col| extract_cell(col, row))
                    .collect(),
            );
        }
    }

    Ok(RawTable::from_rows(columns, rows))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => CellValue::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => {
            array_value_to_string(col, row)
                .map(CellValue::Date)
                .unwrap_or(CellValue::Null)
        }
        _ => array_value_to_string(col, row)
            .map(CellValue::String)
            .unwrap_or(CellValue::Null),
    }
}
