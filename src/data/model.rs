use std::fmt;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the raw satellite table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring what spreadsheet / CSV vintages carry.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// ISO-8601 date (or date-time) kept as text; parsed where it is used.
    Date(String),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) | CellValue::Date(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => Ok(()),
        }
    }
}

impl CellValue {
    /// Missing means null, a NaN float, or blank text.
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Float(v) => v.is_nan(),
            CellValue::String(s) | CellValue::Date(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Numeric coercion. Anything that is not a finite number reads as missing.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            CellValue::Float(v) => *v,
            CellValue::Integer(i) => *i as f64,
            CellValue::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        v.is_finite().then_some(v)
    }

    /// Text form of a present value, `None` when missing.
    pub fn as_text(&self) -> Option<String> {
        if self.is_missing() {
            None
        } else {
            Some(self.to_string())
        }
    }

    /// Transport form: NaN / Inf / missing become `None`, everything else is
    /// stringified.
    pub fn to_transport(&self) -> Option<String> {
        match self {
            CellValue::Float(v) if !v.is_finite() => None,
            other => other.as_text(),
        }
    }
}

// ---------------------------------------------------------------------------
// RawTable – the loaded dataset
// ---------------------------------------------------------------------------

/// Row-major table with named columns. Column names are whatever the source
/// file declared; rows are kept in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    /// Build a table, padding short rows with `Null` and dropping extra cells.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Null);
                row
            })
            .collect();
        RawTable { columns, rows }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Exact (case-sensitive) column lookup.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell at `(row, col)`; `Null` when out of range.
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&CellValue::Null)
    }

    /// Cell by exact column name, `None` when the column does not exist.
    pub fn value(&self, row: usize, column: &str) -> Option<&CellValue> {
        self.column_index(column).map(|col| self.cell(row, col))
    }

    /// Iterate one column top to bottom.
    pub fn column(&self, col: usize) -> impl Iterator<Item = &CellValue> + '_ {
        (0..self.len()).map(move |row| self.cell(row, col))
    }

    /// Replace a column's values, appending the column if it is new.
    /// `values` shorter than the table are padded with `Null`.
    pub fn set_column(&mut self, name: &str, values: Vec<CellValue>) {
        let col = match self.column_index(name) {
            Some(col) => col,
            None => {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.push(CellValue::Null);
                }
                self.columns.len() - 1
            }
        };
        let mut values = values.into_iter();
        for row in &mut self.rows {
            row[col] = values.next().unwrap_or(CellValue::Null);
        }
    }

    /// Rows `indices` in the given order, same schema.
    pub fn select_rows(&self, indices: &[usize]) -> RawTable {
        RawTable {
            columns: self.columns.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }
}
