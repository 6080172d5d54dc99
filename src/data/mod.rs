/// Data layer: raw table model, column resolution and loading.
///
/// Architecture:
/// ```text
///  .xlsx / .parquet / .csv / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  locate + parse file → RawTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ RawTable  │  named columns, rows of CellValue
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ resolver  │  candidate names → actual column
///   └──────────┘
/// ```

pub mod columns;
pub mod loader;
pub mod model;
pub mod resolver;
