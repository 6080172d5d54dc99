//! Materialised tables shared across callers.
//!
//! Both caches hold an `Arc<RawTable>` behind a lock. A refresh builds the
//! new table completely and then swaps the `Arc`; readers holding the old
//! one keep a consistent view.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::OrbitConfig;
use crate::data::columns::{PENDING_NAME, SUSTAINABILITY_CLASS};
use crate::data::loader::{load_dataset, load_delimited, load_snapshot, write_csv};
use crate::data::model::{CellValue, RawTable};
use crate::data::resolver::find_column;
use crate::error::{OrbitError, Result};
use crate::features::engineer_features;
use crate::model::TierModel;

/// A shared slot holding at most one table.
#[derive(Debug, Default)]
pub struct TableSlot {
    inner: RwLock<Option<Arc<RawTable>>>,
}

impl TableSlot {
    pub fn get(&self) -> Option<Arc<RawTable>> {
        self.inner.read().clone()
    }

    /// Swap in a new table and return a handle to it.
    pub fn replace(&self, table: RawTable) -> Arc<RawTable> {
        let table = Arc::new(table);
        *self.inner.write() = Some(Arc::clone(&table));
        table
    }

    pub fn clear(&self) {
        *self.inner.write() = None;
    }
}

/// Attach a tier label to every raw row. Labels go on the raw table, not the
/// engineered features, so queries see the original semantic columns.
pub fn classify_table(mut raw: RawTable, model: &TierModel) -> RawTable {
    let features = engineer_features(&raw);
    let labels = model
        .infer(&features)
        .into_iter()
        .map(|tier| CellValue::String(tier.to_string()))
        .collect();
    raw.set_column(SUSTAINABILITY_CLASS, labels);
    raw
}

// ---------------------------------------------------------------------------
// Classified dataset
// ---------------------------------------------------------------------------

/// The classified dataset: durable CSV snapshot plus in-memory copy.
#[derive(Debug)]
pub struct ClassifiedCache {
    raw_candidates: Vec<PathBuf>,
    snapshot_path: PathBuf,
    model_path: PathBuf,
    slot: TableSlot,
}

impl ClassifiedCache {
    pub fn new(config: &OrbitConfig) -> Self {
        Self {
            raw_candidates: config.raw_candidate_paths(),
            snapshot_path: config.snapshot_path(),
            model_path: config.model_path(),
            slot: TableSlot::default(),
        }
    }

    /// Return the classified table.
    ///
    /// Without `force_recompute` the in-memory copy is served, else the
    /// snapshot on disk is loaded once. Otherwise the pipeline runs and the
    /// snapshot and in-memory copy are both replaced.
    pub fn get_classified(&self, force_recompute: bool) -> Result<Arc<RawTable>> {
        if !force_recompute {
            if let Some(table) = self.slot.get() {
                log::debug!("classified cache hit ({} rows)", table.len());
                return Ok(table);
            }
            if self.snapshot_path.is_file() {
                let table = load_snapshot(&self.snapshot_path)?;
                log::info!(
                    "loaded classified snapshot {} ({} rows)",
                    self.snapshot_path.display(),
                    table.len()
                );
                return Ok(self.slot.replace(table));
            }
        }
        self.recompute()
    }

    /// Load → engineer → infer → persist → swap.
    pub fn recompute(&self) -> Result<Arc<RawTable>> {
        let model = TierModel::load(&self.model_path)?;
        let (raw, source) = load_dataset(&self.raw_candidates)?;
        let classified = classify_table(raw, &model);

        write_csv(&self.snapshot_path, &classified)?;
        log::info!(
            "classified {} rows from {} into {}",
            classified.len(),
            source.display(),
            self.snapshot_path.display()
        );
        Ok(self.slot.replace(classified))
    }

    /// Drop the in-memory copy; the next read reloads the snapshot.
    pub fn invalidate(&self) {
        self.slot.clear();
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.get().is_some()
    }
}

// ---------------------------------------------------------------------------
// Pending feed
// ---------------------------------------------------------------------------

/// One satellite of the unclassified feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRecord {
    pub name: Option<String>,
}

/// Lazily loaded pending feed. Never touches the tier model.
#[derive(Debug)]
pub struct PendingSource {
    feed_path: PathBuf,
    slot: TableSlot,
}

impl PendingSource {
    pub fn new(config: &OrbitConfig) -> Self {
        Self {
            feed_path: config.pending_feed_path(),
            slot: TableSlot::default(),
        }
    }

    pub fn table(&self) -> Result<Arc<RawTable>> {
        if let Some(table) = self.slot.get() {
            return Ok(table);
        }
        if !self.feed_path.is_file() {
            return Err(OrbitError::DatasetNotFound {
                searched: vec![self.feed_path.clone()],
            });
        }
        let table = load_delimited(&self.feed_path, b';')?;
        let Some(name_col) = find_column(&table.columns, &[PENDING_NAME]) else {
            return Err(OrbitError::parse(&self.feed_path, "pending feed has no name column"));
        };
        let unnamed = table
            .column(name_col.index)
            .filter(|c| c.is_missing())
            .count();
        if unnamed > 0 {
            log::warn!("{unnamed} pending rows have no name");
        }
        log::info!(
            "loaded pending feed {} ({} rows)",
            self.feed_path.display(),
            table.len()
        );
        Ok(self.slot.replace(table))
    }

    /// Up to `limit` records in feed order; `limit == 0` returns all.
    pub fn records(&self, limit: usize) -> Result<Vec<PendingRecord>> {
        let table = self.table()?;
        let name_col = find_column(&table.columns, &[PENDING_NAME]).map(|m| m.index);
        let take = if limit == 0 { table.len() } else { limit };
        Ok((0..table.len())
            .take(take)
            .map(|row| PendingRecord {
                name: name_col.and_then(|c| table.cell(row, c).as_text()),
            })
            .collect())
    }

    pub fn invalidate(&self) {
        self.slot.clear();
    }
}
