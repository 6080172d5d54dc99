use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;

use crate::cache::{ClassifiedCache, PendingRecord, PendingSource};
use crate::config::OrbitConfig;
use crate::data::loader::load_dataset;
use crate::data::model::RawTable;
use crate::error::Result;
use crate::features::{SatelliteInput, engineer_features};
use crate::model::TierModel;
use crate::model::labels::Tier;
use crate::query::{FilterRequest, QueryService, SatelliteRecord};
use crate::requests::{PortalRequest, RequestLog};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Everything a caller needs, created once at startup and torn down
/// explicitly. Caches are shared through `Arc` so the query service and the
/// state see the same tables.
#[derive(Debug)]
pub struct AppState {
    config: OrbitConfig,
    classified: Arc<ClassifiedCache>,
    pending: Arc<PendingSource>,
    query: QueryService,
    requests: RequestLog,
}

impl AppState {
    /// Wire caches and services. Nothing is read from disk yet.
    pub fn init(config: OrbitConfig) -> Self {
        let classified = Arc::new(ClassifiedCache::new(&config));
        let pending = Arc::new(PendingSource::new(&config));
        let query = QueryService::new(
            Arc::clone(&classified),
            Arc::clone(&pending),
            config.query.default_limit,
        );
        let requests = RequestLog::new(config.request_log_path());
        log::debug!("state initialised with data dir {}", config.data_dir.display());
        Self {
            config,
            classified,
            pending,
            query,
            requests,
        }
    }

    pub fn config(&self) -> &OrbitConfig {
        &self.config
    }

    pub fn query(&self) -> &QueryService {
        &self.query
    }

    /// Pre-load both caches. Failures are logged; the caches stay lazy.
    pub fn warm_up(&self) {
        match self.classified.get_classified(false) {
            Ok(table) => log::info!("warm-up: classified table ready ({} rows)", table.len()),
            Err(e) => log::warn!("warm-up: classified table unavailable: {e}"),
        }
        match self.pending.table() {
            Ok(table) => log::info!("warm-up: pending feed ready ({} rows)", table.len()),
            Err(e) => log::warn!("warm-up: pending feed unavailable: {e}"),
        }
    }

    /// Fit a new model on the first available raw dataset and persist it.
    ///
    /// The classified snapshot is left alone; run [`AppState::materialize`]
    /// with `force` to relabel it with the new model.
    pub fn train(&self) -> Result<TierModel> {
        let (raw, source) = load_dataset(&self.config.raw_candidate_paths())?;
        log::info!("training on {} ({} rows)", source.display(), raw.len());
        let features = engineer_features(&raw);
        let model = TierModel::train(&features, &self.config.training)?;
        model.save(&self.config.model_path())?;
        Ok(model)
    }

    pub fn materialize(&self, force: bool) -> Result<Arc<RawTable>> {
        self.classified.get_classified(force)
    }

    pub fn filter(&self, request: &FilterRequest) -> Result<Vec<SatelliteRecord>> {
        self.query.filter_request(request)
    }

    pub fn pending(&self, limit: usize) -> Result<Vec<PendingRecord>> {
        self.pending.records(limit)
    }

    /// Classify satellites that are not part of the dataset.
    pub fn classify_adhoc(&self, inputs: &[SatelliteInput]) -> Result<Vec<Tier>> {
        let model = TierModel::load(&self.config.model_path())?;
        let today = Utc::now().date_naive();
        let features: Vec<_> = inputs
            .iter()
            .map(|input| input.to_features(&model.defaults, today))
            .collect();
        Ok(model.infer(&features))
    }

    pub fn persist_request(&self, request: &PortalRequest) -> Result<PathBuf> {
        self.requests.persist_request(request)
    }

    /// Drop cached tables. On-disk artifacts are untouched.
    pub fn teardown(self) {
        self.classified.invalidate();
        self.pending.invalidate();
        log::debug!("state torn down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OrbitError;

    #[test]
    fn warm_up_tolerates_an_empty_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::init(OrbitConfig::default().with_data_dir(dir.path()));
        state.warm_up();
        assert!(matches!(
            state.materialize(false),
            Err(OrbitError::ModelArtifactMissing { .. })
        ));
        assert!(matches!(state.train(), Err(OrbitError::DatasetNotFound { .. })));
        state.teardown();
    }

    #[test]
    fn adhoc_classification_needs_a_model() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::init(OrbitConfig::default().with_data_dir(dir.path()));
        let res = state.classify_adhoc(&[SatelliteInput::default()]);
        assert!(matches!(res, Err(OrbitError::ModelArtifactMissing { .. })));
    }
}
