//! Satellite sustainability tiering.
//!
//! A raw satellite catalogue is turned into feature vectors, clustered by a
//! k-means model trained offline, and each cluster is mapped to a GOLD,
//! SILVER or BRONZE tier. The classified table is cached on disk and in
//! memory and served through filter queries.

pub mod cache;
pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod model;
pub mod query;
pub mod requests;
pub mod state;

pub use error::{OrbitError, Result};
pub use model::labels::Tier;
pub use model::{TierModel, infer_tier};
pub use state::AppState;
