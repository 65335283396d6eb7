//! Common test utilities for the outbreak prediction tests

#![allow(dead_code)]

use outbreak_predictor::{
    config::TrainingConfig,
    ml::{ModelStore, OutbreakService, SyntheticGenerator},
    models::Observation,
};
use std::sync::Arc;
use tempfile::TempDir;

/// Observations per disease in [`training_observations`]
pub const PER_DISEASE: usize = 40;

/// Service over a fresh model directory; keep the `TempDir` alive for the test
pub fn setup_service() -> (OutbreakService, TempDir) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let store = Arc::new(ModelStore::open(dir.path()).expect("open model store"));
    (OutbreakService::new(store, TrainingConfig::default()), dir)
}

/// Balanced high/low-risk observations for every disease
pub fn training_observations() -> Vec<Observation> {
    SyntheticGenerator::new(42).generate_all(PER_DISEASE)
}
