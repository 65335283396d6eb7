pub mod store;

pub use store::*;

use crate::error::Result;
use crate::models::{Disease, Observation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Trait for observation storage operations
pub trait ObservationRepository: Send + Sync {
    /// Validate and store an observation, assigning it a fresh id
    fn create(&self, observation: Observation) -> Result<Observation>;

    /// Store several observations; nothing is stored if any of them is invalid
    fn create_batch(&self, observations: Vec<Observation>) -> Result<Vec<Observation>>;

    /// Get an observation by id
    fn get(&self, id: u64) -> Result<Option<Observation>>;

    /// Replace the observation stored under `id`
    fn update(&self, id: u64, observation: Observation) -> Result<Observation>;

    /// Delete an observation
    fn delete(&self, id: u64) -> Result<()>;

    /// Every observation, ordered by id
    fn list(&self) -> Result<Vec<Observation>>;

    /// Observations for one disease, ordered by id
    fn by_disease(&self, disease: Disease) -> Result<Vec<Observation>>;

    /// Observations for one county (exact match), ordered by id
    fn by_county(&self, county: &str) -> Result<Vec<Observation>>;

    /// Summary counts and averages over every stored observation
    fn statistics(&self) -> Result<TrainingDataStatistics> {
        Ok(TrainingDataStatistics::from_observations(&self.list()?))
    }
}

/// Summary of the stored training data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingDataStatistics {
    pub total_records: usize,
    pub by_disease: BTreeMap<String, usize>,
    pub by_county: BTreeMap<String, usize>,
    pub outbreaks: usize,
    pub avg_temperature: f64,
    pub avg_humidity: f64,
    pub avg_rainfall: f64,
}

impl TrainingDataStatistics {
    /// Averages are rounded to 2 decimals and are 0 for an empty set
    pub fn from_observations(observations: &[Observation]) -> Self {
        let mut stats = TrainingDataStatistics {
            total_records: observations.len(),
            ..Default::default()
        };
        if observations.is_empty() {
            return stats;
        }

        for observation in observations {
            *stats
                .by_disease
                .entry(observation.disease.to_string())
                .or_insert(0) += 1;
            *stats
                .by_county
                .entry(observation.county.clone())
                .or_insert(0) += 1;
            if observation.outbreak_occurred {
                stats.outbreaks += 1;
            }
        }

        let n = observations.len() as f64;
        let average = |f: fn(&Observation) -> f64| {
            let mean = observations.iter().map(f).sum::<f64>() / n;
            (mean * 100.0).round() / 100.0
        };
        stats.avg_temperature = average(|o| o.temperature);
        stats.avg_humidity = average(|o| o.humidity);
        stats.avg_rainfall = average(|o| o.rainfall);

        stats
    }
}
