use crate::error::{AppError, Result};
use crate::ml::models::{TrainingDataset, NEGATIVE_CLASS, POSITIVE_CLASS};
use crate::models::{Disease, Observation, PredictionRequest};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Number of features in every feature vector
pub const N_FEATURES: usize = 8;

/// Feature names in column order; trainer and predictor both rely on this order
pub const FEATURE_NAMES: [&str; N_FEATURES] = [
    "temperature",
    "humidity",
    "rainfall",
    "population_density",
    "access_to_water",
    "healthcare_coverage",
    "previous_cases",
    "vaccination_rate",
];

/// Fixed-order numeric encoding of one observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; N_FEATURES]);

impl FeatureVector {
    pub fn as_array(&self) -> &[f64; N_FEATURES] {
        &self.0
    }

    /// Feature names as owned strings, for metadata documents
    pub fn names() -> Vec<String> {
        FEATURE_NAMES.iter().map(|name| name.to_string()).collect()
    }
}

impl From<&Observation> for FeatureVector {
    fn from(o: &Observation) -> Self {
        FeatureVector([
            o.temperature,
            o.humidity,
            o.rainfall,
            o.population_density,
            o.access_to_water,
            o.healthcare_coverage,
            f64::from(o.previous_cases),
            o.vaccination_rate,
        ])
    }
}

impl From<&PredictionRequest> for FeatureVector {
    fn from(r: &PredictionRequest) -> Self {
        FeatureVector([
            r.temperature,
            r.humidity,
            r.rainfall,
            r.population_density,
            r.access_to_water,
            r.healthcare_coverage,
            f64::from(r.previous_cases),
            r.vaccination_rate,
        ])
    }
}

/// Build the feature matrix and outcome labels for training
///
/// With `disease` set, only observations of that disease are used. An empty
/// selection is an error rather than an empty dataset.
pub fn prepare_training_data(
    observations: &[Observation],
    disease: Option<Disease>,
) -> Result<TrainingDataset> {
    let selected: Vec<&Observation> = observations
        .iter()
        .filter(|o| disease.map_or(true, |d| o.disease == d))
        .collect();

    if selected.is_empty() {
        return Err(AppError::DataInsufficient(match disease {
            Some(d) => format!("no training observations available for {}", d),
            None => "no training observations available".to_string(),
        }));
    }

    let mut features = Array2::zeros((selected.len(), N_FEATURES));
    let mut labels = Vec::with_capacity(selected.len());

    for (i, observation) in selected.iter().enumerate() {
        let vector = FeatureVector::from(*observation);
        for (j, &value) in vector.as_array().iter().enumerate() {
            features[[i, j]] = value;
        }
        labels.push(if observation.outbreak_occurred {
            POSITIVE_CLASS
        } else {
            NEGATIVE_CLASS
        });
    }

    debug!(
        samples = selected.len(),
        features = N_FEATURES,
        "Prepared training data"
    );

    TrainingDataset::new(features, labels)
}
