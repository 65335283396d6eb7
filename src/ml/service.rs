use crate::config::TrainingConfig;
use crate::error::{AppError, Result};
use crate::ml::models::{ModelStatus, TrainingFailure, TrainingOutcome, TrainingReport};
use crate::ml::predictor::Predictor;
use crate::ml::store::ModelStore;
use crate::ml::trainer::ModelTrainer;
use crate::models::{Disease, Observation, PredictionRequest, PredictionResponse};
use crate::state::ObservationRepository;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Outbreak prediction service
///
/// Front door for training and inference. Training never surfaces an `Err`;
/// failures come back as a [`TrainingOutcome::Failed`] value.
pub struct OutbreakService {
    /// Model artifacts and in-memory cache
    store: Arc<ModelStore>,

    /// Defaults for split fraction and seed
    config: TrainingConfig,

    trainer: ModelTrainer,

    predictor: Predictor,
}

impl OutbreakService {
    /// Create a new service over an opened model store
    pub fn new(store: Arc<ModelStore>, config: TrainingConfig) -> Self {
        let trainer =
            ModelTrainer::new(store.clone()).with_min_samples_warning(config.min_samples_warning);
        let predictor = Predictor::new(store.clone());

        Self {
            store,
            config,
            trainer,
            predictor,
        }
    }

    pub fn store(&self) -> &Arc<ModelStore> {
        &self.store
    }

    /// Train a model and report the outcome as a value
    pub fn train(
        &self,
        observations: &[Observation],
        disease: Option<Disease>,
        test_size: Option<f64>,
        seed: Option<u64>,
    ) -> TrainingOutcome {
        match self.try_train(observations, disease, test_size, seed) {
            Ok(report) => TrainingOutcome::Trained(report),
            Err(e) => {
                error!(
                    disease = ?disease,
                    error_code = e.error_code(),
                    "Training failed: {}",
                    e
                );
                TrainingOutcome::Failed(TrainingFailure::from(&e))
            }
        }
    }

    /// Train a model, propagating failures
    pub fn try_train(
        &self,
        observations: &[Observation],
        disease: Option<Disease>,
        test_size: Option<f64>,
        seed: Option<u64>,
    ) -> Result<TrainingReport> {
        let test_size = test_size.unwrap_or(self.config.test_size);
        if !(0.1..=0.5).contains(&test_size) {
            return Err(AppError::Validation(format!(
                "test_size must be between 0.1 and 0.5, got {}",
                test_size
            )));
        }
        let seed = seed.unwrap_or(self.config.random_seed);

        self.trainer.train(observations, disease, test_size, seed)
    }

    /// Train on everything currently held by `repository`
    pub fn train_from_repository(
        &self,
        repository: &dyn ObservationRepository,
        disease: Option<Disease>,
        test_size: Option<f64>,
        seed: Option<u64>,
    ) -> TrainingOutcome {
        match repository.list() {
            Ok(observations) => self.train(&observations, disease, test_size, seed),
            Err(e) => {
                error!("Failed to read observations: {}", e);
                TrainingOutcome::Failed(TrainingFailure::from(&e))
            }
        }
    }

    /// Predict outbreak risk for one request
    pub fn predict(&self, request: &PredictionRequest) -> Result<PredictionResponse> {
        self.predictor.predict(request)
    }

    /// Predict every request; one failure does not abort the others
    pub fn predict_batch(&self, requests: &[PredictionRequest]) -> BatchPredictionResponse {
        let predictions: Vec<BatchPredictionItem> = requests
            .iter()
            .map(|request| match self.predictor.predict(request) {
                Ok(response) => BatchPredictionItem::success(response),
                Err(e) => {
                    warn!(
                        county = %request.county,
                        disease = %request.disease,
                        error_code = e.error_code(),
                        "Batch item failed: {}",
                        e
                    );
                    BatchPredictionItem::failure(request, &e)
                }
            })
            .collect();

        let failed = predictions.iter().filter(|p| p.error.is_some()).count();
        info!(
            total = predictions.len(),
            failed,
            "Batch prediction completed"
        );

        BatchPredictionResponse {
            total: predictions.len(),
            failed,
            predictions,
        }
    }

    /// Summary of every trained model
    pub fn model_status(&self) -> ModelStatus {
        self.store.status()
    }
}

/// One entry of a batch prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPredictionItem {
    pub county: String,
    pub disease: Disease,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<PredictionResponse>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl BatchPredictionItem {
    fn success(response: PredictionResponse) -> Self {
        Self {
            county: response.county.clone(),
            disease: response.disease,
            prediction: Some(response),
            error: None,
            error_code: None,
        }
    }

    fn failure(request: &PredictionRequest, err: &AppError) -> Self {
        Self {
            county: request.county.clone(),
            disease: request.disease,
            prediction: None,
            error: Some(err.to_string()),
            error_code: Some(err.error_code().to_string()),
        }
    }
}

/// Result of a batch prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPredictionResponse {
    pub total: usize,
    pub failed: usize,
    pub predictions: Vec<BatchPredictionItem>,
}
