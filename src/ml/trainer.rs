use crate::error::Result;
use crate::ml::classifier::{Classifier, GaussianNaiveBayes};
use crate::ml::features::{prepare_training_data, FeatureVector};
use crate::ml::models::{
    ModelKey, ModelMetadata, ModelMetrics, TrainingDataset, TrainingReport,
};
use crate::ml::scaler::StandardScaler;
use crate::ml::store::{FittedModel, ModelStore};
use crate::models::{Disease, Observation};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

/// Fit scaler and classifier on a stratified training split and evaluate on the rest
///
/// Pure computation; nothing is persisted.
pub fn fit_model(
    dataset: &TrainingDataset,
    key: ModelKey,
    test_size: f64,
    seed: u64,
) -> Result<(FittedModel, ModelMetrics)> {
    let (train, test) = dataset.stratified_split(test_size, seed)?;

    let scaler = StandardScaler::fit(&train.features)?;
    let train_scaled = TrainingDataset::new(scaler.transform(&train.features)?, train.labels)?;
    let test_scaled = scaler.transform(&test.features)?;

    let classifier = GaussianNaiveBayes::fit(&train_scaled)?;
    let predictions = classifier.predict(&test_scaled)?;
    let metrics = ModelMetrics::from_predictions(&test.labels, &predictions);

    let metadata = ModelMetadata {
        disease: key.file_stem().to_string(),
        accuracy: metrics.accuracy,
        precision: metrics.precision,
        recall: metrics.recall,
        f1_score: metrics.f1_score,
        trained_at: Utc::now(),
        training_samples: train_scaled.n_samples,
        test_samples: test.n_samples,
        features: FeatureVector::names(),
        algorithm: classifier.algorithm().to_string(),
    };

    let model = FittedModel {
        key,
        classifier,
        scaler,
        metadata,
    };

    Ok((model, metrics))
}

/// Trains per-disease (or combined) models and persists them in the store
pub struct ModelTrainer {
    store: Arc<ModelStore>,

    /// Below this many observations training still runs but logs a warning
    min_samples_warning: usize,
}

impl ModelTrainer {
    pub fn new(store: Arc<ModelStore>) -> Self {
        Self {
            store,
            min_samples_warning: 10,
        }
    }

    pub fn with_min_samples_warning(mut self, min_samples: usize) -> Self {
        self.min_samples_warning = min_samples;
        self
    }

    /// Train on `observations` (optionally filtered to one disease) and replace the stored model
    pub fn train(
        &self,
        observations: &[Observation],
        disease: Option<Disease>,
        test_size: f64,
        seed: u64,
    ) -> Result<TrainingReport> {
        let key = ModelKey::for_filter(disease);
        let dataset = prepare_training_data(observations, disease)?;

        if dataset.n_samples < self.min_samples_warning {
            warn!(
                model_key = %key,
                samples = dataset.n_samples,
                "Too few observations for effective training"
            );
        }

        info!(
            model_key = %key,
            samples = dataset.n_samples,
            test_size,
            seed,
            "Training Naive Bayes model"
        );

        let (model, metrics) = fit_model(&dataset, key, test_size, seed)?;
        let model = self.store.save(model)?;

        info!(
            model_key = %key,
            accuracy = format!("{:.2}%", metrics.accuracy * 100.0),
            f1_score = metrics.f1_score,
            "Model trained successfully"
        );

        Ok(TrainingReport {
            success: true,
            model_version: model.metadata.training_version(),
            disease,
            accuracy: metrics.accuracy,
            precision: metrics.precision,
            recall: metrics.recall,
            f1_score: metrics.f1_score,
            training_samples: model.metadata.training_samples,
            metrics: metrics.confusion,
        })
    }
}
