/// Outbreak risk prediction engine
///
/// This module provides:
/// - Feature extraction from observations and prediction requests
/// - Stratified train/test splitting and standard scaling
/// - Gaussian Naive Bayes training and evaluation
/// - Per-disease model persistence with fallback to a combined model
/// - Risk tiering, case estimates and recommendations

pub mod classifier;
pub mod features;
pub mod models;
pub mod predictor;
pub mod recommendations;
pub mod scaler;
pub mod service;
pub mod store;
pub mod synthetic;
pub mod trainer;

pub use classifier::{Classifier, GaussianNaiveBayes};
pub use features::{prepare_training_data, FeatureVector, FEATURE_NAMES, N_FEATURES};
pub use models::{
    ConfusionCounts, ModelKey, ModelMetadata, ModelMetrics, ModelStatus, ModelSummary,
    TrainingDataset, TrainingFailure, TrainingOutcome, TrainingReport,
};
pub use predictor::Predictor;
pub use recommendations::generate_recommendations;
pub use scaler::StandardScaler;
pub use service::{BatchPredictionItem, BatchPredictionResponse, OutbreakService};
pub use store::{ArtifactPaths, FittedModel, ModelStore};
pub use synthetic::SyntheticGenerator;
pub use trainer::ModelTrainer;
