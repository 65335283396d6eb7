use crate::error::{AppError, Result};
use crate::models::Disease;
use chrono::{DateTime, Utc};
use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Label value of observations where an outbreak occurred
pub const POSITIVE_CLASS: usize = 1;

/// Label value of observations without an outbreak
pub const NEGATIVE_CLASS: usize = 0;

/// Key addressing one persisted model/scaler pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelKey {
    /// Model trained on a single disease
    Disease(Disease),

    /// Model trained on every disease combined
    All,
}

impl ModelKey {
    /// Sentinel key of the combined model
    pub const ALL: &'static str = "all";

    /// File stem used for the combined model's artifacts
    pub const ALL_STEM: &'static str = "all_diseases";

    /// Key for an optional disease filter (`None` selects the combined model)
    pub fn for_filter(disease: Option<Disease>) -> Self {
        disease.map(ModelKey::Disease).unwrap_or(ModelKey::All)
    }

    /// Keys tried in order when resolving a model for `disease`
    pub fn lookup_chain(disease: Disease) -> Vec<ModelKey> {
        vec![ModelKey::Disease(disease), ModelKey::All]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKey::Disease(disease) => disease.key(),
            ModelKey::All => Self::ALL,
        }
    }

    /// Stem shared by the model, scaler and metadata files of this key
    pub fn file_stem(&self) -> &'static str {
        match self {
            ModelKey::Disease(disease) => disease.key(),
            ModelKey::All => Self::ALL_STEM,
        }
    }

    /// Inverse of [`ModelKey::file_stem`]
    pub fn from_file_stem(stem: &str) -> Option<Self> {
        if stem == Self::ALL_STEM {
            Some(ModelKey::All)
        } else {
            Disease::from_key(stem).map(ModelKey::Disease)
        }
    }

    pub fn disease(&self) -> Option<Disease> {
        match self {
            ModelKey::Disease(disease) => Some(*disease),
            ModelKey::All => None,
        }
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Training dataset
#[derive(Debug, Clone)]
pub struct TrainingDataset {
    /// Feature matrix (n_samples × n_features)
    pub features: Array2<f64>,

    /// Outcome labels (0 = no outbreak, 1 = outbreak)
    pub labels: Vec<usize>,

    /// Number of samples
    pub n_samples: usize,

    /// Number of features
    pub n_features: usize,
}

impl TrainingDataset {
    pub fn new(features: Array2<f64>, labels: Vec<usize>) -> Result<Self> {
        if features.nrows() != labels.len() {
            return Err(AppError::Internal(format!(
                "Feature matrix has {} rows but {} labels were given",
                features.nrows(),
                labels.len()
            )));
        }

        let (n_samples, n_features) = features.dim();
        Ok(Self {
            features,
            labels,
            n_samples,
            n_features,
        })
    }

    /// Number of samples per label value
    pub fn class_counts(&self) -> BTreeMap<usize, usize> {
        let mut counts = BTreeMap::new();
        for &label in &self.labels {
            *counts.entry(label).or_insert(0) += 1;
        }
        counts
    }

    /// Rows at `indices`, in the given order
    pub fn select(&self, indices: &[usize]) -> TrainingDataset {
        TrainingDataset {
            features: self.features.select(Axis(0), indices),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
            n_samples: indices.len(),
            n_features: self.n_features,
        }
    }

    /// Split into train/test sets, preserving the outcome balance in both
    ///
    /// Each class contributes `round(count × test_size)` samples to the test set,
    /// clamped so that both splits keep at least one member of every class.
    /// The split is fully determined by `seed`.
    pub fn stratified_split(
        &self,
        test_size: f64,
        seed: u64,
    ) -> Result<(TrainingDataset, TrainingDataset)> {
        if !(0.1..=0.5).contains(&test_size) {
            return Err(AppError::Validation(format!(
                "test_size must be within [0.1, 0.5], got {}",
                test_size
            )));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut train_indices = Vec::with_capacity(self.n_samples);
        let mut test_indices = Vec::new();

        for class in [NEGATIVE_CLASS, POSITIVE_CLASS] {
            let mut members: Vec<usize> = self
                .labels
                .iter()
                .enumerate()
                .filter(|(_, &label)| label == class)
                .map(|(i, _)| i)
                .collect();

            if members.len() < 2 {
                return Err(AppError::Stratification(format!(
                    "outcome class {} has {} observation(s), need at least 2 per class",
                    class_name(class),
                    members.len()
                )));
            }

            members.shuffle(&mut rng);

            let n_test = ((members.len() as f64) * test_size).round() as usize;
            let n_test = n_test.clamp(1, members.len() - 1);

            test_indices.extend_from_slice(&members[..n_test]);
            train_indices.extend_from_slice(&members[n_test..]);
        }

        train_indices.sort_unstable();
        test_indices.sort_unstable();

        Ok((self.select(&train_indices), self.select(&test_indices)))
    }
}

fn class_name(class: usize) -> &'static str {
    if class == POSITIVE_CLASS {
        "'outbreak'"
    } else {
        "'no outbreak'"
    }
}

/// Binary confusion matrix counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub true_positives: usize,
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

/// Model evaluation metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub accuracy: f64,

    /// Precision of the outbreak class
    pub precision: f64,

    /// Recall of the outbreak class
    pub recall: f64,

    /// F1 score of the outbreak class
    pub f1_score: f64,

    pub confusion: ConfusionCounts,
}

impl ModelMetrics {
    /// Evaluate predictions against the true labels
    ///
    /// Precision, recall and F1 are reported as 0 when their denominator is 0.
    pub fn from_predictions(y_true: &[usize], y_pred: &[usize]) -> Self {
        let n_samples = y_true.len();
        if n_samples == 0 {
            return Self::default();
        }

        let mut confusion = ConfusionCounts::default();
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            match (t == POSITIVE_CLASS, p == POSITIVE_CLASS) {
                (true, true) => confusion.true_positives += 1,
                (false, false) => confusion.true_negatives += 1,
                (false, true) => confusion.false_positives += 1,
                (true, false) => confusion.false_negatives += 1,
            }
        }

        let tp = confusion.true_positives;
        let fp = confusion.false_positives;
        let fn_count = confusion.false_negatives;

        let accuracy = (tp + confusion.true_negatives) as f64 / n_samples as f64;

        let precision = if tp + fp > 0 {
            tp as f64 / (tp + fp) as f64
        } else {
            0.0
        };

        let recall = if tp + fn_count > 0 {
            tp as f64 / (tp + fn_count) as f64
        } else {
            0.0
        };

        let f1_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Self {
            accuracy,
            precision,
            recall,
            f1_score,
            confusion,
        }
    }
}

/// Metadata document written next to every model artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Disease key, or `all_diseases` for the combined model
    pub disease: String,

    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,

    pub trained_at: DateTime<Utc>,

    pub training_samples: usize,
    pub test_samples: usize,

    /// Feature names in column order
    pub features: Vec<String>,

    /// Classifier algorithm name
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
}

fn default_algorithm() -> String {
    crate::ml::classifier::NAIVE_BAYES.to_string()
}

impl ModelMetadata {
    /// Version string reported by predictions, e.g. `NaiveBayes_2025-01-31`
    pub fn prediction_version(&self) -> String {
        format!("{}_{}", self.algorithm, self.trained_at.format("%Y-%m-%d"))
    }

    /// Version string reported by training, e.g. `v20250131_142501`
    pub fn training_version(&self) -> String {
        format!("v{}", self.trained_at.format("%Y%m%d_%H%M%S"))
    }
}

/// Successful training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub success: bool,
    pub model_version: String,

    /// Disease filter used, `None` for the combined model
    pub disease: Option<Disease>,

    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub training_samples: usize,
    pub metrics: ConfusionCounts,
}

/// Failed training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingFailure {
    pub success: bool,
    pub error: String,
    pub error_code: String,
}

impl From<&AppError> for TrainingFailure {
    fn from(err: &AppError) -> Self {
        Self {
            success: false,
            error: err.to_string(),
            error_code: err.error_code().to_string(),
        }
    }
}

/// Structured training result; training errors never escape the service as `Err`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrainingOutcome {
    Trained(TrainingReport),
    Failed(TrainingFailure),
}

impl TrainingOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TrainingOutcome::Trained(_))
    }

    pub fn report(&self) -> Option<&TrainingReport> {
        match self {
            TrainingOutcome::Trained(report) => Some(report),
            TrainingOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&TrainingFailure> {
        match self {
            TrainingOutcome::Trained(_) => None,
            TrainingOutcome::Failed(failure) => Some(failure),
        }
    }
}

/// Summary of one trained model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub trained_at: DateTime<Utc>,
    pub accuracy: f64,
    pub training_samples: usize,

    /// Number of features the model was trained on
    pub features: usize,
}

/// Status of every model known to the store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelStatus {
    pub models: BTreeMap<String, ModelSummary>,
    pub last_update: Option<DateTime<Utc>>,
}
