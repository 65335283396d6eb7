use crate::error::{AppError, Result};
use crate::ml::models::{TrainingDataset, POSITIVE_CLASS};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Algorithm name reported in model versions
pub const NAIVE_BAYES: &str = "NaiveBayes";

/// Portion of the largest feature variance added to every class variance
const VAR_SMOOTHING: f64 = 1e-9;

/// Trait for probabilistic classifiers
pub trait Classifier: Send + Sync {
    /// Fit a new classifier on a labelled dataset
    fn fit(dataset: &TrainingDataset) -> Result<Self>
    where
        Self: Sized;

    /// Predict class labels
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<usize>>;

    /// Predict class probabilities (columns ordered as [`Classifier::classes`])
    fn predict_proba(&self, features: &Array2<f64>) -> Result<Array2<f64>>;

    /// Class labels seen during fitting, ascending
    fn classes(&self) -> &[usize];

    /// Algorithm name
    fn algorithm(&self) -> &'static str;

    /// Probability of the outbreak class for each row
    fn positive_proba(&self, features: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(features)?;
        match self.classes().iter().position(|&c| c == POSITIVE_CLASS) {
            Some(column) => Ok(proba.column(column).to_owned()),
            None => Ok(Array1::zeros(features.nrows())),
        }
    }
}

/// Gaussian Naive Bayes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaussianNaiveBayes {
    /// Class labels, ascending
    classes: Vec<usize>,

    /// Prior probability of each class
    class_prior: Array1<f64>,

    /// Per-class feature means (n_classes × n_features)
    theta: Array2<f64>,

    /// Per-class feature variances, smoothed (n_classes × n_features)
    var: Array2<f64>,

    /// Smoothing added to every variance
    epsilon: f64,
}

impl GaussianNaiveBayes {
    pub fn n_features(&self) -> usize {
        self.theta.ncols()
    }

    pub fn class_prior(&self) -> &Array1<f64> {
        &self.class_prior
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    fn check_features(&self, features: &Array2<f64>) -> Result<()> {
        if features.ncols() != self.n_features() {
            return Err(AppError::Internal(format!(
                "Model was trained on {} features, got {}",
                self.n_features(),
                features.ncols()
            )));
        }
        Ok(())
    }

    /// Unnormalized log posterior of each class for each row
    fn joint_log_likelihood(&self, features: &Array2<f64>) -> Array2<f64> {
        let n_classes = self.classes.len();
        let mut jll = Array2::zeros((features.nrows(), n_classes));

        for c in 0..n_classes {
            let theta = self.theta.row(c);
            let var = self.var.row(c);
            let log_norm: f64 = -0.5 * var.iter().map(|v| (2.0 * PI * v).ln()).sum::<f64>();
            let log_prior = self.class_prior[c].ln();

            for (i, row) in features.axis_iter(Axis(0)).enumerate() {
                let squared: f64 = row
                    .iter()
                    .zip(theta.iter())
                    .zip(var.iter())
                    .map(|((x, mu), v)| (x - mu).powi(2) / v)
                    .sum();
                jll[[i, c]] = log_prior + log_norm - 0.5 * squared;
            }
        }

        jll
    }
}

impl Classifier for GaussianNaiveBayes {
    fn fit(dataset: &TrainingDataset) -> Result<Self> {
        if dataset.n_samples == 0 {
            return Err(AppError::Internal(
                "Cannot train Naive Bayes on zero samples".to_string(),
            ));
        }

        let counts = dataset.class_counts();
        let classes: Vec<usize> = counts.keys().copied().collect();
        let n_features = dataset.n_features;

        let max_var = dataset
            .features
            .var_axis(Axis(0), 0.0)
            .iter()
            .copied()
            .fold(0.0_f64, f64::max);
        let epsilon = VAR_SMOOTHING * max_var;

        let mut theta = Array2::zeros((classes.len(), n_features));
        let mut var = Array2::zeros((classes.len(), n_features));
        let mut class_prior = Array1::zeros(classes.len());

        for (c, &class) in classes.iter().enumerate() {
            let rows: Vec<usize> = dataset
                .labels
                .iter()
                .enumerate()
                .filter(|(_, &label)| label == class)
                .map(|(i, _)| i)
                .collect();
            let members = dataset.features.select(Axis(0), &rows);

            let mean = members.mean_axis(Axis(0)).ok_or_else(|| {
                AppError::Internal(format!("Class {} has no samples", class))
            })?;
            theta.row_mut(c).assign(&mean);
            var.row_mut(c)
                .assign(&members.var_axis(Axis(0), 0.0).mapv(|v| v + epsilon));
            class_prior[c] = counts[&class] as f64 / dataset.n_samples as f64;
        }

        // Constant features give epsilon = 0; variances must stay strictly positive
        if var.iter().any(|&v| v <= 0.0) {
            var.mapv_inplace(|v| if v <= 0.0 { VAR_SMOOTHING } else { v });
        }

        Ok(Self {
            classes,
            class_prior,
            theta,
            var,
            epsilon,
        })
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Vec<usize>> {
        self.check_features(features)?;

        let jll = self.joint_log_likelihood(features);
        Ok(jll
            .axis_iter(Axis(0))
            .map(|row| {
                let best = row
                    .iter()
                    .enumerate()
                    .fold((0, f64::NEG_INFINITY), |best, (i, &v)| {
                        if v > best.1 {
                            (i, v)
                        } else {
                            best
                        }
                    })
                    .0;
                self.classes[best]
            })
            .collect())
    }

    fn predict_proba(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_features(features)?;

        let mut proba = self.joint_log_likelihood(features);
        for mut row in proba.axis_iter_mut(Axis(0)) {
            // log-sum-exp normalization
            let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let log_total = max + row.iter().map(|v| (v - max).exp()).sum::<f64>().ln();
            row.mapv_inplace(|v| (v - log_total).exp());
        }

        Ok(proba)
    }

    fn classes(&self) -> &[usize] {
        &self.classes
    }

    fn algorithm(&self) -> &'static str {
        NAIVE_BAYES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use smartcore::linalg::basic::matrix::DenseMatrix;
    use smartcore::naive_bayes::gaussian::GaussianNB;

    fn create_test_dataset() -> TrainingDataset {
        let features = array![
            [1.0, 2.0],
            [1.2, 1.8],
            [0.8, 2.2],
            [1.1, 2.1],
            [5.0, 8.0],
            [5.2, 7.9],
            [4.8, 8.3],
            [5.1, 8.1],
        ];
        TrainingDataset::new(features, vec![0, 0, 0, 0, 1, 1, 1, 1]).unwrap()
    }

    #[test]
    fn test_naive_bayes_fit() {
        let dataset = create_test_dataset();
        let model = GaussianNaiveBayes::fit(&dataset).unwrap();

        assert_eq!(model.classes(), &[0, 1]);
        assert_eq!(model.n_features(), 2);
        assert_eq!(model.class_prior(), &array![0.5, 0.5]);
        assert!(model.epsilon() > 0.0);
        assert_eq!(model.algorithm(), "NaiveBayes");
    }

    #[test]
    fn test_naive_bayes_predict() {
        let dataset = create_test_dataset();
        let model = GaussianNaiveBayes::fit(&dataset).unwrap();

        let predictions = model.predict(&array![[1.0, 2.0], [5.0, 8.0]]).unwrap();
        assert_eq!(predictions, vec![0, 1]);
    }

    #[test]
    fn test_predict_proba_rows_sum_to_one() {
        let dataset = create_test_dataset();
        let model = GaussianNaiveBayes::fit(&dataset).unwrap();

        let proba = model
            .predict_proba(&array![[1.0, 2.0], [3.0, 5.0], [5.0, 8.0]])
            .unwrap();
        for row in proba.axis_iter(Axis(0)) {
            assert!((row.sum() - 1.0).abs() < 1e-9);
            assert!(row.iter().all(|&p| (0.0..=1.0).contains(&p)));
        }

        let positive = model.positive_proba(&array![[5.0, 8.0]]).unwrap();
        assert!(positive[0] > 0.99);
    }

    #[test]
    fn test_single_class_has_no_positive_probability() {
        let features = array![[1.0, 2.0], [1.5, 2.5]];
        let dataset = TrainingDataset::new(features, vec![0, 0]).unwrap();
        let model = GaussianNaiveBayes::fit(&dataset).unwrap();

        let positive = model.positive_proba(&array![[1.0, 2.0]]).unwrap();
        assert_eq!(positive[0], 0.0);
    }

    #[test]
    fn test_feature_count_mismatch() {
        let model = GaussianNaiveBayes::fit(&create_test_dataset()).unwrap();
        assert!(model.predict(&array![[1.0, 2.0, 3.0]]).is_err());
        assert!(model.predict_proba(&array![[1.0]]).is_err());
    }

    #[test]
    fn test_labels_match_smartcore() {
        let dataset = create_test_dataset();
        let model = GaussianNaiveBayes::fit(&dataset).unwrap();

        let shape = dataset.features.shape();
        let data: Vec<f64> = dataset.features.iter().copied().collect();
        let x = DenseMatrix::new(shape[0], shape[1], data, false);
        let reference = GaussianNB::fit(&x, &dataset.labels, Default::default()).unwrap();

        let expected: Vec<usize> = reference.predict(&x).unwrap();
        assert_eq!(model.predict(&dataset.features).unwrap(), expected);
    }
}
