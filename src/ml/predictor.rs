use crate::error::{AppError, Result};
use crate::ml::classifier::Classifier;
use crate::ml::features::{FeatureVector, N_FEATURES};
use crate::ml::models::ModelKey;
use crate::ml::recommendations::generate_recommendations;
use crate::ml::store::{FittedModel, ModelStore};
use crate::models::{PredictionRequest, PredictionResponse, RiskLevel};
use chrono::Utc;
use ndarray::Array2;
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

/// Round to 4 decimal places
fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Score one request against a resolved model
///
/// The request is standardized with the model's own scaler. Nothing here is
/// random, so equal inputs give bit-identical outputs (apart from `created_at`).
pub fn score(model: &FittedModel, request: &PredictionRequest) -> Result<PredictionResponse> {
    let vector = FeatureVector::from(request);
    let row = Array2::from_shape_vec((1, N_FEATURES), vector.as_array().to_vec())
        .map_err(|e| AppError::Internal(format!("Failed to create feature array: {}", e)))?;

    let scaled = model.scaler.transform(&row)?;
    let probability = model.classifier.positive_proba(&scaled)?[0];

    let risk_level = RiskLevel::from_probability(probability);
    let predicted_cases =
        (f64::from(request.previous_cases) * risk_level.case_multiplier()).floor() as u32;

    Ok(PredictionResponse {
        county: request.county.clone(),
        disease: request.disease,
        risk_level,
        outbreak_probability: round4(probability),
        confidence_score: round4(probability.max(1.0 - probability)),
        predicted_cases,
        model_version: model.metadata.prediction_version(),
        recommendations: generate_recommendations(request, risk_level),
        created_at: Utc::now(),
    })
}

/// Resolves a model for each request and scores it
pub struct Predictor {
    store: Arc<ModelStore>,
}

impl Predictor {
    pub fn new(store: Arc<ModelStore>) -> Self {
        Self { store }
    }

    /// Model that would answer a request for `request.disease`
    pub fn resolve(&self, request: &PredictionRequest) -> Result<Arc<FittedModel>> {
        let chain = ModelKey::lookup_chain(request.disease);
        let model = self.store.resolve(&chain)?.ok_or_else(|| {
            AppError::ModelNotFound(format!(
                "no model trained for {} and no combined model available",
                request.disease
            ))
        })?;

        if model.key != chain[0] {
            warn!(
                disease = %request.disease,
                model_key = %model.key,
                "No disease-specific model, using fallback"
            );
        }

        Ok(model)
    }

    pub fn predict(&self, request: &PredictionRequest) -> Result<PredictionResponse> {
        request.validate()?;

        let model = self.resolve(request)?;
        let response = score(&model, request)?;

        info!(
            county = %response.county,
            disease = %response.disease,
            risk_level = %response.risk_level,
            probability = response.outbreak_probability,
            model_version = %response.model_version,
            "Prediction completed"
        );

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::classifier::GaussianNaiveBayes;
    use crate::ml::features::FeatureVector;
    use crate::ml::models::{ModelMetadata, TrainingDataset};
    use crate::ml::scaler::StandardScaler;
    use crate::models::Disease;
    use chrono::TimeZone;
    use ndarray::array;

    /// Two tight clusters: low risk around the first row, high risk around the second
    fn fitted_model(key: ModelKey) -> FittedModel {
        let low = [20.0, 40.0, 20.0, 1000.0, 95.0, 90.0, 10.0, 85.0];
        let high = [28.0, 85.0, 150.0, 10000.0, 45.0, 50.0, 300.0, 30.0];
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..10 {
            let jitter = 1.0 + (i as f64 - 4.5) * 0.01;
            rows.extend(low.iter().map(|v| v * jitter));
            labels.push(0);
            rows.extend(high.iter().map(|v| v * jitter));
            labels.push(1);
        }
        let features = Array2::from_shape_vec((20, N_FEATURES), rows).unwrap();
        let scaler = StandardScaler::fit(&features).unwrap();
        let dataset = TrainingDataset::new(scaler.transform(&features).unwrap(), labels).unwrap();

        FittedModel {
            key,
            classifier: GaussianNaiveBayes::fit(&dataset).unwrap(),
            scaler,
            metadata: ModelMetadata {
                disease: key.file_stem().to_string(),
                accuracy: 1.0,
                precision: 1.0,
                recall: 1.0,
                f1_score: 1.0,
                trained_at: Utc.with_ymd_and_hms(2025, 2, 14, 10, 30, 0).unwrap(),
                training_samples: 16,
                test_samples: 4,
                features: FeatureVector::names(),
                algorithm: "NaiveBayes".to_string(),
            },
        }
    }

    fn high_risk_request() -> PredictionRequest {
        PredictionRequest {
            county: "Nairobi".to_string(),
            disease: Disease::Malaria,
            temperature: 28.0,
            humidity: 85.0,
            rainfall: 150.0,
            population_density: 10000.0,
            access_to_water: 45.0,
            healthcare_coverage: 50.0,
            previous_cases: 300,
            vaccination_rate: 30.0,
        }
    }

    fn low_risk_request() -> PredictionRequest {
        PredictionRequest {
            county: "Nyeri".to_string(),
            disease: Disease::Malaria,
            temperature: 20.0,
            humidity: 40.0,
            rainfall: 20.0,
            population_density: 1000.0,
            access_to_water: 95.0,
            healthcare_coverage: 90.0,
            previous_cases: 10,
            vaccination_rate: 85.0,
        }
    }

    #[test]
    fn test_round4() {
        assert_eq!(round4(0.123456), 0.1235);
        assert_eq!(round4(1.0), 1.0);
    }

    #[test]
    fn test_score_high_risk() {
        let model = fitted_model(ModelKey::All);
        let response = score(&model, &high_risk_request()).unwrap();

        assert!(response.outbreak_probability > 0.5);
        assert!(matches!(
            response.risk_level,
            RiskLevel::High | RiskLevel::Critical
        ));
        assert_eq!(response.county, "Nairobi");
        assert_eq!(response.model_version, "NaiveBayes_2025-02-14");
        assert_eq!(response.recommendations.len(), 5);
    }

    #[test]
    fn test_score_low_risk() {
        let model = fitted_model(ModelKey::All);
        let response = score(&model, &low_risk_request()).unwrap();

        assert!(response.outbreak_probability < 0.5);
        assert_eq!(response.risk_level, RiskLevel::Low);
        assert_eq!(response.predicted_cases, 8);
        assert_eq!(
            response.recommendations,
            vec!["Continue routine surveillance".to_string()]
        );
    }

    #[test]
    fn test_predicted_cases_follow_tier() {
        let model = fitted_model(ModelKey::All);
        let response = score(&model, &high_risk_request()).unwrap();

        let expected = (300.0 * response.risk_level.case_multiplier()).floor() as u32;
        assert_eq!(response.predicted_cases, expected);
    }

    #[test]
    fn test_confidence_at_least_half() {
        let model = fitted_model(ModelKey::All);
        let mut request = high_risk_request();
        for step in 0..=10 {
            let t = step as f64 / 10.0;
            request.temperature = 20.0 + 8.0 * t;
            request.humidity = 40.0 + 45.0 * t;
            request.vaccination_rate = 85.0 - 55.0 * t;
            let response = score(&model, &request).unwrap();
            assert!(response.confidence_score >= 0.5);
            assert!((0.0..=1.0).contains(&response.outbreak_probability));
        }
    }

    #[test]
    fn test_score_is_deterministic() {
        let model = fitted_model(ModelKey::All);
        let a = score(&model, &high_risk_request()).unwrap();
        let b = score(&model, &high_risk_request()).unwrap();

        assert_eq!(a.outbreak_probability.to_bits(), b.outbreak_probability.to_bits());
        assert_eq!(a.confidence_score.to_bits(), b.confidence_score.to_bits());
        assert_eq!(a.recommendations, b.recommendations);
        assert_eq!(a.predicted_cases, b.predicted_cases);
    }

    #[test]
    fn test_predictor_falls_back_to_combined_model() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ModelStore::open(dir.path()).unwrap());
        let predictor = Predictor::new(store.clone());

        let err = predictor.predict(&high_risk_request()).unwrap_err();
        assert!(matches!(err, AppError::ModelNotFound(_)));

        store.save(fitted_model(ModelKey::All)).unwrap();
        let model = predictor.resolve(&high_risk_request()).unwrap();
        assert_eq!(model.key, ModelKey::All);

        let response = predictor.predict(&high_risk_request()).unwrap();
        assert_eq!(response.model_version, "NaiveBayes_2025-02-14");
    }

    #[test]
    fn test_predictor_rejects_invalid_request() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ModelStore::open(dir.path()).unwrap());
        store.save(fitted_model(ModelKey::All)).unwrap();
        let predictor = Predictor::new(store);

        let mut request = high_risk_request();
        request.healthcare_coverage = 150.0;
        assert!(matches!(
            predictor.predict(&request),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_scaler_of_resolved_model_is_used() {
        let model = fitted_model(ModelKey::All);
        let row = array![[28.0, 85.0, 150.0, 10000.0, 45.0, 50.0, 300.0, 30.0]];
        let scaled = model.scaler.transform(&row).unwrap();
        let direct = model.classifier.positive_proba(&scaled).unwrap()[0];

        let response = score(&model, &high_risk_request()).unwrap();
        assert_eq!(response.outbreak_probability, round4(direct));
    }
}
