use crate::models::Disease;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use validator::Validate;

/// Outbreak risk tier derived from the outbreak probability
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Map an outbreak probability to its tier
    pub fn from_probability(probability: f64) -> Self {
        if probability >= 0.8 {
            RiskLevel::Critical
        } else if probability >= 0.6 {
            RiskLevel::High
        } else if probability >= 0.4 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Multiplier applied to previous cases to estimate the next period's cases
    pub fn case_multiplier(&self) -> f64 {
        match self {
            RiskLevel::Critical => 2.5,
            RiskLevel::High => 1.8,
            RiskLevel::Medium => 1.2,
            RiskLevel::Low => 0.8,
        }
    }
}

/// Input to a single prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PredictionRequest {
    /// County label, passed through to the response
    #[validate(length(min = 1, max = 255))]
    pub county: String,

    pub disease: Disease,

    pub temperature: f64,

    #[validate(range(min = 0.0, max = 100.0))]
    pub humidity: f64,

    #[validate(range(min = 0.0))]
    pub rainfall: f64,

    #[validate(range(min = 0.0))]
    pub population_density: f64,

    #[validate(range(min = 0.0, max = 100.0))]
    pub access_to_water: f64,

    #[validate(range(min = 0.0, max = 100.0))]
    pub healthcare_coverage: f64,

    pub previous_cases: u32,

    #[validate(range(min = 0.0, max = 100.0))]
    pub vaccination_rate: f64,
}

/// Result of a single prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub county: String,
    pub disease: Disease,
    pub risk_level: RiskLevel,

    /// Positive-class posterior, rounded to 4 decimals
    pub outbreak_probability: f64,

    /// max(p, 1 - p), rounded to 4 decimals
    pub confidence_score: f64,

    pub predicted_cases: u32,

    /// Algorithm name and training date of the model that answered
    pub model_version: String,

    /// At most five items, tier-specific advice first
    pub recommendations: Vec<String>,

    pub created_at: DateTime<Utc>,
}
