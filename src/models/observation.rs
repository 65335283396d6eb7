use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use validator::Validate;

/// Diseases tracked by the dashboard
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Disease {
    #[serde(alias = "malaria")]
    Malaria,
    #[serde(alias = "cholera")]
    Cholera,
    #[serde(alias = "flu")]
    Flu,
    #[serde(alias = "typhoid")]
    Typhoid,
    #[serde(alias = "dengue")]
    Dengue,
    #[serde(rename = "COVID-19", alias = "covid-19", alias = "covid19")]
    #[strum(to_string = "COVID-19", serialize = "covid19")]
    Covid19,
}

impl Disease {
    /// Stable lowercase key used to address this disease's model artifacts
    pub fn key(&self) -> &'static str {
        match self {
            Disease::Malaria => "malaria",
            Disease::Cholera => "cholera",
            Disease::Flu => "flu",
            Disease::Typhoid => "typhoid",
            Disease::Dengue => "dengue",
            Disease::Covid19 => "covid-19",
        }
    }

    /// Inverse of [`Disease::key`]
    pub fn from_key(key: &str) -> Option<Self> {
        use strum::IntoEnumIterator;
        Disease::iter().find(|d| d.key() == key)
    }
}

/// A single labelled training record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Observation {
    /// Repository-assigned identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    /// County name
    #[validate(length(min = 1, max = 255))]
    pub county: String,

    pub disease: Disease,

    /// Mean temperature (°C)
    pub temperature: f64,

    /// Relative humidity (%)
    #[validate(range(min = 0.0, max = 100.0))]
    pub humidity: f64,

    /// Rainfall (mm)
    #[validate(range(min = 0.0))]
    pub rainfall: f64,

    /// People per km²
    #[validate(range(min = 0.0))]
    pub population_density: f64,

    /// Share of the population with access to clean water (%)
    #[validate(range(min = 0.0, max = 100.0))]
    pub access_to_water: f64,

    /// Healthcare coverage (%)
    #[validate(range(min = 0.0, max = 100.0))]
    pub healthcare_coverage: f64,

    /// Cases recorded in the previous period
    pub previous_cases: u32,

    /// Vaccination rate (%)
    #[validate(range(min = 0.0, max = 100.0))]
    pub vaccination_rate: f64,

    /// Outcome label
    pub outbreak_occurred: bool,

    /// Cases reported in the observed period
    #[serde(default)]
    pub cases_reported: u32,
}
