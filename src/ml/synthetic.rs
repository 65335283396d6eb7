use crate::models::{Disease, Observation, PredictionRequest};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use strum::IntoEnumIterator;

/// Counties sampled for synthetic observations
pub const COUNTIES: &[&str] = &[
    "Nairobi", "Mombasa", "Kisumu", "Nakuru", "Eldoret", "Garissa", "Turkana", "Kakamega",
];

/// Relative spread applied to every feature around its cluster centre
const JITTER: f64 = 0.05;

/// Feature centre of a cluster, in model feature order
#[derive(Debug, Clone, Copy)]
struct Profile {
    temperature: f64,
    humidity: f64,
    rainfall: f64,
    population_density: f64,
    access_to_water: f64,
    healthcare_coverage: f64,
    previous_cases: f64,
    vaccination_rate: f64,
}

const HIGH_RISK: Profile = Profile {
    temperature: 28.0,
    humidity: 85.0,
    rainfall: 150.0,
    population_density: 10000.0,
    access_to_water: 45.0,
    healthcare_coverage: 50.0,
    previous_cases: 300.0,
    vaccination_rate: 30.0,
};

const LOW_RISK: Profile = Profile {
    temperature: 20.0,
    humidity: 40.0,
    rainfall: 20.0,
    population_density: 1000.0,
    access_to_water: 95.0,
    healthcare_coverage: 90.0,
    previous_cases: 10.0,
    vaccination_rate: 85.0,
};

/// Seeded generator of labelled high-risk and low-risk observations
///
/// Equal seeds produce equal observations.
pub struct SyntheticGenerator {
    rng: StdRng,
}

impl SyntheticGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// `n` observations for `disease`, alternating outbreak and no-outbreak
    pub fn generate(&mut self, disease: Disease, n: usize) -> Vec<Observation> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    self.observation(disease, HIGH_RISK, true)
                } else {
                    self.observation(disease, LOW_RISK, false)
                }
            })
            .collect()
    }

    /// `n_per_disease` observations for every disease, shuffled
    pub fn generate_all(&mut self, n_per_disease: usize) -> Vec<Observation> {
        let mut observations: Vec<Observation> = Disease::iter()
            .flat_map(|disease| self.generate(disease, n_per_disease))
            .collect();
        observations.shuffle(&mut self.rng);
        observations
    }

    /// Request sitting exactly on the high-risk cluster centre
    pub fn high_risk_request(county: &str, disease: Disease) -> PredictionRequest {
        request_at(county, disease, HIGH_RISK)
    }

    /// Request sitting exactly on the low-risk cluster centre
    pub fn low_risk_request(county: &str, disease: Disease) -> PredictionRequest {
        request_at(county, disease, LOW_RISK)
    }

    fn jitter(&mut self, centre: f64) -> f64 {
        centre * (1.0 + self.rng.gen_range(-JITTER..JITTER))
    }

    fn percent(&mut self, centre: f64) -> f64 {
        self.jitter(centre).clamp(0.0, 100.0)
    }

    fn observation(&mut self, disease: Disease, profile: Profile, outbreak: bool) -> Observation {
        let county = COUNTIES.choose(&mut self.rng).copied().unwrap_or("Nairobi");
        let previous_cases = self.jitter(profile.previous_cases).round() as u32;
        let cases_reported = if outbreak {
            (f64::from(previous_cases) * self.rng.gen_range(1.5..2.5)).round() as u32
        } else {
            self.rng.gen_range(0..=previous_cases)
        };

        Observation {
            id: None,
            county: county.to_string(),
            disease,
            temperature: self.jitter(profile.temperature),
            humidity: self.percent(profile.humidity),
            rainfall: self.jitter(profile.rainfall),
            population_density: self.jitter(profile.population_density),
            access_to_water: self.percent(profile.access_to_water),
            healthcare_coverage: self.percent(profile.healthcare_coverage),
            previous_cases,
            vaccination_rate: self.percent(profile.vaccination_rate),
            outbreak_occurred: outbreak,
            cases_reported,
        }
    }
}

fn request_at(county: &str, disease: Disease, profile: Profile) -> PredictionRequest {
    PredictionRequest {
        county: county.to_string(),
        disease,
        temperature: profile.temperature,
        humidity: profile.humidity,
        rainfall: profile.rainfall,
        population_density: profile.population_density,
        access_to_water: profile.access_to_water,
        healthcare_coverage: profile.healthcare_coverage,
        previous_cases: profile.previous_cases as u32,
        vaccination_rate: profile.vaccination_rate,
    }
}
