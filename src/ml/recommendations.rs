use crate::models::{Disease, PredictionRequest, RiskLevel};

/// Upper bound on recommendations returned with a prediction
pub const MAX_RECOMMENDATIONS: usize = 5;

const CRITICAL: &[&str] = &[
    "Activate emergency response protocol immediately",
    "Alert Ministry of Health for outbreak investigation",
    "Prepare isolation wards and ICU beds",
    "Begin mass vaccination campaign",
    "Increase surveillance frequency to daily",
];

const HIGH: &[&str] = &[
    "Increase health facility preparedness",
    "Stockpile medical supplies and medications",
    "Alert community health workers",
    "Begin weekly surveillance monitoring",
    "Conduct public health education",
];

const MEDIUM: &[&str] = &[
    "Maintain elevated surveillance",
    "Review and update supply inventory",
    "Train healthcare workers on protocols",
    "Monitor trend every 2-3 days",
];

const LOW: &[&str] = &["Continue routine surveillance"];

/// Fixed advice for a risk tier, in priority order
pub fn tier_recommendations(risk_level: RiskLevel) -> &'static [&'static str] {
    match risk_level {
        RiskLevel::Critical => CRITICAL,
        RiskLevel::High => HIGH,
        RiskLevel::Medium => MEDIUM,
        RiskLevel::Low => LOW,
    }
}

/// Advice triggered by the request's conditions, in priority order
pub fn condition_recommendations(request: &PredictionRequest) -> Vec<&'static str> {
    let mut items = Vec::new();

    if request.temperature > 30.0 && request.disease == Disease::Malaria {
        items.push("Increase mosquito control measures");
    }
    if request.humidity > 70.0 && request.rainfall > 100.0 {
        items.push("Enhance water quality monitoring");
    }
    if request.vaccination_rate < 50.0 {
        items.push("Accelerate vaccination campaigns");
    }
    if request.access_to_water < 60.0 {
        items.push("Improve water and sanitation infrastructure");
    }

    items
}

/// Tier advice followed by condition advice, truncated to [`MAX_RECOMMENDATIONS`]
pub fn generate_recommendations(request: &PredictionRequest, risk_level: RiskLevel) -> Vec<String> {
    tier_recommendations(risk_level)
        .iter()
        .copied()
        .chain(condition_recommendations(request))
        .take(MAX_RECOMMENDATIONS)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(disease: Disease) -> PredictionRequest {
        PredictionRequest {
            county: "Kisumu".to_string(),
            disease,
            temperature: 22.0,
            humidity: 50.0,
            rainfall: 30.0,
            population_density: 800.0,
            access_to_water: 90.0,
            healthcare_coverage: 85.0,
            previous_cases: 5,
            vaccination_rate: 80.0,
        }
    }

    #[test]
    fn test_low_tier_without_conditions() {
        let items = generate_recommendations(&request(Disease::Flu), RiskLevel::Low);
        assert_eq!(items, vec!["Continue routine surveillance".to_string()]);
    }

    #[test]
    fn test_conditions_follow_tier_items() {
        let mut r = request(Disease::Malaria);
        r.temperature = 32.0;
        r.humidity = 80.0;
        r.rainfall = 120.0;
        r.vaccination_rate = 40.0;

        let items = generate_recommendations(&r, RiskLevel::Low);
        assert_eq!(
            items,
            vec![
                "Continue routine surveillance",
                "Increase mosquito control measures",
                "Enhance water quality monitoring",
                "Accelerate vaccination campaigns",
            ]
        );
    }

    #[test]
    fn test_mosquito_control_is_malaria_only() {
        let mut r = request(Disease::Cholera);
        r.temperature = 35.0;
        assert!(condition_recommendations(&r).is_empty());
    }

    #[test]
    fn test_truncated_to_five() {
        let mut r = request(Disease::Malaria);
        r.temperature = 32.0;
        r.access_to_water = 40.0;

        for level in [RiskLevel::Critical, RiskLevel::High] {
            let items = generate_recommendations(&r, level);
            assert_eq!(items.len(), MAX_RECOMMENDATIONS);
            assert_eq!(items[0], tier_recommendations(level)[0]);
        }

        let items = generate_recommendations(&r, RiskLevel::Medium);
        assert_eq!(items.len(), 5);
        assert_eq!(items[4], "Increase mosquito control measures");
    }

    #[test]
    fn test_every_tier_non_empty() {
        for level in [
            RiskLevel::Low,
            RiskLevel::Medium,
            RiskLevel::High,
            RiskLevel::Critical,
        ] {
            let items = generate_recommendations(&request(Disease::Typhoid), level);
            assert!(!items.is_empty());
            assert!(items.len() <= MAX_RECOMMENDATIONS);
        }
    }
}
