/// Integration tests for the observation repository and training statistics

mod common;

use common::{setup_service, training_observations, PER_DISEASE};
use outbreak_predictor::{
    ml::ModelKey,
    models::Disease,
    state::{InMemoryObservationRepository, ObservationRepository},
};
use strum::IntoEnumIterator;

#[test]
fn test_statistics_over_synthetic_data() {
    let repository = InMemoryObservationRepository::new();
    repository.create_batch(training_observations()).unwrap();

    let stats = repository.statistics().unwrap();
    let n_diseases = Disease::iter().count();

    assert_eq!(stats.total_records, PER_DISEASE * n_diseases);
    assert_eq!(stats.outbreaks, PER_DISEASE / 2 * n_diseases);
    assert_eq!(stats.by_disease.len(), n_diseases);
    assert_eq!(stats.by_disease["COVID-19"], PER_DISEASE);
    assert_eq!(
        stats.by_county.values().sum::<usize>(),
        stats.total_records
    );
    assert!(stats.avg_temperature > 20.0 && stats.avg_temperature < 28.0);
}

#[test]
fn test_train_from_saved_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("observations.json");

    let repository = InMemoryObservationRepository::new();
    repository.create_batch(training_observations()).unwrap();
    repository.save_json(&path).unwrap();

    let loaded = InMemoryObservationRepository::load_json(&path).unwrap();
    assert_eq!(loaded.len(), repository.len());
    assert_eq!(
        loaded.by_disease(Disease::Cholera).unwrap().len(),
        PER_DISEASE
    );

    let (service, _models) = setup_service();
    let outcome = service.train_from_repository(&loaded, Some(Disease::Cholera), None, None);
    let report = outcome.report().unwrap();
    assert_eq!(report.disease, Some(Disease::Cholera));

    let status = service.model_status();
    assert!(status.models.contains_key("cholera"));
    assert!(service
        .store()
        .metadata(ModelKey::Disease(Disease::Cholera))
        .is_some());
}

#[test]
fn test_load_rejects_malformed_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("observations.json");
    std::fs::write(&path, b"[{\"county\": \"Nairobi\"}]").unwrap();

    let err = InMemoryObservationRepository::load_json(&path).unwrap_err();
    assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
}
