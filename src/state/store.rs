use crate::error::{AppError, Result};
use crate::models::{Disease, Observation};
use crate::state::ObservationRepository;
use dashmap::DashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use validator::Validate;

/// In-memory observation store
#[derive(Debug, Clone)]
pub struct InMemoryObservationRepository {
    observations: Arc<DashMap<u64, Observation>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryObservationRepository {
    pub fn new() -> Self {
        Self {
            observations: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Load observations from a JSON array file, assigning fresh ids
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let observations: Vec<Observation> = serde_json::from_slice(&bytes)?;

        let repository = Self::new();
        let stored = repository.create_batch(observations)?;
        tracing::info!(
            path = %path.display(),
            count = stored.len(),
            "Observations loaded"
        );
        Ok(repository)
    }

    /// Write every observation to `path` as a JSON array
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let observations = self.list()?;
        std::fs::write(path, serde_json::to_vec_pretty(&observations)?)?;
        tracing::debug!(path = %path.display(), count = observations.len(), "Observations saved");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    fn filtered(&self, predicate: impl Fn(&Observation) -> bool) -> Vec<Observation> {
        let mut observations: Vec<Observation> = self
            .observations
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        observations.sort_by_key(|o| o.id);
        observations
    }
}

impl Default for InMemoryObservationRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl ObservationRepository for InMemoryObservationRepository {
    fn create(&self, mut observation: Observation) -> Result<Observation> {
        observation.validate()?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        observation.id = Some(id);
        self.observations.insert(id, observation.clone());

        tracing::debug!(observation_id = id, disease = %observation.disease, "Observation saved");
        Ok(observation)
    }

    fn create_batch(&self, observations: Vec<Observation>) -> Result<Vec<Observation>> {
        for observation in &observations {
            observation.validate()?;
        }
        observations
            .into_iter()
            .map(|observation| self.create(observation))
            .collect()
    }

    fn get(&self, id: u64) -> Result<Option<Observation>> {
        Ok(self.observations.get(&id).map(|entry| entry.clone()))
    }

    fn update(&self, id: u64, mut observation: Observation) -> Result<Observation> {
        observation.validate()?;

        match self.observations.get_mut(&id) {
            Some(mut entry) => {
                observation.id = Some(id);
                *entry = observation.clone();
                tracing::debug!(observation_id = id, "Observation updated");
                Ok(observation)
            }
            None => Err(AppError::NotFound(format!("Observation {} not found", id))),
        }
    }

    fn delete(&self, id: u64) -> Result<()> {
        if self.observations.remove(&id).is_some() {
            tracing::debug!(observation_id = id, "Observation deleted");
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Observation {} not found", id)))
        }
    }

    fn list(&self) -> Result<Vec<Observation>> {
        Ok(self.filtered(|_| true))
    }

    fn by_disease(&self, disease: Disease) -> Result<Vec<Observation>> {
        Ok(self.filtered(|o| o.disease == disease))
    }

    fn by_county(&self, county: &str) -> Result<Vec<Observation>> {
        Ok(self.filtered(|o| o.county == county))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_observation(county: &str, disease: Disease, outbreak: bool) -> Observation {
        Observation {
            id: None,
            county: county.to_string(),
            disease,
            temperature: 25.0,
            humidity: 60.0,
            rainfall: 80.0,
            population_density: 2000.0,
            access_to_water: 70.0,
            healthcare_coverage: 65.0,
            previous_cases: 40,
            vaccination_rate: 60.0,
            outbreak_occurred: outbreak,
            cases_reported: 12,
        }
    }

    #[test]
    fn test_create_assigns_ids() {
        let repo = InMemoryObservationRepository::new();
        let a = repo
            .create(create_test_observation("Nairobi", Disease::Malaria, true))
            .unwrap();
        let b = repo
            .create(create_test_observation("Kisumu", Disease::Cholera, false))
            .unwrap();

        assert_eq!(a.id, Some(1));
        assert_eq!(b.id, Some(2));
        assert_eq!(repo.get(1).unwrap().unwrap().county, "Nairobi");
        assert_eq!(repo.len(), 2);
    }

    #[test]
    fn test_create_rejects_invalid() {
        let repo = InMemoryObservationRepository::new();
        let mut observation = create_test_observation("Nairobi", Disease::Malaria, true);
        observation.vaccination_rate = 120.0;

        assert!(matches!(
            repo.create(observation),
            Err(AppError::Validation(_))
        ));
        assert!(repo.is_empty());
    }

    #[test]
    fn test_create_batch_is_all_or_nothing() {
        let repo = InMemoryObservationRepository::new();
        let mut bad = create_test_observation("Kisumu", Disease::Flu, false);
        bad.county = String::new();

        let result = repo.create_batch(vec![
            create_test_observation("Nairobi", Disease::Flu, true),
            bad,
        ]);
        assert!(result.is_err());
        assert!(repo.is_empty());
    }

    #[test]
    fn test_update_and_delete() {
        let repo = InMemoryObservationRepository::new();
        let stored = repo
            .create(create_test_observation("Nairobi", Disease::Malaria, true))
            .unwrap();
        let id = stored.id.unwrap();

        let mut changed = stored.clone();
        changed.county = "Mombasa".to_string();
        changed.id = None;
        let updated = repo.update(id, changed).unwrap();
        assert_eq!(updated.id, Some(id));
        assert_eq!(repo.get(id).unwrap().unwrap().county, "Mombasa");

        repo.delete(id).unwrap();
        assert!(repo.get(id).unwrap().is_none());
        assert!(matches!(repo.delete(id), Err(AppError::NotFound(_))));
        assert!(matches!(
            repo.update(id, stored),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_filters() {
        let repo = InMemoryObservationRepository::new();
        repo.create(create_test_observation("Nairobi", Disease::Malaria, true))
            .unwrap();
        repo.create(create_test_observation("Nairobi", Disease::Cholera, false))
            .unwrap();
        repo.create(create_test_observation("Kisumu", Disease::Malaria, false))
            .unwrap();

        assert_eq!(repo.by_disease(Disease::Malaria).unwrap().len(), 2);
        assert_eq!(repo.by_disease(Disease::Dengue).unwrap().len(), 0);

        let nairobi = repo.by_county("Nairobi").unwrap();
        assert_eq!(nairobi.len(), 2);
        assert!(nairobi[0].id < nairobi[1].id);
    }

    #[test]
    fn test_statistics() {
        let repo = InMemoryObservationRepository::new();
        assert_eq!(repo.statistics().unwrap().avg_temperature, 0.0);

        let mut hot = create_test_observation("Nairobi", Disease::Malaria, true);
        hot.temperature = 30.0;
        hot.humidity = 71.0;
        repo.create(hot).unwrap();
        let mut cool = create_test_observation("Kisumu", Disease::Covid19, false);
        cool.temperature = 21.111;
        cool.humidity = 50.0;
        repo.create(cool).unwrap();

        let stats = repo.statistics().unwrap();
        assert_eq!(stats.total_records, 2);
        assert_eq!(stats.outbreaks, 1);
        assert_eq!(stats.by_disease.get("Malaria"), Some(&1));
        assert_eq!(stats.by_disease.get("COVID-19"), Some(&1));
        assert_eq!(stats.by_county.get("Kisumu"), Some(&1));
        assert_eq!(stats.avg_temperature, 25.56);
        assert_eq!(stats.avg_humidity, 60.5);
        assert_eq!(stats.avg_rainfall, 80.0);
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("observations.json");

        let repo = InMemoryObservationRepository::new();
        repo.create(create_test_observation("Nairobi", Disease::Typhoid, true))
            .unwrap();
        repo.create(create_test_observation("Kisumu", Disease::Dengue, false))
            .unwrap();
        repo.save_json(&path).unwrap();

        let loaded = InMemoryObservationRepository::load_json(&path).unwrap();
        assert_eq!(loaded.list().unwrap(), repo.list().unwrap());
    }
}
