//! File-backed registry of fitted models, one entry per model key.
//!
//! Each key owns three artifacts in the store directory:
//! `naive_bayes_<stem>.bin`, `scaler_<stem>.bin` and `metadata_<stem>.json`.
//! Metadata of every key is read when the store is opened; classifier and
//! scaler binaries are read on first use and then stay cached.

use crate::error::{AppError, Result};
use crate::ml::classifier::GaussianNaiveBayes;
use crate::ml::models::{ModelKey, ModelMetadata, ModelStatus, ModelSummary};
use crate::ml::scaler::StandardScaler;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A classifier together with the scaler it was trained with
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    pub key: ModelKey,
    pub classifier: GaussianNaiveBayes,
    pub scaler: StandardScaler,
    pub metadata: ModelMetadata,
}

/// Locations of the artifacts belonging to one model key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub scaler: PathBuf,
    pub metadata: PathBuf,
}

impl ArtifactPaths {
    pub fn for_key(dir: &Path, key: ModelKey) -> Self {
        let stem = key.file_stem();
        Self {
            model: dir.join(format!("naive_bayes_{}.bin", stem)),
            scaler: dir.join(format!("scaler_{}.bin", stem)),
            metadata: dir.join(format!("metadata_{}.json", stem)),
        }
    }
}

/// Read a metadata document
pub fn load_metadata(path: &Path) -> Result<ModelMetadata> {
    let bytes = fs::read(path).map_err(|e| persistence_error("read", path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| {
        AppError::Persistence(format!("invalid metadata {}: {}", path.display(), e))
    })
}

/// Read the artifacts of `key`; `Ok(None)` when no model has been persisted for it
pub fn load_artifacts(paths: &ArtifactPaths, key: ModelKey) -> Result<Option<FittedModel>> {
    if !paths.model.exists() {
        return Ok(None);
    }

    let classifier: GaussianNaiveBayes = read_binary(&paths.model)?;
    let scaler: StandardScaler = read_binary(&paths.scaler)?;
    let metadata = load_metadata(&paths.metadata)?;

    Ok(Some(FittedModel {
        key,
        classifier,
        scaler,
        metadata,
    }))
}

fn read_binary<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).map_err(|e| persistence_error("read", path, e))?;
    bincode::deserialize(&bytes).map_err(|e| {
        AppError::Persistence(format!("corrupt artifact {}: {}", path.display(), e))
    })
}

/// Artifacts written to temporary files, waiting to be renamed into place
struct StagedArtifacts {
    files: Vec<(PathBuf, PathBuf)>,
}

impl StagedArtifacts {
    fn new() -> Self {
        Self { files: Vec::new() }
    }

    fn stage(&mut self, path: &Path, bytes: &[u8]) -> Result<()> {
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes).map_err(|e| persistence_error("write", &tmp, e))?;
        self.files.push((tmp, path.to_path_buf()));
        Ok(())
    }

    /// Rename every staged file into place, metadata last
    fn commit(mut self) -> Result<()> {
        for (tmp, path) in std::mem::take(&mut self.files) {
            fs::rename(&tmp, &path).map_err(|e| persistence_error("rename", &path, e))?;
        }
        Ok(())
    }
}

impl Drop for StagedArtifacts {
    fn drop(&mut self) {
        for (tmp, _) in &self.files {
            let _ = fs::remove_file(tmp);
        }
    }
}

fn persistence_error(op: &str, path: &Path, err: std::io::Error) -> AppError {
    AppError::Persistence(format!("failed to {} {}: {}", op, path.display(), err))
}

/// Model registry shared by the trainer and the predictor
pub struct ModelStore {
    dir: PathBuf,

    /// Loaded models; an entry is only ever replaced as a whole
    models: DashMap<ModelKey, Arc<FittedModel>>,

    /// Metadata of every persisted model
    metadata: DashMap<ModelKey, ModelMetadata>,

    /// Serializes artifact writes and first loads so no reader pairs files of different runs
    persist_lock: Mutex<()>,
}

impl ModelStore {
    /// Open (creating if needed) the store rooted at `dir` and read all metadata
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| persistence_error("create", &dir, e))?;

        let store = Self {
            dir,
            models: DashMap::new(),
            metadata: DashMap::new(),
            persist_lock: Mutex::new(()),
        };
        store.load_all_metadata()?;

        Ok(store)
    }

    fn load_all_metadata(&self) -> Result<()> {
        let entries =
            fs::read_dir(&self.dir).map_err(|e| persistence_error("list", &self.dir, e))?;

        for entry in entries {
            let path = entry?.path();
            let Some(stem) = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| name.strip_prefix("metadata_"))
                .and_then(|name| name.strip_suffix(".json"))
            else {
                continue;
            };

            let Some(key) = ModelKey::from_file_stem(stem) else {
                debug!(path = %path.display(), "Ignoring metadata for unknown model key");
                continue;
            };

            match load_metadata(&path) {
                Ok(metadata) => {
                    info!(
                        model_key = %key,
                        trained_at = %metadata.trained_at,
                        "Loaded model metadata"
                    );
                    self.metadata.insert(key, metadata);
                }
                Err(e) => warn!(model_key = %key, error = %e, "Failed to load model metadata"),
            }
        }

        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn paths(&self, key: ModelKey) -> ArtifactPaths {
        ArtifactPaths::for_key(&self.dir, key)
    }

    /// Model for exactly `key`, loading it from disk on first use
    pub fn get(&self, key: ModelKey) -> Result<Option<Arc<FittedModel>>> {
        if let Some(entry) = self.models.get(&key) {
            return Ok(Some(Arc::clone(entry.value())));
        }

        // Holding the write lock keeps the three files of one training run together
        let _guard = self.persist_lock.lock();
        if let Some(entry) = self.models.get(&key) {
            return Ok(Some(Arc::clone(entry.value())));
        }

        let Some(loaded) = load_artifacts(&self.paths(key), key)? else {
            return Ok(None);
        };

        let model = Arc::new(loaded);
        self.models.insert(key, Arc::clone(&model));
        self.metadata.insert(key, model.metadata.clone());

        info!(model_key = %key, "Lazy loaded model");
        Ok(Some(model))
    }

    /// First model found along `chain`
    pub fn resolve(&self, chain: &[ModelKey]) -> Result<Option<Arc<FittedModel>>> {
        for &key in chain {
            if let Some(model) = self.get(key)? {
                return Ok(Some(model));
            }
            debug!(model_key = %key, "No model for key, trying next");
        }
        Ok(None)
    }

    /// Persist `model` and make it the current entry for its key
    ///
    /// Artifacts are written before the in-memory swap, so a failed write leaves
    /// the cache (for this and every other key) untouched. A failed write also
    /// leaves the previous artifacts on disk; only renames can fail part way.
    pub fn save(&self, model: FittedModel) -> Result<Arc<FittedModel>> {
        let key = model.key;
        let paths = self.paths(key);

        let _guard = self.persist_lock.lock();

        // Nothing is renamed until all three files are written
        let mut staged = StagedArtifacts::new();
        staged.stage(&paths.model, &bincode::serialize(&model.classifier)?)?;
        staged.stage(&paths.scaler, &bincode::serialize(&model.scaler)?)?;
        staged.stage(&paths.metadata, &serde_json::to_vec_pretty(&model.metadata)?)?;
        staged.commit()?;

        let model = Arc::new(model);
        self.metadata.insert(key, model.metadata.clone());
        self.models.insert(key, Arc::clone(&model));

        info!(model_key = %key, dir = %self.dir.display(), "Model persisted");
        Ok(model)
    }

    pub fn metadata(&self, key: ModelKey) -> Option<ModelMetadata> {
        self.metadata.get(&key).map(|entry| entry.value().clone())
    }

    /// Keys whose model binaries are currently in memory
    pub fn cached_keys(&self) -> Vec<ModelKey> {
        let mut keys: Vec<ModelKey> = self.models.iter().map(|entry| *entry.key()).collect();
        keys.sort();
        keys
    }

    /// Summary of every known model
    pub fn status(&self) -> ModelStatus {
        let mut status = ModelStatus::default();

        for entry in self.metadata.iter() {
            let metadata = entry.value();
            status.models.insert(
                entry.key().to_string(),
                ModelSummary {
                    trained_at: metadata.trained_at,
                    accuracy: metadata.accuracy,
                    training_samples: metadata.training_samples,
                    features: metadata.features.len(),
                },
            );
            if status.last_update.map_or(true, |last| metadata.trained_at > last) {
                status.last_update = Some(metadata.trained_at);
            }
        }

        status
    }
}
