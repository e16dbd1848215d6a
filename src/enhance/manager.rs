use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::info;

use crate::enhance::dto::ModelEntry;
use crate::enhance::engine::{Device, Engine};
use crate::enhance::registry;
use crate::enhance::weights;
use crate::error::ApiError;

/// Owns the loaded engines and the active-model selector.
///
/// Loading is lazy and idempotent: first access downloads the weights and
/// builds the engine under `load_guard`, with a double-check so concurrent
/// first accesses build it once. Requests snapshot an `Arc<Engine>` up front
/// and hold it for the whole request, so a concurrent switch never races an
/// in-flight enhancement.
pub struct EngineManager {
    device: Device,
    weights_dir: PathBuf,
    engines: RwLock<HashMap<String, Arc<Engine>>>,
    current: RwLock<Option<String>>,
    load_guard: Mutex<()>,
}

impl EngineManager {
    pub fn new(weights_dir: PathBuf, device: Device) -> Self {
        Self {
            device,
            weights_dir,
            engines: RwLock::new(HashMap::new()),
            current: RwLock::new(None),
            load_guard: Mutex::new(()),
        }
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub async fn current_model(&self) -> Option<String> {
        self.current.read().await.clone()
    }

    pub async fn any_loaded(&self) -> bool {
        !self.engines.read().await.is_empty()
    }

    /// Snapshot of the active engine, if one has been loaded.
    pub async fn current_engine(&self) -> Option<Arc<Engine>> {
        let name = self.current.read().await.clone()?;
        self.engines.read().await.get(&name).cloned()
    }

    pub async fn list(&self) -> Vec<ModelEntry> {
        let engines = self.engines.read().await;
        let current = self.current.read().await;
        registry::MODELS
            .iter()
            .map(|spec| ModelEntry {
                name: spec.name.to_string(),
                scale: spec.scale,
                description: spec.description.to_string(),
                loaded: engines.contains_key(spec.name),
                current: current.as_deref() == Some(spec.name),
            })
            .collect()
    }

    /// Switch the active model, loading it first if needed. An unknown name
    /// fails without touching the current selection.
    pub async fn select(&self, name: &str) -> Result<Arc<Engine>, ApiError> {
        let spec = registry::find(name)
            .ok_or_else(|| ApiError::Model("Invalid model name".into()))?;

        if let Some(engine) = self.engines.read().await.get(name).cloned() {
            *self.current.write().await = Some(name.to_string());
            info!(model = name, "switched to loaded model");
            return Ok(engine);
        }

        let _guard = self.load_guard.lock().await;
        // A concurrent select may have loaded it while we waited.
        if let Some(engine) = self.engines.read().await.get(name).cloned() {
            *self.current.write().await = Some(name.to_string());
            return Ok(engine);
        }

        let path = weights::ensure(spec, &self.weights_dir)
            .await
            .map_err(|e| ApiError::ModelLoad(format!("Failed to load model: {e}")))?;
        let engine = Engine::load(spec, &path, self.device)
            .map(Arc::new)
            .map_err(|e| ApiError::ModelLoad(format!("Failed to load model: {e}")))?;

        self.engines
            .write()
            .await
            .insert(name.to_string(), engine.clone());
        *self.current.write().await = Some(name.to_string());
        info!(model = name, "model loaded and selected");
        Ok(engine)
    }

    /// Engine snapshot for one enhancement request. A requested model that
    /// differs from the active one switches first; no request and no active
    /// model is a server error.
    pub async fn engine_for(&self, requested: Option<&str>) -> Result<Arc<Engine>, ApiError> {
        match requested {
            Some(name) if self.current_model().await.as_deref() != Some(name) => {
                self.select(name).await
            }
            _ => self
                .current_engine()
                .await
                .ok_or_else(|| ApiError::ModelLoad("Model not initialized".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> (tempfile::TempDir, EngineManager) {
        let dir = tempfile::tempdir().expect("tempdir");
        let m = EngineManager::new(dir.path().to_path_buf(), Device::Cpu);
        (dir, m)
    }

    #[tokio::test]
    async fn select_unknown_model_leaves_selection_untouched() {
        let (_dir, m) = manager();
        let err = m.select("DefinitelyNotAModel").await.unwrap_err();
        assert!(matches!(err, ApiError::Model(_)));
        assert!(m.current_model().await.is_none());
        assert!(!m.any_loaded().await);
    }

    #[tokio::test]
    async fn engine_for_fails_without_an_active_model() {
        let (_dir, m) = manager();
        let err = m.engine_for(None).await.unwrap_err();
        assert!(matches!(err, ApiError::ModelLoad(_)));
    }

    #[tokio::test]
    async fn select_uses_cached_weights_without_network() {
        let dir = tempfile::tempdir().expect("tempdir");
        tokio::fs::write(dir.path().join("RealESRGAN_x2plus.pth"), b"fake-weights")
            .await
            .expect("seed weights");

        let m = EngineManager::new(dir.path().to_path_buf(), Device::Cpu);
        let engine = m.select("RealESRGAN_x2plus").await.expect("select");
        assert_eq!(engine.scale(), 2);
        assert_eq!(m.current_model().await.as_deref(), Some("RealESRGAN_x2plus"));

        // Second select hits the loaded-engine fast path.
        let again = m.select("RealESRGAN_x2plus").await.expect("reselect");
        assert!(Arc::ptr_eq(&engine, &again));
    }

    #[tokio::test]
    async fn list_reports_loaded_and_current_flags() {
        let dir = tempfile::tempdir().expect("tempdir");
        tokio::fs::write(dir.path().join("RealESRGAN_x2plus.pth"), b"fake-weights")
            .await
            .expect("seed weights");

        let m = EngineManager::new(dir.path().to_path_buf(), Device::Cpu);
        m.select("RealESRGAN_x2plus").await.expect("select");

        let entries = m.list().await;
        assert_eq!(entries.len(), 5);
        let x2 = entries
            .iter()
            .find(|e| e.name == "RealESRGAN_x2plus")
            .expect("entry");
        assert!(x2.loaded);
        assert!(x2.current);
        assert!(entries
            .iter()
            .filter(|e| e.name != "RealESRGAN_x2plus")
            .all(|e| !e.loaded && !e.current));
    }
}
