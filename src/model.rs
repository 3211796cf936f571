//! Process-wide embedding model handle.
//!
//! The model is loaded once at startup. A failed load leaves the holder
//! empty and the server keeps running in degraded mode; there is no reload.
use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};

use crate::config::{ComputeConfig, ModelConfig};
use crate::embedder::download::download_model_files;
use crate::embedder::onnx::OnnxEmbedder;
use crate::embedder::Embedder;

/// Holds the loaded embedder, or nothing if loading failed.
#[derive(Clone)]
pub struct ModelHolder {
    name: String,
    embedder: Option<Arc<dyn Embedder>>,
}

impl ModelHolder {
    /// Load the configured model, downloading missing files first when
    /// `auto_download` is set.
    ///
    /// Never fails: any error is logged and yields an empty holder.
    /// Blocking; call from a blocking context.
    pub fn load(model: &ModelConfig, compute: &ComputeConfig) -> Self {
        match try_load(model, compute) {
            Ok(embedder) => {
                info!(
                    "✓ Model {} loaded successfully ({} dimensions)",
                    model.name,
                    embedder.dimensions()
                );
                Self::ready(&model.name, Arc::new(embedder))
            }
            Err(e) => {
                error!("✗ Failed to load model {}: {e:#}", model.name);
                Self::unavailable(&model.name)
            }
        }
    }

    /// Wrap an already constructed embedder.
    pub fn ready(name: &str, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            name: name.to_string(),
            embedder: Some(embedder),
        }
    }

    /// A holder whose model failed to load.
    pub fn unavailable(name: &str) -> Self {
        Self {
            name: name.to_string(),
            embedder: None,
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.embedder.is_some()
    }

    /// The loaded embedder, if any.
    #[must_use]
    pub fn embedder(&self) -> Option<Arc<dyn Embedder>> {
        self.embedder.clone()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Output size of the loaded model.
    #[must_use]
    pub fn dimensions(&self) -> Option<usize> {
        self.embedder.as_ref().map(|e| e.dimensions())
    }
}

fn try_load(model: &ModelConfig, compute: &ComputeConfig) -> Result<OnnxEmbedder> {
    if model.auto_download {
        download_model_files(&model.dir, &model.repo)?;
    }
    Ok(OnnxEmbedder::new(model, compute)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::mock::MockEmbedder;
    use tempfile::tempdir;

    #[test]
    fn test_ready_holder() {
        let holder = ModelHolder::ready("mock", Arc::new(MockEmbedder::new(16)));
        assert!(holder.is_ready());
        assert_eq!(holder.name(), "mock");
        assert_eq!(holder.dimensions(), Some(16));
        assert!(holder.embedder().is_some());
    }

    #[test]
    fn test_unavailable_holder() {
        let holder = ModelHolder::unavailable("all-MiniLM-L6-v2");
        assert!(!holder.is_ready());
        assert_eq!(holder.dimensions(), None);
        assert!(holder.embedder().is_none());
    }

    #[test]
    fn test_load_failure_degrades_instead_of_panicking() {
        let dir = tempdir().unwrap();
        let model = ModelConfig {
            dir: dir.path().join("missing-model"),
            auto_download: false,
            ..ModelConfig::default()
        };

        let holder = ModelHolder::load(&model, &ComputeConfig::default());
        assert!(!holder.is_ready());
        assert_eq!(holder.name(), "all-MiniLM-L6-v2");
    }
}
