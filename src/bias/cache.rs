use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::classifier::BiasClassifier;
use super::BiasError;

type Loader = Box<dyn Fn(&Path, usize) -> Result<Arc<dyn BiasClassifier>, BiasError> + Send + Sync>;

struct CachedModel {
    dir: PathBuf,
    model: Arc<dyn BiasClassifier>,
}

/// Process-wide, path-keyed cache holding at most one loaded classifier.
///
/// The slot mutex is held across the load itself, which gives single-flight
/// semantics for free: concurrent callers racing on an uncached path
/// serialize, the first performs the load, the rest find the slot populated.
/// A call with a different path replaces the cached handle. The slot is only
/// written after a fully successful load, so an abandoned or failed request
/// never leaves partial state behind.
pub struct BiasModelCache {
    slot: Mutex<Option<CachedModel>>,
    loads: AtomicUsize,
    loader: Loader,
}

impl BiasModelCache {
    /// Cache backed by the ONNX classifier loader.
    #[cfg(feature = "onnx-model")]
    pub fn new() -> Self {
        Self::with_loader(Box::new(|dir, max_input_length| {
            let model = super::classifier::OnnxBiasClassifier::load(dir, max_input_length)?;
            Ok(Arc::new(model) as Arc<dyn BiasClassifier>)
        }))
    }

    /// Without the `onnx-model` feature no classifier backend exists; every
    /// load fails and the pipeline runs in its sentiment-only degraded mode.
    #[cfg(not(feature = "onnx-model"))]
    pub fn new() -> Self {
        Self::with_loader(Box::new(|_, _| {
            Err(BiasError::ModelInit(
                "built without the onnx-model feature".to_string(),
            ))
        }))
    }

    /// Cache with a custom loader, used by tests to count and stage loads.
    pub fn with_loader(loader: Loader) -> Self {
        Self {
            slot: Mutex::new(None),
            loads: AtomicUsize::new(0),
            loader,
        }
    }

    /// Return the cached classifier for `model_dir`, loading it on first use.
    pub fn get_or_load(
        &self,
        model_dir: &Path,
        max_input_length: usize,
    ) -> Result<Arc<dyn BiasClassifier>, BiasError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| BiasError::ModelInit("model cache lock poisoned".to_string()))?;

        if let Some(cached) = slot.as_ref() {
            if cached.dir == model_dir {
                return Ok(Arc::clone(&cached.model));
            }
            tracing::info!(
                old = %cached.dir.display(),
                new = %model_dir.display(),
                "artifact path changed, reloading bias classifier"
            );
        }

        let model = (self.loader)(model_dir, max_input_length)?;
        self.loads.fetch_add(1, Ordering::SeqCst);
        *slot = Some(CachedModel {
            dir: model_dir.to_path_buf(),
            model: Arc::clone(&model),
        });

        Ok(model)
    }

    /// Number of completed loads. Observable for the single-flight tests.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl Default for BiasModelCache {
    fn default() -> Self {
        Self::new()
    }
}
