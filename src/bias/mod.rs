//! Multi-label social-bias classification.
//!
//! The classifier artifact is a local directory produced upstream
//! (tokenizer + ONNX weights + label configuration). Loading is expensive,
//! so a process-wide [`BiasModelCache`] performs it at most once per artifact
//! path; inference runs batched with per-record failure isolation.

pub mod annotate;
pub mod cache;
pub mod classifier;

use std::path::PathBuf;

use thiserror::Error;

pub use annotate::annotate_bias;
pub use cache::BiasModelCache;
pub use classifier::{BiasClassifier, MockClassifier};
#[cfg(feature = "onnx-model")]
pub use classifier::OnnxBiasClassifier;

#[derive(Error, Debug)]
pub enum BiasError {
    #[error("model artifact missing: {0}")]
    ArtifactMissing(PathBuf),

    #[error("model artifact empty: {0}")]
    ArtifactEmpty(PathBuf),

    #[error("model initialization: {0}")]
    ModelInit(String),

    #[error("label configuration: {0}")]
    LabelConfig(String),

    #[error("tokenization error: {0}")]
    Tokenization(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
