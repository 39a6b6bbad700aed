use std::fs::File;
use std::path::Path;

use super::BiasError;

/// File names every classifier artifact directory must provide.
pub const MODEL_FILE: &str = "model.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const CONFIG_FILE: &str = "config.json";

/// Bias classifier abstraction.
///
/// Implementations run the multi-label regime: one independent sigmoid
/// probability per label, no sum-to-one constraint (labels like "racial" and
/// "gender" are not mutually exclusive).
pub trait BiasClassifier: Send + Sync {
    /// Label vocabulary, ordered by numeric label index ascending.
    fn labels(&self) -> &[String];

    /// Per-label probabilities for one text, same order as [`labels`].
    ///
    /// [`labels`]: BiasClassifier::labels
    fn classify(&self, text: &str) -> Result<Vec<f64>, BiasError>;

    /// Vectorized classification. Fails as a whole; the annotator falls back
    /// to per-record calls to isolate individual failures.
    fn classify_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f64>>, BiasError> {
        texts.iter().map(|text| self.classify(text)).collect()
    }
}

/// Verify the artifact directory holds all required files and none is a
/// zero-byte stub (a truncated download must fail here, not at inference).
pub fn validate_artifacts(model_dir: &Path) -> Result<(), BiasError> {
    for name in [MODEL_FILE, TOKENIZER_FILE, CONFIG_FILE] {
        let path = model_dir.join(name);
        if !path.exists() {
            return Err(BiasError::ArtifactMissing(path));
        }
        if path.metadata()?.len() == 0 {
            return Err(BiasError::ArtifactEmpty(path));
        }
    }
    Ok(())
}

/// Read the label vocabulary from the artifact's `config.json`, ordered by
/// numeric label index (`id2label` keys are stringified integers).
pub fn read_labels(config_path: &Path) -> Result<Vec<String>, BiasError> {
    let file = File::open(config_path)?;
    let config: serde_json::Value = serde_json::from_reader(file)
        .map_err(|e| BiasError::LabelConfig(format!("invalid JSON: {e}")))?;

    let id2label = config
        .get("id2label")
        .and_then(|value| value.as_object())
        .ok_or_else(|| BiasError::LabelConfig("missing id2label map".to_string()))?;

    let mut pairs = Vec::with_capacity(id2label.len());
    for (key, value) in id2label {
        let index: usize = key
            .parse()
            .map_err(|_| BiasError::LabelConfig(format!("non-numeric label index: {key}")))?;
        let label = value
            .as_str()
            .ok_or_else(|| BiasError::LabelConfig(format!("non-string label at index {index}")))?;
        pairs.push((index, label.to_string()));
    }
    pairs.sort_by_key(|(index, _)| *index);

    if pairs.is_empty() {
        return Err(BiasError::LabelConfig("empty id2label map".to_string()));
    }

    Ok(pairs.into_iter().map(|(_, label)| label).collect())
}

// ═══════════════════════════════════════════════════════════
// ONNX classifier — behind the `onnx-model` feature
// ═══════════════════════════════════════════════════════════

#[cfg(feature = "onnx-model")]
mod onnx {
    use std::path::Path;
    use std::sync::Mutex;

    use ort::session::Session;
    use tokenizers::{Tokenizer, TruncationParams};

    use super::{read_labels, validate_artifacts, BiasClassifier, CONFIG_FILE, MODEL_FILE, TOKENIZER_FILE};
    use crate::bias::BiasError;

    /// Fine-tuned sequence-classification model running on ONNX Runtime.
    ///
    /// Uses interior mutability (Mutex) because `ort::Session::run` requires
    /// `&mut self` but the `BiasClassifier` trait exposes `&self` for shared
    /// use across concurrent requests.
    pub struct OnnxBiasClassifier {
        session: Mutex<Session>,
        tokenizer: Tokenizer,
        labels: Vec<String>,
    }

    impl OnnxBiasClassifier {
        /// Load the classifier artifact from a directory.
        ///
        /// `model_dir` must contain `model.onnx`, `tokenizer.json` and
        /// `config.json` (with the `id2label` vocabulary). Inputs longer
        /// than `max_input_length` tokens are truncated, never rejected.
        pub fn load(model_dir: &Path, max_input_length: usize) -> Result<Self, BiasError> {
            validate_artifacts(model_dir)?;

            let labels = read_labels(&model_dir.join(CONFIG_FILE))?;

            let session = Session::builder()
                .map_err(|e: ort::Error| BiasError::ModelInit(e.to_string()))?
                .with_intra_threads(2)
                .map_err(|e: ort::Error| BiasError::ModelInit(e.to_string()))?
                .commit_from_file(model_dir.join(MODEL_FILE))
                .map_err(|e: ort::Error| BiasError::ModelInit(format!("ONNX load failed: {e}")))?;

            let mut tokenizer = Tokenizer::from_file(model_dir.join(TOKENIZER_FILE))
                .map_err(|e| BiasError::ModelInit(format!("Tokenizer load failed: {e}")))?;
            tokenizer
                .with_truncation(Some(TruncationParams {
                    max_length: max_input_length,
                    ..TruncationParams::default()
                }))
                .map_err(|e| BiasError::ModelInit(format!("Tokenizer truncation: {e}")))?;
            tokenizer.with_padding(Some(tokenizers::PaddingParams::default()));

            tracing::info!(
                labels = labels.len(),
                "bias classifier loaded from {}",
                model_dir.display()
            );

            Ok(Self {
                session: Mutex::new(session),
                tokenizer,
                labels,
            })
        }

        /// Tokenize a padded batch and run one forward pass, returning one
        /// sigmoid probability per label per text.
        fn infer(&self, texts: &[&str]) -> Result<Vec<Vec<f64>>, BiasError> {
            use ort::value::TensorRef;

            if texts.is_empty() {
                return Ok(Vec::new());
            }

            let encodings = self
                .tokenizer
                .encode_batch(texts.to_vec(), true)
                .map_err(|e| BiasError::Tokenization(e.to_string()))?;

            // Padding makes every encoding in the batch the same length.
            let batch = encodings.len();
            let seq_len = encodings[0].get_ids().len();

            let mut input_ids: Vec<i64> = Vec::with_capacity(batch * seq_len);
            let mut attention_mask: Vec<i64> = Vec::with_capacity(batch * seq_len);
            let mut token_type_ids: Vec<i64> = Vec::with_capacity(batch * seq_len);
            for encoding in &encodings {
                input_ids.extend(encoding.get_ids().iter().map(|&id| id as i64));
                attention_mask.extend(encoding.get_attention_mask().iter().map(|&m| m as i64));
                token_type_ids.extend(encoding.get_type_ids().iter().map(|&t| t as i64));
            }

            let ids_array = ndarray::Array2::from_shape_vec((batch, seq_len), input_ids)
                .map_err(|e| BiasError::Inference(e.to_string()))?;
            let mask_array = ndarray::Array2::from_shape_vec((batch, seq_len), attention_mask)
                .map_err(|e| BiasError::Inference(e.to_string()))?;
            let type_array = ndarray::Array2::from_shape_vec((batch, seq_len), token_type_ids)
                .map_err(|e| BiasError::Inference(e.to_string()))?;

            let ids_tensor = TensorRef::from_array_view(&ids_array)
                .map_err(|e| BiasError::Inference(e.to_string()))?;
            let mask_tensor = TensorRef::from_array_view(&mask_array)
                .map_err(|e| BiasError::Inference(e.to_string()))?;
            let type_tensor = TensorRef::from_array_view(&type_array)
                .map_err(|e| BiasError::Inference(e.to_string()))?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| BiasError::Inference("Session lock poisoned".to_string()))?;

            let outputs = session
                .run(ort::inputs![ids_tensor, mask_tensor, type_tensor])
                .map_err(|e| BiasError::Inference(format!("ONNX inference failed: {e}")))?;

            // Logits shape: [batch, num_labels]
            let (shape, logits) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| BiasError::Inference(format!("Output extraction: {e}")))?;

            let num_labels = self.labels.len();
            if shape.len() != 2 || shape[0] as usize != batch || shape[1] as usize != num_labels {
                return Err(BiasError::Inference(format!(
                    "Unexpected output shape: {shape:?}, expected [{batch}, {num_labels}]"
                )));
            }

            let rows = (0..batch)
                .map(|row| {
                    logits[row * num_labels..(row + 1) * num_labels]
                        .iter()
                        .map(|&logit| sigmoid(logit as f64))
                        .collect()
                })
                .collect();

            Ok(rows)
        }
    }

    impl BiasClassifier for OnnxBiasClassifier {
        fn labels(&self) -> &[String] {
            &self.labels
        }

        fn classify(&self, text: &str) -> Result<Vec<f64>, BiasError> {
            Ok(self.infer(&[text])?.remove(0))
        }

        fn classify_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f64>>, BiasError> {
            self.infer(texts)
        }
    }

    fn sigmoid(logit: f64) -> f64 {
        1.0 / (1.0 + (-logit).exp())
    }
}

#[cfg(feature = "onnx-model")]
pub use onnx::OnnxBiasClassifier;

/// Deterministic classifier for tests — probabilities derived from text
/// bytes, no artifact on disk required.
pub struct MockClassifier {
    labels: Vec<String>,
}

impl MockClassifier {
    pub fn new(labels: &[&str]) -> Self {
        Self {
            labels: labels.iter().map(|label| label.to_string()).collect(),
        }
    }
}

impl BiasClassifier for MockClassifier {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn classify(&self, text: &str) -> Result<Vec<f64>, BiasError> {
        let seed: u64 = text.bytes().map(u64::from).sum();
        Ok((0..self.labels.len())
            .map(|index| {
                let raw = seed.wrapping_mul(31).wrapping_add(index as u64 * 17) % 1000;
                raw as f64 / 1000.0
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn artifact_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in [MODEL_FILE, TOKENIZER_FILE, CONFIG_FILE] {
            let mut file = File::create(dir.path().join(name)).unwrap();
            file.write_all(b"placeholder").unwrap();
        }
        dir
    }

    #[test]
    fn validate_accepts_complete_artifact() {
        let dir = artifact_dir();
        assert!(validate_artifacts(dir.path()).is_ok());
    }

    #[test]
    fn validate_rejects_missing_file() {
        let dir = artifact_dir();
        std::fs::remove_file(dir.path().join(MODEL_FILE)).unwrap();
        assert!(matches!(
            validate_artifacts(dir.path()),
            Err(BiasError::ArtifactMissing(path)) if path.ends_with(MODEL_FILE)
        ));
    }

    #[test]
    fn validate_rejects_zero_byte_file() {
        let dir = artifact_dir();
        File::create(dir.path().join(TOKENIZER_FILE)).unwrap();
        assert!(matches!(
            validate_artifacts(dir.path()),
            Err(BiasError::ArtifactEmpty(path)) if path.ends_with(TOKENIZER_FILE)
        ));
    }

    #[test]
    fn labels_ordered_by_numeric_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        // keys deliberately out of order, "10" sorts after "2" numerically
        std::fs::write(
            &path,
            r#"{"id2label": {"10": "none", "0": "gender", "2": "religious", "1": "racial"}}"#,
        )
        .unwrap();

        let labels = read_labels(&path).unwrap();
        assert_eq!(labels, ["gender", "racial", "religious", "none"]);
    }

    #[test]
    fn missing_id2label_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"architectures": ["BertForSequenceClassification"]}"#).unwrap();
        assert!(matches!(read_labels(&path), Err(BiasError::LabelConfig(_))));
    }

    #[test]
    fn mock_classifier_is_deterministic_and_bounded() {
        let mock = MockClassifier::new(&["gender", "racial", "none"]);
        let first = mock.classify("some text").unwrap();
        let second = mock.classify("some text").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        assert!(first.iter().all(|p| (0.0..=1.0).contains(p)));
    }
}
