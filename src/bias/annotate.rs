use std::collections::BTreeMap;

use super::classifier::BiasClassifier;
use crate::thread::AnnotatedRecord;

/// Records per forward pass. Classification is vectorized for throughput,
/// not run one record at a time.
pub const INFERENCE_BATCH_SIZE: usize = 16;

/// Probabilities are rounded for stable output comparison.
const ROUND_DIGITS: f64 = 1000.0;

/// Stamp the bias distribution on every record, in place and in order.
///
/// Empty bodies get the all-zero distribution without touching the model.
/// A failing record gets the all-zero distribution and a warning; it never
/// aborts the batch. When a whole batch fails at once (a runtime rather
/// than a per-text problem), records are retried individually so only the
/// genuinely failing ones degrade.
pub fn annotate_bias(records: &mut [AnnotatedRecord], model: &dyn BiasClassifier) {
    let labels = model.labels();

    for chunk in records.chunks_mut(INFERENCE_BATCH_SIZE) {
        let mut indices = Vec::with_capacity(chunk.len());
        let mut texts: Vec<String> = Vec::with_capacity(chunk.len());
        for (offset, annotated) in chunk.iter_mut().enumerate() {
            if annotated.record.body.trim().is_empty() {
                annotated.bias = zero_distribution(labels);
            } else {
                indices.push(offset);
                texts.push(annotated.record.body.clone());
            }
        }
        if texts.is_empty() {
            continue;
        }

        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        match model.classify_batch(&refs) {
            Ok(rows) if rows.len() == refs.len() => {
                for (&offset, probs) in indices.iter().zip(rows) {
                    chunk[offset].bias = distribution(labels, &probs);
                }
            }
            Ok(rows) => {
                tracing::warn!(
                    expected = refs.len(),
                    got = rows.len(),
                    "batch returned wrong row count, retrying per record"
                );
                classify_individually(chunk, &indices, &refs, model, labels);
            }
            Err(error) => {
                tracing::warn!(%error, "batch inference failed, retrying per record");
                classify_individually(chunk, &indices, &refs, model, labels);
            }
        }
    }
}

fn classify_individually(
    chunk: &mut [AnnotatedRecord],
    indices: &[usize],
    texts: &[&str],
    model: &dyn BiasClassifier,
    labels: &[String],
) {
    for (&offset, text) in indices.iter().zip(texts) {
        match model.classify(text) {
            Ok(probs) => chunk[offset].bias = distribution(labels, &probs),
            Err(error) => {
                tracing::warn!(
                    id = %chunk[offset].record.id,
                    %error,
                    "record classification failed, defaulting to zero distribution"
                );
                chunk[offset].bias = zero_distribution(labels);
            }
        }
    }
}

fn distribution(labels: &[String], probs: &[f64]) -> BTreeMap<String, f64> {
    labels
        .iter()
        .zip(probs)
        .map(|(label, &prob)| (label.clone(), (prob * ROUND_DIGITS).round() / ROUND_DIGITS))
        .collect()
}

fn zero_distribution(labels: &[String]) -> BTreeMap<String, f64> {
    labels.iter().map(|label| (label.clone(), 0.0)).collect()
}
