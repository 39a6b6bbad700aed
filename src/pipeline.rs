//! Composition of the three stages: flatten → sentiment → bias.
//!
//! Bias and sentiment are independent of each other; both are per-record and
//! order-preserving. When the classifier cannot load, the pipeline still
//! returns sentiment-annotated records (required degradation mode) — only a
//! tree that cannot be read at all is a hard failure.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::bias::{annotate_bias, BiasModelCache};
use crate::config::AnalysisConfig;
use crate::sentiment::{annotate_sentiment, SentimentScorer, VaderScorer};
use crate::thread::{flatten, AnnotatedRecord, MessageNode, OwnedNode};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    #[error("pipeline task failed: {0}")]
    TaskFailed(String),
}

/// Whether the bias stage ran for this invocation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BiasStatus {
    /// All records carry the full label distribution.
    Applied { labels: Vec<String> },
    /// Sentiment-only degradation: the model could not be loaded.
    Unavailable { reason: String },
}

#[derive(Debug, Serialize)]
pub struct AnalysisOutput {
    pub records: Vec<AnnotatedRecord>,
    pub bias: BiasStatus,
}

/// One pipeline instance serves all requests; the model cache is the only
/// shared mutable state, records are owned per invocation.
pub struct AnalysisPipeline {
    scorer: Box<dyn SentimentScorer>,
    cache: Arc<BiasModelCache>,
}

impl AnalysisPipeline {
    pub fn new(cache: Arc<BiasModelCache>) -> Self {
        Self {
            scorer: Box::new(VaderScorer::new()),
            cache,
        }
    }

    /// Swap the lexicon implementation (tests use a fixed-score stub).
    pub fn with_scorer(cache: Arc<BiasModelCache>, scorer: Box<dyn SentimentScorer>) -> Self {
        Self { scorer, cache }
    }

    /// Run the full pipeline synchronously on an already-materialized tree.
    pub fn run(
        &self,
        root: &dyn MessageNode,
        config: &AnalysisConfig,
    ) -> Result<AnalysisOutput, PipelineError> {
        let flat = flatten(root, &config.flatten_options())
            .map_err(|e| PipelineError::InvalidInput(e.to_string()))?;

        let mut records: Vec<AnnotatedRecord> =
            flat.into_iter().map(AnnotatedRecord::from).collect();

        annotate_sentiment(&mut records, self.scorer.as_ref());

        let bias = match self.cache.get_or_load(&config.model_dir, config.max_input_length) {
            Ok(model) => {
                annotate_bias(&mut records, model.as_ref());
                BiasStatus::Applied {
                    labels: model.labels().to_vec(),
                }
            }
            Err(error) => {
                tracing::warn!(%error, "bias model unavailable, returning sentiment-only records");
                BiasStatus::Unavailable {
                    reason: error.to_string(),
                }
            }
        };

        tracing::info!(
            records = records.len(),
            bias = matches!(bias, BiasStatus::Applied { .. }),
            "thread analysis complete"
        );

        Ok(AnalysisOutput { records, bias })
    }

    /// Run with an overall deadline covering everything including model load.
    ///
    /// The work runs on a blocking task; on timeout the invocation is
    /// abandoned. The blocking task still runs to completion in the
    /// background, and the model cache is only written after a fully
    /// successful load, so abandonment never leaves partial shared state.
    pub async fn run_with_deadline(
        self: &Arc<Self>,
        root: OwnedNode,
        config: AnalysisConfig,
        deadline: Duration,
    ) -> Result<AnalysisOutput, PipelineError> {
        let pipeline = Arc::clone(self);
        let task = tokio::task::spawn_blocking(move || pipeline.run(&root, &config));

        match tokio::time::timeout(deadline, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(PipelineError::TaskFailed(join_error.to_string())),
            Err(_) => Err(PipelineError::DeadlineExceeded(deadline)),
        }
    }
}
