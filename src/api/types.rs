use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bias::BiasModelCache;
use crate::config::AnalysisConfig;
use crate::pipeline::{AnalysisPipeline, BiasStatus};
use crate::thread::{AnnotatedRecord, OwnedNode, TruncationPolicy};

/// Default per-request deadline, model load included.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct ApiContext {
    pub pipeline: Arc<AnalysisPipeline>,
    pub config: AnalysisConfig,
    pub deadline: Duration,
}

impl ApiContext {
    pub fn new(config: AnalysisConfig) -> Self {
        let cache = Arc::new(BiasModelCache::new());
        Self {
            pipeline: Arc::new(AnalysisPipeline::new(cache)),
            config,
            deadline: DEFAULT_DEADLINE,
        }
    }
}

/// `POST /analyze` body: the materialized thread plus per-request options.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub thread: OwnedNode,
    /// Overrides the configured record cap for this request only.
    #[serde(default)]
    pub max_comments: Option<usize>,
    /// Opt into score-weighted sampling instead of prefix truncation.
    #[serde(default)]
    pub weighted_sampling: bool,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    /// "success" when both annotation layers ran, "partial" when the bias
    /// model was unavailable and records carry sentiment only.
    pub status: &'static str,
    pub bias: BiasStatus,
    pub data: Vec<AnnotatedRecord>,
}

impl AnalyzeRequest {
    /// Per-request configuration derived from the server defaults.
    pub fn effective_config(&self, base: &AnalysisConfig) -> AnalysisConfig {
        let mut config = base.clone();
        if let Some(max) = self.max_comments {
            config.max_comments = Some(max);
        }
        if self.weighted_sampling {
            config.truncation = TruncationPolicy::WeightedSample;
        }
        config
    }
}
