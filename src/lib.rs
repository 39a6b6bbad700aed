//! threadlens — discussion-thread flattening and dual annotation.
//!
//! Takes a materialized social-media thread, flattens the nested reply tree
//! into depth-first order with thread-grouping metadata, then annotates every
//! record with a lexicon-based sentiment polarity and a multi-label
//! social-bias distribution from a fine-tuned ONNX classifier.

pub mod api;
pub mod bias;
pub mod config;
pub mod pipeline;
pub mod sentiment;
pub mod thread;

pub use config::AnalysisConfig;
pub use pipeline::{AnalysisOutput, AnalysisPipeline, BiasStatus, PipelineError};
pub use thread::{AnnotatedRecord, FlatRecord, MessageNode, OwnedNode, SentimentLabel};
