//! Thin HTTP surface over the analysis pipeline.
//!
//! One POST endpoint accepting a materialized thread tree, plus a health
//! route. Retrieval of the thread from its source network API and artifact
//! download both live outside this process; the handler only runs the core
//! pipeline and maps its outcomes to status codes.

pub mod error;
pub mod router;
pub mod types;

pub use error::ApiError;
pub use router::analysis_router;
pub use types::ApiContext;
