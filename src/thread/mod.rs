//! Discussion-thread flattening.
//!
//! Turns a nested reply tree into an ordered flat sequence of records,
//! each tagged with its nesting depth and the top-level comment that
//! started its branch.

pub mod flatten;
pub mod node;
pub mod record;

use thiserror::Error;

pub use flatten::{flatten, FlattenOptions, TruncationPolicy};
pub use node::{MessageNode, OwnedNode};
pub use record::{AnnotatedRecord, FlatRecord, SentimentLabel};

#[derive(Error, Debug)]
pub enum FlattenError {
    #[error("root node unreadable: {0}")]
    InvalidRoot(&'static str),
}
