use serde::{Deserialize, Serialize};

/// Narrow capability view of one message in a discussion tree.
///
/// Retrieval collaborators (and tests) implement this over whatever concrete
/// representation they hold, so the flattening algorithm never depends on a
/// remote API's object model. Field accessors return `Option` because source
/// data is routinely partial: a node whose required fields cannot be read is
/// skipped during flattening, not fatal to the traversal.
pub trait MessageNode {
    fn id(&self) -> Option<String>;
    fn parent_id(&self) -> Option<String>;
    fn author(&self) -> Option<String>;
    fn body(&self) -> Option<String>;
    /// Root submissions carry a title the body falls back to when empty.
    fn title(&self) -> Option<String> {
        None
    }
    fn score(&self) -> Option<i64>;
    fn created_utc(&self) -> Option<f64>;
    /// True for the root submission, false for every comment.
    fn is_root(&self) -> bool;
    /// Direct replies, pre-sorted by the collaborator's display order.
    fn children(&self) -> Vec<&dyn MessageNode>;
}

/// Concrete, serde-friendly tree node.
///
/// Used by the HTTP surface (the caller ships a materialized tree in the
/// request body) and by tests building synthetic threads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OwnedNode {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub created_utc: Option<f64>,
    #[serde(default)]
    pub is_root: bool,
    #[serde(default)]
    pub replies: Vec<OwnedNode>,
}

impl MessageNode for OwnedNode {
    fn id(&self) -> Option<String> {
        if self.id.is_empty() {
            None
        } else {
            Some(self.id.clone())
        }
    }

    fn parent_id(&self) -> Option<String> {
        self.parent_id.clone()
    }

    fn author(&self) -> Option<String> {
        self.author.clone()
    }

    fn body(&self) -> Option<String> {
        self.body.clone()
    }

    fn title(&self) -> Option<String> {
        self.title.clone()
    }

    fn score(&self) -> Option<i64> {
        self.score
    }

    fn created_utc(&self) -> Option<f64> {
        self.created_utc
    }

    fn is_root(&self) -> bool {
        self.is_root
    }

    fn children(&self) -> Vec<&dyn MessageNode> {
        self.replies
            .iter()
            .map(|child| child as &dyn MessageNode)
            .collect()
    }
}
