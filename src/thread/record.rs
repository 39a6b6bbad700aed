use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One flattened message, in depth-first traversal order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatRecord {
    pub id: String,
    /// Empty for the root submission.
    pub parent_id: String,
    pub author: String,
    pub body: String,
    pub score: i64,
    pub created_utc: f64,
    /// Nesting depth. 0 for the root submission and for top-level comments.
    pub level: u32,
    /// Id of the nearest ancestor-or-self at level 0 — groups arbitrarily
    /// deep reply chains back to the top-level comment that started them.
    pub oc_bin_id: String,
}

/// Ternary polarity class derived from the compound sentiment score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    /// Standard VADER thresholds: ±0.05, boundary values inclusive toward
    /// the named class.
    pub fn from_compound(score: f64) -> Self {
        if score >= 0.05 {
            SentimentLabel::Positive
        } else if score <= -0.05 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

/// A flattened message plus both annotation layers.
///
/// Serializes as one flat mapping: record fields, sentiment fields, and one
/// key per bias label, matching what the presentation layer consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatedRecord {
    #[serde(flatten)]
    pub record: FlatRecord,
    /// Compound polarity in [-1, 1].
    pub sentiment: f64,
    pub sentiment_label: SentimentLabel,
    /// Independent per-label probabilities in [0, 1]; empty until the bias
    /// stage runs (and stays empty in the sentiment-only degradation mode).
    #[serde(flatten)]
    pub bias: BTreeMap<String, f64>,
}

impl From<FlatRecord> for AnnotatedRecord {
    fn from(record: FlatRecord) -> Self {
        Self {
            record,
            sentiment: 0.0,
            sentiment_label: SentimentLabel::Neutral,
            bias: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(body: &str) -> FlatRecord {
        FlatRecord {
            id: "c1".into(),
            parent_id: "t3_x".into(),
            author: "someone".into(),
            body: body.into(),
            score: 3,
            created_utc: 1_700_000_000.0,
            level: 0,
            oc_bin_id: "c1".into(),
        }
    }

    #[test]
    fn boundary_scores_map_inclusively() {
        assert_eq!(SentimentLabel::from_compound(0.05), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_compound(-0.05), SentimentLabel::Negative);
        assert_eq!(SentimentLabel::from_compound(0.0), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_compound(0.049), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_compound(-0.049), SentimentLabel::Neutral);
    }

    #[test]
    fn annotated_record_serializes_flat() {
        let mut annotated = AnnotatedRecord::from(record("some text"));
        annotated.sentiment = 0.5;
        annotated.sentiment_label = SentimentLabel::Positive;
        annotated.bias.insert("gender".into(), 0.12);

        let value = serde_json::to_value(&annotated).unwrap();
        let map = value.as_object().unwrap();
        assert_eq!(map["id"], "c1");
        assert_eq!(map["sentiment_label"], "positive");
        assert_eq!(map["gender"], 0.12);
        assert!(map.get("record").is_none());
        assert!(map.get("bias").is_none());
    }
}
