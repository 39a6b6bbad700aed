//! Lexicon-based sentiment annotation.
//!
//! Stateless and infallible: every text gets a compound polarity score in
//! [-1, 1], empty or unscorable text scores 0.0 (neutral). The scorer is a
//! trait so the pipeline and tests can swap the lexicon implementation.

use crate::thread::{AnnotatedRecord, SentimentLabel};

/// Compound polarity scorer over raw text.
pub trait SentimentScorer: Send + Sync {
    /// Score in [-1, 1]; must never fail.
    fn compound(&self, text: &str) -> f64;
}

/// VADER lexicon scorer — the same rule-based model the social-media domain
/// conventionally uses (handles negation, intensifiers, punctuation emphasis).
pub struct VaderScorer {
    analyzer: vader_sentiment::SentimentIntensityAnalyzer<'static>,
}

impl VaderScorer {
    pub fn new() -> Self {
        Self {
            analyzer: vader_sentiment::SentimentIntensityAnalyzer::new(),
        }
    }
}

impl Default for VaderScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentScorer for VaderScorer {
    fn compound(&self, text: &str) -> f64 {
        self.analyzer
            .polarity_scores(text)
            .get("compound")
            .copied()
            .unwrap_or(0.0)
    }
}

/// Stamp sentiment score + label on every record, in place and in order.
pub fn annotate_sentiment(records: &mut [AnnotatedRecord], scorer: &dyn SentimentScorer) {
    for annotated in records.iter_mut() {
        let score = scorer.compound(&annotated.record.body);
        annotated.sentiment = score;
        annotated.sentiment_label = SentimentLabel::from_compound(score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thread::FlatRecord;

    fn annotated(body: &str) -> AnnotatedRecord {
        AnnotatedRecord::from(FlatRecord {
            id: "c".into(),
            parent_id: String::new(),
            author: "user".into(),
            body: body.into(),
            score: 0,
            created_utc: 0.0,
            level: 0,
            oc_bin_id: "c".into(),
        })
    }

    #[test]
    fn positive_text_scores_positive() {
        let scorer = VaderScorer::new();
        let score = scorer.compound("I love this!");
        assert!(score > 0.05, "got {score}");
        assert_eq!(SentimentLabel::from_compound(score), SentimentLabel::Positive);
    }

    #[test]
    fn negative_text_scores_negative() {
        let scorer = VaderScorer::new();
        let score = scorer.compound("I hate you");
        assert!(score < -0.05, "got {score}");
        assert_eq!(SentimentLabel::from_compound(score), SentimentLabel::Negative);
    }

    #[test]
    fn empty_text_is_neutral() {
        let scorer = VaderScorer::new();
        assert_eq!(scorer.compound(""), 0.0);
    }

    #[test]
    fn annotates_every_record_in_place() {
        let scorer = VaderScorer::new();
        let mut records = vec![annotated("I love this!"), annotated("I hate you"), annotated("table")];
        annotate_sentiment(&mut records, &scorer);

        assert_eq!(records[0].sentiment_label, SentimentLabel::Positive);
        assert_eq!(records[1].sentiment_label, SentimentLabel::Negative);
        assert_eq!(records[2].sentiment_label, SentimentLabel::Neutral);
        assert!(records.iter().all(|r| (-1.0..=1.0).contains(&r.sentiment)));
    }
}
