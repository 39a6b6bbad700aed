use rand::Rng;

use super::node::MessageNode;
use super::record::FlatRecord;
use super::FlattenError;

/// How to shrink a thread that flattens to more than `max_records` entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruncationPolicy {
    /// Keep the first `max_records` entries in traversal order. Deterministic,
    /// preserves the ordering invariant; the default.
    Prefix,
    /// Keep a random sample weighted by score, then re-sort by traversal
    /// index so parent-before-child ordering still holds. The root record is
    /// always retained.
    WeightedSample,
}

#[derive(Debug, Clone)]
pub struct FlattenOptions {
    pub max_records: Option<usize>,
    pub policy: TruncationPolicy,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            max_records: None,
            policy: TruncationPolicy::Prefix,
        }
    }
}

/// Flatten a discussion tree into depth-first pre-order records.
///
/// The root submission is emitted first at level 0, then every comment
/// subtree in the child order already present on the nodes (the retrieval
/// collaborator pre-sorts, e.g. "best first"). Top-level comments are also
/// level 0 by convention; each descent increments the level.
///
/// A comment whose required fields cannot be read is skipped with a warning;
/// its replies are still visited. Only an unreadable root fails the call.
pub fn flatten(
    root: &dyn MessageNode,
    options: &FlattenOptions,
) -> Result<Vec<FlatRecord>, FlattenError> {
    let mut records = vec![extract_root(root)?];
    for child in root.children() {
        walk(child, 0, &mut records);
    }

    assign_oc_bins(&mut records);

    if let Some(max) = options.max_records {
        if records.len() > max {
            records = match options.policy {
                TruncationPolicy::Prefix => {
                    records.truncate(max);
                    records
                }
                TruncationPolicy::WeightedSample => weighted_sample(records, max),
            };
        }
    }

    Ok(records)
}

fn walk(node: &dyn MessageNode, level: u32, out: &mut Vec<FlatRecord>) {
    match extract_comment(node, level) {
        Ok(record) => out.push(record),
        Err(field) => {
            tracing::warn!(field, level, "skipping unreadable comment node");
        }
    }
    for child in node.children() {
        walk(child, level + 1, out);
    }
}

fn extract_root(root: &dyn MessageNode) -> Result<FlatRecord, FlattenError> {
    let id = root.id().ok_or(FlattenError::InvalidRoot("id"))?;
    // Link posts have an empty body; fall back to the title.
    let body = root
        .body()
        .filter(|text| !text.trim().is_empty())
        .or_else(|| root.title())
        .filter(|text| !text.trim().is_empty())
        .ok_or(FlattenError::InvalidRoot("body/title"))?;

    Ok(FlatRecord {
        oc_bin_id: id.clone(),
        id,
        parent_id: String::new(),
        author: root.author().unwrap_or_else(|| "[deleted]".to_string()),
        body,
        score: root.score().unwrap_or(0),
        created_utc: root.created_utc().unwrap_or(0.0),
        level: 0,
    })
}

fn extract_comment(node: &dyn MessageNode, level: u32) -> Result<FlatRecord, &'static str> {
    let id = node.id().ok_or("id")?;
    let body = node.body().ok_or("body")?;

    Ok(FlatRecord {
        id,
        parent_id: node.parent_id().unwrap_or_default(),
        author: node.author().unwrap_or_else(|| "[deleted]".to_string()),
        body,
        score: node.score().unwrap_or(0),
        created_utc: node.created_utc().unwrap_or(0.0),
        level,
        oc_bin_id: String::new(),
    })
}

/// Single left-to-right scan: every level-0 record opens a new bin, and each
/// record (including the opener) is stamped with the current bin id.
fn assign_oc_bins(records: &mut [FlatRecord]) {
    let mut current = String::new();
    for record in records.iter_mut() {
        if record.level == 0 {
            current = record.id.clone();
        }
        record.oc_bin_id = current.clone();
    }
}

/// Weighted sampling without replacement (Efraimidis-Spirtakis keys), weight
/// `max(score, 1)`, then re-sorted by traversal index.
fn weighted_sample(records: Vec<FlatRecord>, max: usize) -> Vec<FlatRecord> {
    if max == 0 {
        return Vec::new();
    }

    let mut rng = rand::thread_rng();
    let mut keyed: Vec<(f64, usize)> = records
        .iter()
        .enumerate()
        .skip(1)
        .map(|(index, record)| {
            let weight = record.score.max(1) as f64;
            (rng.gen::<f64>().powf(1.0 / weight), index)
        })
        .collect();
    keyed.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut keep: Vec<usize> = keyed
        .into_iter()
        .take(max - 1)
        .map(|(_, index)| index)
        .collect();
    keep.push(0);
    keep.sort_unstable();

    let mut remaining: Vec<Option<FlatRecord>> = records.into_iter().map(Some).collect();
    keep.into_iter()
        .filter_map(|index| remaining[index].take())
        .collect()
}
