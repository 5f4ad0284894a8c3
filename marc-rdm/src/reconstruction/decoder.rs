// Trial Decoder - raw trial record → validated Trial
//
// Pure transform. Any failure is reported as RdmError::TrialDecode and the
// caller drops just that trial.

use crate::error::{RdmError, RdmResult};
use crate::types::{pair_count, RawTrialRecord, Trial};
use serde::Deserialize;
use std::collections::HashSet;

/// One entry of a placement list
///
/// Placement objects carry the label under `word` plus arrangement
/// coordinates we do not need; bare string entries are accepted too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Placement {
    Labeled { word: String },
    Bare(String),
}

impl Placement {
    fn into_label(self) -> String {
        match self {
            Placement::Labeled { word } => word,
            Placement::Bare(word) => word,
        }
    }
}

/// Decode and validate one raw trial record
///
/// # Checks
/// * placement list parses and holds exactly `item_count` unique labels
/// * distance list parses, has `item_count·(item_count−1)/2` entries,
///   every entry finite and non-negative
pub fn decode_trial(record: &RawTrialRecord) -> RdmResult<Trial> {
    let item_order = decode_item_order(record)?;
    let pairwise_distances = decode_distances(record)?;

    Ok(Trial {
        item_order,
        pairwise_distances,
        category: record.category_hint.clone(),
        context: record.context.clone(),
    })
}

/// Decode only the placement list of a record
///
/// A full-set record whose labels decode can still fix the canonical item
/// order when its distance payload is rejected.
pub fn decode_item_order(record: &RawTrialRecord) -> RdmResult<Vec<String>> {
    let placements: Vec<Placement> = serde_json::from_str(&record.item_order_json)
        .map_err(|e| decode_error(record, format!("placement list: {}", e)))?;
    let item_order: Vec<String> = placements.into_iter().map(Placement::into_label).collect();

    if item_order.len() != record.item_count {
        return Err(decode_error(
            record,
            format!(
                "placement list has {} items, expected {}",
                item_order.len(),
                record.item_count
            ),
        ));
    }

    let mut seen = HashSet::with_capacity(item_order.len());
    if let Some(dup) = item_order.iter().find(|label| !seen.insert(label.as_str())) {
        return Err(decode_error(
            record,
            format!("label '{}' placed more than once", dup),
        ));
    }

    Ok(item_order)
}

fn decode_distances(record: &RawTrialRecord) -> RdmResult<Vec<f64>> {
    let pairwise_distances: Vec<f64> = serde_json::from_str(&record.pairwise_distances_json)
        .map_err(|e| decode_error(record, format!("distance list: {}", e)))?;

    let expected_len = pair_count(record.item_count);
    if pairwise_distances.len() != expected_len {
        return Err(decode_error(
            record,
            format!(
                "trial with {} items has vector length {}, expected {}",
                record.item_count,
                pairwise_distances.len(),
                expected_len
            ),
        ));
    }

    if let Some((idx, d)) = pairwise_distances
        .iter()
        .enumerate()
        .find(|(_, d)| !d.is_finite() || **d < 0.0)
    {
        return Err(decode_error(
            record,
            format!("distance #{} is {}, must be finite and >= 0", idx, d),
        ));
    }

    Ok(pairwise_distances)
}

fn decode_error(record: &RawTrialRecord, reason: String) -> RdmError {
    RdmError::TrialDecode {
        participant_id: record.participant_id.clone(),
        context: record.context.clone(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(item_count: usize, order: &str, distances: &str) -> RawTrialRecord {
        RawTrialRecord {
            participant_id: "p1".to_string(),
            item_count,
            item_order_json: order.to_string(),
            pairwise_distances_json: distances.to_string(),
            category_hint: None,
            context: "cleaned_p1.csv:2".to_string(),
        }
    }

    #[test]
    fn test_decode_placement_objects() {
        let rec = record(
            3,
            r#"[{"word":"猫","x":10,"y":4},{"word":"狗","x":1,"y":2},{"word":"鸟","x":0,"y":0}]"#,
            "[0.1, 0.2, 0.3]",
        );
        let trial = decode_trial(&rec).unwrap();
        assert_eq!(trial.item_order, vec!["猫", "狗", "鸟"]);
        assert_eq!(trial.pairwise_distances, vec![0.1, 0.2, 0.3]);
        assert_eq!(trial.context, "cleaned_p1.csv:2");
    }

    #[test]
    fn test_decode_bare_labels() {
        let rec = record(2, r#"["a","b"]"#, "[0.5]");
        let trial = decode_trial(&rec).unwrap();
        assert_eq!(trial.item_order, vec!["a", "b"]);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let rec = record(3, r#"["a","b","c"]"#, "[0.1, 0.2]");
        let err = decode_trial(&rec).unwrap_err();
        match err {
            RdmError::TrialDecode {
                participant_id,
                context,
                reason,
            } => {
                assert_eq!(participant_id, "p1");
                assert_eq!(context, "cleaned_p1.csv:2");
                assert!(reason.contains("expected 3"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_item_count_mismatch_rejected() {
        let rec = record(4, r#"["a","b","c"]"#, "[0.1, 0.2, 0.3]");
        assert!(decode_trial(&rec).is_err());
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let rec = record(3, r#"["a","b","a"]"#, "[0.1, 0.2, 0.3]");
        assert!(decode_trial(&rec).is_err());
    }

    #[test]
    fn test_negative_distance_rejected() {
        let rec = record(2, r#"["a","b"]"#, "[-0.5]");
        assert!(decode_trial(&rec).is_err());
    }

    #[test]
    fn test_item_order_survives_bad_distances() {
        let rec = record(3, r#"["a","b","c"]"#, "[0.5, 0.5]");
        assert!(decode_trial(&rec).is_err());
        assert_eq!(decode_item_order(&rec).unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(decode_trial(&record(2, "not json", "[0.5]")).is_err());
        assert!(decode_trial(&record(2, r#"["a","b"]"#, "[0.5,")).is_err());
    }
}
