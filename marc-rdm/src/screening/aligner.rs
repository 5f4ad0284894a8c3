// Cross-Participant Aligner - one shared canonical item order or a fatal error
//
// Compares orders position by position; the same labels in another order
// are a mismatch.

use crate::error::{RdmError, RdmResult};
use crate::reconstruction::ReconstructedParticipant;
use crate::types::MatrixStack;
use tracing::{error, info};

/// Verify every participant shares the first participant's item order and
/// assemble the Matrix Stack
///
/// # Errors
/// * `RdmError::NoParticipants` - empty input
/// * `RdmError::InconsistentItemOrder` - first offending participant
pub fn align(participants: Vec<ReconstructedParticipant>) -> RdmResult<MatrixStack> {
    let mut iter = participants.into_iter();
    let Some(first) = iter.next() else {
        return Err(RdmError::NoParticipants);
    };

    let reference = first.canonical_order;
    let mut ids = vec![first.participant_id];
    let mut matrices = vec![first.matrix];

    for participant in iter {
        if let Some(err) = order_mismatch(&reference, &participant) {
            error!("{}", err);
            return Err(err);
        }
        ids.push(participant.participant_id);
        matrices.push(participant.matrix);
    }

    info!(
        "Item order is consistent across all {} participants",
        ids.len()
    );
    Ok(MatrixStack::new(ids, matrices, reference))
}

fn order_mismatch(
    reference: &[String],
    participant: &ReconstructedParticipant,
) -> Option<RdmError> {
    let order = &participant.canonical_order;
    let mismatch = |position: usize, expected: &str, found: &str| RdmError::InconsistentItemOrder {
        participant_id: participant.participant_id.clone(),
        position,
        expected: expected.to_string(),
        found: found.to_string(),
    };

    if let Some((position, (expected, found))) = reference
        .iter()
        .zip(order)
        .enumerate()
        .find(|(_, (a, b))| a != b)
    {
        return Some(mismatch(position, expected, found));
    }

    if reference.len() != order.len() {
        let position = reference.len().min(order.len());
        return Some(mismatch(
            position,
            reference.get(position).map(String::as_str).unwrap_or("<end>"),
            order.get(position).map(String::as_str).unwrap_or("<end>"),
        ));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DissimilarityMatrix;

    fn participant(id: &str, order: &[&str]) -> ReconstructedParticipant {
        let n = order.len();
        ReconstructedParticipant {
            participant_id: id.to_string(),
            canonical_order: order.iter().map(|s| s.to_string()).collect(),
            matrix: DissimilarityMatrix::from_condensed(n, &vec![1.0; n * (n - 1) / 2]).unwrap(),
            trials_used: 1,
            trials_dropped: 0,
            imputed_pairs: 0,
        }
    }

    #[test]
    fn test_consistent_orders_build_stack() {
        let stack = align(vec![
            participant("p1", &["a", "b", "c"]),
            participant("p2", &["a", "b", "c"]),
        ])
        .unwrap();

        assert_eq!(stack.len(), 2);
        assert_eq!(stack.participant_ids(), &["p1".to_string(), "p2".to_string()]);
        assert_eq!(stack.item_order(), &["a", "b", "c"]);
    }

    #[test]
    fn test_permuted_order_is_fatal() {
        let err = align(vec![
            participant("p1", &["a", "b", "c"]),
            participant("p2", &["a", "c", "b"]),
        ])
        .unwrap_err();

        match err {
            RdmError::InconsistentItemOrder {
                participant_id,
                position,
                expected,
                found,
            } => {
                assert_eq!(participant_id, "p2");
                assert_eq!(position, 1);
                assert_eq!(expected, "b");
                assert_eq!(found, "c");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_empty_input_is_fatal() {
        assert!(matches!(align(Vec::new()), Err(RdmError::NoParticipants)));
    }
}
