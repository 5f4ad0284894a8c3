// Reconstruction - one participant's raw trials → one dissimilarity matrix
//
// Decoder → Category Screen → Index Resolver → Evidence Accumulator.
// Pure per-participant computation; safe to run participants in parallel.

pub mod accumulator;
pub mod category_screen;
pub mod decoder;
pub mod index_resolver;

use crate::config::PipelineConfig;
use crate::error::RdmResult;
use crate::types::{DissimilarityMatrix, ParticipantRecord};
use tracing::{debug, warn};

pub use accumulator::{accumulate, trial_weight, Accumulated};
pub use category_screen::screen_trials;
pub use decoder::{decode_item_order, decode_trial};
pub use index_resolver::{resolve_index, select_canonical_order, OrderCandidate, ResolvedIndex};

/// Successfully reconstructed participant
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructedParticipant {
    pub participant_id: String,
    pub canonical_order: Vec<String>,
    pub matrix: DissimilarityMatrix,
    pub trials_used: usize,
    pub trials_dropped: usize,
    pub imputed_pairs: usize,
}

/// Reconstruct one participant's matrix
///
/// Trial decode failures are logged and the trial's evidence skipped. A
/// full-set trial whose placements decode still fixes the item order.
///
/// # Errors
/// * `RdmError::MissingFullTrial` - no trial covers the full item set
/// * `RdmError::EmptyEvidence` - nothing observable survived
pub fn reconstruct_participant(
    record: &ParticipantRecord,
    config: &PipelineConfig,
) -> RdmResult<ReconstructedParticipant> {
    let participant_id = record.participant_id.as_str();

    let mut candidates = Vec::new();
    let mut decoded = Vec::new();
    for raw in &record.trials {
        match decode_trial(raw) {
            Ok(trial) => {
                candidates.push(OrderCandidate {
                    item_order: trial.item_order.clone(),
                    context: trial.context.clone(),
                });
                decoded.push(trial);
            }
            Err(e) => {
                warn!("{}; skipping trial", e);
                if let Ok(item_order) = decode_item_order(raw) {
                    candidates.push(OrderCandidate {
                        item_order,
                        context: raw.context.clone(),
                    });
                }
            }
        }
    }

    let canonical_order =
        select_canonical_order(participant_id, &candidates, config.full_set_size)?;

    let trials = screen_trials(participant_id, decoded, &config.categories);
    let trials_dropped = record.trials.len() - trials.len();

    let resolved = resolve_index(participant_id, canonical_order, &trials);
    let acc = accumulate(participant_id, &trials, &resolved, config.weighting)?;

    if acc.imputed_pairs > 0 {
        warn!(
            "Participant {}: {} pairs never observed, filled with mean {:.4}",
            participant_id,
            acc.imputed_pairs,
            acc.imputed_value.unwrap_or_default()
        );
    }

    debug!(
        "Participant {}: {} trials used, {} dropped, {} pairs observed",
        participant_id,
        trials.len(),
        trials_dropped,
        acc.observed_pairs
    );

    Ok(ReconstructedParticipant {
        participant_id: participant_id.to_string(),
        canonical_order: resolved.canonical_order,
        matrix: acc.matrix,
        trials_used: trials.len(),
        trials_dropped,
        imputed_pairs: acc.imputed_pairs,
    })
}
