// Index Resolver - canonical item order and local → canonical mapping
//
// The first full-set trial (record order) whose placements decode fixes the
// canonical order. Every trial with usable distances, including later
// full-set ones, is then mapped onto it.

use crate::error::{RdmError, RdmResult};
use crate::types::Trial;
use std::collections::HashMap;
use tracing::warn;

/// Canonical order for one participant plus per-trial index maps
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedIndex {
    /// Item labels in canonical position order
    pub canonical_order: Vec<String>,

    /// For each trial (same order as input), local position → canonical
    /// position; `None` where the label is not in the canonical order
    pub mappings: Vec<Vec<Option<usize>>>,
}

impl ResolvedIndex {
    /// Number of local labels that could not be mapped, summed over trials
    pub fn unmapped_count(&self) -> usize {
        self.mappings
            .iter()
            .map(|m| m.iter().filter(|p| p.is_none()).count())
            .sum()
    }
}

/// Item order of one trial record that decoded as far as its placements
#[derive(Debug, Clone, PartialEq)]
pub struct OrderCandidate {
    pub item_order: Vec<String>,
    pub context: String,
}

/// Pick the canonical order: the first full-set candidate in record order
///
/// # Errors
/// * `RdmError::MissingFullTrial` if no candidate has `full_set_size` items
pub fn select_canonical_order(
    participant_id: &str,
    candidates: &[OrderCandidate],
    full_set_size: usize,
) -> RdmResult<Vec<String>> {
    let full: Vec<&OrderCandidate> = candidates
        .iter()
        .filter(|c| c.item_order.len() == full_set_size)
        .collect();

    let Some(reference) = full.first() else {
        return Err(RdmError::MissingFullTrial {
            participant_id: participant_id.to_string(),
            expected: full_set_size,
        });
    };

    if full.len() > 1 {
        warn!(
            "Participant {}: {} full trials found, using {} for item order",
            participant_id,
            full.len(),
            reference.context
        );
    }

    Ok(reference.item_order.clone())
}

/// Map every trial onto `canonical_order`
pub fn resolve_index(
    participant_id: &str,
    canonical_order: Vec<String>,
    trials: &[Trial],
) -> ResolvedIndex {
    let position: HashMap<&str, usize> = canonical_order
        .iter()
        .enumerate()
        .map(|(i, label)| (label.as_str(), i))
        .collect();

    let mappings = trials
        .iter()
        .map(|trial| {
            trial
                .item_order
                .iter()
                .map(|label| {
                    let mapped = position.get(label.as_str()).copied();
                    if mapped.is_none() {
                        warn!(
                            "Participant {}: label '{}' in trial {} not in master list; \
                             its pairs are skipped",
                            participant_id, label, trial.context
                        );
                    }
                    mapped
                })
                .collect()
        })
        .collect();

    ResolvedIndex {
        canonical_order,
        mappings,
    }
}
