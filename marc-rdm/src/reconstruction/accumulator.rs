// Evidence Accumulator - merge partial trials into one dissimilarity matrix
//
// weighted_sum / weight_total per canonical pair, then mean-of-observed
// imputation for pairs no trial covered. Diagonal is exactly zero.

use crate::config::WeightingPolicy;
use crate::error::{RdmError, RdmResult};
use crate::reconstruction::index_resolver::ResolvedIndex;
use crate::types::{DissimilarityMatrix, Trial};
use ndarray::Array2;
use tracing::debug;

/// Accumulated matrix plus coverage statistics
#[derive(Debug, Clone, PartialEq)]
pub struct Accumulated {
    pub matrix: DissimilarityMatrix,

    /// Unordered pairs observed by at least one trial
    pub observed_pairs: usize,

    /// Unordered pairs filled by imputation
    pub imputed_pairs: usize,

    /// Value used for imputed pairs (None when nothing was imputed)
    pub imputed_value: Option<f64>,
}

/// Evidence weight of one trial under `policy`
pub fn trial_weight(trial: &Trial, policy: WeightingPolicy) -> f64 {
    match policy {
        WeightingPolicy::Equal => 1.0,
        WeightingPolicy::EvidenceWeighted => {
            let w = trial.mean_distance().powi(2);
            if w > 0.0 {
                w
            } else {
                1.0
            }
        }
    }
}

/// Merge all trials of one participant into a `size × size` matrix
///
/// `resolved.mappings[k]` must be the index map of `trials[k]`.
///
/// # Errors
/// * `RdmError::EmptyEvidence` if no pair was observed at all
pub fn accumulate(
    participant_id: &str,
    trials: &[Trial],
    resolved: &ResolvedIndex,
    policy: WeightingPolicy,
) -> RdmResult<Accumulated> {
    let size = resolved.canonical_order.len();
    let mut weighted_sum = Array2::<f64>::zeros((size, size));
    let mut weight_total = Array2::<f64>::zeros((size, size));

    for (trial, mapping) in trials.iter().zip(&resolved.mappings) {
        let w = trial_weight(trial, policy);
        let n = trial.item_count();
        let mut recorded = 0usize;

        for i in 0..n {
            let Some(ci) = mapping[i] else { continue };
            for j in (i + 1)..n {
                let Some(cj) = mapping[j] else { continue };
                let d = trial.distance(i, j);

                weighted_sum[[ci, cj]] += w * d;
                weighted_sum[[cj, ci]] += w * d;
                weight_total[[ci, cj]] += w;
                weight_total[[cj, ci]] += w;
                recorded += 1;
            }
        }

        debug!(
            "Participant {}: trial {} ({} items, weight {:.4}) contributed {} pairs",
            participant_id, trial.context, n, w, recorded
        );
    }

    let mut values = Array2::<f64>::zeros((size, size));
    let mut observed_sum = 0.0;
    let mut observed_pairs = 0usize;
    let mut missing = Vec::new();

    for i in 0..size {
        for j in (i + 1)..size {
            if weight_total[[i, j]] > 0.0 {
                let v = weighted_sum[[i, j]] / weight_total[[i, j]];
                values[[i, j]] = v;
                values[[j, i]] = v;
                observed_sum += v;
                observed_pairs += 1;
            } else {
                missing.push((i, j));
            }
        }
    }

    if observed_pairs == 0 {
        return Err(RdmError::EmptyEvidence {
            participant_id: participant_id.to_string(),
        });
    }

    let imputed_value = if missing.is_empty() {
        None
    } else {
        // Mean over observed off-diagonal pairs only; zero diagonal excluded
        let fill = observed_sum / observed_pairs as f64;
        for &(i, j) in &missing {
            values[[i, j]] = fill;
            values[[j, i]] = fill;
        }
        Some(fill)
    };

    Ok(Accumulated {
        matrix: DissimilarityMatrix::from_array(values),
        observed_pairs,
        imputed_pairs: missing.len(),
        imputed_value,
    })
}
