// Quality Filter - mean pairwise distance (MPD) outlier exclusion
//
// One-sided rule: exclude iff MPD > mean(MPD) + z · std(MPD), population std.
// Every processed participant gets a diagnostic row, excluded or not.

use crate::config::FilterMode;
use crate::types::{DissimilarityMatrix, MatrixStack, MpdDiagnostic};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Statistics of one filter pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterPass {
    pub pass: u32,
    pub participants: usize,
    pub mean_mpd: f64,
    pub std_mpd: f64,
    pub threshold: f64,
    pub excluded_ids: Vec<String>,
}

/// Filtered stack plus the audit trail
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    pub retained: MatrixStack,
    /// One row per input participant, in input order
    pub diagnostics: Vec<MpdDiagnostic>,
    pub passes: Vec<FilterPass>,
}

/// Mean of the off-diagonal entries, NaNs skipped
///
/// Returns NaN when no finite off-diagonal value exists.
pub fn mean_pairwise_distance(matrix: &DissimilarityMatrix) -> f64 {
    let (sum, count) = matrix
        .off_diagonal()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Population mean and standard deviation (divisor N)
pub fn population_mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

/// Outlier flags for one pass over `mpds`
///
/// Returns (mean, std, threshold, flags).
pub fn flag_outliers(mpds: &[f64], z_threshold: f64) -> (f64, f64, f64, Vec<bool>) {
    let (mean, std) = population_mean_std(mpds);
    let threshold = mean + z_threshold * std;
    let flags = mpds.iter().map(|m| *m > threshold).collect();
    (mean, std, threshold, flags)
}

/// Screen a Matrix Stack by MPD
pub fn filter_by_mpd(stack: &MatrixStack, z_threshold: f64, mode: FilterMode) -> FilterOutcome {
    let mpds: Vec<f64> = stack.matrices().iter().map(mean_pairwise_distance).collect();
    let ids = stack.participant_ids();

    let mut excluded = vec![false; mpds.len()];
    let mut passes = Vec::new();

    loop {
        let active: Vec<usize> = (0..mpds.len()).filter(|&k| !excluded[k]).collect();
        let active_mpds: Vec<f64> = active.iter().map(|&k| mpds[k]).collect();
        let (mean, std, threshold, flags) = flag_outliers(&active_mpds, z_threshold);

        let newly: Vec<usize> = active
            .iter()
            .zip(&flags)
            .filter(|(_, flagged)| **flagged)
            .map(|(&k, _)| k)
            .collect();
        for &k in &newly {
            excluded[k] = true;
        }

        let pass = FilterPass {
            pass: passes.len() as u32 + 1,
            participants: active.len(),
            mean_mpd: mean,
            std_mpd: std,
            threshold,
            excluded_ids: newly.iter().map(|&k| ids[k].clone()).collect(),
        };

        info!(
            "MPD pass {}: mean {:.4}, std {:.4}, threshold (mean + {} SD) {:.4}, excluded {:?}",
            pass.pass, pass.mean_mpd, pass.std_mpd, z_threshold, pass.threshold, pass.excluded_ids
        );
        passes.push(pass);

        if newly.is_empty() || mode == FilterMode::SinglePass {
            break;
        }
    }

    let keep: Vec<bool> = excluded.iter().map(|e| !e).collect();
    let retained = stack.retain_by(&keep);
    info!("Remaining participants after filtering: {}", retained.len());

    let diagnostics = ids
        .iter()
        .zip(&mpds)
        .zip(&excluded)
        .map(|((id, mpd), excluded)| MpdDiagnostic {
            participant_id: id.clone(),
            mpd_value: *mpd,
            excluded: *excluded,
        })
        .collect();

    FilterOutcome {
        retained,
        diagnostics,
        passes,
    }
}
