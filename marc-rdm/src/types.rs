//! Core data types shared across reconstruction stages

use ndarray::{Array2, Array3, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// One trial row as delivered by a loader, before decoding
#[derive(Debug, Clone, PartialEq)]
pub struct RawTrialRecord {
    pub participant_id: String,

    /// Declared number of arranged items
    pub item_count: usize,

    /// Serialized placement list (JSON array)
    pub item_order_json: String,

    /// Serialized condensed distance vector (JSON array)
    pub pairwise_distances_json: String,

    /// Category label written by the experiment, if any
    pub category_hint: Option<String>,

    /// Where the record came from (e.g. `file.csv:4`), for diagnostics
    pub context: String,
}

/// A decoded, shape-checked trial
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    /// Item labels in trial-local order (unique)
    pub item_order: Vec<String>,

    /// Condensed upper-triangular distances for `item_order`
    ///
    /// Row-major over pairs (0,1), (0,2), .., (0,n-1), (1,2), ..
    pub pairwise_distances: Vec<f64>,

    /// Category tag assigned by screening, if a category table is in use
    pub category: Option<String>,

    /// Source context carried over from the raw record
    pub context: String,
}

impl Trial {
    pub fn item_count(&self) -> usize {
        self.item_order.len()
    }

    /// Distance between local positions `i` and `j` (i != j)
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        let (a, b) = if i < j { (i, j) } else { (j, i) };
        self.pairwise_distances[condensed_index(self.item_count(), a, b)]
    }

    /// Arithmetic mean of the distance vector (0.0 when empty)
    pub fn mean_distance(&self) -> f64 {
        if self.pairwise_distances.is_empty() {
            return 0.0;
        }
        self.pairwise_distances.iter().sum::<f64>() / self.pairwise_distances.len() as f64
    }
}

/// All raw trial records of one participant, in file order
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantRecord {
    pub participant_id: String,
    pub trials: Vec<RawTrialRecord>,
}

/// Number of unordered pairs among `n` items
pub fn pair_count(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

/// Position of pair (i, j), i < j, in a condensed vector over `n` items
pub fn condensed_index(n: usize, i: usize, j: usize) -> usize {
    debug_assert!(i < j && j < n);
    i * n - i * (i + 1) / 2 + (j - i - 1)
}

/// Symmetric, zero-diagonal, non-negative dissimilarity matrix
#[derive(Debug, Clone, PartialEq)]
pub struct DissimilarityMatrix {
    values: Array2<f64>,
}

impl DissimilarityMatrix {
    /// Wrap a finished square matrix
    ///
    /// Callers are the accumulator and the export loader; both guarantee a
    /// square array.
    pub(crate) fn from_array(values: Array2<f64>) -> Self {
        debug_assert_eq!(values.nrows(), values.ncols());
        Self { values }
    }

    /// Build from a condensed distance vector over `n` items
    pub fn from_condensed(n: usize, condensed: &[f64]) -> Option<Self> {
        if condensed.len() != pair_count(n) {
            return None;
        }
        let mut values = Array2::zeros((n, n));
        for i in 0..n {
            for j in (i + 1)..n {
                let d = condensed[condensed_index(n, i, j)];
                values[[i, j]] = d;
                values[[j, i]] = d;
            }
        }
        Some(Self { values })
    }

    pub fn size(&self) -> usize {
        self.values.nrows()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[[i, j]]
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Upper triangle (excluding diagonal) in condensed order
    pub fn condensed(&self) -> Vec<f64> {
        let n = self.size();
        let mut out = Vec::with_capacity(pair_count(n));
        for i in 0..n {
            for j in (i + 1)..n {
                out.push(self.values[[i, j]]);
            }
        }
        out
    }

    /// Off-diagonal values, row-major
    pub fn off_diagonal(&self) -> impl Iterator<Item = f64> + '_ {
        self.values
            .indexed_iter()
            .filter(|((i, j), _)| i != j)
            .map(|(_, v)| *v)
    }
}

/// Retained participants' matrices with their ids, order-matched
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixStack {
    participant_ids: Vec<String>,
    matrices: Vec<DissimilarityMatrix>,
    item_order: Vec<String>,
}

impl MatrixStack {
    /// Assemble a stack; ids and matrices must pair up one-to-one
    pub(crate) fn new(
        participant_ids: Vec<String>,
        matrices: Vec<DissimilarityMatrix>,
        item_order: Vec<String>,
    ) -> Self {
        debug_assert_eq!(participant_ids.len(), matrices.len());
        Self {
            participant_ids,
            matrices,
            item_order,
        }
    }

    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }

    pub fn participant_ids(&self) -> &[String] {
        &self.participant_ids
    }

    pub fn matrices(&self) -> &[DissimilarityMatrix] {
        &self.matrices
    }

    /// Canonical item order shared by every matrix
    pub fn item_order(&self) -> &[String] {
        &self.item_order
    }

    /// Iterate (participant id, matrix) pairs in stack order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DissimilarityMatrix)> {
        self.participant_ids
            .iter()
            .map(String::as_str)
            .zip(self.matrices.iter())
    }

    /// Keep only entries whose `keep` flag is true
    pub(crate) fn retain_by(&self, keep: &[bool]) -> Self {
        let (ids, matrices) = self
            .iter()
            .zip(keep)
            .filter(|(_, keep)| **keep)
            .map(|((id, m), _)| (id.to_string(), m.clone()))
            .unzip();
        Self::new(ids, matrices, self.item_order.clone())
    }

    /// Stack all matrices into a `[participants, items, items]` array
    pub fn to_array3(&self) -> Array3<f64> {
        let n = self.item_order.len();
        let mut out = Array3::zeros((self.len(), n, n));
        for (k, matrix) in self.matrices.iter().enumerate() {
            out.index_axis_mut(Axis(0), k).assign(&matrix.view());
        }
        out
    }
}

/// Per-participant screening outcome (one row per processed participant)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MpdDiagnostic {
    pub participant_id: String,
    pub mpd_value: f64,
    pub excluded: bool,
}
