//! Error types for marc-rdm
//!
//! Failures are graded by how much of the run they take down:
//! - trial level: the trial is dropped
//! - participant level: the participant is dropped
//! - run level: the whole pipeline aborts

use thiserror::Error;

/// Reconstruction pipeline error
#[derive(Debug, Error)]
pub enum RdmError {
    /// Trial payload could not be decoded or failed shape checks
    #[error("Trial decode failed for participant {participant_id} ({context}): {reason}")]
    TrialDecode {
        participant_id: String,
        context: String,
        reason: String,
    },

    /// Participant has no trial covering the full item set
    #[error("Participant {participant_id} has no full trial ({expected} items)")]
    MissingFullTrial {
        participant_id: String,
        expected: usize,
    },

    /// No pair was observed in any surviving trial
    #[error("Participant {participant_id} has no valid pairwise evidence")]
    EmptyEvidence { participant_id: String },

    /// Canonical item order differs from the reference participant
    #[error(
        "Item order mismatch for participant {participant_id} at position {position}: \
         expected '{expected}', found '{found}'. All participants must share one item order"
    )]
    InconsistentItemOrder {
        participant_id: String,
        position: usize,
        expected: String,
        found: String,
    },

    /// Nothing survived reconstruction
    #[error("No participants were successfully processed")]
    NoParticipants,

    /// Exported files disagree with each other
    #[error("Export mismatch: {0}")]
    ExportMismatch(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// .npy write error
    #[error("NPY write error: {0}")]
    NpyWrite(#[from] ndarray_npy::WriteNpyError),

    /// .npy read error
    #[error("NPY read error: {0}")]
    NpyRead(#[from] ndarray_npy::ReadNpyError),

    /// marc-common error
    #[error("Common error: {0}")]
    Common(#[from] marc_common::Error),
}

impl RdmError {
    /// True for conditions that must abort the whole run
    pub fn is_run_fatal(&self) -> bool {
        !matches!(
            self,
            RdmError::TrialDecode { .. }
                | RdmError::MissingFullTrial { .. }
                | RdmError::EmptyEvidence { .. }
        )
    }
}

/// Result type for marc-rdm operations
pub type RdmResult<T> = Result<T, RdmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_errors_are_recoverable() {
        let err = RdmError::MissingFullTrial {
            participant_id: "p1".to_string(),
            expected: 90,
        };
        assert!(!err.is_run_fatal());

        let err = RdmError::EmptyEvidence {
            participant_id: "p1".to_string(),
        };
        assert!(!err.is_run_fatal());
    }

    #[test]
    fn test_order_mismatch_is_fatal() {
        let err = RdmError::InconsistentItemOrder {
            participant_id: "p2".to_string(),
            position: 0,
            expected: "cat".to_string(),
            found: "dog".to_string(),
        };
        assert!(err.is_run_fatal());
        assert!(err.to_string().contains("p2"));
        assert!(RdmError::NoParticipants.is_run_fatal());
    }
}
