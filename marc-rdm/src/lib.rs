//! marc-rdm library interface
//!
//! Rebuilds one item × item dissimilarity matrix per participant from
//! partial multi-arrangement trials, screens participants by mean pairwise
//! distance and exports the stack for downstream analysis.

pub mod config;
pub mod error;
pub mod export;
pub mod loader;
pub mod pipeline;
pub mod reconstruction;
pub mod report;
pub mod screening;
pub mod types;

pub use crate::config::{ConfigOverrides, FilterMode, PipelineConfig, WeightingPolicy};
pub use crate::error::{RdmError, RdmResult};
pub use crate::pipeline::{run, run_folder, PipelineOutput};
pub use crate::types::{
    DissimilarityMatrix, MatrixStack, MpdDiagnostic, ParticipantRecord, RawTrialRecord, Trial,
};
