//! Pipeline driver
//!
//! reconstruct (parallel, per participant) → align (barrier) →
//! filter (barrier) → export
//!
//! Participant-level failures are logged and recorded in the run report;
//! aligner failures and an empty reconstruction abort the run.

use crate::config::PipelineConfig;
use crate::error::{RdmError, RdmResult};
use crate::export::{export_stack, ExportedFiles};
use crate::loader::load_data_folder;
use crate::reconstruction::{reconstruct_participant, ReconstructedParticipant};
use crate::report::{RunReport, SkippedParticipant, REPORT_FILE};
use crate::screening::{align, filter_by_mpd, FilterOutcome};
use crate::types::ParticipantRecord;
use rayon::prelude::*;
use std::path::Path;
use tracing::{error, info, warn};

/// In-memory result of a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub outcome: FilterOutcome,
    pub report: RunReport,
}

/// Reconstruct every participant; participant-level failures become skip
/// entries
///
/// Output order follows input order.
///
/// # Errors
/// The first run-fatal error, in input order
pub fn reconstruct_all(
    records: &[ParticipantRecord],
    config: &PipelineConfig,
) -> RdmResult<(Vec<ReconstructedParticipant>, Vec<SkippedParticipant>)> {
    let results: Vec<_> = records
        .par_iter()
        .map(|record| (record.participant_id.as_str(), reconstruct_participant(record, config)))
        .collect();

    collect_reconstructions(results)
}

fn collect_reconstructions(
    results: Vec<(&str, RdmResult<ReconstructedParticipant>)>,
) -> RdmResult<(Vec<ReconstructedParticipant>, Vec<SkippedParticipant>)> {
    let mut reconstructed = Vec::with_capacity(results.len());
    let mut skipped = Vec::new();

    for (participant_id, result) in results {
        match result {
            Ok(participant) => reconstructed.push(participant),
            Err(e) if e.is_run_fatal() => {
                error!("Participant {}: {}; aborting run", participant_id, e);
                return Err(e);
            }
            Err(e) => {
                warn!("Error processing participant {}: {}; skipping", participant_id, e);
                skipped.push(SkippedParticipant {
                    participant_id: participant_id.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok((reconstructed, skipped))
}

/// Run reconstruction and screening over already-loaded records
///
/// # Errors
/// * `RdmError::NoParticipants` - nobody survived reconstruction
/// * any run-fatal error raised while reconstructing
/// * `RdmError::InconsistentItemOrder` - item orders disagree
pub fn run(records: &[ParticipantRecord], config: &PipelineConfig) -> RdmResult<PipelineOutput> {
    let mut report = RunReport::new(config)?;
    report.participants_loaded = records.len();

    let (reconstructed, skipped) = reconstruct_all(records, config)?;
    report.participants_reconstructed = reconstructed.len();
    report.skipped = skipped;
    info!(
        "Successfully processed {} of {} participants",
        reconstructed.len(),
        records.len()
    );

    let stack = align(reconstructed)?;
    let outcome = filter_by_mpd(&stack, config.z_threshold, config.filter_mode);

    report.participants_retained = outcome.retained.len();
    report.filter_passes = outcome.passes.clone();

    Ok(PipelineOutput { outcome, report })
}

/// Load a data folder, run the pipeline and write every output file
pub fn run_folder(
    data_folder: &Path,
    output_folder: &Path,
    config: &PipelineConfig,
) -> RdmResult<(PipelineOutput, ExportedFiles)> {
    let records = load_data_folder(data_folder, &config.file_prefix, &config.columns)?;
    if records.is_empty() {
        return Err(RdmError::NoParticipants);
    }

    let output = run(&records, config)?;

    let files = export_stack(
        output_folder,
        &output.outcome.retained,
        &output.outcome.diagnostics,
    )?;
    output.report.export_json(output_folder.join(REPORT_FILE))?;

    Ok((output, files))
}
