//! Export Layer - the interchange contract with downstream analysis
//!
//! Files written to the output folder:
//! - `all_rdms.npy` - float64 `[participants, items, items]`
//! - `participant_info.csv` - `participant_id`, row k ↔ axis-0 index k
//! - `word_order.csv` - `word`, row k ↔ axis-1/2 index k (UTF-8 with BOM)
//! - `mpd_values_all.csv` - `participant_id,mpd_value,excluded` for every
//!   processed participant, retained or not

use crate::error::{RdmError, RdmResult};
use crate::types::{DissimilarityMatrix, MatrixStack, MpdDiagnostic};
use ndarray::{Array3, Axis};
use ndarray_npy::{read_npy, write_npy};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub const RDMS_FILE: &str = "all_rdms.npy";
pub const PARTICIPANTS_FILE: &str = "participant_info.csv";
pub const WORD_ORDER_FILE: &str = "word_order.csv";
pub const DIAGNOSTICS_FILE: &str = "mpd_values_all.csv";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Serialize, Deserialize)]
struct ParticipantRow {
    participant_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct WordRow {
    word: String,
}

/// Paths of the files written by `export_stack`
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFiles {
    pub rdms: PathBuf,
    pub participants: PathBuf,
    pub word_order: PathBuf,
    pub diagnostics: PathBuf,
}

/// Write the filtered stack, roster, item order and diagnostics
pub fn export_stack(
    output_folder: &Path,
    stack: &MatrixStack,
    diagnostics: &[MpdDiagnostic],
) -> RdmResult<ExportedFiles> {
    std::fs::create_dir_all(output_folder)?;

    let files = ExportedFiles {
        rdms: output_folder.join(RDMS_FILE),
        participants: output_folder.join(PARTICIPANTS_FILE),
        word_order: output_folder.join(WORD_ORDER_FILE),
        diagnostics: output_folder.join(DIAGNOSTICS_FILE),
    };

    write_npy(&files.rdms, &stack.to_array3())?;

    let mut writer = csv::Writer::from_path(&files.participants)?;
    for id in stack.participant_ids() {
        writer.serialize(ParticipantRow {
            participant_id: id.clone(),
        })?;
    }
    writer.flush()?;

    let mut file = std::fs::File::create(&files.word_order)?;
    file.write_all(UTF8_BOM)?;
    let mut writer = csv::Writer::from_writer(file);
    for word in stack.item_order() {
        writer.serialize(WordRow { word: word.clone() })?;
    }
    writer.flush()?;

    let mut writer = csv::Writer::from_path(&files.diagnostics)?;
    for row in diagnostics {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!(
        "Exported {} participants × {} items to {}",
        stack.len(),
        stack.item_order().len(),
        output_folder.display()
    );

    Ok(files)
}

/// Re-load an exported stack
///
/// # Errors
/// * `RdmError::ExportMismatch` when array shape, roster length and item
///   order length disagree
pub fn load_export(output_folder: &Path) -> RdmResult<MatrixStack> {
    let array: Array3<f64> = read_npy(output_folder.join(RDMS_FILE))?;

    let participant_ids: Vec<String> =
        read_rows::<ParticipantRow>(&output_folder.join(PARTICIPANTS_FILE))?
            .into_iter()
            .map(|r| r.participant_id)
            .collect();
    let item_order: Vec<String> = read_rows::<WordRow>(&output_folder.join(WORD_ORDER_FILE))?
        .into_iter()
        .map(|r| r.word)
        .collect();

    let (n, rows, cols) = array.dim();
    if n != participant_ids.len() {
        return Err(RdmError::ExportMismatch(format!(
            "{} matrices but {} participant ids",
            n,
            participant_ids.len()
        )));
    }
    if rows != cols || rows != item_order.len() {
        return Err(RdmError::ExportMismatch(format!(
            "matrices are {}×{} but word order has {} entries",
            rows,
            cols,
            item_order.len()
        )));
    }

    let matrices = array
        .axis_iter(Axis(0))
        .map(|m| DissimilarityMatrix::from_array(m.to_owned()))
        .collect();

    Ok(MatrixStack::new(participant_ids, matrices, item_order))
}

/// Re-load the diagnostic table
pub fn load_diagnostics(output_folder: &Path) -> RdmResult<Vec<MpdDiagnostic>> {
    read_rows(&output_folder.join(DIAGNOSTICS_FILE))
}

fn read_rows<T: for<'de> Deserialize<'de>>(path: &Path) -> RdmResult<Vec<T>> {
    let bytes = std::fs::read(path)?;
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes[..]);
    let mut reader = csv::Reader::from_reader(body);
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}
