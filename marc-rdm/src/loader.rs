//! Participant trial file loader
//!
//! Reads `<prefix>*.csv` files (one participant per file) into raw trial
//! records. Only rows with a distance payload are arrangement trials.
//! Files that cannot be used are skipped with a warning.

use crate::error::RdmResult;
use crate::types::{ParticipantRecord, RawTrialRecord};
use marc_common::config::ColumnNames;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// List participant files in `data_folder`, sorted by file name
pub fn participant_files(data_folder: &Path, prefix: &str) -> RdmResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(data_folder)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with(prefix) && name.to_ascii_lowercase().ends_with(".csv") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load every participant file in `data_folder`
///
/// Unreadable or unusable files are skipped; an I/O error listing the folder
/// itself is returned.
pub fn load_data_folder(
    data_folder: &Path,
    prefix: &str,
    columns: &ColumnNames,
) -> RdmResult<Vec<ParticipantRecord>> {
    let files = participant_files(data_folder, prefix)?;
    info!(
        "Found {} participant files matching '{}*.csv' in {}",
        files.len(),
        prefix,
        data_folder.display()
    );

    let mut records = Vec::with_capacity(files.len());
    for path in &files {
        match load_participant_file(path, columns) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(e) => warn!("Error reading {}: {}; skipping file", path.display(), e),
        }
    }
    Ok(records)
}

/// Load one participant file
///
/// Returns `Ok(None)` when the file has no usable arrangement rows or lacks
/// a required column.
pub fn load_participant_file(
    path: &Path,
    columns: &ColumnNames,
) -> RdmResult<Option<ParticipantRecord>> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.trim_start_matches('\u{feff}') == name);

    let Some(distances_idx) = column(&columns.distances) else {
        warn!("{} missing '{}' column; skipping", file_name, columns.distances);
        return Ok(None);
    };
    let Some(participant_idx) = column(&columns.participant) else {
        warn!("{} missing '{}' column; skipping", file_name, columns.participant);
        return Ok(None);
    };
    let Some(placements_idx) = column(&columns.placements) else {
        warn!("{} missing '{}' column; skipping", file_name, columns.placements);
        return Ok(None);
    };
    let Some(count_idx) = column(&columns.item_count) else {
        warn!("{} missing '{}' column; skipping", file_name, columns.item_count);
        return Ok(None);
    };
    let category_idx = column(&columns.category);

    let mut participant_id: Option<String> = None;
    let mut trials = Vec::new();

    for (row_idx, row) in reader.records().enumerate() {
        // Header is line 1
        let line = row_idx + 2;
        let context = format!("{}:{}", file_name, line);
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!("{}: unreadable row ({}); skipping", context, e);
                continue;
            }
        };

        let field = |idx: usize| row.get(idx).map(str::trim).unwrap_or("");

        let distances = field(distances_idx);
        if distances.is_empty() {
            continue;
        }

        let id = participant_id
            .get_or_insert_with(|| field(participant_idx).to_string())
            .clone();

        let Some(item_count) = parse_item_count(field(count_idx)) else {
            warn!(
                "Participant {}: {} has invalid item count '{}'; skipping trial",
                id,
                context,
                field(count_idx)
            );
            continue;
        };

        trials.push(RawTrialRecord {
            participant_id: id,
            item_count,
            item_order_json: field(placements_idx).to_string(),
            pairwise_distances_json: distances.to_string(),
            category_hint: category_idx
                .map(field)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            context,
        });
    }

    let Some(participant_id) = participant_id else {
        warn!("No arrangement data in {}", file_name);
        return Ok(None);
    };

    Ok(Some(ParticipantRecord {
        participant_id,
        trials,
    }))
}

/// Parse an item count written as `90` or `90.0`
fn parse_item_count(text: &str) -> Option<usize> {
    if let Ok(n) = text.parse::<usize>() {
        return Some(n);
    }
    let f = text.parse::<f64>().ok()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 {
        Some(f as usize)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HEADER: &str =
        "participant_number,trial_category,n_words,placements,dissimilarity_vector\n";

    #[test]
    fn test_parse_item_count() {
        assert_eq!(parse_item_count("90"), Some(90));
        assert_eq!(parse_item_count("90.0"), Some(90));
        assert_eq!(parse_item_count("9.5"), None);
        assert_eq!(parse_item_count(""), None);
        assert_eq!(parse_item_count("-3"), None);
    }

    #[test]
    fn test_loads_arrangement_rows_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cleaned_p7.csv");
        let body = format!(
            "{}{}{}{}",
            HEADER,
            "7,all_words,2.0,\"[{\"\"word\"\":\"\"a\"\"},{\"\"word\"\":\"\"b\"\"}]\",[0.5]\n",
            "7,instructions,,,\n",
            "7,pair,2,\"[\"\"a\"\",\"\"b\"\"]\",[0.25]\n"
        );
        std::fs::write(&path, body).unwrap();

        let record = load_participant_file(&path, &ColumnNames::default())
            .unwrap()
            .unwrap();
        assert_eq!(record.participant_id, "7");
        assert_eq!(record.trials.len(), 2);
        assert_eq!(record.trials[0].item_count, 2);
        assert_eq!(record.trials[0].item_order_json, r#"[{"word":"a"},{"word":"b"}]"#);
        assert_eq!(record.trials[0].category_hint.as_deref(), Some("all_words"));
        assert_eq!(record.trials[0].context, "cleaned_p7.csv:2");
        assert_eq!(record.trials[1].context, "cleaned_p7.csv:4");
    }

    #[test]
    fn test_missing_distance_column_skips_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cleaned_x.csv");
        std::fs::write(&path, "participant_number,n_words,placements\n1,2,[]\n").unwrap();

        assert!(load_participant_file(&path, &ColumnNames::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_bom_header_and_custom_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cleaned_bom.csv");
        std::fs::write(
            &path,
            "\u{feff}subject,count,items,dist\ns1,2,\"[\"\"x\"\",\"\"y\"\"]\",[1.0]\n",
        )
        .unwrap();

        let columns = ColumnNames {
            participant: "subject".to_string(),
            item_count: "count".to_string(),
            placements: "items".to_string(),
            distances: "dist".to_string(),
            category: "category".to_string(),
        };
        let record = load_participant_file(&path, &columns).unwrap().unwrap();
        assert_eq!(record.participant_id, "s1");
        assert_eq!(record.trials[0].category_hint, None);
    }

    #[test]
    fn test_folder_listing_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        for name in ["cleaned_b.csv", "cleaned_a.csv", "raw_c.csv", "cleaned_d.txt"] {
            std::fs::write(dir.path().join(name), HEADER).unwrap();
        }

        let files = participant_files(dir.path(), "cleaned_").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["cleaned_a.csv", "cleaned_b.csv"]);
    }
}
