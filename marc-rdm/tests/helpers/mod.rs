//! Shared fixtures for marc-rdm integration tests
//!
//! Builds participant trial files whose every trial reports distances from
//! one known ground-truth function, so reconstructed values are predictable.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// Item labels `w00`, `w01`, ...
pub fn labels(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("w{:02}", i)).collect()
}

/// Ground-truth distance between canonical items `i` and `j`
pub fn truth(i: usize, j: usize, scale: f64) -> f64 {
    let (a, b) = if i < j { (i, j) } else { (j, i) };
    scale * (0.05 + ((a * 7 + b * 3) % 17) as f64 / 20.0)
}

/// One trial row: (n_words, placements JSON, condensed distances JSON)
pub struct TrialRow {
    pub category: String,
    pub n_words: String,
    pub placements: String,
    pub distances: String,
}

/// Trial over canonical indices `items` (in that local order)
pub fn trial_row(category: &str, all_labels: &[String], items: &[usize], scale: f64) -> TrialRow {
    let placements: Vec<serde_json::Value> = items
        .iter()
        .enumerate()
        .map(|(k, &i)| serde_json::json!({ "word": all_labels[i], "x": k * 10, "y": 5 }))
        .collect();

    let mut distances = Vec::new();
    for a in 0..items.len() {
        for b in (a + 1)..items.len() {
            distances.push(truth(items[a], items[b], scale));
        }
    }

    TrialRow {
        category: category.to_string(),
        n_words: items.len().to_string(),
        placements: serde_json::to_string(&placements).unwrap(),
        distances: serde_json::to_string(&distances).unwrap(),
    }
}

/// Full trial in canonical order plus subsets in reversed local order
pub fn standard_trials(all_labels: &[String], scale: f64, subset_size: usize) -> Vec<TrialRow> {
    let n = all_labels.len();
    let mut rows = vec![trial_row("all_words", all_labels, &(0..n).collect::<Vec<_>>(), scale)];

    let mut start = 0;
    while start < n {
        let end = (start + subset_size).min(n);
        let items: Vec<usize> = (start..end).rev().collect();
        if items.len() >= 2 {
            rows.push(trial_row(&format!("group_{}", start), all_labels, &items, scale));
        }
        start = end;
    }
    rows
}

/// Write `cleaned_<participant>.csv` with a non-arrangement row in front
pub fn write_participant_csv(dir: &Path, participant: &str, rows: &[TrialRow]) -> PathBuf {
    let path = dir.join(format!("cleaned_{}.csv", participant));
    let mut writer = csv::Writer::from_path(&path).unwrap();
    writer
        .write_record([
            "participant_number",
            "trial_category",
            "n_words",
            "placements",
            "dissimilarity_vector",
        ])
        .unwrap();
    writer
        .write_record([participant, "instructions", "", "", ""])
        .unwrap();
    for row in rows {
        writer
            .write_record([
                participant,
                row.category.as_str(),
                row.n_words.as_str(),
                row.placements.as_str(),
                row.distances.as_str(),
            ])
            .unwrap();
    }
    writer.flush().unwrap();
    path
}
