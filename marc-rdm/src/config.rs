//! Pipeline configuration for marc-rdm
//!
//! Resolves the `[pipeline]`, `[columns]` and `[categories]` TOML sections
//! plus command-line overrides into one explicit `PipelineConfig` that is
//! passed into every stage.
//!
//! **Priority:** CLI (incl. its ENV fallbacks) → TOML → built-in defaults

use marc_common::config::{ColumnNames, TomlConfig};
use marc_common::{CategoryTable, Error, Result};
use serde::Serialize;
use tracing::info;

/// How each trial's observations are weighted in the accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightingPolicy {
    /// Every trial weighs 1.0
    Equal,
    /// Weight = mean(trial distances)^2, 1.0 when that is not positive
    EvidenceWeighted,
}

/// Outlier filter repetition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// One pass over the full stack
    SinglePass,
    /// Recompute on survivors until a pass excludes nobody
    Iterative,
}

/// Resolved pipeline settings
#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    pub weighting: WeightingPolicy,
    pub z_threshold: f64,
    pub filter_mode: FilterMode,
    /// Item count of the canonical-order (full) trial
    pub full_set_size: usize,
    pub file_prefix: String,
    pub columns: ColumnNames,
    #[serde(skip)]
    pub categories: CategoryTable,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            weighting: WeightingPolicy::Equal,
            z_threshold: 3.0,
            filter_mode: FilterMode::SinglePass,
            full_set_size: 90,
            file_prefix: "cleaned_".to_string(),
            columns: ColumnNames::default(),
            categories: CategoryTable::default(),
        }
    }
}

/// Command-line configuration overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub equal_weights: Option<bool>,
    pub z_threshold: Option<f64>,
    pub iterative_filter: Option<bool>,
    pub full_set_size: Option<usize>,
}

impl PipelineConfig {
    /// Merge TOML configuration with CLI overrides
    ///
    /// # Errors
    /// * `Error::Config` for out-of-range overrides or a bad category table
    pub fn resolve(toml_config: &TomlConfig, overrides: &ConfigOverrides) -> Result<Self> {
        let section = &toml_config.pipeline;

        let equal_weights = overrides.equal_weights.unwrap_or(section.equal_weights);
        let z_threshold = overrides.z_threshold.unwrap_or(section.z_threshold);
        let iterative = overrides.iterative_filter.unwrap_or(section.iterative_filter);
        let full_set_size = overrides.full_set_size.unwrap_or(section.full_set_size);

        if !z_threshold.is_finite() {
            return Err(Error::Config(format!(
                "z_threshold must be finite, got {}",
                z_threshold
            )));
        }
        if full_set_size < 2 {
            return Err(Error::Config(format!(
                "full_set_size must be at least 2, got {}",
                full_set_size
            )));
        }

        let categories = CategoryTable::from_groups(&toml_config.categories)?;
        if !categories.is_empty() && categories.label_count() != full_set_size {
            return Err(Error::Config(format!(
                "Category table lists {} labels but full_set_size is {}",
                categories.label_count(),
                full_set_size
            )));
        }

        let config = Self {
            weighting: if equal_weights {
                WeightingPolicy::Equal
            } else {
                WeightingPolicy::EvidenceWeighted
            },
            z_threshold,
            filter_mode: if iterative {
                FilterMode::Iterative
            } else {
                FilterMode::SinglePass
            },
            full_set_size,
            file_prefix: section.file_prefix.clone(),
            columns: toml_config.columns.clone(),
            categories,
        };

        info!(
            "Pipeline: weighting={:?}, z_threshold={}, filter={:?}, full_set_size={}, categories={}",
            config.weighting,
            config.z_threshold,
            config.filter_mode,
            config.full_set_size,
            if config.categories.is_empty() { "off" } else { "on" }
        );

        Ok(config)
    }
}
