//! Configuration loading and config file discovery
//!
//! Bootstrap configuration lives in a single TOML file. Discovery priority:
//! 1. Command-line argument (highest priority)
//! 2. `MARC_CONFIG` environment variable
//! 3. `<user config dir>/marc/config.toml` when present
//! 4. Built-in defaults (a missing file is never fatal)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "MARC_CONFIG";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Reconstruction and screening options
    #[serde(default)]
    pub pipeline: PipelineSection,

    /// Column names of the participant trial files
    #[serde(default)]
    pub columns: ColumnNames,

    /// Category tag → member labels
    ///
    /// Empty means no category screening.
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<String>>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// `[pipeline]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSection {
    /// Weight every trial 1.0 (true) or by mean(distances)^2 (false)
    #[serde(default = "default_equal_weights")]
    pub equal_weights: bool,

    /// Outlier cutoff in population standard deviations above the mean MPD
    #[serde(default = "default_z_threshold")]
    pub z_threshold: f64,

    /// Recompute mean/std after exclusion until no further exclusions
    #[serde(default)]
    pub iterative_filter: bool,

    /// Number of items in the full-set trial
    #[serde(default = "default_full_set_size")]
    pub full_set_size: usize,

    /// File name prefix of participant trial files
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            equal_weights: default_equal_weights(),
            z_threshold: default_z_threshold(),
            iterative_filter: false,
            full_set_size: default_full_set_size(),
            file_prefix: default_file_prefix(),
        }
    }
}

/// `[columns]` section: header names in participant trial files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnNames {
    #[serde(default = "default_participant_column")]
    pub participant: String,
    #[serde(default = "default_item_count_column")]
    pub item_count: String,
    #[serde(default = "default_placements_column")]
    pub placements: String,
    #[serde(default = "default_distances_column")]
    pub distances: String,
    #[serde(default = "default_category_column")]
    pub category: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            participant: default_participant_column(),
            item_count: default_item_count_column(),
            placements: default_placements_column(),
            distances: default_distances_column(),
            category: default_category_column(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_equal_weights() -> bool {
    true
}

fn default_z_threshold() -> f64 {
    3.0
}

fn default_full_set_size() -> usize {
    90
}

fn default_file_prefix() -> String {
    "cleaned_".to_string()
}

fn default_participant_column() -> String {
    "participant_number".to_string()
}

fn default_item_count_column() -> String {
    "n_words".to_string()
}

fn default_placements_column() -> String {
    "placements".to_string()
}

fn default_distances_column() -> String {
    "dissimilarity_vector".to_string()
}

fn default_category_column() -> String {
    "trial_category".to_string()
}

/// Resolve which config file to read, if any
///
/// Returns `None` when no explicit path was given and no user config exists.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: user config directory
    user_config_path().filter(|p| p.exists())
}

/// `<user config dir>/marc/config.toml` for the current platform
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("marc").join("config.toml"))
}

/// Load TOML configuration, falling back to defaults when the file is absent
///
/// A file that exists but cannot be parsed is an error; a missing file only
/// logs a warning.
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = path else {
        info!("No config file found, using built-in defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!("Config file {} not found, using built-in defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)?;
    config.validate()?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

impl TomlConfig {
    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if !self.pipeline.z_threshold.is_finite() {
            return Err(Error::Config(format!(
                "pipeline.z_threshold must be finite, got {}",
                self.pipeline.z_threshold
            )));
        }
        if self.pipeline.full_set_size < 2 {
            return Err(Error::Config(format!(
                "pipeline.full_set_size must be at least 2, got {}",
                self.pipeline.full_set_size
            )));
        }
        Ok(())
    }
}

/// Write configuration atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, target: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut temp_path = target.as_os_str().to_owned();
    temp_path.push(".tmp");
    let temp_path = PathBuf::from(temp_path);

    {
        let mut file = std::fs::File::create(&temp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
    }

    if let Err(e) = std::fs::rename(&temp_path, target) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(Error::Io(e));
    }

    Ok(())
}
