//! Core data models for exposure_tree
//!
//! This module contains the records fed to the tree builder and the
//! configuration that steers discovery, extraction and rendering.

use crate::core::error::{Result, ResultExt, TreeError};
use crate::core::presenter::Theme;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Name of the per-directory configuration file
pub const CONFIG_FILE_NAME: &str = ".exptree.json";

/// Exposure-purpose tags rendered with emphasis when a group shares them
pub const DEFAULT_PRIORITY_TAGS: [&str; 4] = ["FLAT", "SKY", "SCIENCE", "STANDARD"];

/// Metadata produced by an extractor for one file
#[derive(Debug, Clone, PartialEq)]
pub struct ExposureMetadata {
    /// Display file name
    pub filename: String,
    /// Observation group id
    pub observation_id: String,
    /// Descriptive object name
    pub object: String,
    /// Tags describing exposure type and purpose
    pub tags: BTreeSet<String>,
    /// Exposure time in seconds
    pub exposure_time: f64,
}

/// One input file's derived attributes, as consumed by the tree builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExposureRecord {
    /// Display file name, also the sort key
    pub filename: String,
    /// Observation identity (`<obsid> - <object>`)
    pub identity: String,
    pub tags: BTreeSet<String>,
    /// Exposure time display string, e.g. `300.0s`
    pub exposure_time: String,
}

impl ExposureRecord {
    /// Create a record from already-derived attributes
    pub fn new<I, S>(
        filename: impl Into<String>,
        identity: impl Into<String>,
        tags: I,
        exposure_time: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            filename: filename.into(),
            identity: identity.into(),
            tags: tags.into_iter().map(Into::into).collect(),
            exposure_time: exposure_time.into(),
        }
    }

    /// Derive a record from extracted metadata
    pub fn from_metadata(meta: ExposureMetadata) -> Self {
        Self {
            identity: format!("{} - {}", meta.observation_id, meta.object),
            exposure_time: format_exposure_time(meta.exposure_time),
            filename: meta.filename,
            tags: meta.tags,
        }
    }
}

/// Render an exposure time in seconds with at least one decimal place
pub fn format_exposure_time(seconds: f64) -> String {
    if seconds.fract() == 0.0 && seconds.is_finite() {
        format!("{:.1}s", seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Header keywords the reference extractor reads
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HeaderKeywords {
    #[serde(default = "default_observation_id_keyword")]
    pub observation_id: String,
    #[serde(default = "default_object_keyword")]
    pub object: String,
    #[serde(default = "default_exposure_time_keyword")]
    pub exposure_time: String,
    /// Keywords whose values become tags
    #[serde(default = "default_tag_keywords")]
    pub tag_keywords: Vec<String>,
}

fn default_observation_id_keyword() -> String {
    "OBSID".to_string()
}

fn default_object_keyword() -> String {
    "OBJECT".to_string()
}

fn default_exposure_time_keyword() -> String {
    "EXPTIME".to_string()
}

fn default_tag_keywords() -> Vec<String> {
    ["INSTRUME", "OBSTYPE", "OBSCLASS", "FRMTYPE"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for HeaderKeywords {
    fn default() -> Self {
        Self {
            observation_id: default_observation_id_keyword(),
            object: default_object_keyword(),
            exposure_time: default_exposure_time_keyword(),
            tag_keywords: default_tag_keywords(),
        }
    }
}

/// Configuration loaded from .exptree.json
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Glob pattern for exposure files
    #[serde(default = "default_pattern")]
    pub pattern: String,
    /// Flat-mode recursion limit
    #[serde(default = "default_depth")]
    pub depth: usize,
    /// Tags emphasized in group labels
    #[serde(default = "default_priority_tags")]
    pub priority_tags: Vec<String>,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub header: HeaderKeywords,
}

fn default_pattern() -> String {
    "*.fits".to_string()
}

fn default_depth() -> usize {
    2
}

fn default_priority_tags() -> Vec<String> {
    DEFAULT_PRIORITY_TAGS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pattern: default_pattern(),
            depth: default_depth(),
            priority_tags: default_priority_tags(),
            theme: Theme::default(),
            header: HeaderKeywords::default(),
        }
    }
}

impl Config {
    /// Load a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let context = format!("loading {}", path.display());
        let content = std::fs::read_to_string(path)
            .map_err(TreeError::from)
            .context(context.as_str())?;
        let config: Config = serde_json::from_str(&content)
            .map_err(TreeError::from)
            .context(context.as_str())?;
        config.validate()?;
        Ok(config)
    }

    /// Locate the configuration that applies to `dir`
    ///
    /// The per-directory file wins over the user-global one.
    pub fn locate(dir: &Path) -> Option<PathBuf> {
        let local = dir.join(CONFIG_FILE_NAME);
        if local.is_file() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|d| d.join("exptree").join("config.json"))
            .filter(|p| p.is_file())
    }

    fn validate(&self) -> Result<()> {
        if self.pattern.trim().is_empty() {
            return Err(TreeError::invalid_config("pattern must not be empty"));
        }
        if self.header.observation_id.is_empty() || self.header.exposure_time.is_empty() {
            return Err(TreeError::invalid_config("header keywords must not be empty"));
        }
        Ok(())
    }
}
