//! Configuration loading and parsing
//!
//! Batch decode jobs are described in a TOML file: which signal set
//! catalogs to load, which response transcripts to decode, and how.

use anyhow::{Context, Result};
use obd_decoder::{CanIdFormat, MidMessagePolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from a job.toml)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub input: InputConfig,
    pub vehicle: VehicleConfig,
    #[serde(default)]
    pub decode: DecodeConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    /// Response transcript files to decode
    pub responses: Vec<PathBuf>,
    /// Signal set catalog files to load
    pub signalsets: Vec<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VehicleConfig {
    /// Model year used to resolve the signal set
    pub model_year: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DecodeConfig {
    /// Arbitration ID format of the transcripts
    #[serde(default = "default_id_format")]
    pub id_format: CanIdFormat,
    /// Policy for a First/Single frame arriving mid-collection
    #[serde(default)]
    pub mid_message_policy: MidMessagePolicy,
    /// Optional: only decode these response arbitration IDs
    #[serde(default)]
    pub response_filter: Option<Vec<u32>>,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            id_format: default_id_format(),
            mid_message_policy: MidMessagePolicy::default(),
            response_filter: None,
        }
    }
}

fn default_id_format() -> CanIdFormat {
    CanIdFormat::ElevenBit
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Output file (stdout when absent)
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}
