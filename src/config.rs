//! Configuration types for the config-driven driver tool.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct ApplyToolConfig {
    #[serde(rename = "input")]
    pub input: PathBuf,
    #[serde(rename = "output")]
    pub output: PathBuf,
    #[serde(default)]
    pub slicing: SlicingConfig,
    pub filter: FilterConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SlicingConfig {
    /// Axis to slice along. Omitted, the last dimension is used.
    pub axis: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterConfig {
    Identity,
    BoxMean { radius: usize },
    Median { radius: usize },
    AddRescale {
        #[serde(default)]
        out_min: u8,
        #[serde(default = "default_out_max")]
        out_max: u8,
    },
}

fn default_out_max() -> u8 {
    255
}

pub fn load_config(path: &Path) -> Result<ApplyToolConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}
