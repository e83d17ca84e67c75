// VSI Sensor - Virtual Streaming Interface Peripheral Emulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Data file the sensor input replays when no manifest overrides it.
pub const DEFAULT_DATA_FILE: &str = "intdata.txt";

/// Default schema version for YAML configs
fn default_schema_version() -> String {
    "1.0".to_string()
}

fn default_name() -> String {
    "vsi0".to_string()
}

fn default_data_file() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_FILE)
}

fn default_block_num() -> u32 {
    1
}

/// Stream parameters the firmware driver programs into the peripheral.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StreamConfig {
    pub channels: u32,
    pub sample_bits: u32,
    pub sample_rate: u32,
    pub block_size: String, // e.g. "256B"
    #[serde(default = "default_block_num")]
    pub block_num: u32,
}

impl StreamConfig {
    /// DMA block size in bytes.
    pub fn block_size_bytes(&self) -> Result<u32> {
        let bytes = parse_size(&self.block_size)
            .with_context(|| format!("Invalid stream block_size '{}'", self.block_size))?;
        u32::try_from(bytes)
            .with_context(|| format!("Stream block_size {} does not fit in 32 bits", bytes))
    }
}

/// Manifest describing one VSI sensor input instance.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct VsiConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    #[serde(default = "default_name")]
    pub name: String,
    /// Text capture opened on every receiver enable.
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
    #[serde(default)]
    pub stream: Option<StreamConfig>,
}

impl Default for VsiConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            name: default_name(),
            data_file: default_data_file(),
            stream: None,
        }
    }
}

impl VsiConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).context("Failed to parse VSI config YAML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = std::fs::File::open(&path)
            .with_context(|| format!("Failed to open VSI config at {:?}", path.as_ref()))?;
        let config: Self = serde_yaml::from_reader(f).context("Failed to parse VSI config YAML")?;
        config.validate()?;
        tracing::debug!(
            "Loaded VSI config '{}' (data file {:?})",
            config.name,
            config.data_file
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema_version != "1.0" {
            anyhow::bail!(
                "Unsupported schema_version '{}'. Supported versions: '1.0'",
                self.schema_version
            );
        }

        if self.data_file.as_os_str().is_empty() {
            anyhow::bail!("'data_file' path cannot be empty");
        }

        if let Some(stream) = &self.stream {
            if stream.block_size_bytes()? == 0 {
                anyhow::bail!("Stream 'block_size' must be greater than zero");
            }
        }

        Ok(())
    }
}

/// Parses a human readable size into a whole number of bytes.
pub fn parse_size(size_str: &str) -> Result<u64> {
    use human_size::{Byte, Size};
    let size: Size = size_str
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid size format: {}", e))?;
    let bytes = size.into::<Byte>().value();
    if bytes < 0.0 || bytes.fract() != 0.0 {
        anyhow::bail!("Size '{}' is not a whole number of bytes", size_str);
    }
    Ok(bytes as u64)
}
