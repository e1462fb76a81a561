// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration module.
//!
//! Handles loading and saving application settings.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::bluetooth::constants::{limits, DEFAULT_DEVICE_ADDRESS};
use crate::bluetooth::{FrameMode, FrameReader};
use crate::chart::DEFAULT_LABEL;

const APP_DIR: &str = "countchart";

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Data directory for the record store.
    #[serde(skip)]
    pub data_dir: PathBuf,

    /// Bluetooth settings.
    pub bluetooth: BluetoothConfig,

    /// Read loop settings.
    pub reader: ReaderConfig,

    /// Chart settings.
    pub chart: ChartConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BluetoothConfig {
    /// Address of the remote SPP device.
    pub device_address: String,

    /// Seconds allowed for the RFCOMM handshake.
    pub connect_timeout_secs: u64,
}

impl Default for BluetoothConfig {
    fn default() -> Self {
        Self {
            device_address: DEFAULT_DEVICE_ADDRESS.to_string(),
            connect_timeout_secs: limits::CONNECT_TIMEOUT_SECS,
        }
    }
}

impl BluetoothConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Bytes requested per read.
    pub chunk_size: usize,

    /// "chunk" or "reassemble".
    pub frame_mode: FrameMode,

    /// Buffer limit in reassemble mode.
    pub max_frame_bytes: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            chunk_size: limits::READ_CHUNK_SIZE,
            frame_mode: FrameMode::Chunk,
            max_frame_bytes: limits::MAX_FRAME_BYTES,
        }
    }
}

impl ReaderConfig {
    /// Build a frame reader from these settings.
    pub fn frame_reader(&self) -> FrameReader {
        FrameReader::with_mode(self.frame_mode, self.chunk_size, self.max_frame_bytes)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Data set label shown under the chart.
    pub label: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            label: DEFAULT_LABEL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file or create default.
    pub fn load() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);

        Self::load_from(&config_dir, data_dir)
    }

    /// Load `config.toml` from `config_dir`, writing defaults if it is missing.
    pub fn load_from(config_dir: &Path, data_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(config_dir)?;

        let config_path = config_dir.join("config.toml");

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            let config = Self::default();
            let content = toml::to_string_pretty(&config)?;
            std::fs::write(&config_path, content)?;
            config
        };

        config.data_dir = data_dir;
        std::fs::create_dir_all(&config.data_dir)?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_creates_default_file() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_dir = temp_dir.path().join("config");
        let data_dir = temp_dir.path().join("data");

        let config = Config::load_from(&config_dir, data_dir.clone())?;

        assert!(config_dir.join("config.toml").exists());
        assert!(data_dir.exists());
        assert_eq!(config.bluetooth.device_address, DEFAULT_DEVICE_ADDRESS);
        assert_eq!(config.reader.chunk_size, 1024);
        assert_eq!(config.reader.frame_mode, FrameMode::Chunk);
        assert_eq!(config.chart.label, "Count per Minute");

        Ok(())
    }

    #[test]
    fn test_partial_file_uses_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        std::fs::write(
            temp_dir.path().join("config.toml"),
            "[bluetooth]\ndevice_address = \"00:11:22:33:44:55\"\n\n[reader]\nframe_mode = \"reassemble\"\n",
        )?;

        let config = Config::load_from(temp_dir.path(), temp_dir.path().join("data"))?;

        assert_eq!(config.bluetooth.device_address, "00:11:22:33:44:55");
        assert_eq!(config.bluetooth.connect_timeout_secs, 20);
        assert_eq!(config.reader.frame_mode, FrameMode::Reassemble);
        assert_eq!(config.reader.max_frame_bytes, 64 * 1024);

        Ok(())
    }
}
