// Configuration management for Carillon

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::melody::{BellMap, DensityBasis, Reduction, TrackSelection};
use crate::midi::DEFAULT_TEMPO_US;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub extraction: ExtractionConfig,

    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// Melody extraction settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExtractionConfig {
    /// How melody-bearing tracks are chosen
    pub track_selection: TrackSelection,

    /// Upper bound on the number of track clusters
    pub max_clusters: usize,

    /// Grid slots per quarter note (8 = thirty-second notes)
    pub grid_divisions_per_quarter: u16,

    /// Minimum silence between the end of one bell and the next strike
    pub min_gap_ms: u64,

    /// Minimum ring time of a bell
    pub min_duration_ms: u64,

    /// Tempo used when the file has none (microseconds per quarter note)
    pub default_tempo_us: u32,

    /// Denominator of the note density feature
    pub density_basis: DensityBasis,

    /// How simultaneous notes are collapsed
    pub reduction: Reduction,

    /// Available bells
    pub bells: BellMap,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            track_selection: TrackSelection::default(),
            max_clusters: 3,
            grid_divisions_per_quarter: 8,
            min_gap_ms: 250,
            min_duration_ms: 300,
            default_tempo_us: DEFAULT_TEMPO_US,
            density_basis: DensityBasis::default(),
            reduction: Reduction::default(),
            bells: BellMap::default(),
        }
    }
}

/// How strikes are scheduled during playback
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackDiscipline {
    /// Wait for each bell's ring time before the next delay
    #[default]
    Sequential,
    /// Strike without waiting for the ring; wait once for the last ring at the end
    Overlapped,
}

/// Bell playback settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlaybackConfig {
    pub discipline: PlaybackDiscipline,

    /// Pause used in place of a bell whose sample is missing
    pub missing_sample_pause_ms: u64,

    /// Bell name -> WAV file
    pub samples: BTreeMap<String, PathBuf>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            discipline: PlaybackDiscipline::default(),
            missing_sample_pause_ms: 300,
            samples: BTreeMap::new(),
        }
    }
}

/// HTTP upload server settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,

    /// Largest accepted request body
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
            max_upload_bytes: 8 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Load config from disk or return default
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);

        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(contents) => {
                    match toml::from_str(&contents) {
                        Ok(config) => return config,
                        Err(e) => {
                            log::warn!("Failed to parse config {}: {}", config_path.display(), e);
                        }
                    }
                }
                Err(e) => {
                    log::warn!("Failed to read config file {}: {}", config_path.display(), e);
                }
            }
        }

        Self::default()
    }

    /// Save config to disk
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;

        Ok(())
    }
}

/// Get the default config file path
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("carillon")
        .join("config.toml")
}
