use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Serial port of the unit, e.g. `/dev/ttyUSB0` or `COM3`.
    pub port: Option<String>,

    #[serde(default = "default_baud")]
    pub baud: u32,

    #[serde(default)]
    pub speech: SpeechConfig,

    #[serde(default)]
    pub harness: HarnessConfig,

    #[serde(default)]
    pub audio: AudioConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Recognition service endpoint; unset disables recognition.
    pub url: Option<String>,

    /// Raw 16-bit mono PCM source, a file or a FIFO fed by an external
    /// recorder; unset disables capture.
    pub capture: Option<PathBuf>,

    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct HarnessConfig {
    #[serde(default = "default_event_timeout")]
    pub event_timeout_s: f32,

    #[serde(default = "default_settle")]
    pub settle_s: f32,

    #[serde(default = "default_probe_polls")]
    pub probe_polls: u32,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default)]
    pub disable_cues: bool,
}

impl Config {
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .wrap_err_with(|| format!("Failed to read config file {path}"))?;

        serde_yaml::from_str(&contents).wrap_err("Failed to parse config file")
    }

    /// A missing file falls back to defaults so commands run config-free.
    pub async fn load_or_default(path: &str) -> Result<Self> {
        match Path::new(path).exists() {
            true => Self::load(path).await,
            false => {
                tracing::debug!("No config file at {path}, using defaults");
                Ok(Self::default())
            }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: None,
            baud: default_baud(),
            speech: SpeechConfig::default(),
            harness: HarnessConfig::default(),
            audio: AudioConfig::default(),
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        SpeechConfig {
            url: None,
            capture: None,
            sample_rate: default_sample_rate(),
        }
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfig {
            event_timeout_s: default_event_timeout(),
            settle_s: default_settle(),
            probe_polls: default_probe_polls(),
        }
    }
}

const fn default_baud() -> u32 {
    9600
}

const fn default_sample_rate() -> u32 {
    44_100
}

const fn default_event_timeout() -> f32 {
    10.
}

const fn default_settle() -> f32 {
    1.
}

const fn default_probe_polls() -> u32 {
    10
}
