use serde::{Deserialize, Serialize};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub playback: PlaybackConfig,
    pub flags: FlagConfig,
}

/// Configuration for the playback lifecycle controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Delay before the one-shot autoplay trigger fires on non-mobile
    /// devices.
    pub autoplay_delay_seconds: f64,
    /// Default audio source when none is given on the command line.
    pub source_url: String,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            autoplay_delay_seconds: 2.101,
            source_url: "assets/florecer/source.mus".to_string(),
        }
    }
}

/// Configuration for the feature-flag collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagConfig {
    /// Snapshot endpoint, fetched at most once per session.
    pub endpoint: String,
}

impl Default for FlagConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://flags.example.net/v1/snapshot".to_string(),
        }
    }
}
