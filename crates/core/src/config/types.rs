use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root device configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DeviceConfig {
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub readiness: ReadinessConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
}

/// Local bootstrap descriptor pointing at the coordinator service.
///
/// Field names follow the JSON file shipped with the device assets.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BootstrapConfig {
    #[serde(rename = "serverIp", alias = "serverip", default)]
    pub server_ip: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub port: String,
}

/// Accept the port as `"8080"` or `8080`; environment overrides arrive as numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Text(String),
        Number(u64),
    }

    Ok(match Port::deserialize(deserializer)? {
        Port::Text(text) => text,
        Port::Number(number) => number.to_string(),
    })
}

impl BootstrapConfig {
    /// Base URL of the coordinator service, without trailing slash.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.server_ip.trim(), self.port.trim())
    }
}

/// Where media, markers and the bootstrap descriptor live on disk
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssetsConfig {
    #[serde(default = "default_assets_root")]
    pub root: PathBuf,
    /// Bootstrap descriptor path, relative to `root`
    #[serde(default = "default_bootstrap_file")]
    pub bootstrap_file: PathBuf,
    #[serde(default = "default_videos_dir")]
    pub videos_dir: String,
    #[serde(default = "default_markers_dir")]
    pub markers_dir: String,
}

impl AssetsConfig {
    pub fn bootstrap_path(&self) -> PathBuf {
        self.root.join(&self.bootstrap_file)
    }

    /// Resolve a media reference from the experience descriptor.
    pub fn video_path(&self, media_ref: &str) -> PathBuf {
        self.root.join(&self.videos_dir).join(media_ref)
    }

    /// Resolve the reference image for a marker id.
    pub fn marker_path(&self, marker_id: &str) -> PathBuf {
        self.root.join(&self.markers_dir).join(marker_id)
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            root: default_assets_root(),
            bootstrap_file: default_bootstrap_file(),
            videos_dir: default_videos_dir(),
            markers_dir: default_markers_dir(),
        }
    }
}

fn default_assets_root() -> PathBuf {
    PathBuf::from("assets")
}

fn default_bootstrap_file() -> PathBuf {
    PathBuf::from("Configuraciones/configuracion.json")
}

fn default_videos_dir() -> String {
    "Videos".to_string()
}

fn default_markers_dir() -> String {
    "Marcadores".to_string()
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// Request timeout in seconds (default: 10)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl NetworkConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs as u64)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u32 {
    10
}

/// Retry policy for failed status polls.
///
/// The poll cadence itself is fixed; these only govern what happens when a
/// status request fails.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReadinessConfig {
    /// Consecutive failed polls tolerated before giving up.
    #[serde(default = "default_max_failures")]
    pub max_consecutive_failures: u32,

    /// Delay after the first failed poll (milliseconds). Doubles per failure.
    #[serde(default = "default_backoff_initial")]
    pub backoff_initial_ms: u64,

    /// Upper bound for the failure backoff (milliseconds).
    #[serde(default = "default_backoff_max")]
    pub backoff_max_ms: u64,

    /// Give up waiting for the start signal after this long.
    /// Unset means wait for as long as the operator takes.
    #[serde(default)]
    pub max_wait_secs: Option<u64>,
}

impl ReadinessConfig {
    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_secs.map(Duration::from_secs)
    }

    /// Backoff before the next attempt after `failures` consecutive failures.
    pub fn backoff_for(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1).min(16);
        let delay = self
            .backoff_initial_ms
            .saturating_mul(1u64 << exponent)
            .min(self.backoff_max_ms);
        Duration::from_millis(delay)
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            max_consecutive_failures: default_max_failures(),
            backoff_initial_ms: default_backoff_initial(),
            backoff_max_ms: default_backoff_max(),
            max_wait_secs: None,
        }
    }
}

fn default_max_failures() -> u32 {
    5
}

fn default_backoff_initial() -> u64 {
    250
}

fn default_backoff_max() -> u64 {
    4000
}

/// Frame loop configuration for the device runner
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackConfig {
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    /// Announce readiness as soon as the primary media is prepared,
    /// without waiting for an operator.
    #[serde(default)]
    pub auto_ready: bool,
}

impl PlaybackConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate.max(1) as f64)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            frame_rate: default_frame_rate(),
            auto_ready: false,
        }
    }
}

fn default_frame_rate() -> u32 {
    30
}
