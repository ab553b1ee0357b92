use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::platform;

/// Environment variables that take precedence over the `[credentials]` table.
pub const CLIENT_ID_ENV: &str = "MARQUEE_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "MARQUEE_CLIENT_SECRET";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Which feed the panel shows.
    #[serde(default)]
    pub source: SourceKind,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub transit: TransitConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Currently playing track, album art as thumbnail.
    #[default]
    Playback,
    /// Next departures at one stop.
    Transit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_status_url")]
    pub status_url: String,
    /// Edge length of the image variant picked from the status payload.
    #[serde(default = "default_image_size")]
    pub image_size: u32,
}

/// OAuth client identity used for the refresh grant. Opaque to the daemon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// JSON file holding the access/refresh token pair.
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,
    /// Append-only failure log, one `component: message` line per failure.
    #[serde(default = "default_error_log")]
    pub error_log: PathBuf,
    /// Optional 32x32 image shown when no thumbnail is available.
    #[serde(default)]
    pub placeholder_image: Option<PathBuf>,
    /// Raw RGB565 framebuffer the panel is driven through.
    #[serde(default = "default_framebuffer")]
    pub framebuffer: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Delay between scroll frames.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Delay before retrying after a failed or inactive refresh cycle.
    #[serde(default = "default_retry_ms")]
    pub retry_ms: u64,
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Minimum marquee length and separator width, in characters.
    #[serde(default = "default_spacer")]
    pub spacer: usize,
    /// Sample picked from each 2x2 block when downsampling, as `[x, y]`.
    #[serde(default)]
    pub corner: [u8; 2],
    #[serde(default = "default_text_color")]
    pub text_color: u32,
    #[serde(default)]
    pub background_color: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Below this much available memory the daemon blanks the panel and exits
    /// for a restart.
    #[serde(default = "default_floor_kib")]
    pub floor_kib: u64,
}

/// Departures feed (Transiter-style stop and route endpoints).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitConfig {
    #[serde(default = "default_stop_url")]
    pub stop_url: String,
    /// Route whose alert list drives the alert marker.
    #[serde(default = "default_route_url")]
    pub route_url: String,
    /// Headsigns to keep, compared case-insensitively.
    #[serde(default = "default_directions")]
    pub directions: Vec<String>,
    /// UTC hour the panel turns on.
    #[serde(default = "default_on_hour")]
    pub on_hour: u32,
    /// UTC hour the panel turns off.
    #[serde(default = "default_off_hour")]
    pub off_hour: u32,
}

impl Default for TransitConfig {
    fn default() -> Self {
        Self {
            stop_url: default_stop_url(),
            route_url: default_route_url(),
            directions: default_directions(),
            on_hour: default_on_hour(),
            off_hour: default_off_hour(),
        }
    }
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            token_url: default_token_url(),
            status_url: default_status_url(),
            image_size: default_image_size(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            token_file: default_token_file(),
            error_log: default_error_log(),
            placeholder_image: None,
            framebuffer: default_framebuffer(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            retry_ms: default_retry_ms(),
            http_timeout_ms: default_http_timeout_ms(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            spacer: default_spacer(),
            corner: [0, 0],
            text_color: default_text_color(),
            background_color: 0x000000,
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            floor_kib: default_floor_kib(),
        }
    }
}

fn default_token_url() -> String {
    "https://accounts.spotify.com/api/token".to_string()
}

fn default_status_url() -> String {
    "https://api.spotify.com/v1/me/player/currently-playing".to_string()
}

fn default_image_size() -> u32 {
    64
}

fn default_token_file() -> PathBuf {
    platform::data_dir().join("tokens.json")
}

fn default_error_log() -> PathBuf {
    platform::data_dir().join("errors.txt")
}

fn default_framebuffer() -> PathBuf {
    PathBuf::from("/dev/fb0")
}

fn default_stop_url() -> String {
    "https://demo.transiter.dev/systems/us-ny-subway/stops/Q04?skip_service_maps=true&skip_alerts=true&skip_transfers=true".to_string()
}

fn default_route_url() -> String {
    "https://demo.transiter.dev/systems/us-ny-subway/routes/Q?skip_service_maps=true&skip_estimated_headways=true".to_string()
}

fn default_directions() -> Vec<String> {
    ["downtown and brooklyn", "downtown", "brooklyn"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_on_hour() -> u32 {
    12
}

fn default_off_hour() -> u32 {
    3
}

fn default_tick_ms() -> u64 {
    60
}

fn default_retry_ms() -> u64 {
    5_000
}

fn default_http_timeout_ms() -> u64 {
    10_000
}

fn default_spacer() -> usize {
    5
}

fn default_text_color() -> u32 {
    0x919492
}

fn default_floor_kib() -> u64 {
    4_096
}

impl TimingConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn retry(&self) -> Duration {
        Duration::from_millis(self.retry_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }
}

impl CredentialsConfig {
    /// Client id and secret, preferring the environment over the file.
    pub fn resolve(&self) -> (String, String) {
        let id = std::env::var(CLIENT_ID_ENV).unwrap_or_else(|_| self.client_id.clone());
        let secret =
            std::env::var(CLIENT_SECRET_ENV).unwrap_or_else(|_| self.client_secret.clone());
        (id, secret)
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save_to(&config_path)?;
            return Ok(config);
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.display.corner.iter().any(|&c| c > 1) {
            anyhow::bail!(
                "display.corner must be 0 or 1 on each axis, got {:?}",
                self.display.corner
            );
        }
        if self.transit.on_hour > 23 || self.transit.off_hour > 23 {
            anyhow::bail!(
                "transit.on_hour and transit.off_hour must be 0-23, got {} and {}",
                self.transit.on_hour,
                self.transit.off_hour
            );
        }
        if self.display.spacer == 0 {
            anyhow::bail!("display.spacer must be at least 1");
        }
        if self.timing.tick_ms >= self.timing.retry_ms {
            tracing::warn!(
                "timing.tick_ms ({}) is not shorter than timing.retry_ms ({})",
                self.timing.tick_ms,
                self.timing.retry_ms
            );
        }
        Ok(())
    }
}
