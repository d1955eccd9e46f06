use crate::batch::BatchLimits;
use crate::checks::ProbeConfig;
use crate::humanize::ByteSize;
use crate::render::RenderLimits;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub style: StyleConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub url_check: UrlCheckConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Largest accepted request body (logos, CSV files, images to decode)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: ByteSize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, 7860))
}

fn default_max_upload_bytes() -> ByteSize {
    ByteSize::mib(10)
}

/// Rendering bounds and defaults
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StyleConfig {
    #[serde(default = "default_min_size")]
    pub min_size: u32,
    #[serde(default = "default_max_size")]
    pub max_size: u32,
    #[serde(default = "default_size")]
    pub default_size: u32,
    #[serde(default = "default_logo_scale")]
    pub default_logo_scale: f32,
    #[serde(default = "default_max_logo_scale")]
    pub max_logo_scale: f32,
    #[serde(default = "default_caption_max_chars")]
    pub caption_max_chars: usize,
    /// TTF/OTF used for frame captions; system fonts are probed when unset
    #[serde(default)]
    pub font_path: Option<PathBuf>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            min_size: default_min_size(),
            max_size: default_max_size(),
            default_size: default_size(),
            default_logo_scale: default_logo_scale(),
            max_logo_scale: default_max_logo_scale(),
            caption_max_chars: default_caption_max_chars(),
            font_path: None,
        }
    }
}

impl StyleConfig {
    pub fn render_limits(&self) -> RenderLimits {
        RenderLimits {
            min_size: self.min_size,
            max_size: self.max_size,
            max_logo_scale: self.max_logo_scale,
            caption_max_chars: self.caption_max_chars,
        }
    }
}

fn default_min_size() -> u32 {
    300
}

fn default_max_size() -> u32 {
    2400
}

fn default_size() -> u32 {
    600
}

fn default_logo_scale() -> f32 {
    0.18
}

fn default_max_logo_scale() -> f32 {
    0.25
}

fn default_caption_max_chars() -> usize {
    40
}

/// Batch generation limits
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchConfig {
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
    #[serde(default = "default_tile_size")]
    pub tile_size: u32,
    #[serde(default = "default_gallery_columns")]
    pub gallery_columns: u32,
    #[serde(default = "default_gallery_gap")]
    pub gallery_gap: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_rows: default_max_rows(),
            tile_size: default_tile_size(),
            gallery_columns: default_gallery_columns(),
            gallery_gap: default_gallery_gap(),
        }
    }
}

impl BatchConfig {
    pub fn limits(&self) -> BatchLimits {
        BatchLimits {
            max_rows: self.max_rows,
            tile_size: self.tile_size,
            gallery_columns: self.gallery_columns,
            gallery_gap: self.gallery_gap,
        }
    }
}

fn default_max_rows() -> usize {
    100
}

fn default_tile_size() -> u32 {
    600
}

fn default_gallery_columns() -> u32 {
    3
}

fn default_gallery_gap() -> u32 {
    20
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HistoryConfig {
    #[serde(default = "default_history_capacity")]
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_history_capacity(),
        }
    }
}

fn default_history_capacity() -> usize {
    crate::history::DEFAULT_CAPACITY
}

/// Reachability probe settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UrlCheckConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for UrlCheckConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl UrlCheckConfig {
    pub fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            user_agent: self.user_agent.clone(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_user_agent() -> String {
    ProbeConfig::default().user_agent
}
