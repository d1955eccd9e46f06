//! Request and response bodies of the JSON API.
//!
//! Generation takes a kind, its raw form fields and an optional style block:
//!
//! ```json
//! {
//!   "kind": "wifi",
//!   "fields": { "ssid": "Home", "password": "pass1234", "security": "WPA2" },
//!   "style": {
//!     "module_shape": "rounded",
//!     "fg": "#1a1a2e",
//!     "bg": "#ffffff",
//!     "gradient": { "start": "#1a1a2e", "end": "#4a4e69", "direction": "radial" },
//!     "frame": { "kind": "rounded", "text": "Scan to join" },
//!     "size": 800,
//!     "error_correction": "Q"
//!   }
//! }
//! ```
//!
//! Colors are `#rrggbb` or `#rgb`. A logo is sent as base64 or a data URL and
//! always raises error correction to H.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::batch::{BatchMode, BatchReportEntry};
use crate::content::{FieldSpec, Fields, QrKind};
use crate::decoder::DecodedSymbol;
use crate::history::{HistoryEntry, HistoryStats};
use crate::observability::MetricsSnapshot;
use crate::render::{ErrorCorrection, FrameKind, GradientDirection, ModuleShape};

#[derive(Debug, Deserialize, Clone)]
pub struct GenerateRequest {
    pub kind: QrKind,
    #[serde(default)]
    pub fields: Fields,
    #[serde(default)]
    pub style: StylePayload,
}

/// Unvalidated style block; see [`super::validation::style_options`]
#[derive(Debug, Deserialize, Clone, Default)]
pub struct StylePayload {
    #[serde(default)]
    pub module_shape: ModuleShape,
    pub fg: Option<String>,
    pub bg: Option<String>,
    pub gradient: Option<GradientPayload>,
    pub logo: Option<LogoPayload>,
    pub frame: Option<FramePayload>,
    pub size: Option<u32>,
    #[serde(default)]
    pub error_correction: ErrorCorrection,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GradientPayload {
    pub start: String,
    pub end: String,
    pub direction: GradientDirection,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogoPayload {
    /// Base64 or `data:image/...;base64,` URL
    pub image: String,
    pub scale: Option<f32>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct FramePayload {
    #[serde(default)]
    pub kind: FrameKind,
    #[serde(default)]
    pub text: String,
    pub color: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub kind: QrKind,
    pub payload: String,
    /// PNG as a `data:image/png;base64,` URL
    pub image: String,
    pub error_correction: ErrorCorrection,
    pub error_correction_upgraded: bool,
    pub version: i16,
    pub size: u32,
}

#[derive(Debug, Deserialize, Default)]
pub struct BatchQuery {
    /// `urls`, `wifi`, `vcards` or `custom`; defaults to `urls`
    pub mode: Option<String>,
    #[serde(default)]
    pub error_correction: ErrorCorrection,
    #[serde(default)]
    pub module_shape: ModuleShape,
}

#[derive(Debug, Serialize)]
pub struct BatchItemResponse {
    pub row_index: usize,
    pub payload: String,
    pub image: String,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub mode: BatchMode,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub report: Vec<BatchReportEntry>,
    pub items: Vec<BatchItemResponse>,
    /// Contact sheet of every successful row; absent when none succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gallery: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DecodeRequest {
    /// Base64 or data URL of a PNG/JPEG/GIF/BMP/WebP image
    pub image: String,
}

#[derive(Debug, Serialize)]
pub struct DecodeResponse {
    pub count: usize,
    pub symbols: Vec<DecodedSymbol>,
}

#[derive(Debug, Deserialize)]
pub struct UrlCheckRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordCheckRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct KindSchema {
    pub kind: QrKind,
    pub label: &'static str,
    pub fields: &'static [FieldSpec],
}

#[derive(Debug, Serialize)]
pub struct KindsResponse {
    pub kinds: Vec<KindSchema>,
    pub batch_modes: Vec<BatchMode>,
    pub min_size: u32,
    pub max_size: u32,
    pub default_size: u32,
    pub max_logo_scale: f32,
    pub caption_max_chars: usize,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub capacity: usize,
    pub entries: Vec<HistoryEntry>,
}

#[derive(Debug, Serialize)]
pub struct ClearHistoryResponse {
    pub removed: usize,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    #[serde(flatten)]
    pub stats: HistoryStats,
    pub counters: MetricsSnapshot,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub components: HashMap<String, String>,
    pub version: String,
}
