//! QR detection in uploaded images.

mod rqrr_backend;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma};
use serde::Serialize;
use thiserror::Error;

use crate::content::{Fields, QrContent, QrKind};

pub use rqrr_backend::RqrrDecoder;

/// Larger uploads are downscaled before detection.
const MAX_SCAN_SIDE: u32 = 2000;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("image could not be read: {0}")]
    Unreadable(#[from] image::ImageError),

    #[error("no QR code found in image")]
    NoSymbol,

    #[error("QR code found but could not be decoded: {0}")]
    Corrupt(String),
}

/// Detection backend.
pub trait SymbolDecoder: Send + Sync {
    /// Every symbol located in `image`, decoded text or the reason it failed.
    fn scan(&self, image: &GrayImage) -> Vec<Result<String, String>>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedSymbol {
    pub text: String,
    pub kind: QrKind,
    pub fields: Fields,
}

impl DecodedSymbol {
    fn from_text(text: String) -> Self {
        let content = QrContent::parse(&text);
        Self {
            kind: content.kind(),
            fields: content.to_fields(),
            text,
        }
    }
}

pub fn decode_image(
    decoder: &dyn SymbolDecoder,
    bytes: &[u8],
) -> Result<Vec<DecodedSymbol>, DecodeError> {
    let image = image::load_from_memory(bytes)?;
    let gray = prepare(&image);

    let results = decoder.scan(&gray);
    if results.is_empty() {
        return Err(DecodeError::NoSymbol);
    }

    let mut failures = Vec::new();
    let mut symbols = Vec::new();
    for result in results {
        match result {
            Ok(text) => symbols.push(DecodedSymbol::from_text(text)),
            Err(reason) => failures.push(reason),
        }
    }

    if symbols.is_empty() {
        return Err(DecodeError::Corrupt(failures.join("; ")));
    }
    if !failures.is_empty() {
        tracing::debug!(failed = failures.len(), decoded = symbols.len(), "Some symbols failed to decode");
    }

    Ok(symbols)
}

/// Greyscale over white, downscaled to at most [`MAX_SCAN_SIDE`].
fn prepare(image: &DynamicImage) -> GrayImage {
    let rgba = image.to_rgba8();
    let (w, h) = rgba.dimensions();
    let mut gray = GrayImage::new(w, h);

    for (x, y, px) in rgba.enumerate_pixels() {
        let [r, g, b, a] = px.0;
        let luma = (r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000;
        let a = a as u32;
        let composited = (luma * a + 255 * (255 - a)) / 255;
        gray.put_pixel(x, y, Luma([composited as u8]));
    }

    let longest = w.max(h);
    if longest > MAX_SCAN_SIDE {
        let ratio = MAX_SCAN_SIDE as f32 / longest as f32;
        let nw = ((w as f32 * ratio).round() as u32).max(1);
        let nh = ((h as f32 * ratio).round() as u32).max(1);
        gray = imageops::resize(&gray, nw, nh, FilterType::Triangle);
    }

    gray
}
