use ab_glyph::{FontVec, PxScale};
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use qrcode::types::QrError;
use qrcode::{Color, QrCode, Version};
use std::path::Path;
use thiserror::Error;

use super::style::{ErrorCorrection, FrameKind, HexColor, Logo, ModuleShape, RenderLimits, StyleError, StyleOptions};

/// Blank modules around the symbol, always part of the rendered square.
pub const QUIET_ZONE: u32 = 4;

/// Probed in order when no font is configured.
const FALLBACK_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Style(#[from] StyleError),

    #[error("payload cannot be encoded: {0}")]
    Encode(QrError),

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

#[derive(Debug, Clone)]
pub struct RenderedQr {
    pub image: RgbaImage,
    /// Level the symbol was encoded with.
    pub error_correction: ErrorCorrection,
    /// True when a logo forced a higher level than requested.
    pub upgraded: bool,
    pub version: i16,
}

/// Turns payloads into styled raster images.
pub struct Renderer {
    limits: RenderLimits,
    font: Option<FontVec>,
}

impl Renderer {
    pub fn new(limits: RenderLimits, font: Option<FontVec>) -> Self {
        Self { limits, font }
    }

    pub fn limits(&self) -> &RenderLimits {
        &self.limits
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Loads the caption font from `path`, or from well-known system locations.
    pub fn load_font(path: Option<&Path>) -> Option<FontVec> {
        let candidates: Vec<&Path> = match path {
            Some(path) => vec![path],
            None => FALLBACK_FONTS.iter().map(Path::new).collect(),
        };

        for candidate in candidates {
            let bytes = match std::fs::read(candidate) {
                Ok(bytes) => bytes,
                Err(e) => {
                    if path.is_some() {
                        tracing::warn!(path = %candidate.display(), error = %e, "Cannot read caption font");
                    }
                    continue;
                }
            };
            match FontVec::try_from_vec(bytes) {
                Ok(font) => {
                    tracing::info!(path = %candidate.display(), "Loaded caption font");
                    return Some(font);
                }
                Err(e) => {
                    tracing::warn!(path = %candidate.display(), error = %e, "Invalid caption font");
                }
            }
        }

        tracing::warn!("No caption font available; frame captions will be left blank");
        None
    }

    pub fn render(&self, payload: &str, style: &StyleOptions) -> Result<RenderedQr, RenderError> {
        style.validate(&self.limits)?;

        let level = style.effective_error_correction();
        let upgraded = level != style.error_correction;
        if upgraded {
            tracing::debug!(requested = ?style.error_correction, effective = ?level, "Raised error correction for logo");
        }

        let code = QrCode::with_error_correction_level(payload.as_bytes(), level.into())
            .map_err(RenderError::Encode)?;
        let version = match code.version() {
            Version::Normal(v) | Version::Micro(v) => v,
        };

        let mask = module_mask(&code, style.module_shape, style.size);
        let mut image = colorize(&mask, style);

        if let Some(logo) = &style.logo {
            place_logo(&mut image, logo, style.bg);
        }

        if style.frame.is_visible() {
            image = self.apply_frame(image, style);
        }

        Ok(RenderedQr {
            image,
            error_correction: level,
            upgraded,
            version,
        })
    }

    /// Draws the frame outside the symbol and the caption in a band below it.
    fn apply_frame(&self, symbol: RgbaImage, style: &StyleOptions) -> RgbaImage {
        let size = symbol.width();
        let caption = style.frame.text.trim();
        let border = match style.frame.kind {
            FrameKind::None => 0,
            FrameKind::Simple | FrameKind::Rounded => (size / 40).max(4),
        };
        let band = if caption.is_empty() { 0 } else { (size / 8).max(24) };
        let frame_color = style.frame.color.unwrap_or(style.fg);

        let (w, h) = (size + 2 * border, size + 2 * border + band);
        let mut canvas = RgbaImage::from_pixel(w, h, style.bg.rgba());
        match style.frame.kind {
            FrameKind::None => {}
            FrameKind::Simple => {
                draw_filled_rect_mut(&mut canvas, Rect::at(0, 0).of_size(w, h), frame_color.rgba());
            }
            FrameKind::Rounded => {
                fill_rounded_rect(&mut canvas, w, h, border * 3, frame_color.rgba());
            }
        }
        imageops::replace(&mut canvas, &symbol, border as i64, border as i64);

        if band > 0 {
            let text_color = match style.frame.kind {
                FrameKind::None => style.fg,
                _ => style.bg,
            };
            self.draw_caption(&mut canvas, caption, border + size, band, border, text_color);
        }

        canvas
    }

    fn draw_caption(
        &self,
        canvas: &mut RgbaImage,
        caption: &str,
        top: u32,
        band: u32,
        inset: u32,
        color: HexColor,
    ) {
        let Some(font) = &self.font else {
            tracing::warn!(caption, "Caption requested but no font is loaded");
            return;
        };

        let available = canvas.width().saturating_sub(2 * inset + band / 4).max(1);
        let mut scale = PxScale::from(band as f32 * 0.6);
        let (mut tw, mut th) = text_size(scale, font, caption);
        if tw > available {
            let shrink = available as f32 / tw as f32;
            scale = PxScale::from(scale.x * shrink);
            (tw, th) = text_size(scale, font, caption);
        }

        let x = canvas.width().saturating_sub(tw) / 2;
        let y = top + band.saturating_sub(th) / 2;
        draw_text_mut(canvas, color.rgba(), x as i32, y as i32, scale, font, caption);
    }
}

/// Coverage mask of dark modules at `size` x `size`, quiet zone included.
fn module_mask(code: &QrCode, shape: ModuleShape, size: u32) -> GrayImage {
    let width = code.width();
    let total = width as u32 + 2 * QUIET_ZONE;
    // Supersampled at roughly twice the target, even module size.
    let mut m = ((size * 2) / total).max(4);
    m += m % 2;
    let canvas_side = m * total;
    let mut canvas = GrayImage::new(canvas_side, canvas_side);
    let on = Luma([255u8]);

    let dark = |x: i64, y: i64| -> bool {
        x >= 0
            && y >= 0
            && (x as usize) < width
            && (y as usize) < width
            && code[(x as usize, y as usize)] == Color::Dark
    };

    for y in 0..width as i64 {
        for x in 0..width as i64 {
            if !dark(x, y) {
                continue;
            }
            let x0 = ((x as u32 + QUIET_ZONE) * m) as i32;
            let y0 = ((y as u32 + QUIET_ZONE) * m) as i32;
            let half = (m / 2) as i32;

            let shape = if is_finder(x as usize, y as usize, width) && shape != ModuleShape::Rounded {
                ModuleShape::Square
            } else {
                shape
            };

            match shape {
                ModuleShape::Square => {
                    draw_filled_rect_mut(&mut canvas, Rect::at(x0, y0).of_size(m, m), on);
                }
                ModuleShape::Gapped => {
                    let gap = (m / 8).max(1);
                    draw_filled_rect_mut(
                        &mut canvas,
                        Rect::at(x0 + gap as i32, y0 + gap as i32).of_size(m - 2 * gap, m - 2 * gap),
                        on,
                    );
                }
                ModuleShape::Circle => {
                    let radius = (m as i32 * 9) / 20;
                    draw_filled_circle_mut(&mut canvas, (x0 + half, y0 + half), radius, on);
                }
                ModuleShape::Rounded => {
                    draw_filled_circle_mut(&mut canvas, (x0 + half, y0 + half), half - 1, on);
                    let (up, down) = (dark(x, y - 1), dark(x, y + 1));
                    let (left, right) = (dark(x - 1, y), dark(x + 1, y));
                    let quadrants = [
                        (up || left, x0, y0),
                        (up || right, x0 + half, y0),
                        (down || left, x0, y0 + half),
                        (down || right, x0 + half, y0 + half),
                    ];
                    for (square, qx, qy) in quadrants {
                        // A corner stays square unless both neighbours touching it are light.
                        if square {
                            draw_filled_rect_mut(&mut canvas, Rect::at(qx, qy).of_size(m / 2, m / 2), on);
                        }
                    }
                }
            }
        }
    }

    imageops::resize(&canvas, size, size, FilterType::Lanczos3)
}

/// The three 7x7 position markers.
fn is_finder(x: usize, y: usize, width: usize) -> bool {
    let near = |v: usize| v < 7;
    let far = |v: usize| v + 7 >= width;
    (near(x) && near(y)) || (far(x) && near(y)) || (near(x) && far(y))
}

fn colorize(mask: &GrayImage, style: &StyleOptions) -> RgbaImage {
    let (w, h) = mask.dimensions();
    let bg = style.bg.rgba();
    let mut out = RgbaImage::from_pixel(w, h, bg);

    for (x, y, px) in out.enumerate_pixels_mut() {
        let coverage = mask.get_pixel(x, y).0[0];
        if coverage == 0 {
            continue;
        }
        let fg = match &style.gradient {
            Some(gradient) => gradient.color_at(x, y, w, h),
            None => style.fg.rgba(),
        };
        *px = blend(bg, fg, coverage);
    }

    out
}

fn blend(bg: Rgba<u8>, fg: Rgba<u8>, coverage: u8) -> Rgba<u8> {
    let a = coverage as u32;
    let mix = |b: u8, f: u8| ((b as u32 * (255 - a) + f as u32 * a + 127) / 255) as u8;
    Rgba([mix(bg[0], fg[0]), mix(bg[1], fg[1]), mix(bg[2], fg[2]), 255])
}

/// Centers the logo on a padded plate in the background color.
fn place_logo(image: &mut RgbaImage, logo: &Logo, plate: HexColor) {
    let size = image.width();
    let side = ((size as f32 * logo.scale).round() as u32).max(1);
    let pad = (side / 10).max(4);
    let plate_side = side + 2 * pad;
    let origin = size.saturating_sub(plate_side) / 2;

    draw_filled_rect_mut(
        image,
        Rect::at(origin as i32, origin as i32).of_size(plate_side, plate_side),
        plate.rgba(),
    );

    let fitted = logo.image.resize_to_fill(side, side, FilterType::Lanczos3).to_rgba8();
    imageops::overlay(image, &fitted, (origin + pad) as i64, (origin + pad) as i64);
}

fn fill_rounded_rect(canvas: &mut RgbaImage, w: u32, h: u32, radius: u32, color: Rgba<u8>) {
    let r = radius.min(w / 2).min(h / 2);
    if r == 0 {
        draw_filled_rect_mut(canvas, Rect::at(0, 0).of_size(w, h), color);
        return;
    }

    if w > 2 * r {
        draw_filled_rect_mut(canvas, Rect::at(r as i32, 0).of_size(w - 2 * r, h), color);
    }
    if h > 2 * r {
        draw_filled_rect_mut(canvas, Rect::at(0, r as i32).of_size(w, h - 2 * r), color);
    }

    let (r, w, h) = (r as i32, w as i32, h as i32);
    for (cx, cy) in [(r, r), (w - r - 1, r), (r, h - r - 1), (w - r - 1, h - r - 1)] {
        draw_filled_circle_mut(canvas, (cx, cy), r, color);
    }
}
