use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

use super::models::{FramePayload, StylePayload};
use crate::config::StyleConfig;
use crate::render::{Frame, Gradient, HexColor, Logo, StyleError, StyleOptions};

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("{field} is not valid base64: {reason}")]
    InvalidBase64 { field: &'static str, reason: String },
    #[error("{field} is not a readable image: {reason}")]
    InvalidImage { field: &'static str, reason: String },
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
}

/// Strips an optional `data:<mime>;base64,` prefix and decodes the rest
pub fn decode_base64(field: &'static str, raw: &str) -> Result<Vec<u8>, PayloadError> {
    let raw = raw.trim();
    let encoded = match raw.split_once(',') {
        Some((header, data)) if header.starts_with("data:") => data,
        _ => raw,
    };
    if encoded.is_empty() {
        return Err(PayloadError::Empty { field });
    }

    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| PayloadError::InvalidBase64 {
            field,
            reason: e.to_string(),
        })
}

/// Style block to render options, filling gaps from the configured defaults
pub fn style_options(
    payload: &StylePayload,
    defaults: &StyleConfig,
) -> Result<StyleOptions, StyleOrPayloadError> {
    let fg = parse_color(payload.fg.as_deref(), HexColor::BLACK)?;
    let bg = parse_color(payload.bg.as_deref(), HexColor::WHITE)?;

    let gradient = payload
        .gradient
        .as_ref()
        .map(|g| -> Result<Gradient, StyleError> {
            Ok(Gradient {
                start: g.start.parse()?,
                end: g.end.parse()?,
                direction: g.direction,
            })
        })
        .transpose()?;

    let logo = payload
        .logo
        .as_ref()
        .map(|l| -> Result<Logo, PayloadError> {
            let bytes = decode_base64("style.logo.image", &l.image)?;
            let image = image::load_from_memory(&bytes).map_err(|e| {
                PayloadError::InvalidImage {
                    field: "style.logo.image",
                    reason: e.to_string(),
                }
            })?;
            Ok(Logo {
                image,
                scale: l.scale.unwrap_or(defaults.default_logo_scale),
            })
        })
        .transpose()?;

    let frame = frame(payload.frame.as_ref())?;

    let options = StyleOptions {
        module_shape: payload.module_shape,
        fg,
        bg,
        gradient,
        logo,
        frame,
        size: payload.size.unwrap_or(defaults.default_size),
        error_correction: payload.error_correction,
    };
    options.validate(&defaults.render_limits())?;

    Ok(options)
}

#[derive(Debug, Error)]
pub enum StyleOrPayloadError {
    #[error(transparent)]
    Style(#[from] StyleError),
    #[error(transparent)]
    Payload(#[from] PayloadError),
}

fn parse_color(raw: Option<&str>, fallback: HexColor) -> Result<HexColor, StyleError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(fallback),
        Some(value) => value.parse(),
    }
}

fn frame(payload: Option<&FramePayload>) -> Result<Frame, StyleError> {
    let Some(payload) = payload else {
        return Ok(Frame::default());
    };

    let color = match payload.color.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(value) => Some(value.parse()?),
    };

    Ok(Frame {
        kind: payload.kind,
        text: payload.text.trim().to_string(),
        color,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{GradientPayload, LogoPayload};
    use crate::render::{ErrorCorrection, FrameKind, GradientDirection};
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_base64() -> String {
        let image = RgbaImage::from_pixel(16, 16, Rgba([200, 30, 30, 255]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        STANDARD.encode(bytes)
    }

    #[test]
    fn test_defaults_come_from_config() {
        let config = StyleConfig::default();
        let options = style_options(&StylePayload::default(), &config).unwrap();

        assert_eq!(options.size, config.default_size);
        assert_eq!(options.fg, HexColor::BLACK);
        assert_eq!(options.bg, HexColor::WHITE);
        assert!(options.logo.is_none());
        assert_eq!(options.frame.kind, FrameKind::None);
    }

    #[test]
    fn test_decode_base64_accepts_data_url() {
        let encoded = png_base64();
        let plain = decode_base64("image", &encoded).unwrap();
        let from_url =
            decode_base64("image", &format!("data:image/png;base64,{encoded}")).unwrap();
        assert_eq!(plain, from_url);
        assert!(matches!(
            decode_base64("image", "data:image/png;base64,"),
            Err(PayloadError::Empty { .. })
        ));
        assert!(matches!(
            decode_base64("image", "not base64!"),
            Err(PayloadError::InvalidBase64 { .. })
        ));
    }

    #[test]
    fn test_logo_uses_default_scale() {
        let payload = StylePayload {
            logo: Some(LogoPayload {
                image: png_base64(),
                scale: None,
            }),
            error_correction: ErrorCorrection::L,
            ..StylePayload::default()
        };
        let options = style_options(&payload, &StyleConfig::default()).unwrap();

        let logo = options.logo.as_ref().unwrap();
        assert_eq!(logo.scale, 0.18);
        assert_eq!(options.effective_error_correction(), ErrorCorrection::H);
    }

    #[test]
    fn test_bad_inputs_are_rejected() {
        let payload = StylePayload {
            fg: Some("#nothex".into()),
            ..StylePayload::default()
        };
        assert!(matches!(
            style_options(&payload, &StyleConfig::default()),
            Err(StyleOrPayloadError::Style(StyleError::InvalidColor(_)))
        ));

        let payload = StylePayload {
            size: Some(5000),
            ..StylePayload::default()
        };
        assert!(matches!(
            style_options(&payload, &StyleConfig::default()),
            Err(StyleOrPayloadError::Style(StyleError::SizeOutOfRange { .. }))
        ));

        let payload = StylePayload {
            logo: Some(LogoPayload {
                image: STANDARD.encode(b"definitely not an image"),
                scale: None,
            }),
            ..StylePayload::default()
        };
        assert!(matches!(
            style_options(&payload, &StyleConfig::default()),
            Err(StyleOrPayloadError::Payload(PayloadError::InvalidImage { .. }))
        ));
    }

    #[test]
    fn test_gradient_and_frame() {
        let payload = StylePayload {
            gradient: Some(GradientPayload {
                start: "#000".into(),
                end: "#223344".into(),
                direction: GradientDirection::Vertical,
            }),
            frame: Some(FramePayload {
                kind: FrameKind::Rounded,
                text: "  Scan me  ".into(),
                color: Some(String::new()),
            }),
            ..StylePayload::default()
        };
        let options = style_options(&payload, &StyleConfig::default()).unwrap();

        let gradient = options.gradient.unwrap();
        assert_eq!(gradient.start, HexColor::BLACK);
        assert_eq!(gradient.end, HexColor([0x22, 0x33, 0x44]));
        assert_eq!(options.frame.text, "Scan me");
        assert_eq!(options.frame.color, None);
    }
}
