use image::{DynamicImage, Rgba};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Minimum relative-luminance gap between a dark color and the background.
pub const MIN_LUMINANCE_GAP: f32 = 0.3;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StyleError {
    #[error("invalid color '{0}': expected #rrggbb or #rgb")]
    InvalidColor(String),

    #[error("size {size} is outside {min}..={max} px")]
    SizeOutOfRange { size: u32, min: u32, max: u32 },

    #[error("logo scale {scale} must be greater than 0 and at most {max}")]
    LogoScaleOutOfRange { scale: f32, max: f32 },

    #[error("caption is {len} characters, at most {max} allowed")]
    CaptionTooLong { len: usize, max: usize },

    #[error("{role} color {color} is too light against background {background}")]
    LowContrast {
        role: &'static str,
        color: HexColor,
        background: HexColor,
    },
}

/// `#rrggbb` color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexColor(pub [u8; 3]);

impl HexColor {
    pub const BLACK: HexColor = HexColor([0, 0, 0]);
    pub const WHITE: HexColor = HexColor([255, 255, 255]);

    pub fn rgba(self) -> Rgba<u8> {
        let [r, g, b] = self.0;
        Rgba([r, g, b, 255])
    }

    /// WCAG relative luminance in 0..=1.
    pub fn luminance(self) -> f32 {
        fn channel(c: u8) -> f32 {
            let c = c as f32 / 255.0;
            if c <= 0.03928 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        let [r, g, b] = self.0;
        0.2126 * channel(r) + 0.7152 * channel(g) + 0.0722 * channel(b)
    }

    pub fn lerp(self, other: HexColor, t: f32) -> Rgba<u8> {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgba([
            mix(self.0[0], other.0[0]),
            mix(self.0[1], other.0[1]),
            mix(self.0[2], other.0[2]),
            255,
        ])
    }
}

impl FromStr for HexColor {
    type Err = StyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StyleError::InvalidColor(s.to_string());
        let hex = s.trim().trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let digits: Vec<u8> = match hex.len() {
            3 => hex
                .chars()
                .map(|c| u8::from_str_radix(&format!("{c}{c}"), 16))
                .collect::<Result<_, _>>()
                .map_err(|_| invalid())?,
            6 => (0..3)
                .map(|i| u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16))
                .collect::<Result<_, _>>()
                .map_err(|_| invalid())?,
            _ => return Err(invalid()),
        };

        Ok(HexColor([digits[0], digits[1], digits[2]]))
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum ErrorCorrection {
    #[serde(alias = "l")]
    L,
    #[default]
    #[serde(alias = "m")]
    M,
    #[serde(alias = "q")]
    Q,
    #[serde(alias = "h")]
    H,
}

impl ErrorCorrection {
    /// Approximate share of codewords that can be restored.
    pub fn recovery_percent(self) -> u8 {
        match self {
            ErrorCorrection::L => 7,
            ErrorCorrection::M => 15,
            ErrorCorrection::Q => 25,
            ErrorCorrection::H => 30,
        }
    }
}

impl From<ErrorCorrection> for qrcode::EcLevel {
    fn from(level: ErrorCorrection) -> Self {
        match level {
            ErrorCorrection::L => qrcode::EcLevel::L,
            ErrorCorrection::M => qrcode::EcLevel::M,
            ErrorCorrection::Q => qrcode::EcLevel::Q,
            ErrorCorrection::H => qrcode::EcLevel::H,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleShape {
    #[default]
    Square,
    #[serde(alias = "gapped_square")]
    Gapped,
    #[serde(alias = "circles")]
    Circle,
    Rounded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradientDirection {
    Radial,
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gradient {
    pub start: HexColor,
    pub end: HexColor,
    pub direction: GradientDirection,
}

impl Gradient {
    /// Color at pixel (x, y) of a `w` x `h` square.
    pub fn color_at(&self, x: u32, y: u32, w: u32, h: u32) -> Rgba<u8> {
        let span = |v: u32, len: u32| v as f32 / (len.max(2) - 1) as f32;
        let t = match self.direction {
            GradientDirection::Horizontal => span(x, w),
            GradientDirection::Vertical => span(y, h),
            GradientDirection::Radial => {
                let cx = (w as f32 - 1.0) / 2.0;
                let cy = (h as f32 - 1.0) / 2.0;
                let max = (cx * cx + cy * cy).sqrt().max(1.0);
                let (dx, dy) = (x as f32 - cx, y as f32 - cy);
                (dx * dx + dy * dy).sqrt() / max
            }
        };
        self.start.lerp(self.end, t)
    }
}

#[derive(Debug, Clone)]
pub struct Logo {
    pub image: DynamicImage,
    /// Logo side divided by symbol side.
    pub scale: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameKind {
    #[default]
    None,
    Simple,
    Rounded,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pub kind: FrameKind,
    pub text: String,
    /// Falls back to the foreground color.
    pub color: Option<HexColor>,
}

impl Frame {
    pub fn is_visible(&self) -> bool {
        self.kind != FrameKind::None || !self.text.trim().is_empty()
    }
}

/// Cosmetic options applied to one rendered symbol.
#[derive(Debug, Clone)]
pub struct StyleOptions {
    pub module_shape: ModuleShape,
    pub fg: HexColor,
    pub bg: HexColor,
    pub gradient: Option<Gradient>,
    pub logo: Option<Logo>,
    pub frame: Frame,
    pub size: u32,
    pub error_correction: ErrorCorrection,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            module_shape: ModuleShape::Square,
            fg: HexColor::BLACK,
            bg: HexColor::WHITE,
            gradient: None,
            logo: None,
            frame: Frame::default(),
            size: 600,
            error_correction: ErrorCorrection::M,
        }
    }
}

/// Bounds enforced on [`StyleOptions`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderLimits {
    pub min_size: u32,
    pub max_size: u32,
    pub max_logo_scale: f32,
    pub caption_max_chars: usize,
}

impl Default for RenderLimits {
    fn default() -> Self {
        Self {
            min_size: 300,
            max_size: 2400,
            max_logo_scale: 0.25,
            caption_max_chars: 40,
        }
    }
}

impl StyleOptions {
    /// Level actually used for encoding; a logo forces H.
    pub fn effective_error_correction(&self) -> ErrorCorrection {
        if self.logo.is_some() {
            self.error_correction.max(ErrorCorrection::H)
        } else {
            self.error_correction
        }
    }

    pub fn validate(&self, limits: &RenderLimits) -> Result<(), StyleError> {
        if !(limits.min_size..=limits.max_size).contains(&self.size) {
            return Err(StyleError::SizeOutOfRange {
                size: self.size,
                min: limits.min_size,
                max: limits.max_size,
            });
        }

        if let Some(logo) = &self.logo {
            if !(logo.scale > 0.0 && logo.scale <= limits.max_logo_scale) {
                return Err(StyleError::LogoScaleOutOfRange {
                    scale: logo.scale,
                    max: limits.max_logo_scale,
                });
            }
        }

        let caption_len = self.frame.text.trim().chars().count();
        if caption_len > limits.caption_max_chars {
            return Err(StyleError::CaptionTooLong {
                len: caption_len,
                max: limits.caption_max_chars,
            });
        }

        let mut dark = vec![("foreground", self.fg)];
        if let Some(gradient) = &self.gradient {
            dark = vec![("gradient start", gradient.start), ("gradient end", gradient.end)];
        }
        let background = self.bg.luminance();
        for (role, color) in dark {
            if background - color.luminance() < MIN_LUMINANCE_GAP {
                return Err(StyleError::LowContrast {
                    role,
                    color,
                    background: self.bg,
                });
            }
        }

        Ok(())
    }
}
