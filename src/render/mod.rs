//! Styling and rasterization of QR symbols.

mod export;
mod renderer;
mod style;

pub use export::{PNG_DATA_URL_PREFIX, encode_png, png_data_url};
pub use renderer::{QUIET_ZONE, RenderError, RenderedQr, Renderer};
pub use style::{
    ErrorCorrection, Frame, FrameKind, Gradient, GradientDirection, HexColor, Logo,
    ModuleShape, RenderLimits, StyleError, StyleOptions,
};
