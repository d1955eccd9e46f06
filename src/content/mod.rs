//! QR content types: field schemas, payload formatting and parsing.

mod escape;
mod fields;
mod formatter;
mod kinds;
mod parser;

pub use fields::{Fields, ValidationError};
pub use formatter::{
    AppPlatform, CryptoCurrency, QrContent, SocialPlatform, WifiSecurity, format,
};
pub use kinds::{FieldSpec, QrKind};

pub(crate) use formatter::validate_web_url;
