//! Non-fatal helper checks shown next to form inputs.

pub mod password;
pub mod url;

pub use password::{PasswordStrength, Strength, password_strength};
pub use url::{HttpProbe, ProbeConfig, ProbeError, Reachability, UrlCheck, UrlProbe, check_url};
