use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::content::QrKind;

/// CSV layouts accepted for batch generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchMode {
    Urls,
    Wifi,
    Vcards,
    Custom,
}

impl BatchMode {
    pub const ALL: [BatchMode; 4] = [
        BatchMode::Urls,
        BatchMode::Wifi,
        BatchMode::Vcards,
        BatchMode::Custom,
    ];

    /// Header columns a CSV must contain, in template order.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            BatchMode::Urls => &["url"],
            BatchMode::Wifi => &["ssid", "password", "security"],
            BatchMode::Vcards => &["name", "phone", "email", "org"],
            BatchMode::Custom => &["data"],
        }
    }

    /// Content kind each row is formatted as.
    pub fn kind(self) -> QrKind {
        match self {
            BatchMode::Urls => QrKind::Url,
            BatchMode::Wifi => QrKind::Wifi,
            BatchMode::Vcards => QrKind::Vcard,
            BatchMode::Custom => QrKind::Text,
        }
    }

    /// Maps a CSV column to the formatter field it feeds.
    pub fn field_for(self, column: &str) -> &str {
        match (self, column) {
            (BatchMode::Custom, "data") => "text",
            (_, other) => other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BatchMode::Urls => "urls",
            BatchMode::Wifi => "wifi",
            BatchMode::Vcards => "vcards",
            BatchMode::Custom => "custom",
        }
    }

    pub fn template_filename(self) -> String {
        let stem = match self {
            BatchMode::Urls => "url",
            BatchMode::Wifi => "wifi",
            BatchMode::Vcards => "vcard",
            BatchMode::Custom => "custom",
        };
        format!("{stem}_template.csv")
    }

    fn sample_rows(self) -> &'static [&'static [&'static str]] {
        match self {
            BatchMode::Urls => &[
                &["https://example.com"],
                &["https://yourwebsite.com"],
                &["https://github.com/yourusername"],
            ],
            BatchMode::Wifi => &[
                &["MyHomeWiFi", "password123", "WPA2"],
                &["GuestNetwork", "guestpass456", "WPA"],
                &["OfficeNetwork", "office789", "WPA2"],
            ],
            BatchMode::Vcards => &[
                &["John Doe", "+1234567890", "john@example.com", "Acme Corp"],
                &["Jane Smith", "+0987654321", "jane@example.com", "Tech Inc"],
                &["Bob Johnson", "+1122334455", "bob@example.com", "StartupXYZ"],
            ],
            BatchMode::Custom => &[
                &["Your custom text here"],
                &["Another custom entry"],
                &["Third custom entry"],
            ],
        }
    }

    /// Header plus three sample rows.
    pub fn template_csv(self) -> Result<String, csv::Error> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(self.columns())?;
        for row in self.sample_rows() {
            writer.write_record(*row)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl fmt::Display for BatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "urls" | "url" => Ok(BatchMode::Urls),
            "wifi" | "wi-fi" => Ok(BatchMode::Wifi),
            "vcards" | "vcard" => Ok(BatchMode::Vcards),
            "custom" | "data" => Ok(BatchMode::Custom),
            other => Err(format!("unknown batch mode '{other}'")),
        }
    }
}
