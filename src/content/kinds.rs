use serde::{Deserialize, Serialize};
use std::fmt;

/// Content types a QR code can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QrKind {
    Url,
    Wifi,
    Vcard,
    Email,
    Sms,
    Phone,
    Crypto,
    Social,
    Calendar,
    AppStore,
    Text,
}

/// One input field of a kind's form.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub required: bool,
    pub choices: &'static [&'static str],
}

const fn required(name: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec { name, label, required: true, choices: &[] }
}

const fn optional(name: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec { name, label, required: false, choices: &[] }
}

const fn choice(
    name: &'static str,
    label: &'static str,
    required: bool,
    choices: &'static [&'static str],
) -> FieldSpec {
    FieldSpec { name, label, required, choices }
}

pub const WIFI_SECURITY_CHOICES: &[&str] = &["WPA", "WPA2", "WEP", "nopass"];
pub const CRYPTO_CHOICES: &[&str] = &["bitcoin", "ethereum"];
pub const SOCIAL_CHOICES: &[&str] =
    &["instagram", "twitter", "linkedin", "facebook", "tiktok", "youtube"];
pub const APP_PLATFORM_CHOICES: &[&str] = &["ios", "android"];

const URL_FIELDS: &[FieldSpec] = &[required("url", "Website URL")];

const WIFI_FIELDS: &[FieldSpec] = &[
    required("ssid", "Network name (SSID)"),
    optional("password", "Password"),
    choice("security", "Security", false, WIFI_SECURITY_CHOICES),
];

const VCARD_FIELDS: &[FieldSpec] = &[
    required("name", "Full name"),
    optional("phone", "Phone number"),
    optional("email", "Email"),
    optional("org", "Company / organization"),
];

const EMAIL_FIELDS: &[FieldSpec] = &[
    required("to", "Recipient email"),
    optional("subject", "Subject"),
    optional("body", "Message body"),
];

const SMS_FIELDS: &[FieldSpec] =
    &[required("phone", "Phone number"), optional("message", "Message")];

const PHONE_FIELDS: &[FieldSpec] = &[required("phone", "Phone number")];

const CRYPTO_FIELDS: &[FieldSpec] = &[
    choice("currency", "Cryptocurrency", true, CRYPTO_CHOICES),
    required("address", "Wallet address"),
    optional("amount", "Amount"),
];

const SOCIAL_FIELDS: &[FieldSpec] = &[
    choice("platform", "Platform", true, SOCIAL_CHOICES),
    required("username", "Username (without @)"),
];

const CALENDAR_FIELDS: &[FieldSpec] = &[
    required("title", "Event title"),
    optional("location", "Location"),
    required("start", "Start (YYYY-MM-DDTHH:MM)"),
    required("end", "End (YYYY-MM-DDTHH:MM)"),
    optional("description", "Description"),
];

const APP_STORE_FIELDS: &[FieldSpec] = &[
    choice("platform", "Platform", true, APP_PLATFORM_CHOICES),
    required("app_id", "App ID / package name"),
];

const TEXT_FIELDS: &[FieldSpec] = &[required("text", "Text")];

impl QrKind {
    pub const ALL: [QrKind; 11] = [
        QrKind::Url,
        QrKind::Wifi,
        QrKind::Vcard,
        QrKind::Email,
        QrKind::Sms,
        QrKind::Phone,
        QrKind::Crypto,
        QrKind::Social,
        QrKind::Calendar,
        QrKind::AppStore,
        QrKind::Text,
    ];

    /// Input fields the formatter reads for this kind.
    pub fn schema(self) -> &'static [FieldSpec] {
        match self {
            QrKind::Url => URL_FIELDS,
            QrKind::Wifi => WIFI_FIELDS,
            QrKind::Vcard => VCARD_FIELDS,
            QrKind::Email => EMAIL_FIELDS,
            QrKind::Sms => SMS_FIELDS,
            QrKind::Phone => PHONE_FIELDS,
            QrKind::Crypto => CRYPTO_FIELDS,
            QrKind::Social => SOCIAL_FIELDS,
            QrKind::Calendar => CALENDAR_FIELDS,
            QrKind::AppStore => APP_STORE_FIELDS,
            QrKind::Text => TEXT_FIELDS,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QrKind::Url => "Link/URL",
            QrKind::Wifi => "Wi-Fi",
            QrKind::Vcard => "vCard (Contact)",
            QrKind::Email => "Email",
            QrKind::Sms => "SMS/Text",
            QrKind::Phone => "Phone Call",
            QrKind::Crypto => "Cryptocurrency",
            QrKind::Social => "Social Media",
            QrKind::Calendar => "Calendar Event",
            QrKind::AppStore => "App Store",
            QrKind::Text => "Plain Text",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QrKind::Url => "url",
            QrKind::Wifi => "wifi",
            QrKind::Vcard => "vcard",
            QrKind::Email => "email",
            QrKind::Sms => "sms",
            QrKind::Phone => "phone",
            QrKind::Crypto => "crypto",
            QrKind::Social => "social",
            QrKind::Calendar => "calendar",
            QrKind::AppStore => "app_store",
            QrKind::Text => "text",
        }
    }
}

impl fmt::Display for QrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
