use chrono::NaiveDateTime;
use reqwest::Url;
use serde::Serialize;

use super::escape::{percent_encode, text_escape, wifi_escape};
use super::fields::{
    FieldReader, Fields, ValidationError, normalize_phone, normalize_username, validate_amount,
    validate_email,
};
use super::kinds::QrKind;

/// Wire format of DTSTART/DTEND.
pub(crate) const ICAL_DATETIME: &str = "%Y%m%dT%H%M%S";
const FORM_DATETIME: &str = "%Y-%m-%dT%H:%M";
const FORM_DATETIME_SECONDS: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WifiSecurity {
    Wpa,
    Wpa2,
    Wep,
    NoPass,
}

impl WifiSecurity {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "" | "WPA" => Some(WifiSecurity::Wpa),
            "WPA2" => Some(WifiSecurity::Wpa2),
            "WEP" => Some(WifiSecurity::Wep),
            "NOPASS" | "NONE" | "OPEN" => Some(WifiSecurity::NoPass),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WifiSecurity::Wpa => "WPA",
            WifiSecurity::Wpa2 => "WPA2",
            WifiSecurity::Wep => "WEP",
            WifiSecurity::NoPass => "nopass",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CryptoCurrency {
    Bitcoin,
    Ethereum,
}

impl CryptoCurrency {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "bitcoin" | "btc" => Some(CryptoCurrency::Bitcoin),
            "ethereum" | "eth" => Some(CryptoCurrency::Ethereum),
            _ => None,
        }
    }

    pub fn scheme(self) -> &'static str {
        match self {
            CryptoCurrency::Bitcoin => "bitcoin",
            CryptoCurrency::Ethereum => "ethereum",
        }
    }

    /// Query parameter carrying the amount.
    pub fn amount_param(self) -> &'static str {
        match self {
            CryptoCurrency::Bitcoin => "amount",
            CryptoCurrency::Ethereum => "value",
        }
    }

    fn validate_address(self, address: &str) -> Result<(), ValidationError> {
        let ok = match self {
            CryptoCurrency::Bitcoin => {
                (26..=62).contains(&address.len())
                    && address.chars().all(|c| c.is_ascii_alphanumeric())
            }
            CryptoCurrency::Ethereum => {
                address.len() == 42
                    && address.starts_with("0x")
                    && address[2..].chars().all(|c| c.is_ascii_hexdigit())
            }
        };

        if ok {
            Ok(())
        } else {
            Err(ValidationError::invalid(
                "address",
                format!("not a valid {} address", self.scheme()),
            ))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SocialPlatform {
    Instagram,
    Twitter,
    LinkedIn,
    Facebook,
    TikTok,
    YouTube,
}

impl SocialPlatform {
    pub const ALL: [SocialPlatform; 6] = [
        SocialPlatform::Instagram,
        SocialPlatform::Twitter,
        SocialPlatform::LinkedIn,
        SocialPlatform::Facebook,
        SocialPlatform::TikTok,
        SocialPlatform::YouTube,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "instagram" => Some(SocialPlatform::Instagram),
            "twitter" | "x" | "twitter/x" => Some(SocialPlatform::Twitter),
            "linkedin" => Some(SocialPlatform::LinkedIn),
            "facebook" => Some(SocialPlatform::Facebook),
            "tiktok" => Some(SocialPlatform::TikTok),
            "youtube" => Some(SocialPlatform::YouTube),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SocialPlatform::Instagram => "instagram",
            SocialPlatform::Twitter => "twitter",
            SocialPlatform::LinkedIn => "linkedin",
            SocialPlatform::Facebook => "facebook",
            SocialPlatform::TikTok => "tiktok",
            SocialPlatform::YouTube => "youtube",
        }
    }

    /// Host and path prefix placed before the username.
    pub fn profile_prefix(self) -> (&'static str, &'static str) {
        match self {
            SocialPlatform::Instagram => ("instagram.com", "/"),
            SocialPlatform::Twitter => ("twitter.com", "/"),
            SocialPlatform::LinkedIn => ("linkedin.com", "/in/"),
            SocialPlatform::Facebook => ("facebook.com", "/"),
            SocialPlatform::TikTok => ("tiktok.com", "/@"),
            SocialPlatform::YouTube => ("youtube.com", "/@"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AppPlatform {
    Ios,
    Android,
}

impl AppPlatform {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ios" | "apple" => Some(AppPlatform::Ios),
            "android" | "google" => Some(AppPlatform::Android),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AppPlatform::Ios => "ios",
            AppPlatform::Android => "android",
        }
    }
}

/// Validated content of one QR code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrContent {
    Url {
        url: String,
    },
    Wifi {
        ssid: String,
        password: String,
        security: WifiSecurity,
    },
    Vcard {
        name: String,
        phone: String,
        email: String,
        org: String,
    },
    Email {
        to: String,
        subject: String,
        body: String,
    },
    Sms {
        phone: String,
        message: String,
    },
    Phone {
        phone: String,
    },
    Crypto {
        currency: CryptoCurrency,
        address: String,
        amount: Option<String>,
    },
    Social {
        platform: SocialPlatform,
        username: String,
    },
    Calendar {
        title: String,
        location: String,
        start: NaiveDateTime,
        end: NaiveDateTime,
        description: String,
    },
    AppStore {
        platform: AppPlatform,
        app_id: String,
    },
    Text {
        text: String,
    },
}

impl QrContent {
    /// Validates `fields` against the kind's schema and builds typed content.
    pub fn from_fields(kind: QrKind, fields: &Fields) -> Result<Self, ValidationError> {
        let reader = FieldReader::new(kind, fields);
        reader.check_schema()?;

        let content = match kind {
            QrKind::Url => QrContent::Url {
                url: validate_web_url(reader.required("url")?)?,
            },
            QrKind::Wifi => {
                let security = WifiSecurity::parse(reader.optional("security")).ok_or_else(
                    || ValidationError::invalid("security", "expected WPA, WPA2, WEP or nopass"),
                )?;
                let password = reader.verbatim("password");
                validate_wifi_password(security, password)?;
                QrContent::Wifi {
                    ssid: reader.required("ssid")?.to_string(),
                    password: if security == WifiSecurity::NoPass {
                        String::new()
                    } else {
                        password.to_string()
                    },
                    security,
                }
            }
            QrKind::Vcard => {
                let phone = match reader.optional("phone") {
                    "" => String::new(),
                    raw => normalize_phone("phone", raw)?,
                };
                let email = reader.optional("email");
                if !email.is_empty() {
                    validate_email("email", email)?;
                }
                QrContent::Vcard {
                    name: reader.required("name")?.to_string(),
                    phone,
                    email: email.to_string(),
                    org: reader.optional("org").to_string(),
                }
            }
            QrKind::Email => {
                let to = reader.required("to")?;
                validate_email("to", to)?;
                QrContent::Email {
                    to: to.to_string(),
                    subject: reader.optional("subject").to_string(),
                    body: reader.verbatim("body").to_string(),
                }
            }
            QrKind::Sms => QrContent::Sms {
                phone: normalize_phone("phone", reader.required("phone")?)?,
                message: reader.verbatim("message").to_string(),
            },
            QrKind::Phone => QrContent::Phone {
                phone: normalize_phone("phone", reader.required("phone")?)?,
            },
            QrKind::Crypto => {
                let currency = CryptoCurrency::parse(reader.required("currency")?)
                    .ok_or_else(|| {
                        ValidationError::invalid("currency", "expected bitcoin or ethereum")
                    })?;
                let address = reader.required("address")?;
                currency.validate_address(address)?;
                let amount = match reader.optional("amount") {
                    "" => None,
                    raw => {
                        validate_amount("amount", raw)?;
                        Some(raw.to_string())
                    }
                };
                QrContent::Crypto {
                    currency,
                    address: address.to_string(),
                    amount,
                }
            }
            QrKind::Social => {
                let platform = SocialPlatform::parse(reader.required("platform")?)
                    .ok_or_else(|| ValidationError::invalid("platform", "unknown platform"))?;
                QrContent::Social {
                    platform,
                    username: normalize_username("username", reader.required("username")?)?,
                }
            }
            QrKind::Calendar => {
                let start = parse_form_datetime("start", reader.required("start")?)?;
                let end = parse_form_datetime("end", reader.required("end")?)?;
                if end < start {
                    return Err(ValidationError::invalid("end", "event ends before it starts"));
                }
                QrContent::Calendar {
                    title: reader.required("title")?.to_string(),
                    location: reader.optional("location").to_string(),
                    start,
                    end,
                    description: reader.optional("description").to_string(),
                }
            }
            QrKind::AppStore => {
                let platform = AppPlatform::parse(reader.required("platform")?)
                    .ok_or_else(|| ValidationError::invalid("platform", "expected ios or android"))?;
                QrContent::AppStore {
                    platform,
                    app_id: validate_app_id(platform, reader.required("app_id")?)?,
                }
            }
            QrKind::Text => QrContent::Text {
                text: reader.required_verbatim("text")?.to_string(),
            },
        };

        Ok(content)
    }

    pub fn kind(&self) -> QrKind {
        match self {
            QrContent::Url { .. } => QrKind::Url,
            QrContent::Wifi { .. } => QrKind::Wifi,
            QrContent::Vcard { .. } => QrKind::Vcard,
            QrContent::Email { .. } => QrKind::Email,
            QrContent::Sms { .. } => QrKind::Sms,
            QrContent::Phone { .. } => QrKind::Phone,
            QrContent::Crypto { .. } => QrKind::Crypto,
            QrContent::Social { .. } => QrKind::Social,
            QrContent::Calendar { .. } => QrKind::Calendar,
            QrContent::AppStore { .. } => QrKind::AppStore,
            QrContent::Text { .. } => QrKind::Text,
        }
    }

    /// The exact string handed to the encoder.
    pub fn payload(&self) -> String {
        match self {
            QrContent::Url { url } => url.clone(),
            QrContent::Wifi {
                ssid,
                password,
                security,
            } => match security {
                WifiSecurity::NoPass => format!("WIFI:T:nopass;S:{};;", wifi_escape(ssid)),
                _ => format!(
                    "WIFI:T:{};S:{};P:{};;",
                    security.as_str(),
                    wifi_escape(ssid),
                    wifi_escape(password)
                ),
            },
            QrContent::Vcard {
                name,
                phone,
                email,
                org,
            } => {
                let (first, last) = split_name(name);
                let mut lines = vec![
                    "BEGIN:VCARD".to_string(),
                    "VERSION:3.0".to_string(),
                    format!("N:{};{};;;", text_escape(last), text_escape(first)),
                    format!("FN:{}", text_escape(name)),
                ];
                if !phone.is_empty() {
                    lines.push(format!("TEL:{phone}"));
                }
                if !email.is_empty() {
                    lines.push(format!("EMAIL:{email}"));
                }
                if !org.is_empty() {
                    lines.push(format!("ORG:{}", text_escape(org)));
                }
                lines.push("END:VCARD".to_string());
                lines.join("\n")
            }
            QrContent::Email { to, subject, body } => {
                let params = query_string(&[("subject", subject), ("body", body)]);
                format!("mailto:{to}{params}")
            }
            QrContent::Sms { phone, message } => {
                format!("sms:{phone}{}", query_string(&[("body", message)]))
            }
            QrContent::Phone { phone } => format!("tel:{phone}"),
            QrContent::Crypto {
                currency,
                address,
                amount,
            } => match amount {
                Some(amount) => format!(
                    "{}:{address}?{}={amount}",
                    currency.scheme(),
                    currency.amount_param()
                ),
                None => format!("{}:{address}", currency.scheme()),
            },
            QrContent::Social { platform, username } => {
                let (host, path) = platform.profile_prefix();
                format!("https://{host}{path}{username}")
            }
            QrContent::Calendar {
                title,
                location,
                start,
                end,
                description,
            } => {
                let mut lines = vec![
                    "BEGIN:VEVENT".to_string(),
                    format!("SUMMARY:{}", text_escape(title)),
                ];
                if !location.is_empty() {
                    lines.push(format!("LOCATION:{}", text_escape(location)));
                }
                lines.push(format!("DTSTART:{}", start.format(ICAL_DATETIME)));
                lines.push(format!("DTEND:{}", end.format(ICAL_DATETIME)));
                if !description.is_empty() {
                    lines.push(format!("DESCRIPTION:{}", text_escape(description)));
                }
                lines.push("END:VEVENT".to_string());
                lines.join("\n")
            }
            QrContent::AppStore { platform, app_id } => match platform {
                AppPlatform::Ios => format!("https://apps.apple.com/app/id{app_id}"),
                AppPlatform::Android => {
                    format!("https://play.google.com/store/apps/details?id={app_id}")
                }
            },
            QrContent::Text { text } => text.clone(),
        }
    }

    /// Field map in the shape of the kind's schema.
    pub fn to_fields(&self) -> Fields {
        let pairs: Vec<(&str, String)> = match self {
            QrContent::Url { url } => vec![("url", url.clone())],
            QrContent::Wifi {
                ssid,
                password,
                security,
            } => vec![
                ("ssid", ssid.clone()),
                ("password", password.clone()),
                ("security", security.as_str().to_string()),
            ],
            QrContent::Vcard {
                name,
                phone,
                email,
                org,
            } => vec![
                ("name", name.clone()),
                ("phone", phone.clone()),
                ("email", email.clone()),
                ("org", org.clone()),
            ],
            QrContent::Email { to, subject, body } => vec![
                ("to", to.clone()),
                ("subject", subject.clone()),
                ("body", body.clone()),
            ],
            QrContent::Sms { phone, message } => {
                vec![("phone", phone.clone()), ("message", message.clone())]
            }
            QrContent::Phone { phone } => vec![("phone", phone.clone())],
            QrContent::Crypto {
                currency,
                address,
                amount,
            } => vec![
                ("currency", currency.scheme().to_string()),
                ("address", address.clone()),
                ("amount", amount.clone().unwrap_or_default()),
            ],
            QrContent::Social { platform, username } => vec![
                ("platform", platform.as_str().to_string()),
                ("username", username.clone()),
            ],
            QrContent::Calendar {
                title,
                location,
                start,
                end,
                description,
            } => vec![
                ("title", title.clone()),
                ("location", location.clone()),
                ("start", start.format(FORM_DATETIME).to_string()),
                ("end", end.format(FORM_DATETIME).to_string()),
                ("description", description.clone()),
            ],
            QrContent::AppStore { platform, app_id } => vec![
                ("platform", platform.as_str().to_string()),
                ("app_id", app_id.clone()),
            ],
            QrContent::Text { text } => vec![("text", text.clone())],
        };

        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }
}

/// Validates the fields for `kind` and returns the encoder payload.
pub fn format(kind: QrKind, fields: &Fields) -> Result<String, ValidationError> {
    QrContent::from_fields(kind, fields).map(|content| content.payload())
}

pub(crate) fn validate_web_url(raw: &str) -> Result<String, ValidationError> {
    let parsed = Url::parse(raw).map_err(|e| ValidationError::invalid("url", e.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ValidationError::invalid("url", "scheme must be http or https"));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(ValidationError::invalid("url", "URL has no host"));
    }

    Ok(raw.to_string())
}

fn validate_wifi_password(security: WifiSecurity, password: &str) -> Result<(), ValidationError> {
    match security {
        WifiSecurity::Wpa | WifiSecurity::Wpa2 => {
            let len = password.chars().count();
            if !(8..=63).contains(&len) {
                return Err(ValidationError::invalid(
                    "password",
                    "WPA passwords must be 8 to 63 characters",
                ));
            }
        }
        WifiSecurity::Wep if password.is_empty() => {
            return Err(ValidationError::invalid("password", "WEP requires a password"));
        }
        _ => {}
    }
    Ok(())
}

fn parse_form_datetime(field: &'static str, raw: &str) -> Result<NaiveDateTime, ValidationError> {
    NaiveDateTime::parse_from_str(raw, FORM_DATETIME)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, FORM_DATETIME_SECONDS))
        .map_err(|_| ValidationError::invalid(field, "expected YYYY-MM-DDTHH:MM"))
}

fn validate_app_id(platform: AppPlatform, raw: &str) -> Result<String, ValidationError> {
    match platform {
        AppPlatform::Ios => {
            let digits = raw.strip_prefix("id").unwrap_or(raw);
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                return Err(ValidationError::invalid(
                    "app_id",
                    "App Store ids are numeric (e.g. 284882215)",
                ));
            }
            Ok(digits.to_string())
        }
        AppPlatform::Android => {
            let segments: Vec<&str> = raw.split('.').collect();
            let valid = segments.len() >= 2
                && segments.iter().all(|s| {
                    s.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
                        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                });
            if !valid {
                return Err(ValidationError::invalid(
                    "app_id",
                    "expected a package name like com.example.app",
                ));
            }
            Ok(raw.to_string())
        }
    }
}

/// `N:` wants family and given names; the last word is the family name.
fn split_name(name: &str) -> (&str, &str) {
    match name.rsplit_once(' ') {
        Some((first, last)) => (first.trim(), last.trim()),
        None => ("", name),
    }
}

fn query_string(params: &[(&str, &String)]) -> String {
    let encoded: Vec<String> = params
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| format!("{k}={}", percent_encode(v)))
        .collect();

    if encoded.is_empty() {
        String::new()
    } else {
        format!("?{}", encoded.join("&"))
    }
}
