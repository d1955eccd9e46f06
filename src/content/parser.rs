use chrono::NaiveDateTime;
use reqwest::Url;

use super::escape::{percent_decode, query_pairs, split_unescaped, text_unescape};
use super::fields::{normalize_phone, normalize_username};
use super::formatter::{
    AppPlatform, CryptoCurrency, ICAL_DATETIME, QrContent, SocialPlatform, WifiSecurity,
};

impl QrContent {
    /// Best-effort inverse of [`QrContent::payload`].
    ///
    /// Classification goes by prefix. A payload that carries a known prefix
    /// but does not parse cleanly is returned as [`QrContent::Text`].
    pub fn parse(raw: &str) -> QrContent {
        let trimmed = raw.trim();
        parse_structured(trimmed).unwrap_or_else(|| QrContent::Text {
            text: raw.to_string(),
        })
    }
}

fn parse_structured(raw: &str) -> Option<QrContent> {
    let upper = raw.chars().take(16).collect::<String>().to_ascii_uppercase();

    if upper.starts_with("WIFI:") {
        return parse_wifi(&raw[5..]);
    }
    if upper.starts_with("BEGIN:VCARD") {
        return parse_vcard(raw);
    }
    if upper.starts_with("BEGIN:VEVENT") || upper.starts_with("BEGIN:VCALENDAR") {
        return parse_vevent(raw);
    }

    let (scheme, rest) = raw.split_once(':')?;
    match scheme.to_ascii_lowercase().as_str() {
        "mailto" => parse_mailto(rest),
        "sms" | "smsto" => parse_sms(rest),
        "tel" => normalize_phone("phone", rest)
            .ok()
            .map(|phone| QrContent::Phone { phone }),
        "bitcoin" => parse_crypto(CryptoCurrency::Bitcoin, rest),
        "ethereum" => parse_crypto(CryptoCurrency::Ethereum, rest),
        "http" | "https" => Some(parse_web(raw)),
        _ => None,
    }
}

fn parse_wifi(body: &str) -> Option<QrContent> {
    let mut ssid = None;
    let mut password = String::new();
    let mut security = WifiSecurity::Wpa;

    for part in split_unescaped(body, ';') {
        let Some((key, value)) = part.split_once(':') else {
            continue;
        };
        match key.to_ascii_uppercase().as_str() {
            "S" => ssid = Some(value.to_string()),
            "P" => password = value.to_string(),
            "T" => security = WifiSecurity::parse(value)?,
            _ => {}
        }
    }

    let ssid = ssid.filter(|s| !s.is_empty())?;
    if security == WifiSecurity::NoPass {
        password.clear();
    }
    Some(QrContent::Wifi {
        ssid,
        password,
        security,
    })
}

/// Content lines of a vCard or VEVENT as (upper-cased property, raw value).
fn property_lines(raw: &str) -> impl Iterator<Item = (String, &str)> {
    raw.lines().filter_map(|line| {
        let (key, value) = line.trim_end_matches('\r').split_once(':')?;
        // Parameters such as `TEL;TYPE=CELL` are dropped.
        let name = key.split(';').next().unwrap_or(key).to_ascii_uppercase();
        Some((name, value))
    })
}

fn parse_vcard(raw: &str) -> Option<QrContent> {
    let mut name = String::new();
    let mut structured = String::new();
    let mut phone = String::new();
    let mut email = String::new();
    let mut org = String::new();

    for (key, value) in property_lines(raw) {
        match key.as_str() {
            "FN" => name = text_unescape(value),
            "N" => structured = value.to_string(),
            "TEL" if phone.is_empty() => phone = normalize_phone("phone", value).ok()?,
            "EMAIL" if email.is_empty() => email = value.trim().to_string(),
            "ORG" => org = text_unescape(value),
            _ => {}
        }
    }

    if name.is_empty() {
        // `N:last;first;;;` is the fallback when FN is absent.
        let mut parts = split_unescaped(&structured, ';').into_iter();
        let last = parts.next().unwrap_or_default();
        let first = parts.next().unwrap_or_default();
        name = format!("{first} {last}").trim().to_string();
    }
    if name.is_empty() {
        return None;
    }

    Some(QrContent::Vcard {
        name,
        phone,
        email,
        org,
    })
}

fn parse_vevent(raw: &str) -> Option<QrContent> {
    let mut title = None;
    let mut location = String::new();
    let mut description = String::new();
    let mut start = None;
    let mut end = None;

    for (key, value) in property_lines(raw) {
        match key.as_str() {
            "SUMMARY" => title = Some(text_unescape(value)),
            "LOCATION" => location = text_unescape(value),
            "DESCRIPTION" => description = text_unescape(value),
            "DTSTART" => start = Some(parse_ical_datetime(value)?),
            "DTEND" => end = Some(parse_ical_datetime(value)?),
            _ => {}
        }
    }

    let start = start?;
    Some(QrContent::Calendar {
        title: title.filter(|t| !t.is_empty())?,
        location,
        start,
        end: end.unwrap_or(start),
        description,
    })
}

fn parse_ical_datetime(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim().trim_end_matches('Z'), ICAL_DATETIME).ok()
}

fn parse_mailto(rest: &str) -> Option<QrContent> {
    let (to, query) = rest.split_once('?').unwrap_or((rest, ""));
    let to = percent_decode(to);
    if to.is_empty() {
        return None;
    }

    let mut subject = String::new();
    let mut body = String::new();
    for (key, value) in query_pairs(query) {
        match key.as_str() {
            "subject" => subject = value,
            "body" => body = value,
            _ => {}
        }
    }

    Some(QrContent::Email { to, subject, body })
}

fn parse_sms(rest: &str) -> Option<QrContent> {
    let (number, message) = match rest.split_once('?') {
        Some((number, query)) => {
            let message = query_pairs(query)
                .into_iter()
                .find(|(k, _)| k == "body")
                .map(|(_, v)| v)
                .unwrap_or_default();
            (number, message)
        }
        // `SMSTO:<number>:<message>`
        None => match rest.split_once(':') {
            Some((number, message)) => (number, message.to_string()),
            None => (rest, String::new()),
        },
    };

    Some(QrContent::Sms {
        phone: normalize_phone("phone", number).ok()?,
        message,
    })
}

fn parse_crypto(currency: CryptoCurrency, rest: &str) -> Option<QrContent> {
    let (address, query) = rest.split_once('?').unwrap_or((rest, ""));
    if address.is_empty() {
        return None;
    }

    let amount = query_pairs(query)
        .into_iter()
        .find(|(k, _)| k == currency.amount_param() || k == "amount")
        .map(|(_, v)| v)
        .filter(|v| !v.is_empty());

    Some(QrContent::Crypto {
        currency,
        address: address.to_string(),
        amount,
    })
}

fn parse_web(raw: &str) -> QrContent {
    let Ok(url) = Url::parse(raw) else {
        return QrContent::Url {
            url: raw.to_string(),
        };
    };

    app_store_link(&url)
        .or_else(|| social_profile(&url))
        .unwrap_or_else(|| QrContent::Url {
            url: raw.to_string(),
        })
}

fn bare_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    Some(
        host.strip_prefix("www.")
            .or_else(|| host.strip_prefix("m."))
            .map(str::to_string)
            .unwrap_or(host),
    )
}

fn app_store_link(url: &Url) -> Option<QrContent> {
    match bare_host(url)?.as_str() {
        "apps.apple.com" | "itunes.apple.com" => {
            let last = url.path_segments()?.next_back()?;
            let digits = last.strip_prefix("id")?;
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            Some(QrContent::AppStore {
                platform: AppPlatform::Ios,
                app_id: digits.to_string(),
            })
        }
        "play.google.com" => {
            let (_, app_id) = url.query_pairs().find(|(k, _)| k == "id")?;
            Some(QrContent::AppStore {
                platform: AppPlatform::Android,
                app_id: app_id.into_owned(),
            })
        }
        _ => None,
    }
}

fn social_profile(url: &Url) -> Option<QrContent> {
    let host = bare_host(url)?;
    let host = if host == "x.com" { "twitter.com".to_string() } else { host };

    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    if url.query().is_some() {
        return None;
    }

    for platform in SocialPlatform::ALL {
        let (platform_host, prefix) = platform.profile_prefix();
        if host != platform_host {
            continue;
        }

        let raw_name = match (prefix, segments.as_slice()) {
            ("/in/", ["in", name]) => *name,
            ("/@", [name]) => name.strip_prefix('@')?,
            ("/", [name]) => *name,
            _ => return None,
        };

        let username = normalize_username("username", raw_name).ok()?;
        return Some(QrContent::Social { platform, username });
    }

    None
}
