//! Format, render, scan and parse back with the real rqrr detector.

use image::{DynamicImage, Rgba, RgbaImage};

use qrstudio::content::{Fields, QrContent, QrKind, format};
use qrstudio::decoder::{DecodeError, RqrrDecoder, decode_image};
use qrstudio::render::{
    ErrorCorrection, Gradient, GradientDirection, HexColor, Logo, ModuleShape, RenderLimits,
    Renderer, StyleOptions, encode_png,
};

fn fields(pairs: &[(&str, &str)]) -> Fields {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn scan_back(kind: QrKind, pairs: &[(&str, &str)], style: &StyleOptions) {
    let fields = fields(pairs);
    let payload = format(kind, &fields).unwrap();
    let expected = QrContent::from_fields(kind, &fields).unwrap();

    let renderer = Renderer::new(RenderLimits::default(), None);
    let rendered = renderer.render(&payload, style).unwrap();
    let png = encode_png(&rendered.image).unwrap();

    let symbols = decode_image(&RqrrDecoder, &png).unwrap();
    assert_eq!(symbols.len(), 1, "payload: {payload}");
    assert_eq!(symbols[0].text, payload);
    assert_eq!(symbols[0].kind, kind);
    assert_eq!(QrContent::parse(&symbols[0].text), expected);
}

#[test]
fn every_kind_survives_a_scan() {
    let style = StyleOptions::default();

    scan_back(QrKind::Url, &[("url", "https://example.com/docs?page=2")], &style);
    scan_back(
        QrKind::Wifi,
        &[("ssid", "Home"), ("password", "pass1234"), ("security", "WPA2")],
        &style,
    );
    scan_back(
        QrKind::Vcard,
        &[
            ("name", "Ada Lovelace"),
            ("phone", "+44 20 1234 5678"),
            ("email", "ada@example.org"),
            ("org", "Analytical Engines"),
        ],
        &style,
    );
    scan_back(
        QrKind::Email,
        &[("to", "a@b.io"), ("subject", "Hello"), ("body", "See you soon")],
        &style,
    );
    scan_back(QrKind::Sms, &[("phone", "+15550100"), ("message", "On my way")], &style);
    scan_back(QrKind::Phone, &[("phone", "+15550100")], &style);
    scan_back(
        QrKind::Crypto,
        &[
            ("currency", "bitcoin"),
            ("address", "1BoatSLRHtKNngkdXEeobR76b53LETtpyT"),
            ("amount", "0.01"),
        ],
        &style,
    );
    scan_back(QrKind::Social, &[("platform", "instagram"), ("username", "rustlang")], &style);
    scan_back(
        QrKind::Calendar,
        &[
            ("title", "Team sync"),
            ("location", "Room 4"),
            ("start", "2025-01-02T09:30"),
            ("end", "2025-01-02T10:00"),
        ],
        &style,
    );
    scan_back(QrKind::AppStore, &[("platform", "android"), ("app_id", "org.example.app")], &style);
    scan_back(QrKind::Text, &[("text", "just some words")], &style);
}

#[test]
fn styled_symbols_still_scan() {
    let rounded = StyleOptions {
        module_shape: ModuleShape::Rounded,
        fg: HexColor([0x1a, 0x1a, 0x2e]),
        error_correction: ErrorCorrection::Q,
        ..StyleOptions::default()
    };
    scan_back(QrKind::Url, &[("url", "https://example.com")], &rounded);

    let gapped = StyleOptions {
        module_shape: ModuleShape::Gapped,
        gradient: Some(Gradient {
            start: HexColor::BLACK,
            end: HexColor([0x22, 0x22, 0x55]),
            direction: GradientDirection::Radial,
        }),
        size: 800,
        ..StyleOptions::default()
    };
    scan_back(QrKind::Phone, &[("phone", "+15550100")], &gapped);

    let with_logo = StyleOptions {
        logo: Some(Logo {
            image: DynamicImage::ImageRgba8(RgbaImage::from_pixel(
                40,
                40,
                Rgba([30, 30, 30, 255]),
            )),
            scale: 0.18,
        }),
        ..StyleOptions::default()
    };
    scan_back(QrKind::Text, &[("text", "logo in the middle")], &with_logo);
}

#[test]
fn blank_image_has_no_symbol() {
    let blank = RgbaImage::from_pixel(300, 300, Rgba([255, 255, 255, 255]));
    let png = encode_png(&blank).unwrap();

    let result = decode_image(&RqrrDecoder, &png);
    assert!(matches!(result, Err(DecodeError::NoSymbol)));
}
