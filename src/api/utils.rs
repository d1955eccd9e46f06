//! API utility functions
//!
//! Pure, stateless helpers for request processing, kept out of services.rs
//! so they can be unit tested.

use axum::http::{HeaderMap, header};

use crate::api::error::ApiError;

fn content_type_header(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::InvalidPayload("missing Content-Type header".into()))
}

fn parse_media_type(content_type: &str) -> Result<mime::Mime, ApiError> {
    content_type
        .parse()
        .map_err(|_| ApiError::InvalidPayload(format!("invalid Content-Type: {}", content_type)))
}

/// Parses and validates Content-Type header for application/json
///
/// Accepts:
/// - `application/json`
/// - `application/json; charset=utf-8`
///
/// Rejects:
/// - `application/jsonp`
/// - `application/json-patch+json`
/// - `text/json`
/// - Malformed media types
pub fn parse_content_type(content_type: &str) -> Result<mime::Mime, ApiError> {
    let media_type = parse_media_type(content_type)?;

    if media_type.type_() != mime::APPLICATION || media_type.subtype() != mime::JSON {
        return Err(ApiError::InvalidPayload(format!(
            "Content-Type must be application/json, got: {}/{}",
            media_type.type_(),
            media_type.subtype()
        )));
    }

    Ok(media_type)
}

/// Parses and validates Content-Type header for CSV uploads
///
/// Accepts `text/csv`, `application/csv` and `text/plain` (what browsers send
/// for a `.csv` file on some platforms)
pub fn parse_csv_content_type(content_type: &str) -> Result<mime::Mime, ApiError> {
    let media_type = parse_media_type(content_type)?;

    let accepted = matches!(
        (media_type.type_().as_str(), media_type.subtype().as_str()),
        ("text", "csv") | ("application", "csv") | ("text", "plain")
    );
    if !accepted {
        return Err(ApiError::InvalidPayload(format!(
            "Content-Type must be text/csv, got: {}/{}",
            media_type.type_(),
            media_type.subtype()
        )));
    }

    Ok(media_type)
}

/// Requires a JSON Content-Type on the request
pub fn require_json(headers: &HeaderMap) -> Result<(), ApiError> {
    parse_content_type(content_type_header(headers)?).map(|_| ())
}

/// Requires a CSV Content-Type on the request
pub fn require_csv(headers: &HeaderMap) -> Result<(), ApiError> {
    parse_csv_content_type(content_type_header(headers)?).map(|_| ())
}

/// Validates that body size does not exceed the maximum allowed size
pub fn validate_body_size(data: &[u8], max_size: usize) -> Result<(), ApiError> {
    if data.len() > max_size {
        return Err(ApiError::PayloadTooLarge(data.len()));
    }
    Ok(())
}

/// `Content-Disposition` value for a file download
pub fn attachment(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    format!("attachment; filename=\"{safe}\"")
}
