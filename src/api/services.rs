use axum::{
    Json,
    body::{Body, Bytes},
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse},
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use tracing::{debug, info, warn};

use super::{
    error::ApiError,
    models::{
        AnalyticsResponse, BatchItemResponse, BatchQuery, BatchResponse, ClearHistoryResponse,
        DecodeRequest, DecodeResponse, GenerateRequest, GenerateResponse, HealthResponse,
        HistoryResponse, KindSchema, KindsResponse, PasswordCheckRequest, UrlCheckRequest,
    },
    state::AppState,
    utils,
    validation,
};
use crate::batch::{BatchMode, BatchOutcome, BatchRunner, BatchStyle};
use crate::checks;
use crate::content::{self, QrKind};
use crate::decoder;
use crate::history::HistoryEntry;
use crate::render::{self, RenderedQr};

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Headroom for JSON bodies carrying base64 images (4/3 of the raw upload)
fn json_body_limit(state: &AppState) -> usize {
    let raw = state.config.server.max_upload_bytes.as_usize();
    raw.saturating_mul(4) / 3 + 64 * 1024
}

/// Reads the request body, refusing anything past `limit` bytes
async fn read_body(body: Body, limit: usize) -> Result<Bytes, ApiError> {
    let data = Limited::new(body, limit)
        .collect()
        .await
        .map_err(|err| {
            if err.downcast_ref::<LengthLimitError>().is_some() {
                ApiError::PayloadTooLarge(limit)
            } else {
                ApiError::Internal(err.to_string())
            }
        })?
        .to_bytes();

    utils::validate_body_size(&data, limit)?;

    Ok(data)
}

async fn read_json<T: serde::de::DeserializeOwned>(
    state: &AppState,
    headers: &HeaderMap,
    body: Body,
) -> Result<T, ApiError> {
    utils::require_json(headers)?;
    let data = read_body(body, json_body_limit(state)).await?;
    Ok(serde_json::from_slice(&data)?)
}

/// UI page (GET /)
pub async fn index() -> impl IntoResponse {
    Html(INDEX_HTML)
}

/// Health check endpoint (GET /health)
///
/// The process has no external dependencies; a missing caption font degrades
/// framed output but does not make the service unhealthy.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    use std::collections::HashMap;

    let mut components = HashMap::new();
    components.insert("api".to_string(), "healthy".to_string());
    components.insert("renderer".to_string(), "healthy".to_string());
    components.insert("decoder".to_string(), "healthy".to_string());
    components.insert(
        "caption_font".to_string(),
        if state.renderer.has_font() {
            "available"
        } else {
            "missing"
        }
        .to_string(),
    );

    let response = HealthResponse {
        status: "healthy".to_string(),
        components,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (StatusCode::OK, Json(response))
}

/// Form schema for every content kind (GET /api/kinds)
pub async fn kinds(State(state): State<AppState>) -> impl IntoResponse {
    let style = &state.config.style;
    let response = KindsResponse {
        kinds: QrKind::ALL
            .iter()
            .map(|&kind| KindSchema {
                kind,
                label: kind.label(),
                fields: kind.schema(),
            })
            .collect(),
        batch_modes: BatchMode::ALL.to_vec(),
        min_size: style.min_size,
        max_size: style.max_size,
        default_size: style.default_size,
        max_logo_scale: style.max_logo_scale,
        caption_max_chars: style.caption_max_chars,
    };

    Json(response)
}

/// Formats, styles and renders one code, then records it in history
///
/// Style validation and rendering run on the blocking pool. Nothing is
/// recorded when any step fails.
async fn generate_png_bytes(
    state: &AppState,
    request: GenerateRequest,
) -> Result<(String, RenderedQr, Vec<u8>), ApiError> {
    let kind = request.kind;
    let result = async {
        let payload = content::format(kind, &request.fields)?;

        let renderer = state.renderer.clone();
        let config = state.config.clone();
        let style_payload = request.style;
        let job_payload = payload.clone();
        let (rendered, png) = tokio::task::spawn_blocking(move || {
            // Logo decoding happens here too, off the async workers.
            let style = validation::style_options(&style_payload, &config.style)?;
            let rendered = renderer.render(&job_payload, &style)?;
            let png = render::encode_png(&rendered.image)?;
            Ok::<_, ApiError>((rendered, png))
        })
        .await??;

        Ok::<_, ApiError>((payload, rendered, png))
    }
    .await;

    match result {
        Ok((payload, rendered, png)) => {
            state
                .history
                .write()
                .await
                .record(HistoryEntry::new(kind, &payload));
            state.metrics.generated();
            info!(
                kind = kind.as_str(),
                version = rendered.version,
                error_correction = ?rendered.error_correction,
                bytes = png.len(),
                "Generated QR code"
            );
            Ok((payload, rendered, png))
        }
        Err(e) => {
            state.metrics.generation_failed();
            debug!(kind = kind.as_str(), error = %e, "Generation rejected");
            Err(e)
        }
    }
}

/// Generate a QR code (POST /api/generate)
///
/// Returns the encoded payload, the PNG as a data URL and the error
/// correction level actually used.
pub async fn generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<impl IntoResponse, ApiError> {
    let request: GenerateRequest = read_json(&state, &headers, body).await?;
    let kind = request.kind;
    let (payload, rendered, png) = generate_png_bytes(&state, request).await?;

    let response = GenerateResponse {
        kind,
        payload,
        image: render::png_data_url(&png),
        error_correction: rendered.error_correction,
        error_correction_upgraded: rendered.upgraded,
        version: rendered.version,
        size: rendered.image.width(),
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Generate a QR code as a raw PNG download (POST /api/generate/png)
pub async fn generate_png(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<impl IntoResponse, ApiError> {
    let request: GenerateRequest = read_json(&state, &headers, body).await?;
    let filename = format!("qr_{}.png", request.kind.as_str());
    let (_, _, png) = generate_png_bytes(&state, request).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (header::CONTENT_DISPOSITION, utils::attachment(&filename)),
        ],
        png,
    ))
}

/// CSV batch generation (POST /api/batch?mode=...)
///
/// Row failures are reported inline; only structural problems (missing
/// columns, empty file, too many rows) reject the whole upload.
pub async fn batch(
    State(state): State<AppState>,
    Query(query): Query<BatchQuery>,
    headers: HeaderMap,
    body: Body,
) -> Result<impl IntoResponse, ApiError> {
    utils::require_csv(&headers)?;

    let mode = match query.mode.as_deref() {
        None | Some("") => BatchMode::Urls,
        Some(raw) => raw.parse::<BatchMode>().map_err(ApiError::InvalidPayload)?,
    };
    let style = BatchStyle {
        error_correction: query.error_correction,
        module_shape: query.module_shape,
    };

    let csv = read_body(body, state.config.server.max_upload_bytes.as_usize()).await?;

    let renderer = state.renderer.clone();
    let limits = state.config.batch.limits();
    let (outcome, items, gallery) = tokio::task::spawn_blocking(move || {
        let outcome = BatchRunner::new(&renderer, limits).run(&csv, mode, &style)?;
        let items = encode_items(&outcome)?;
        let gallery = outcome
            .gallery(&limits)
            .map(|sheet| render::encode_png(&sheet).map(|png| render::png_data_url(&png)))
            .transpose()?;
        Ok::<_, ApiError>((outcome, items, gallery))
    })
    .await??;

    {
        let mut history = state.history.write().await;
        for item in &outcome.items {
            history.record(HistoryEntry::new(item.kind, &item.payload));
        }
    }
    state
        .metrics
        .batch_rows(outcome.succeeded() as u64, outcome.failed() as u64);
    if outcome.failed() > 0 {
        warn!(mode = %mode, failed = outcome.failed(), "Batch finished with failed rows");
    }

    let response = BatchResponse {
        mode,
        total: outcome.total(),
        succeeded: outcome.succeeded(),
        failed: outcome.failed(),
        report: outcome.report,
        items,
        gallery,
    };

    Ok((StatusCode::OK, Json(response)))
}

fn encode_items(outcome: &BatchOutcome) -> Result<Vec<BatchItemResponse>, ApiError> {
    outcome
        .items
        .iter()
        .map(|item| {
            let png = render::encode_png(&item.image)?;
            Ok(BatchItemResponse {
                row_index: item.row_index,
                payload: item.payload.clone(),
                image: render::png_data_url(&png),
            })
        })
        .collect()
}

/// Sample CSV for a batch mode (GET /api/batch/templates/{mode})
pub async fn batch_template(Path(mode): Path<String>) -> Result<impl IntoResponse, ApiError> {
    let mode: BatchMode = mode.parse().map_err(ApiError::NotFound)?;
    let csv = mode
        .template_csv()
        .map_err(|e| ApiError::Internal(format!("Failed to build template: {}", e)))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                utils::attachment(&mode.template_filename()),
            ),
        ],
        csv,
    ))
}

/// Read QR codes from an uploaded image (POST /api/decode)
pub async fn decode(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<impl IntoResponse, ApiError> {
    let request: DecodeRequest = read_json(&state, &headers, body).await?;
    let bytes = validation::decode_base64("image", &request.image)?;
    utils::validate_body_size(&bytes, state.config.server.max_upload_bytes.as_usize())?;

    let detector = state.decoder.clone();
    let result =
        tokio::task::spawn_blocking(move || decoder::decode_image(detector.as_ref(), &bytes))
            .await?;

    match result {
        Ok(symbols) => {
            state.metrics.decoded();
            info!(count = symbols.len(), "Decoded image");
            Ok((
                StatusCode::OK,
                Json(DecodeResponse {
                    count: symbols.len(),
                    symbols,
                }),
            ))
        }
        Err(e) => {
            state.metrics.decode_failed();
            debug!(error = %e, "Decode failed");
            Err(e.into())
        }
    }
}

/// URL format and reachability check (POST /api/validate/url)
pub async fn validate_url(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<impl IntoResponse, ApiError> {
    let request: UrlCheckRequest = read_json(&state, &headers, body).await?;
    let check = checks::check_url(state.probe.as_ref(), &request.url).await;
    Ok(Json(check))
}

/// Wi-Fi password strength meter (POST /api/validate/password)
pub async fn validate_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<impl IntoResponse, ApiError> {
    let request: PasswordCheckRequest = read_json(&state, &headers, body).await?;
    Ok(Json(checks::password_strength(&request.password)))
}

/// Recent generations, newest first (GET /api/history)
pub async fn history(State(state): State<AppState>) -> impl IntoResponse {
    let history = state.history.read().await;
    Json(HistoryResponse {
        capacity: history.capacity(),
        entries: history.list(),
    })
}

/// Forget every recorded generation (DELETE /api/history)
pub async fn clear_history(State(state): State<AppState>) -> impl IntoResponse {
    let removed = state.history.write().await.clear();
    info!(removed, "History cleared");
    Json(ClearHistoryResponse { removed })
}

/// Kind distribution plus process counters (GET /api/analytics)
pub async fn analytics(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.history.read().await.stats();
    Json(AnalyticsResponse {
        stats,
        counters: state.metrics.snapshot(),
    })
}
