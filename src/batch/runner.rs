use csv::{ReaderBuilder, StringRecord, Trim};
use image::{Rgba, RgbaImage, imageops};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use super::mode::BatchMode;
use crate::content::{self, Fields, QrKind, ValidationError};
use crate::render::{ErrorCorrection, ModuleShape, RenderError, Renderer, StyleOptions};

const PREVIEW_CHARS: usize = 40;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error(
        "CSV structure mismatch for '{mode}': expected columns [{}], found [{}], missing [{}]",
        .expected.join(", "), .found.join(", "), .missing.join(", ")
    )]
    MissingColumns {
        mode: BatchMode,
        expected: Vec<String>,
        found: Vec<String>,
        missing: Vec<String>,
    },

    #[error("CSV file is empty (no data rows)")]
    Empty,

    #[error("CSV has {rows} rows, at most {max} allowed")]
    TooManyRows { rows: usize, max: usize },

    #[error("CSV could not be read: {0}")]
    Csv(#[from] csv::Error),
}

/// Why a single row was skipped
#[derive(Debug, Error)]
pub enum BatchRowError {
    #[error("malformed row: {0}")]
    Malformed(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Options applied to every row of a batch
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchStyle {
    pub error_correction: ErrorCorrection,
    pub module_shape: ModuleShape,
}

#[derive(Debug, Clone, Copy)]
pub struct BatchLimits {
    pub max_rows: usize,
    pub tile_size: u32,
    pub gallery_columns: u32,
    pub gallery_gap: u32,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            max_rows: 100,
            tile_size: 600,
            gallery_columns: 3,
            gallery_gap: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReportEntry {
    /// 1-based data row, header excluded
    pub row_index: usize,
    pub status: RowStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A successfully rendered row
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub row_index: usize,
    pub kind: QrKind,
    pub payload: String,
    pub image: RgbaImage,
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub mode: BatchMode,
    pub report: Vec<BatchReportEntry>,
    pub items: Vec<BatchItem>,
}

impl BatchOutcome {
    pub fn total(&self) -> usize {
        self.report.len()
    }

    pub fn succeeded(&self) -> usize {
        self.items.len()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    /// Tiles laid out in rows with gaps on a white background
    pub fn gallery(&self, limits: &BatchLimits) -> Option<RgbaImage> {
        let first = self.items.first()?;
        let tile = first.image.width();
        let gap = limits.gallery_gap;
        let cols = (limits.gallery_columns.max(1) as usize).min(self.items.len()) as u32;
        let rows = self.items.len().div_ceil(cols as usize) as u32;

        let width = tile * cols + gap * (cols + 1);
        let height = tile * rows + gap * (rows + 1);
        let mut gallery = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));

        for (idx, item) in self.items.iter().enumerate() {
            let (row, col) = (idx as u32 / cols, idx as u32 % cols);
            let x = gap + col * (tile + gap);
            let y = gap + row * (tile + gap);
            imageops::replace(&mut gallery, &item.image, x as i64, y as i64);
        }

        Some(gallery)
    }
}

/// Runs the formatter and renderer over every row of a CSV
pub struct BatchRunner<'a> {
    renderer: &'a Renderer,
    limits: BatchLimits,
}

impl<'a> BatchRunner<'a> {
    pub fn new(renderer: &'a Renderer, limits: BatchLimits) -> Self {
        Self { renderer, limits }
    }

    pub fn run(
        &self,
        csv: &[u8],
        mode: BatchMode,
        style: &BatchStyle,
    ) -> Result<BatchOutcome, BatchError> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .trim(Trim::All)
            .from_reader(csv);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_ascii_lowercase())
            .collect();
        if headers.iter().all(String::is_empty) {
            return Err(BatchError::Empty);
        }

        let columns = column_positions(mode, &headers)?;

        let records: Vec<Result<StringRecord, csv::Error>> = reader.records().collect();
        if records.is_empty() {
            return Err(BatchError::Empty);
        }
        if records.len() > self.limits.max_rows {
            return Err(BatchError::TooManyRows {
                rows: records.len(),
                max: self.limits.max_rows,
            });
        }

        info!(mode = %mode, rows = records.len(), "Processing batch");

        let tile_style = StyleOptions {
            module_shape: style.module_shape,
            error_correction: style.error_correction,
            size: self.limits.tile_size,
            ..StyleOptions::default()
        };

        let mut report = Vec::with_capacity(records.len());
        let mut items = Vec::new();

        for (idx, record) in records.into_iter().enumerate() {
            let row_index = idx + 1;
            match self.process_row(record, mode, &columns, &tile_style) {
                Ok((payload, image)) => {
                    report.push(BatchReportEntry {
                        row_index,
                        status: RowStatus::Success,
                        preview: Some(preview(&payload)),
                        error: None,
                    });
                    items.push(BatchItem {
                        row_index,
                        kind: mode.kind(),
                        payload,
                        image,
                    });
                }
                Err(e) => {
                    debug!(row = row_index, error = %e, "Batch row failed");
                    report.push(BatchReportEntry {
                        row_index,
                        status: RowStatus::Failure,
                        preview: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        info!(
            mode = %mode,
            succeeded = items.len(),
            failed = report.len() - items.len(),
            "Batch finished"
        );

        Ok(BatchOutcome {
            mode,
            report,
            items,
        })
    }

    fn process_row(
        &self,
        record: Result<StringRecord, csv::Error>,
        mode: BatchMode,
        columns: &[(&'static str, usize)],
        style: &StyleOptions,
    ) -> Result<(String, RgbaImage), BatchRowError> {
        let record = record.map_err(|e| BatchRowError::Malformed(e.to_string()))?;

        let short: Vec<&str> = columns
            .iter()
            .filter(|(_, pos)| record.get(*pos).is_none())
            .map(|(column, _)| *column)
            .collect();
        if !short.is_empty() {
            return Err(BatchRowError::Malformed(format!(
                "row has {} cells, missing [{}]",
                record.len(),
                short.join(", ")
            )));
        }

        let fields: Fields = columns
            .iter()
            .filter_map(|(column, pos)| {
                let value = record.get(*pos)?.to_string();
                Some((mode.field_for(column).to_string(), value))
            })
            .collect();

        let payload = content::format(mode.kind(), &fields)?;
        let rendered = self.renderer.render(&payload, style)?;
        Ok((payload, rendered.image))
    }
}

/// Position of every required column, or the whole batch is rejected.
fn column_positions(
    mode: BatchMode,
    headers: &[String],
) -> Result<Vec<(&'static str, usize)>, BatchError> {
    let mut positions = Vec::new();
    let mut missing = Vec::new();

    for column in mode.columns() {
        match headers.iter().position(|h| h == column) {
            Some(pos) => positions.push((*column, pos)),
            None => missing.push(column.to_string()),
        }
    }

    if !missing.is_empty() {
        return Err(BatchError::MissingColumns {
            mode,
            expected: mode.columns().iter().map(|c| c.to_string()).collect(),
            found: headers.to_vec(),
            missing,
        });
    }

    Ok(positions)
}

fn preview(payload: &str) -> String {
    if payload.chars().count() > PREVIEW_CHARS {
        let head: String = payload.chars().take(PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        payload.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderLimits;

    fn renderer() -> Renderer {
        Renderer::new(RenderLimits::default(), None)
    }

    fn small_limits() -> BatchLimits {
        BatchLimits {
            tile_size: 300,
            ..BatchLimits::default()
        }
    }

    #[test]
    fn keeps_going_after_a_bad_row() {
        let csv = "url\nhttps://a.example\nhttps://b.example\nnot a url\nhttps://c.example\n";
        let renderer = renderer();
        let outcome = BatchRunner::new(&renderer, small_limits())
            .run(csv.as_bytes(), BatchMode::Urls, &BatchStyle::default())
            .unwrap();

        assert_eq!(outcome.total(), 4);
        assert_eq!(outcome.succeeded(), 3);
        assert_eq!(outcome.failed(), 1);
        let statuses: Vec<RowStatus> = outcome.report.iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![RowStatus::Success, RowStatus::Success, RowStatus::Failure, RowStatus::Success]
        );
        assert_eq!(outcome.report[2].row_index, 3);
        let rows: Vec<usize> = outcome.items.iter().map(|i| i.row_index).collect();
        assert_eq!(rows, vec![1, 2, 4]);
    }

    #[test]
    fn missing_columns_reject_whole_batch() {
        let csv = "SSID,pass\nHome,secret123\n";
        let renderer = renderer();
        let err = BatchRunner::new(&renderer, small_limits())
            .run(csv.as_bytes(), BatchMode::Wifi, &BatchStyle::default())
            .unwrap_err();

        match err {
            BatchError::MissingColumns { missing, found, .. } => {
                assert_eq!(missing, vec!["password".to_string(), "security".to_string()]);
                assert_eq!(found, vec!["ssid".to_string(), "pass".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn headers_match_case_insensitively_and_security_defaults() {
        let csv = " SSID , Password ,Security\nHome,pass1234,\n";
        let renderer = renderer();
        let outcome = BatchRunner::new(&renderer, small_limits())
            .run(csv.as_bytes(), BatchMode::Wifi, &BatchStyle::default())
            .unwrap();
        assert_eq!(outcome.items[0].payload, "WIFI:T:WPA;S:Home;P:pass1234;;");
    }

    #[test]
    fn short_rows_fail_instead_of_defaulting() {
        let csv = "name,phone,email,org\n\
                   John Doe,+1234567890,john@example.com,Acme\n\
                   Jane Smith,+0987654321,jane@example.com,Tech\n\
                   Jane\n\
                   Bob Johnson,+1122334455,bob@example.com,StartupXYZ\n";
        let renderer = renderer();
        let outcome = BatchRunner::new(&renderer, small_limits())
            .run(csv.as_bytes(), BatchMode::Vcards, &BatchStyle::default())
            .unwrap();

        assert_eq!(outcome.succeeded(), 3);
        assert_eq!(outcome.failed(), 1);
        let failure = &outcome.report[2];
        assert_eq!(failure.status, RowStatus::Failure);
        let error = failure.error.as_deref().unwrap();
        assert!(error.contains("phone, email, org"), "{error}");

        let csv = "ssid,password,security\nHome,pass1234\n";
        let outcome = BatchRunner::new(&renderer, small_limits())
            .run(csv.as_bytes(), BatchMode::Wifi, &BatchStyle::default())
            .unwrap();
        assert_eq!(outcome.succeeded(), 0);
        assert_eq!(outcome.report[0].status, RowStatus::Failure);
        assert!(outcome.report[0].error.as_deref().unwrap().contains("security"));
    }

    #[test]
    fn empty_and_oversized_inputs() {
        let renderer = renderer();
        let runner = BatchRunner::new(
            &renderer,
            BatchLimits {
                max_rows: 2,
                ..small_limits()
            },
        );

        assert!(matches!(
            runner.run(b"", BatchMode::Custom, &BatchStyle::default()),
            Err(BatchError::Empty)
        ));
        assert!(matches!(
            runner.run(b"data\n", BatchMode::Custom, &BatchStyle::default()),
            Err(BatchError::Empty)
        ));
        assert!(matches!(
            runner.run(b"data\na\nb\nc\n", BatchMode::Custom, &BatchStyle::default()),
            Err(BatchError::TooManyRows { rows: 3, max: 2 })
        ));
    }

    #[test]
    fn gallery_layout() {
        let csv = "data\none\ntwo\nthree\nfour\n";
        let renderer = renderer();
        let limits = small_limits();
        let outcome = BatchRunner::new(&renderer, limits)
            .run(csv.as_bytes(), BatchMode::Custom, &BatchStyle::default())
            .unwrap();

        let gallery = outcome.gallery(&limits).unwrap();
        assert_eq!(gallery.width(), 300 * 3 + 20 * 4);
        assert_eq!(gallery.height(), 300 * 2 + 20 * 3);
    }

    #[test]
    fn long_payload_preview_is_truncated() {
        assert_eq!(preview("short"), "short");
        let long = "a".repeat(45);
        assert_eq!(preview(&long), format!("{}...", "a".repeat(40)));
    }
}
