//! Series validation: raw provider rows -> `TimeSeries`.
//!
//! The validator is the only way to construct a `TimeSeries`, so downstream
//! code (the moving-average engine, the assembler, the chart) can rely on its
//! invariants: non-empty, strictly increasing timestamps, no duplicates.

use chrono::NaiveDateTime;

use crate::data::{RawRow, RawSeries};
use crate::domain::FetchRequest;
use crate::error::AppError;

/// A single OHLCV observation. Fields may be NaN where the provider reported
/// a gap; all-NaN rows are dropped during validation, partial-NaN rows are
/// kept (the moving-average engine propagates NaN).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub ts: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PricePoint {
    fn ohlc_all_nan(&self) -> bool {
        self.open.is_nan() && self.high.is_nan() && self.low.is_nan() && self.close.is_nan()
    }
}

/// A validated price series: non-empty, timestamps strictly increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    points: Vec<PricePoint>,
}

impl TimeSeries {
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    // The validator rejects empty input, so this only exists to keep clippy's
    // len-without-is-empty lint honest.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Closing prices in timestamp order (NaN where the provider had a gap).
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn first(&self) -> &PricePoint {
        &self.points[0]
    }

    pub fn last(&self) -> &PricePoint {
        &self.points[self.points.len() - 1]
    }
}

/// Validate raw provider output against the request it answered.
///
/// Policy:
/// - no rows at all, or only all-NaN rows -> `EmptyData`
/// - rows with every OHLC field NaN are dropped silently
/// - rows are sorted by timestamp; duplicates after sorting -> `MalformedData`
/// - a finite negative volume -> `MalformedData`
pub fn validate_series(raw: RawSeries, request: &FetchRequest) -> Result<TimeSeries, AppError> {
    if raw.rows.is_empty() {
        return Err(AppError::empty_data(format!(
            "Provider returned no rows for '{}'.",
            request.ticker
        )));
    }

    let mut points: Vec<PricePoint> = raw
        .rows
        .into_iter()
        .map(point_from_row)
        .collect::<Result<_, _>>()?;

    points.retain(|p| !p.ohlc_all_nan());
    if points.is_empty() {
        return Err(AppError::empty_data(format!(
            "Provider returned only empty rows for '{}'.",
            request.ticker
        )));
    }

    points.sort_by_key(|p| p.ts);
    for pair in points.windows(2) {
        if pair[0].ts >= pair[1].ts {
            return Err(AppError::malformed_data(format!(
                "Duplicate timestamp {} in provider data for '{}'.",
                pair[1].ts, request.ticker
            )));
        }
    }

    Ok(TimeSeries { points })
}

fn point_from_row(row: RawRow) -> Result<PricePoint, AppError> {
    if row.volume.is_finite() && row.volume < 0.0 {
        return Err(AppError::malformed_data(format!(
            "Negative volume {} at {}.",
            row.volume, row.ts
        )));
    }
    Ok(PricePoint {
        ts: row.ts,
        open: row.open,
        high: row.high,
        low: row.low,
        close: row.close,
        volume: row.volume,
    })
}
