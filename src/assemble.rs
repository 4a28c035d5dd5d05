//! Chart data assembly: base series + moving-average columns -> `ChartDataset`.
//!
//! The dataset is the sole artifact handed to the render boundary (the TUI
//! chart widget, the report formatter, the CSV export). It is row-oriented
//! and already in display units: when the logarithmic flag is set, OHLC and
//! overlay values are ln-transformed here, so renderers never re-scale.

use chrono::NaiveDateTime;

use crate::error::AppError;
use crate::ma::MovingAverageSeries;
use crate::series::TimeSeries;

/// A non-fatal report that a price could not be log-transformed.
///
/// The affected value is skipped (rendered as a gap); the rest of the dataset
/// is assembled normally.
#[derive(Debug, Clone, PartialEq)]
pub struct NonPositivePriceWarning {
    pub ts: NaiveDateTime,
    pub field: String,
    pub value: f64,
}

impl std::fmt::Display for NonPositivePriceWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "non-positive {} ({}) at {} skipped for log scale",
            self.field, self.value, self.ts
        )
    }
}

/// One chart row: OHLCV in display units plus one averaged value per overlay
/// column (absent where the window has insufficient history).
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRow {
    pub ts: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub averages: Vec<Option<f64>>,
}

/// The chart-ready dataset: every timestamp of the base series appears
/// exactly once, overlay columns are aligned row-for-row.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartDataset {
    pub ticker: String,
    /// Overlay labels, in the same order as `ChartRow::averages`.
    pub labels: Vec<String>,
    pub rows: Vec<ChartRow>,
    pub log_scale: bool,
    pub warnings: Vec<NonPositivePriceWarning>,
}

impl ChartDataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Merge the base series with its moving-average columns.
///
/// Overlays must be aligned to the series (one value slot per point); the
/// engine guarantees this, so a mismatch here is a wiring bug and fails with
/// `MalformedData` rather than silently truncating.
pub fn assemble_dataset(
    ticker: &str,
    series: &TimeSeries,
    overlays: &[MovingAverageSeries],
    log_scale: bool,
) -> Result<ChartDataset, AppError> {
    for overlay in overlays {
        if overlay.values.len() != series.len() {
            return Err(AppError::malformed_data(format!(
                "Overlay {} has {} values for a series of {} points.",
                overlay.label,
                overlay.values.len(),
                series.len()
            )));
        }
    }

    let labels: Vec<String> = overlays.iter().map(|o| o.label.clone()).collect();
    let mut warnings = Vec::new();
    let mut rows = Vec::with_capacity(series.len());

    for (i, p) in series.points().iter().enumerate() {
        let mut averages: Vec<Option<f64>> =
            overlays.iter().map(|o| o.values[i]).collect();

        let (open, high, low, close) = if log_scale {
            (
                log_value(p.open, "open", p.ts, &mut warnings),
                log_value(p.high, "high", p.ts, &mut warnings),
                log_value(p.low, "low", p.ts, &mut warnings),
                log_value(p.close, "close", p.ts, &mut warnings),
            )
        } else {
            (p.open, p.high, p.low, p.close)
        };

        if log_scale {
            for (avg, label) in averages.iter_mut().zip(&labels) {
                if let Some(v) = *avg {
                    *avg = Some(log_value(v, label, p.ts, &mut warnings));
                }
            }
        }

        rows.push(ChartRow {
            ts: p.ts,
            open,
            high,
            low,
            close,
            volume: p.volume,
            averages,
        });
    }

    Ok(ChartDataset {
        ticker: ticker.to_string(),
        labels,
        rows,
        log_scale,
        warnings,
    })
}

/// Natural log for display. NaN gaps pass through untouched; a non-positive
/// price becomes NaN (a gap) and is reported instead of aborting the render.
fn log_value(
    v: f64,
    field: &str,
    ts: NaiveDateTime,
    warnings: &mut Vec<NonPositivePriceWarning>,
) -> f64 {
    if v.is_nan() {
        return v;
    }
    if v <= 0.0 {
        warnings.push(NonPositivePriceWarning {
            ts,
            field: field.to_string(),
            value: v,
        });
        return f64::NAN;
    }
    v.ln()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{RawRow, RawSeries};
    use crate::domain::{FetchMode, FetchRequest, IntervalCode, PeriodCode};
    use crate::error::ErrorKind;
    use crate::ma::compute_moving_averages;
    use crate::series::validate_series;
    use chrono::NaiveDate;

    fn series_from_closes(closes: &[f64]) -> TimeSeries {
        let rows = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| RawRow {
                ts: NaiveDate::from_ymd_opt(2025, 2, 1 + i as u32)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
                open: c,
                high: c * 1.01,
                low: c * 0.99,
                close: c,
                volume: 10.0,
            })
            .collect();
        let request = FetchRequest {
            ticker: "TEST".to_string(),
            mode: FetchMode::Period(PeriodCode::Mo1),
            interval: IntervalCode::D1,
        };
        validate_series(RawSeries { rows }, &request).unwrap()
    }

    #[test]
    fn every_base_timestamp_appears_with_aligned_columns() {
        let series = series_from_closes(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let overlays = compute_moving_averages(&series, &[3, 10]).unwrap();
        let ds = assemble_dataset("TEST", &series, &overlays, false).unwrap();

        assert_eq!(ds.len(), series.len());
        assert_eq!(ds.labels, vec!["MA3".to_string(), "MA10".to_string()]);
        for (row, p) in ds.rows.iter().zip(series.points()) {
            assert_eq!(row.ts, p.ts);
            assert_eq!(row.averages.len(), 2);
        }
        // MA3 defined from index 2; MA10 absent everywhere (window > len).
        assert_eq!(ds.rows[2].averages[0], Some(20.0));
        assert!(ds.rows.iter().all(|r| r.averages[1].is_none()));
    }

    #[test]
    fn log_transform_is_monotonic_and_invertible() {
        let closes = [10.0, 20.0, 30.0, 40.0, 50.0];
        let series = series_from_closes(&closes);
        let ds = assemble_dataset("TEST", &series, &[], true).unwrap();

        assert!(ds.warnings.is_empty());
        let transformed: Vec<f64> = ds.rows.iter().map(|r| r.close).collect();
        assert!(transformed.windows(2).all(|w| w[0] < w[1]));
        for (t, orig) in transformed.iter().zip(&closes) {
            assert!((t.exp() - orig).abs() < 1e-9 * orig);
        }
    }

    #[test]
    fn non_positive_price_warns_and_skips_without_aborting() {
        let series = series_from_closes(&[10.0, -5.0, 30.0]);
        let ds = assemble_dataset("TEST", &series, &[], true).unwrap();

        // open/high/low/close of the offending row all warn.
        assert_eq!(ds.warnings.len(), 4);
        assert!(ds.rows[1].close.is_nan());
        assert!(ds.rows[0].close.is_finite());
        assert!(ds.rows[2].close.is_finite());
    }

    #[test]
    fn overlay_values_share_the_log_axis() {
        let series = series_from_closes(&[10.0, 10.0, 10.0]);
        let overlays = compute_moving_averages(&series, &[2]).unwrap();
        let ds = assemble_dataset("TEST", &series, &overlays, true).unwrap();
        let v = ds.rows[2].averages[0].unwrap();
        assert!((v - 10.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn misaligned_overlay_fails_with_malformed_data() {
        let series = series_from_closes(&[1.0, 2.0, 3.0]);
        let overlay = MovingAverageSeries {
            label: "MA2".to_string(),
            window: 2,
            values: vec![None, Some(1.5)],
        };
        let err = assemble_dataset("TEST", &series, &[overlay], false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedData);
    }
}
