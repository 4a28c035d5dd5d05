//! Simple moving averages over a validated series.
//!
//! The engine is deterministic and pure: same series + same window set gives
//! bit-identical output. Two representation rules matter for charting:
//!
//! - the first `w-1` outputs are *absent* (`None`), not zero and not
//!   interpolated, because insufficient history exists
//! - a NaN close anywhere inside the trailing window makes that output
//!   `Some(NaN)` (the gap is propagated, never skipped), so charts stay
//!   reproducible across refreshes

use crate::error::AppError;
use crate::series::TimeSeries;

/// A requested moving-average window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MovingAverageSpec {
    pub window: usize,
}

impl MovingAverageSpec {
    pub fn new(window: usize) -> Result<Self, AppError> {
        if window == 0 {
            return Err(AppError::invalid_window(
                "Moving-average window must be a positive integer.",
            ));
        }
        Ok(Self { window })
    }

    /// Display label, e.g. `MA10`.
    pub fn label(&self) -> String {
        format!("MA{}", self.window)
    }
}

/// One computed moving-average column, aligned index-for-index with the
/// source series.
#[derive(Debug, Clone, PartialEq)]
pub struct MovingAverageSeries {
    pub label: String,
    pub window: usize,
    pub values: Vec<Option<f64>>,
}

/// Check and canonicalize a window list: positive sizes only, duplicates
/// collapsed, ascending order. Called by the pipeline before any network
/// fetch so a bad `-w` flag fails without wasted I/O.
pub fn normalize_windows(windows: &[usize]) -> Result<Vec<MovingAverageSpec>, AppError> {
    let mut specs = windows
        .iter()
        .map(|&w| MovingAverageSpec::new(w))
        .collect::<Result<Vec<_>, _>>()?;
    specs.sort();
    specs.dedup();
    Ok(specs)
}

/// Compute one SMA column per window over the closing prices.
///
/// A window larger than the series is accepted and yields an all-absent
/// column rather than an error.
pub fn compute_moving_averages(
    series: &TimeSeries,
    windows: &[usize],
) -> Result<Vec<MovingAverageSeries>, AppError> {
    let specs = normalize_windows(windows)?;
    let closes = series.closes();
    Ok(specs.iter().map(|spec| sma(&closes, *spec)).collect())
}

fn sma(closes: &[f64], spec: MovingAverageSpec) -> MovingAverageSeries {
    let w = spec.window;
    let mut values = vec![None; closes.len()];
    for i in 0..closes.len() {
        if i + 1 >= w {
            // Direct summation over the trailing window. Windows here are
            // small (tens to low hundreds), so no running-sum trick is
            // needed, and summing fresh avoids NaN poisoning a running
            // accumulator forever.
            let sum: f64 = closes[i + 1 - w..=i].iter().sum();
            values[i] = Some(sum / w as f64);
        }
    }
    MovingAverageSeries {
        label: spec.label(),
        window: w,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{RawRow, RawSeries};
    use crate::domain::{FetchMode, FetchRequest, IntervalCode, PeriodCode};
    use crate::error::ErrorKind;
    use crate::series::validate_series;
    use chrono::NaiveDate;

    fn series_from_closes(closes: &[f64]) -> TimeSeries {
        let rows = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| RawRow {
                ts: NaiveDate::from_ymd_opt(2025, 1, 1 + i as u32)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
                // Keep open/high/low finite so a NaN close yields a
                // partial-NaN row the validator retains, not an all-NaN
                // row it drops.
                open: 1.0,
                high: 2.0,
                low: 0.5,
                close: c,
                volume: 0.0,
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
    fn window_three_over_five_days() {
        let series = series_from_closes(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let out = compute_moving_averages(&series, &[3]).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].label, "MA3");
        assert_eq!(
            out[0].values,
            vec![None, None, Some(20.0), Some(30.0), Some(40.0)]
        );
    }

    #[test]
    fn defined_and_absent_counts_match_window() {
        let series = series_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        for w in 1..=7 {
            let out = compute_moving_averages(&series, &[w]).unwrap();
            let defined = out[0].values.iter().filter(|v| v.is_some()).count();
            let absent = out[0].values.iter().filter(|v| v.is_none()).count();
            assert_eq!(defined, 7 - w + 1);
            assert_eq!(absent, w - 1);
        }
    }

    #[test]
    fn window_larger_than_series_is_all_absent() {
        let series = series_from_closes(&[1.0, 2.0, 3.0]);
        let out = compute_moving_averages(&series, &[10]).unwrap();
        assert_eq!(out[0].values, vec![None, None, None]);
    }

    #[test]
    fn zero_window_fails_with_invalid_window() {
        let series = series_from_closes(&[1.0, 2.0]);
        let err = compute_moving_averages(&series, &[3, 0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidWindow);
    }

    #[test]
    fn duplicate_windows_are_collapsed() {
        let series = series_from_closes(&[1.0, 2.0, 3.0, 4.0]);
        let out = compute_moving_averages(&series, &[2, 2, 2]).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].window, 2);
    }

    #[test]
    fn nan_close_propagates_through_the_window() {
        let series = series_from_closes(&[10.0, f64::NAN, 30.0, 40.0, 50.0]);
        let out = compute_moving_averages(&series, &[2]).unwrap();
        // Both windows spanning the NaN close produce NaN; later windows are clean.
        assert!(out[0].values[1].unwrap().is_nan());
        assert!(out[0].values[2].unwrap().is_nan());
        assert_eq!(out[0].values[3], Some(35.0));
        assert_eq!(out[0].values[4], Some(45.0));
    }

    #[test]
    fn recomputation_is_bit_identical() {
        let series = series_from_closes(&[3.5, 7.25, 1.125, 9.0, 4.75, 2.5]);
        let a = compute_moving_averages(&series, &[2, 4]).unwrap();
        let b = compute_moving_averages(&series, &[4, 2]).unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.label, y.label);
            for (u, v) in x.values.iter().zip(&y.values) {
                match (u, v) {
                    (Some(a), Some(b)) => assert_eq!(a.to_bits(), b.to_bits()),
                    (None, None) => {}
                    _ => panic!("alignment mismatch"),
                }
            }
        }
    }
}
