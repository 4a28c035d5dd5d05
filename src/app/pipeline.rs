//! Shared pipeline logic used by both the one-shot CLI and the TUI.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! fetch -> validate -> moving averages -> assemble
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).
//! The TUI fetches on a background thread, so the compute-only half is
//! exposed separately as `prepare_dataset`.

use crate::assemble::{ChartDataset, assemble_dataset};
use crate::data::{RawSeries, YahooClient};
use crate::domain::FetchRequest;
use crate::error::AppError;
use crate::ma::{compute_moving_averages, normalize_windows};
use crate::series::validate_series;

/// Execute one full pipeline cycle: fetch, validate, compute, assemble.
pub fn run_cycle(
    client: &YahooClient,
    request: &FetchRequest,
    windows: &[usize],
    log_scale: bool,
) -> Result<ChartDataset, AppError> {
    // Caller-input mistakes fail before any network I/O.
    normalize_windows(windows)?;
    request.validate()?;

    let raw = client.fetch_series(request)?;
    prepare_dataset(raw, request, windows, log_scale)
}

/// The synchronous half of a cycle: raw rows already in hand.
pub fn prepare_dataset(
    raw: RawSeries,
    request: &FetchRequest,
    windows: &[usize],
    log_scale: bool,
) -> Result<ChartDataset, AppError> {
    let series = validate_series(raw, request)?;
    let overlays = compute_moving_averages(&series, windows)?;
    assemble_dataset(&request.ticker, &series, &overlays, log_scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RawRow;
    use crate::domain::{FetchMode, IntervalCode, PeriodCode};
    use crate::error::ErrorKind;
    use chrono::NaiveDate;

    fn request() -> FetchRequest {
        FetchRequest {
            ticker: "AAPL".to_string(),
            mode: FetchMode::Period(PeriodCode::Mo1),
            interval: IntervalCode::D1,
        }
    }

    fn raw_from_closes(closes: &[f64]) -> RawSeries {
        RawSeries {
            rows: closes
                .iter()
                .enumerate()
                .map(|(i, &c)| RawRow {
                    ts: NaiveDate::from_ymd_opt(2025, 3, 1 + i as u32)
                        .unwrap()
                        .and_hms_opt(0, 0, 0)
                        .unwrap(),
                    open: c,
                    high: c,
                    low: c,
                    close: c,
                    volume: 1.0,
                })
                .collect(),
        }
    }

    #[test]
    fn prepare_dataset_runs_the_compute_stages_in_order() {
        let ds = prepare_dataset(raw_from_closes(&[10.0, 20.0, 30.0, 40.0, 50.0]), &request(), &[3], false)
            .unwrap();
        assert_eq!(ds.labels, vec!["MA3".to_string()]);
        assert_eq!(ds.rows[4].averages[0], Some(40.0));
    }

    #[test]
    fn empty_provider_result_never_reaches_the_engine() {
        let err = prepare_dataset(RawSeries::default(), &request(), &[3], false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyData);
    }

    #[test]
    fn bad_window_fails_before_any_fetch() {
        let client = YahooClient::new();
        let err = run_cycle(&client, &request(), &[0], false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidWindow);
    }

    #[test]
    fn bad_request_fails_before_any_fetch() {
        let client = YahooClient::new();
        let mut req = request();
        req.ticker = String::new();
        let err = run_cycle(&client, &req, &[10], false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }
}
