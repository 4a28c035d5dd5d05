//! Yahoo Finance v8 chart API client.
//!
//! One GET per fetch: `{BASE_URL}/{ticker}` with either `range=` (relative
//! lookback) or `period1=`/`period2=` (epoch seconds, end-inclusive) plus
//! `interval=`. The response carries parallel column arrays keyed off a
//! shared timestamp array, with `null` entries where the venue had no trade.

use chrono::{NaiveDate, NaiveTime};
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use serde::Deserialize;

use crate::data::{RawRow, RawSeries};
use crate::domain::{FetchMode, FetchRequest};
use crate::error::AppError;

const BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

// The chart endpoint rejects requests without a browser-ish user agent.
const UA: &str = "Mozilla/5.0 (X11; Linux x86_64) sma/0.1";

/// Cloning is cheap: the inner `reqwest` client is a shared handle, which is
/// what lets the TUI hand a clone to its background fetch thread.
#[derive(Clone)]
pub struct YahooClient {
    client: Client,
}

impl YahooClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Fetch raw rows for a request.
    ///
    /// The request is validated first so caller-input mistakes surface before
    /// any network I/O. Transport and provider-side failures come back as
    /// `EmptyData`: from the pipeline's point of view the provider produced
    /// no usable rows, and the message keeps the underlying cause.
    pub fn fetch_series(&self, request: &FetchRequest) -> Result<RawSeries, AppError> {
        request.validate()?;

        let url = format!("{BASE_URL}/{}", request.ticker.trim());
        let mut req = self
            .client
            .get(&url)
            .header(USER_AGENT, UA)
            .query(&[("interval", request.interval.code())]);

        match request.mode {
            FetchMode::Period(period) => {
                req = req.query(&[("range", period.code())]);
            }
            FetchMode::DateRange { start, end } => {
                let (period1, period2) = date_range_params(start, end);
                req = req.query(&[
                    ("period1", period1.to_string()),
                    ("period2", period2.to_string()),
                ]);
            }
        }

        let resp = req
            .send()
            .map_err(|e| AppError::empty_data(format!("Provider request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::empty_data(format!(
                "Provider request for '{}' failed with status {}.",
                request.ticker,
                resp.status()
            )));
        }

        let body: ChartResponse = resp
            .json()
            .map_err(|e| AppError::malformed_data(format!("Failed to parse provider response: {e}")))?;

        if let Some(err) = body.chart.error {
            return Err(AppError::empty_data(format!(
                "Provider error for '{}': {} ({}).",
                request.ticker, err.description, err.code
            )));
        }

        let result = body
            .chart
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| {
                AppError::empty_data(format!("Provider returned no result for '{}'.", request.ticker))
            })?;

        Ok(RawSeries {
            rows: rows_from_result(result)?,
        })
    }
}

impl Default for YahooClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Epoch-second bounds for an inclusive date range. The endpoint treats
/// `period2` as exclusive, so the end date is pushed one day out.
fn date_range_params(start: NaiveDate, end: NaiveDate) -> (i64, i64) {
    let day_start = |d: NaiveDate| d.and_time(NaiveTime::MIN).and_utc().timestamp();
    (day_start(start), day_start(end.succ_opt().unwrap_or(end)))
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Debug, Deserialize, Default)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
}

#[derive(Debug, Deserialize, Default)]
struct QuoteBlock {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Flatten one chart result into rows. An empty timestamp array is a valid
/// "no data" answer (the validator raises `EmptyData`); structural problems
/// like a missing or short column are `MalformedData`.
fn rows_from_result(result: ChartResult) -> Result<Vec<RawRow>, AppError> {
    if result.timestamp.is_empty() {
        return Ok(Vec::new());
    }

    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| AppError::malformed_data("Provider response is missing quote columns."))?;

    let n = result.timestamp.len();
    for (name, col) in [
        ("open", &quote.open),
        ("high", &quote.high),
        ("low", &quote.low),
        ("close", &quote.close),
        ("volume", &quote.volume),
    ] {
        if col.len() != n {
            return Err(AppError::malformed_data(format!(
                "Provider column '{name}' has {} entries for {n} timestamps.",
                col.len()
            )));
        }
    }

    let value = |col: &[Option<f64>], i: usize| col[i].unwrap_or(f64::NAN);

    let mut rows = Vec::with_capacity(n);
    for (i, &secs) in result.timestamp.iter().enumerate() {
        let ts = chrono::DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| AppError::malformed_data(format!("Invalid provider timestamp {secs}.")))?
            .naive_utc();
        rows.push(RawRow {
            ts,
            open: value(&quote.open, i),
            high: value(&quote.high, i),
            low: value(&quote.low, i),
            close: value(&quote.close, i),
            volume: value(&quote.volume, i),
        });
    }

    Ok(rows)
}
