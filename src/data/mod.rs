//! Data provider boundary.
//!
//! The provider hands back raw tabular rows; everything past this module goes
//! through the series validator before use.

pub mod yahoo;

pub use yahoo::YahooClient;

use chrono::NaiveDateTime;

/// One raw provider row, as fetched. Price fields are NaN where the provider
/// reported a gap (null in the wire format).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawRow {
    pub ts: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Raw provider output for one request. May be empty; the validator turns an
/// empty result into `EmptyData`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawSeries {
    pub rows: Vec<RawRow>,
}
