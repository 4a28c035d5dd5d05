//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - built fresh from CLI flags or the TUI settings snapshot on each action
//! - passed by value into the pure pipeline functions
//! - discarded after the cycle they configured

use std::time::Duration;

use chrono::NaiveDate;
use clap::ValueEnum;

use crate::error::AppError;

/// Relative lookback codes accepted by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PeriodCode {
    #[value(name = "1d")]
    D1,
    #[value(name = "5d")]
    D5,
    #[value(name = "1mo")]
    Mo1,
    #[value(name = "3mo")]
    Mo3,
    #[value(name = "6mo")]
    Mo6,
    #[value(name = "1y")]
    Y1,
    #[value(name = "2y")]
    Y2,
    #[value(name = "5y")]
    Y5,
    #[value(name = "10y")]
    Y10,
    Ytd,
    Max,
}

impl PeriodCode {
    pub const ALL: [PeriodCode; 11] = [
        PeriodCode::D1,
        PeriodCode::D5,
        PeriodCode::Mo1,
        PeriodCode::Mo3,
        PeriodCode::Mo6,
        PeriodCode::Y1,
        PeriodCode::Y2,
        PeriodCode::Y5,
        PeriodCode::Y10,
        PeriodCode::Ytd,
        PeriodCode::Max,
    ];

    /// Wire string the provider expects (`range=` query parameter).
    pub fn code(self) -> &'static str {
        match self {
            PeriodCode::D1 => "1d",
            PeriodCode::D5 => "5d",
            PeriodCode::Mo1 => "1mo",
            PeriodCode::Mo3 => "3mo",
            PeriodCode::Mo6 => "6mo",
            PeriodCode::Y1 => "1y",
            PeriodCode::Y2 => "2y",
            PeriodCode::Y5 => "5y",
            PeriodCode::Y10 => "10y",
            PeriodCode::Ytd => "ytd",
            PeriodCode::Max => "max",
        }
    }

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|&p| p == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let i = Self::ALL.iter().position(|&p| p == self).unwrap_or(0);
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Bar interval codes accepted by the provider.
///
/// Intraday intervals (below 1d) are only available for recent history; the
/// provider rejects requests outside that window and we surface its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IntervalCode {
    #[value(name = "1m")]
    M1,
    #[value(name = "2m")]
    M2,
    #[value(name = "5m")]
    M5,
    #[value(name = "15m")]
    M15,
    #[value(name = "30m")]
    M30,
    #[value(name = "60m")]
    M60,
    #[value(name = "90m")]
    M90,
    #[value(name = "1h")]
    H1,
    #[value(name = "1d")]
    D1,
    #[value(name = "5d")]
    D5,
    #[value(name = "1wk")]
    Wk1,
    #[value(name = "1mo")]
    Mo1,
    #[value(name = "3mo")]
    Mo3,
}

impl IntervalCode {
    pub const ALL: [IntervalCode; 13] = [
        IntervalCode::M1,
        IntervalCode::M2,
        IntervalCode::M5,
        IntervalCode::M15,
        IntervalCode::M30,
        IntervalCode::M60,
        IntervalCode::M90,
        IntervalCode::H1,
        IntervalCode::D1,
        IntervalCode::D5,
        IntervalCode::Wk1,
        IntervalCode::Mo1,
        IntervalCode::Mo3,
    ];

    /// Wire string the provider expects (`interval=` query parameter).
    pub fn code(self) -> &'static str {
        match self {
            IntervalCode::M1 => "1m",
            IntervalCode::M2 => "2m",
            IntervalCode::M5 => "5m",
            IntervalCode::M15 => "15m",
            IntervalCode::M30 => "30m",
            IntervalCode::M60 => "60m",
            IntervalCode::M90 => "90m",
            IntervalCode::H1 => "1h",
            IntervalCode::D1 => "1d",
            IntervalCode::D5 => "5d",
            IntervalCode::Wk1 => "1wk",
            IntervalCode::Mo1 => "1mo",
            IntervalCode::Mo3 => "3mo",
        }
    }

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|&p| p == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let i = Self::ALL.iter().position(|&p| p == self).unwrap_or(0);
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// How the fetched series is bounded: a relative lookback code or an explicit
/// start/end date pair. The two are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Period(PeriodCode),
    DateRange { start: NaiveDate, end: NaiveDate },
}

/// An immutable fetch request: constructed fresh per fetch, never mutated,
/// discarded after use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub ticker: String,
    pub mode: FetchMode,
    pub interval: IntervalCode,
}

impl FetchRequest {
    /// Check caller inputs before any network I/O is attempted.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.ticker.trim().is_empty() {
            return Err(AppError::invalid_request("Ticker symbol must not be empty."));
        }
        if let FetchMode::DateRange { start, end } = self.mode {
            if start > end {
                return Err(AppError::invalid_request(format!(
                    "Start date {start} is after end date {end}."
                )));
            }
        }
        Ok(())
    }
}

/// Practical floor for the live-update interval.
pub const MIN_REFRESH_SECS: u64 = 1;

/// Live-mode configuration: owned by the refresh controller for the lifetime
/// of live mode, read-only during a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshConfig {
    interval_secs: u64,
    pub request: FetchRequest,
}

impl RefreshConfig {
    pub fn new(interval_secs: u64, request: FetchRequest) -> Result<Self, AppError> {
        if interval_secs < MIN_REFRESH_SECS {
            return Err(AppError::invalid_request(format!(
                "Refresh interval must be at least {MIN_REFRESH_SECS}s (got {interval_secs}s)."
            )));
        }
        request.validate()?;
        Ok(Self {
            interval_secs,
            request,
        })
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn request(ticker: &str) -> FetchRequest {
        FetchRequest {
            ticker: ticker.to_string(),
            mode: FetchMode::Period(PeriodCode::Mo1),
            interval: IntervalCode::D1,
        }
    }

    #[test]
    fn empty_ticker_rejected_before_fetch() {
        let err = request("  ").validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[test]
    fn inverted_date_range_rejected() {
        let req = FetchRequest {
            ticker: "AAPL".to_string(),
            mode: FetchMode::DateRange {
                start: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            },
            interval: IntervalCode::D1,
        };
        let err = req.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[test]
    fn equal_start_end_is_valid() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let req = FetchRequest {
            ticker: "MSFT".to_string(),
            mode: FetchMode::DateRange {
                start: day,
                end: day,
            },
            interval: IntervalCode::D1,
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn refresh_config_enforces_minimum_interval() {
        let err = RefreshConfig::new(0, request("AAPL")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);

        let cfg = RefreshConfig::new(5, request("AAPL")).unwrap();
        assert_eq!(cfg.interval(), Duration::from_secs(5));
    }

    #[test]
    fn period_codes_round_trip_through_wire_strings() {
        for p in PeriodCode::ALL {
            assert!(!p.code().is_empty());
        }
        assert_eq!(PeriodCode::Mo1.code(), "1mo");
        assert_eq!(IntervalCode::Wk1.code(), "1wk");
    }

    #[test]
    fn cycling_covers_all_variants() {
        let mut p = PeriodCode::D1;
        for _ in 0..PeriodCode::ALL.len() {
            p = p.next();
        }
        assert_eq!(p, PeriodCode::D1);
        assert_eq!(PeriodCode::D1.prev(), PeriodCode::Max);
    }
}
