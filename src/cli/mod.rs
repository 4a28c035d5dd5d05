//! Command-line parsing for the dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the pipeline code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::domain::{FetchMode, FetchRequest, IntervalCode, PeriodCode};
use crate::error::AppError;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "sma", version, about = "Stock candlestick charts with moving-average overlays")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch a series once, print a summary table, and optionally export CSV.
    Chart(ChartArgs),
    /// Launch the interactive TUI dashboard.
    ///
    /// This uses the same underlying pipeline as `sma chart`, but renders a
    /// candlestick chart in a terminal UI and supports live updates.
    Tui(ChartArgs),
}

/// Common options for the one-shot and TUI front-ends.
#[derive(Debug, Parser, Clone)]
pub struct ChartArgs {
    /// Ticker symbol (e.g. AAPL, MSFT).
    #[arg(short = 't', long, default_value = "AAPL")]
    pub ticker: String,

    /// Relative lookback period (ignored when --start/--end are given).
    #[arg(short = 'p', long, value_enum, default_value = "1mo")]
    pub period: PeriodCode,

    /// Range start date, YYYY-MM-DD (use together with --end).
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Range end date, YYYY-MM-DD, inclusive (use together with --start).
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Bar interval. Intraday intervals only cover recent history.
    #[arg(short = 'i', long, value_enum, default_value = "1d")]
    pub interval: IntervalCode,

    /// Moving-average windows in periods (comma-separated or repeated).
    #[arg(short = 'w', long = "window", value_delimiter = ',', default_values_t = [10usize, 50, 100])]
    pub windows: Vec<usize>,

    /// Logarithmic price scale.
    #[arg(long)]
    pub log: bool,

    /// Start with live updates enabled (TUI).
    #[arg(long)]
    pub live: bool,

    /// Live-update interval in seconds.
    #[arg(long, default_value_t = 10)]
    pub refresh_secs: u64,

    /// Export the assembled dataset to a CSV file.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Rows of recent history to print in the summary table.
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
}

impl ChartArgs {
    /// Build the immutable fetch request from the flag snapshot.
    pub fn fetch_request(&self) -> Result<FetchRequest, AppError> {
        let mode = match (self.start, self.end) {
            (Some(start), Some(end)) => FetchMode::DateRange { start, end },
            (None, None) => FetchMode::Period(self.period),
            _ => {
                return Err(AppError::invalid_request(
                    "--start and --end must be given together.",
                ));
            }
        };
        let request = FetchRequest {
            ticker: self.ticker.trim().to_string(),
            mode,
            interval: self.interval,
        };
        request.validate()?;
        Ok(request)
    }
}
