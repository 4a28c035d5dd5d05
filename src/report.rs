//! Formatted terminal output for the one-shot `sma chart` path.
//!
//! We keep formatting code in one place so:
//! - the pipeline code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::assemble::ChartDataset;
use crate::domain::{FetchMode, FetchRequest};

/// Format the dataset summary: request echo, span, latest values, and a tail
/// table of recent rows with one column per moving average.
pub fn format_dataset_summary(
    dataset: &ChartDataset,
    request: &FetchRequest,
    tail_rows: usize,
) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== sma: {} ===\n", dataset.ticker));
    out.push_str(&format!(
        "Range: {} | interval: {}\n",
        mode_label(request),
        request.interval.code()
    ));
    out.push_str(&format!(
        "Bars: {} | {} .. {}\n",
        dataset.len(),
        dataset.rows[0].ts,
        dataset.rows[dataset.len() - 1].ts
    ));
    if dataset.log_scale {
        out.push_str("Scale: logarithmic (values below are ln of price)\n");
    }
    if !dataset.warnings.is_empty() {
        out.push_str(&format!(
            "Warnings: {} non-positive price(s) skipped for log scale\n",
            dataset.warnings.len()
        ));
    }

    let last = &dataset.rows[dataset.len() - 1];
    out.push_str(&format!("\nLatest close: {}\n", fmt_price(last.close)));
    for (label, value) in dataset.labels.iter().zip(&last.averages) {
        out.push_str(&format!("{label}: {}\n", fmt_avg(*value)));
    }

    out.push('\n');
    out.push_str(&format!(
        "{:<19} {:>10} {:>10} {:>10} {:>10}",
        "timestamp", "open", "high", "low", "close"
    ));
    for label in &dataset.labels {
        out.push_str(&format!(" {label:>10}"));
    }
    out.push('\n');

    let skip = dataset.len().saturating_sub(tail_rows);
    for row in &dataset.rows[skip..] {
        out.push_str(&format!(
            "{:<19} {:>10} {:>10} {:>10} {:>10}",
            row.ts.format("%Y-%m-%d %H:%M").to_string(),
            fmt_price(row.open),
            fmt_price(row.high),
            fmt_price(row.low),
            fmt_price(row.close),
        ));
        for avg in &row.averages {
            out.push_str(&format!(" {:>10}", fmt_avg(*avg)));
        }
        out.push('\n');
    }

    out
}

fn mode_label(request: &FetchRequest) -> String {
    match request.mode {
        FetchMode::Period(p) => p.code().to_string(),
        FetchMode::DateRange { start, end } => format!("{start} .. {end}"),
    }
}

/// Two-decimal price; NaN gaps render as "-". Shared with the TUI header.
pub fn fmt_price(v: f64) -> String {
    if v.is_nan() {
        "-".to_string()
    } else {
        format!("{v:.2}")
    }
}

/// Like [`fmt_price`], with absent values also rendered as "-".
pub fn fmt_avg(v: Option<f64>) -> String {
    match v {
        Some(v) => fmt_price(v),
        None => "-".to_string(),
    }
}
