//! Export an assembled dataset to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream
//! scripts: one row per bar, one trailing column per moving average, empty
//! cells where a value is absent or the provider had a gap.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::assemble::ChartDataset;
use crate::error::AppError;

pub fn write_dataset_csv(path: &Path, dataset: &ChartDataset) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::io(format!("Failed to create export CSV '{}': {e}", path.display()))
    })?;

    let mut header = String::from("timestamp,open,high,low,close,volume");
    for label in &dataset.labels {
        header.push(',');
        header.push_str(label);
    }
    writeln!(file, "{header}")
        .map_err(|e| AppError::io(format!("Failed to write export CSV header: {e}")))?;

    for row in &dataset.rows {
        let mut line = format!(
            "{},{},{},{},{},{}",
            row.ts.format("%Y-%m-%dT%H:%M:%S"),
            csv_cell(row.open),
            csv_cell(row.high),
            csv_cell(row.low),
            csv_cell(row.close),
            csv_cell(row.volume),
        );
        for avg in &row.averages {
            line.push(',');
            if let Some(v) = avg {
                line.push_str(&csv_cell(*v));
            }
        }
        writeln!(file, "{line}")
            .map_err(|e| AppError::io(format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

fn csv_cell(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else {
        format!("{v:.10}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::prepare_dataset;
    use crate::data::{RawRow, RawSeries};
    use crate::domain::{FetchMode, FetchRequest, IntervalCode, PeriodCode};
    use chrono::NaiveDate;

    #[test]
    fn csv_has_one_column_per_overlay_and_blank_absent_cells() {
        let request = FetchRequest {
            ticker: "TEST".to_string(),
            mode: FetchMode::Period(PeriodCode::Mo1),
            interval: IntervalCode::D1,
        };
        let rows = (0..4)
            .map(|i| RawRow {
                ts: NaiveDate::from_ymd_opt(2025, 5, 1 + i as u32)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
                open: 10.0,
                high: 11.0,
                low: 9.0,
                close: 10.0 + i as f64,
                volume: 5.0,
            })
            .collect();
        let dataset = prepare_dataset(RawSeries { rows }, &request, &[2], false).unwrap();

        let path = std::env::temp_dir().join("sma_export_test.csv");
        write_dataset_csv(&path, &dataset).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "timestamp,open,high,low,close,volume,MA2");
        assert_eq!(lines.len(), 5);
        // First bar has no MA2 value: the trailing cell is empty.
        assert!(lines[1].ends_with(','));
        assert!(!lines[2].ends_with(','));
    }
}
