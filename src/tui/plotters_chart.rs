//! Plotters-powered candlestick chart widget for Ratatui.
//!
//! Why Plotters instead of Ratatui's built-in `Chart` widget?
//! - it has a real candlestick element (OHLC box-and-wick glyphs)
//! - nicer axis + mesh rendering
//! - easy to extend later (legend, annotations, exportable PNG/SVG backends)
//!
//! We render Plotters output into the Ratatui buffer using
//! `plotters-ratatui-backend`.

use plotters::prelude::*;
// The ratatui `Color` import below shadows the prelude's `Color` trait, which
// `.filled()` on `RGBColor` needs in scope.
use plotters::style::Color as _;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// One moving-average line trace in chart coordinates.
pub struct OverlaySeries {
    pub label: String,
    /// (bar index, display price); absent values are simply omitted.
    pub points: Vec<(f64, f64)>,
}

/// Colors assigned to overlays in order, cycling. Kept high-contrast for
/// terminal readability; the same order is used for the header labels.
pub const OVERLAY_COLORS: [(u8, u8, u8); 4] = [
    (0, 255, 255), // cyan
    (255, 255, 0), // yellow
    (255, 0, 255), // magenta
    (0, 128, 255), // blue
];

/// A lightweight, render-only chart description.
///
/// The widget is intentionally data-driven: all series and bounds are computed
/// outside the render call. This keeps `render()` focused on drawing and makes
/// it easy to test the data prep separately.
pub struct CandlesChart<'a> {
    /// Candles as (bar index, [open, high, low, close]) in display units.
    pub candles: &'a [(f64, [f64; 4])],
    /// Moving-average overlays, already aligned to bar indices.
    pub overlays: &'a [OverlaySeries],
    /// X bounds (bar index space).
    pub x_bounds: [f64; 2],
    /// Y bounds (price, or ln(price) when the log flag is set).
    pub y_bounds: [f64; 2],
    /// Y axis caption ("price" or "price (log)").
    pub y_label: String,
    /// Per-bar tick labels (dates), indexed by rounded x value.
    pub date_labels: &'a [String],
}

impl<'a> Widget for CandlesChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a
        // chart. In that case, we render a small hint rather than panicking.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let x0 = self.x_bounds[0];
        let x1 = self.x_bounds[1];
        let y0 = self.y_bounds[0];
        let y1 = self.y_bounds[1];

        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite())
            || x1 <= x0
            || y1 <= y0
        {
            return;
        }

        // Candle body width in backend pixels. The ratatui backend's canvas is
        // roughly one pixel per terminal cell, so divide the columns between
        // the bars and leave a gap.
        let n = self.candles.len().max(1) as f64;
        let candle_px = ((f64::from(area.width) / n) - 1.0).floor().max(1.0) as u32;

        // `plotters-ratatui-backend` draws Plotters primitives via Ratatui's
        // `Canvas` widget, which ultimately writes to the terminal buffer.
        //
        // We delegate rendering to the crate-provided widget helper to avoid
        // coupling our code to its internal backend types.
        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                // Small margins keep the chart readable without wasting space.
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 8)
                .set_label_area_size(LabelAreaPosition::Bottom, 2)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            // Axes + tick labels.
            //
            // We disable the mesh lines to reduce visual clutter in
            // low-resolution terminal rendering; the axes + labels are enough.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .y_desc(&self.y_label)
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| {
                    let i = v.round();
                    if i < 0.0 {
                        return String::new();
                    }
                    self.date_labels
                        .get(i as usize)
                        .cloned()
                        .unwrap_or_default()
                })
                .y_label_formatter(&|v| format!("{v:.2}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            let gain = RGBColor(0, 255, 0);
            let loss = RGBColor(255, 0, 0);

            // 1) Candlesticks from OHLC.
            chart.draw_series(self.candles.iter().map(|&(x, [o, h, l, c])| {
                CandleStick::new(x, o, h, l, c, gain.filled(), loss.filled(), candle_px)
            }))?;

            // 2) One line trace per moving-average overlay.
            for (i, overlay) in self.overlays.iter().enumerate() {
                let (r, g, b) = OVERLAY_COLORS[i % OVERLAY_COLORS.len()];
                chart.draw_series(LineSeries::new(
                    overlay.points.iter().copied(),
                    &RGBColor(r, g, b),
                ))?;
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_into(area: Rect) -> Buffer {
        let candles = vec![
            (0.0, [10.0, 12.0, 9.0, 11.0]),
            (1.0, [11.0, 13.0, 10.0, 12.0]),
            (2.0, [12.0, 14.0, 11.0, 13.0]),
        ];
        let overlays = vec![OverlaySeries {
            label: "MA2".to_string(),
            points: vec![(1.0, 11.5), (2.0, 12.5)],
        }];
        let date_labels = vec![
            "06-01".to_string(),
            "06-02".to_string(),
            "06-03".to_string(),
        ];
        let widget = CandlesChart {
            candles: &candles,
            overlays: &overlays,
            x_bounds: [-0.5, 2.5],
            y_bounds: [8.0, 15.0],
            y_label: "price".to_string(),
            date_labels: &date_labels,
        };
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        buf
    }

    #[test]
    fn candles_and_overlays_render_into_the_buffer() {
        let buf = render_into(Rect::new(0, 0, 60, 20));
        assert!(buf.content().iter().any(|cell| cell.symbol() != " "));
    }

    #[test]
    fn tiny_area_shows_a_resize_hint() {
        let area = Rect::new(0, 0, 12, 3);
        let buf = render_into(area);
        let first_row: String = (0..area.width)
            .map(|x| buf[(x, 0)].symbol().to_string())
            .collect();
        assert!(first_row.starts_with("Chart area"));
    }
}
