//! Ratatui-based terminal dashboard.
//!
//! The TUI provides a settings panel for the ticker, lookback, interval, and
//! moving-average windows, renders the candlestick chart with overlays, and
//! drives live updates through the refresh controller.
//!
//! Threading model: the event loop is the only place that mutates state. The
//! network fetch runs on a spawned thread and reports back over a channel;
//! every reply carries the generation counter it was spawned with, so results
//! that arrive after a config change or after live mode was disabled are
//! discarded instead of overwriting fresher data.

use std::io;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
    Terminal,
};

use crate::app::pipeline;
use crate::assemble::ChartDataset;
use crate::cli::ChartArgs;
use crate::data::{RawSeries, YahooClient};
use crate::domain::{FetchMode, FetchRequest, IntervalCode, PeriodCode, RefreshConfig, MIN_REFRESH_SECS};
use crate::error::AppError;
use crate::ma::normalize_windows;
use crate::refresh::RefreshController;
use crate::report::{fmt_avg, fmt_price};

mod plotters_chart;

use plotters_chart::{CandlesChart, OverlaySeries, OVERLAY_COLORS};

/// Start the TUI.
pub fn run(args: ChartArgs) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::render(format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(args)?;
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::render(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::render(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Result of a background fetch, tagged with the generation it belongs to.
struct FetchReply {
    generation: u64,
    request: FetchRequest,
    result: Result<RawSeries, AppError>,
}

/// Which settings field is being text-edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Editing {
    Ticker,
    Windows,
}

const FIELD_TICKER: usize = 0;
const FIELD_PERIOD: usize = 1;
const FIELD_INTERVAL: usize = 2;
const FIELD_WINDOWS: usize = 3;
const FIELD_LOG: usize = 4;
const FIELD_LIVE: usize = 5;
const FIELD_REFRESH: usize = 6;
const FIELD_COUNT: usize = 7;

struct App {
    client: YahooClient,

    // Current-values snapshot owned by the UI; immutable FetchRequest /
    // RefreshConfig structs are rebuilt from it on each user action.
    ticker: String,
    period: PeriodCode,
    date_range: Option<(chrono::NaiveDate, chrono::NaiveDate)>,
    interval: IntervalCode,
    windows: Vec<usize>,
    log_scale: bool,
    refresh_secs: u64,

    selected_field: usize,
    editing: Option<Editing>,
    edit_input: String,
    status: String,

    controller: RefreshController,
    in_flight: bool,
    wants_fetch: bool,
    generation: u64,
    tx: mpsc::Sender<FetchReply>,
    rx: mpsc::Receiver<FetchReply>,

    // Last good raw series plus the request it answered, kept so that
    // display-only changes (windows, log scale) recompute without re-fetching.
    raw: Option<(FetchRequest, RawSeries)>,
    dataset: Option<ChartDataset>,
}

impl App {
    fn new(args: ChartArgs) -> Result<Self, AppError> {
        normalize_windows(&args.windows)?;
        let request = args.fetch_request()?;

        let (tx, rx) = mpsc::channel();
        let mut app = Self {
            client: YahooClient::new(),
            ticker: request.ticker.clone(),
            period: args.period,
            date_range: match request.mode {
                FetchMode::DateRange { start, end } => Some((start, end)),
                FetchMode::Period(_) => None,
            },
            interval: args.interval,
            windows: args.windows.clone(),
            log_scale: args.log,
            refresh_secs: args.refresh_secs.max(MIN_REFRESH_SECS),
            selected_field: 0,
            editing: None,
            edit_input: String::new(),
            status: "Fetching data...".to_string(),
            controller: RefreshController::new(),
            in_flight: false,
            wants_fetch: false,
            generation: 0,
            tx,
            rx,
            raw: None,
            dataset: None,
        };

        if args.live {
            // The controller's immediate-cycle-on-enable contract covers the
            // initial fetch.
            app.set_live(true);
        } else {
            app.wants_fetch = true;
        }
        Ok(app)
    }

    /// Build an immutable request from the current settings snapshot.
    fn current_request(&self) -> Result<FetchRequest, AppError> {
        let mode = match self.date_range {
            Some((start, end)) => FetchMode::DateRange { start, end },
            None => FetchMode::Period(self.period),
        };
        let request = FetchRequest {
            ticker: self.ticker.trim().to_string(),
            mode,
            interval: self.interval,
        };
        request.validate()?;
        Ok(request)
    }

    fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::render(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::render(format!("Event poll error: {e}")))?
            {
                match event::read().map_err(|e| AppError::render(format!("Event read error: {e}")))? {
                    Event::Key(key) => {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        if self.handle_key(key.code) {
                            break;
                        }
                        needs_redraw = true;
                    }
                    Event::Resize(_, _) => {
                        needs_redraw = true;
                    }
                    _ => {}
                }
            }

            if self.pump() {
                needs_redraw = true;
            }

            // Keep the countdown in the header moving while live.
            if self.controller.is_running() || self.in_flight {
                needs_redraw = true;
            }
        }
        Ok(())
    }

    /// Drain fetch replies and start the next cycle when one is due.
    /// Returns true when anything changed.
    fn pump(&mut self) -> bool {
        let mut changed = false;

        while let Ok(reply) = self.rx.try_recv() {
            self.in_flight = false;
            self.controller.cycle_finished();
            changed = true;

            if reply.generation != self.generation {
                // Result of a fetch that was superseded (config change or
                // live-mode disable); discard whole, per the cancellation
                // contract.
                continue;
            }

            match reply.result {
                Ok(raw) => {
                    self.raw = Some((reply.request, raw));
                    self.recompute();
                }
                Err(err) => {
                    // Transient failures are reported and tolerated; the
                    // refresh timer keeps running.
                    self.status = format!("Fetch failed: {err}");
                }
            }
        }

        if !self.in_flight {
            let now = Instant::now();
            if let Some(request) = self.controller.poll(now) {
                self.spawn_fetch(request);
                changed = true;
            } else if self.wants_fetch {
                self.wants_fetch = false;
                match self.current_request() {
                    Ok(request) => self.spawn_fetch(request),
                    Err(err) => self.status = err.to_string(),
                }
                changed = true;
            }
        }

        changed
    }

    fn spawn_fetch(&mut self, request: FetchRequest) {
        self.in_flight = true;
        let client = self.client.clone();
        let tx = self.tx.clone();
        let generation = self.generation;
        thread::spawn(move || {
            let result = client.fetch_series(&request);
            // The receiver disappears on quit; nothing to do about it here.
            let _ = tx.send(FetchReply {
                generation,
                request,
                result,
            });
        });
    }

    /// Recompute the dataset from the last good raw series (no network).
    fn recompute(&mut self) {
        let Some((request, raw)) = &self.raw else {
            return;
        };
        match pipeline::prepare_dataset(raw.clone(), request, &self.windows, self.log_scale) {
            Ok(dataset) => {
                self.status = if dataset.warnings.is_empty() {
                    format!("{}: {} bars.", dataset.ticker, dataset.len())
                } else {
                    format!(
                        "{}: {} bars, {} price(s) skipped for log scale.",
                        dataset.ticker,
                        dataset.len(),
                        dataset.warnings.len()
                    )
                };
                self.dataset = Some(dataset);
            }
            Err(err) => {
                self.status = err.to_string();
            }
        }
    }

    /// A fetch-relevant setting changed: invalidate in-flight results and
    /// refetch (restarting the live schedule if one is running).
    fn refetch_config_changed(&mut self) {
        self.generation += 1;
        if self.controller.is_running() {
            self.set_live(true);
        } else {
            self.wants_fetch = true;
        }
    }

    fn set_live(&mut self, on: bool) {
        if !on {
            self.controller.disable();
            // An in-flight cycle may still return; make sure it is discarded.
            self.generation += 1;
            self.status = "Live updates off.".to_string();
            return;
        }
        match self
            .current_request()
            .and_then(|request| RefreshConfig::new(self.refresh_secs, request))
        {
            Ok(config) => {
                let secs = config.interval_secs();
                self.controller.enable(config, Instant::now());
                self.status = format!("Live updates every {secs}s.");
            }
            Err(err) => {
                self.status = err.to_string();
            }
        }
    }

    /// Returns true when the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.editing.is_some() {
            self.handle_edit(code);
            return false;
        }

        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Up => {
                if self.selected_field > 0 {
                    self.selected_field -= 1;
                }
            }
            KeyCode::Down => {
                if self.selected_field < FIELD_COUNT - 1 {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1),
            KeyCode::Right => self.adjust_field(1),
            KeyCode::Enter => match self.selected_field {
                FIELD_TICKER => {
                    self.editing = Some(Editing::Ticker);
                    self.edit_input = self.ticker.clone();
                    self.status = "Editing ticker. Enter to apply, Esc to cancel.".to_string();
                }
                FIELD_WINDOWS => {
                    self.editing = Some(Editing::Windows);
                    self.edit_input = self
                        .windows
                        .iter()
                        .map(|w| w.to_string())
                        .collect::<Vec<_>>()
                        .join(",");
                    self.status =
                        "Editing MA windows (comma-separated). Enter to apply, Esc to cancel."
                            .to_string();
                }
                FIELD_LOG => self.toggle_log(),
                FIELD_LIVE => {
                    let on = !self.controller.is_running();
                    self.set_live(on);
                }
                _ => {}
            },
            KeyCode::Char('r') => {
                if !self.in_flight {
                    self.wants_fetch = true;
                    self.status = "Refreshing...".to_string();
                }
            }
            KeyCode::Char('l') => self.toggle_log(),
            KeyCode::Char('v') => {
                let on = !self.controller.is_running();
                self.set_live(on);
            }
            _ => {}
        }

        false
    }

    fn adjust_field(&mut self, delta: i32) {
        match self.selected_field {
            FIELD_PERIOD => {
                self.period = if delta >= 0 {
                    self.period.next()
                } else {
                    self.period.prev()
                };
                // Cycling the period leaves an explicit date range behind.
                self.date_range = None;
                self.status = format!("period: {}", self.period.code());
                self.refetch_config_changed();
            }
            FIELD_INTERVAL => {
                self.interval = if delta >= 0 {
                    self.interval.next()
                } else {
                    self.interval.prev()
                };
                self.status = format!("interval: {}", self.interval.code());
                self.refetch_config_changed();
            }
            FIELD_LOG => self.toggle_log(),
            FIELD_LIVE => {
                let on = !self.controller.is_running();
                self.set_live(on);
            }
            FIELD_REFRESH => {
                let next = if delta >= 0 {
                    self.refresh_secs.saturating_add(1)
                } else {
                    self.refresh_secs.saturating_sub(1)
                };
                self.refresh_secs = next.max(MIN_REFRESH_SECS);
                self.status = format!("refresh: {}s", self.refresh_secs);
                if self.controller.is_running() {
                    self.set_live(true);
                }
            }
            _ => {}
        }
    }

    fn toggle_log(&mut self) {
        self.log_scale = !self.log_scale;
        self.status = if self.log_scale {
            "Logarithmic price scale.".to_string()
        } else {
            "Linear price scale.".to_string()
        };
        // Display-only change: recompute from the stored raw series.
        self.recompute();
    }

    fn handle_edit(&mut self, code: KeyCode) {
        let Some(editing) = self.editing else {
            return;
        };
        match code {
            KeyCode::Esc => {
                self.editing = None;
                self.status = "Edit canceled.".to_string();
            }
            KeyCode::Enter => {
                self.editing = None;
                match editing {
                    Editing::Ticker => self.apply_ticker_input(),
                    Editing::Windows => self.apply_windows_input(),
                }
            }
            KeyCode::Backspace => {
                self.edit_input.pop();
            }
            KeyCode::Char(c) => match editing {
                // Tickers like BRK-B, ^GSPC, EURUSD=X, BTC-USD.
                Editing::Ticker => {
                    if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=') {
                        self.edit_input.push(c.to_ascii_uppercase());
                    }
                }
                Editing::Windows => {
                    if c.is_ascii_digit() || c == ',' || c == ' ' {
                        self.edit_input.push(c);
                    }
                }
            },
            _ => {}
        }
    }

    fn apply_ticker_input(&mut self) {
        let trimmed = self.edit_input.trim();
        if trimmed.is_empty() {
            self.status = "Ticker symbol must not be empty.".to_string();
            return;
        }
        self.ticker = trimmed.to_string();
        self.status = format!("ticker: {}", self.ticker);
        self.refetch_config_changed();
    }

    fn apply_windows_input(&mut self) {
        let parsed: Result<Vec<usize>, _> = self
            .edit_input
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse::<usize>)
            .collect();
        let windows = match parsed {
            Ok(w) if !w.is_empty() => w,
            Ok(_) => {
                self.status = "At least one MA window is required.".to_string();
                return;
            }
            Err(e) => {
                self.status = format!("Invalid window list: {e}");
                return;
            }
        };
        if let Err(err) = normalize_windows(&windows) {
            self.status = err.to_string();
            return;
        }
        self.windows = windows;
        self.status = format!(
            "windows: {}",
            self.windows
                .iter()
                .map(|w| w.to_string())
                .collect::<Vec<_>>()
                .join(",")
        );
        // Display-only change: recompute from the stored raw series.
        self.recompute();
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("sma", Style::default().fg(Color::Cyan)),
            Span::raw(" — candlesticks with moving averages"),
        ]));

        let range = match self.date_range {
            Some((start, end)) => format!("{start} .. {end}"),
            None => self.period.code().to_string(),
        };
        let live = if self.controller.is_running() {
            match self.controller.due_in(Instant::now()) {
                Some(d) => format!("live {}s (next in {}s)", self.refresh_secs, d.as_secs()),
                None => "live".to_string(),
            }
        } else {
            "paused".to_string()
        };
        lines.push(Line::from(Span::styled(
            format!(
                "{} | range: {range} | interval: {} | {} | {live}",
                self.ticker,
                self.interval.code(),
                if self.log_scale { "log" } else { "linear" },
            ),
            Style::default().fg(Color::Gray),
        )));

        if let Some(dataset) = &self.dataset {
            let last = &dataset.rows[dataset.len() - 1];
            let mut spans = vec![Span::styled(
                format!("close: {} | ", fmt_price(last.close)),
                Style::default().fg(Color::Gray),
            )];
            for (i, (label, avg)) in dataset.labels.iter().zip(&last.averages).enumerate() {
                let (r, g, b) = OVERLAY_COLORS[i % OVERLAY_COLORS.len()];
                spans.push(Span::styled(
                    format!("{label}: {}  ", fmt_avg(*avg)),
                    Style::default().fg(Color::Rgb(r, g, b)),
                ));
            }
            lines.push(Line::from(spans));
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(9)])
            .split(area);

        self.draw_chart(frame, chunks[0]);
        self.draw_settings(frame, chunks[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let title = match &self.dataset {
            Some(d) if d.log_scale => format!("{} (log scale)", d.ticker),
            Some(d) => d.ticker.clone(),
            None => "Chart".to_string(),
        };
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(dataset) = &self.dataset else {
            let msg = Paragraph::new("Waiting for data...")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default());
            frame.render_widget(msg, inner);
            return;
        };

        let Some((candles, overlays, x_bounds, y_bounds, date_labels)) = chart_series(dataset)
        else {
            let msg = Paragraph::new("No plottable bars in this range.")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default());
            frame.render_widget(msg, inner);
            return;
        };

        let widget = CandlesChart {
            candles: &candles,
            overlays: &overlays,
            x_bounds,
            y_bounds,
            y_label: if dataset.log_scale {
                "price (log)".to_string()
            } else {
                "price".to_string()
            },
            date_labels: &date_labels,
        };
        frame.render_widget(widget, inner);
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let range = match self.date_range {
            Some((start, end)) => format!("{start} .. {end}"),
            None => self.period.code().to_string(),
        };
        let windows = self
            .windows
            .iter()
            .map(|w| w.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let items = vec![
            ListItem::new(format!("Ticker: {}", self.ticker)),
            ListItem::new(format!("Period: {range}")),
            ListItem::new(format!("Interval: {}", self.interval.code())),
            ListItem::new(format!("MA windows: {windows}")),
            ListItem::new(format!(
                "Log scale: {}",
                if self.log_scale { "on" } else { "off" }
            )),
            ListItem::new(format!(
                "Live: {}",
                if self.controller.is_running() { "on" } else { "off" }
            )),
            ListItem::new(format!("Refresh: {}s", self.refresh_secs)),
        ];

        let list = List::new(items)
            .block(Block::default().title("Settings").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ratatui::widgets::ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);

        if self.editing.is_some() {
            let hint = Paragraph::new(format!("> {}", self.edit_input))
                .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
            let rect = Rect {
                x: area.x + 2,
                y: area.y + area.height.saturating_sub(2),
                width: area.width.saturating_sub(4),
                height: 1,
            };
            frame.render_widget(hint, rect);
        }
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  ←/→ adjust  Enter edit/toggle  r refresh  l log  v live  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Build chart series for Plotters: candles and overlay traces in bar-index
/// coordinates, bounds with a small pad, and per-bar date labels.
///
/// Returns `None` when no bar has a complete finite OHLC (nothing to plot).
#[allow(clippy::type_complexity)]
fn chart_series(
    dataset: &ChartDataset,
) -> Option<(
    Vec<(f64, [f64; 4])>,
    Vec<OverlaySeries>,
    [f64; 2],
    [f64; 2],
    Vec<String>,
)> {
    let mut candles = Vec::with_capacity(dataset.len());
    let mut date_labels = Vec::with_capacity(dataset.len());
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);

    for (i, row) in dataset.rows.iter().enumerate() {
        date_labels.push(row.ts.format("%m-%d").to_string());

        let ohlc = [row.open, row.high, row.low, row.close];
        if ohlc.iter().all(|v| v.is_finite()) {
            candles.push((i as f64, ohlc));
            y_min = y_min.min(row.low);
            y_max = y_max.max(row.high);
        }
    }

    if candles.is_empty() {
        return None;
    }

    let mut overlays = Vec::with_capacity(dataset.labels.len());
    for (col, label) in dataset.labels.iter().enumerate() {
        let points: Vec<(f64, f64)> = dataset
            .rows
            .iter()
            .enumerate()
            .filter_map(|(i, row)| match row.averages[col] {
                Some(v) if v.is_finite() => Some((i as f64, v)),
                _ => None,
            })
            .collect();
        for &(_, v) in &points {
            y_min = y_min.min(v);
            y_max = y_max.max(v);
        }
        overlays.push(OverlaySeries {
            label: label.clone(),
            points,
        });
    }

    if !y_min.is_finite() || !y_max.is_finite() || y_max <= y_min {
        y_min = if y_min.is_finite() { y_min - 0.5 } else { 0.0 };
        y_max = y_min + 1.0;
    }

    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);
    let y_bounds = [y_min - pad, y_max + pad];
    let x_bounds = [-0.5, dataset.len() as f64 - 0.5];

    Some((candles, overlays, x_bounds, y_bounds, date_labels))
}
