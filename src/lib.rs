//! `stock-ma` library crate.
//!
//! The binary (`sma`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the pipeline stages (fetch, validate, averages, assemble) are callable
//!   from scripts without the TUI or the refresh timer
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod assemble;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod ma;
pub mod refresh;
pub mod report;
pub mod series;
pub mod tui;
