//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - provider request enums (`PeriodCode`, `IntervalCode`, `FetchMode`)
//! - the immutable per-fetch request (`FetchRequest`)
//! - live-mode configuration (`RefreshConfig`)

pub mod types;

pub use types::*;
