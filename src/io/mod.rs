//! Local file output.

pub mod export;
