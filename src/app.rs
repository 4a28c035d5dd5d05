//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - runs the one-shot chart pipeline and prints/exports its output
//! - hands off to the TUI for interactive use

use clap::Parser;

use crate::cli::{ChartArgs, Command};
use crate::data::YahooClient;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `sma` binary.
pub fn run() -> Result<(), AppError> {
    // We want a bare `sma` and `sma -t MSFT` to behave like `sma tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of
    // the argv list before parsing. This preserves a clean clap structure
    // while keeping the dashboard one keystroke away.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Chart(args) => handle_chart(args),
        Command::Tui(args) => crate::tui::run(args),
    }
}

fn handle_chart(args: ChartArgs) -> Result<(), AppError> {
    let request = args.fetch_request()?;
    let client = YahooClient::new();
    let dataset = pipeline::run_cycle(&client, &request, &args.windows, args.log)?;

    println!(
        "{}",
        crate::report::format_dataset_summary(&dataset, &request, args.rows)
    );

    for warning in &dataset.warnings {
        eprintln!("warning: {warning}");
    }

    if let Some(path) = &args.export {
        crate::io::export::write_dataset_csv(path, &dataset)?;
        println!("Exported {} rows to {}", dataset.len(), path.display());
    }

    Ok(())
}

/// Rewrite argv so `sma` defaults to `sma tui`.
///
/// Rules:
/// - `sma`                      -> `sma tui`
/// - `sma -t MSFT ...`          -> `sma tui -t MSFT ...`
/// - `sma --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "chart" | "tui");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_defaults_to_tui() {
        assert_eq!(rewrite_args(args(&["sma"])), args(&["sma", "tui"]));
    }

    #[test]
    fn leading_flag_goes_to_tui() {
        assert_eq!(
            rewrite_args(args(&["sma", "-t", "MSFT"])),
            args(&["sma", "tui", "-t", "MSFT"])
        );
    }

    #[test]
    fn explicit_subcommands_and_help_pass_through() {
        assert_eq!(
            rewrite_args(args(&["sma", "chart", "-t", "MSFT"])),
            args(&["sma", "chart", "-t", "MSFT"])
        );
        assert_eq!(rewrite_args(args(&["sma", "--help"])), args(&["sma", "--help"]));
    }
}
