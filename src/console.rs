//! Colorful console output for draft generation.

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use std::time::Duration;

use crate::generator::DraftGrid;

/// Startup banner.
pub fn print_banner(addr: &str, demo: &str) {
    println!();
    println!("  {}", "Shift Scheduling".bright_cyan().bold());
    println!(
        "  {} {}",
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black(),
        format!("demo data {}", demo).white()
    );
    println!(
        "  {} {}\n",
        "Listening on".bright_black(),
        format!("http://{}", addr).bright_green()
    );
}

/// Prints the fill summary of a generated draft.
pub fn print_draft_summary(grid: &DraftGrid, course_count: usize, elapsed: Duration) {
    let total = grid.cells().len();
    let filled = grid.filled_count();
    let unfilled = grid.unfilled_count();
    let coverage = if total > 0 {
        filled as f64 / total as f64 * 100.0
    } else {
        100.0
    };

    let coverage_str = format!("{:.1}%", coverage);
    let coverage_colored = if unfilled == 0 {
        coverage_str.bright_green().bold().to_string()
    } else {
        coverage_str.yellow().bold().to_string()
    };

    println!(
        "{} {} {} Draft {} ({} days x {} courses): filled ({}), unfilled ({}), coverage {}, time spent ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Draft]".bright_cyan(),
        grid.range().to_string().white().bold(),
        grid.range().len_days().to_formatted_string(&Locale::en).bright_yellow(),
        course_count.to_formatted_string(&Locale::en).bright_yellow(),
        filled.to_formatted_string(&Locale::en).bright_green(),
        unfilled.to_formatted_string(&Locale::en).bright_red(),
        coverage_colored,
        format_duration(elapsed).yellow()
    );
}

/// Formats a duration nicely.
fn format_duration(d: Duration) -> String {
    let total_ms = d.as_millis();
    if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else if total_ms < 60_000 {
        format!("{:.2}s", d.as_secs_f64())
    } else {
        let mins = total_ms / 60_000;
        let secs = (total_ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    }
}

/// Returns a timestamp string.
fn timestamp() -> String {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| format!("{}.{:03}", d.as_secs(), d.subsec_millis()))
        .unwrap_or_else(|_| "0.000".to_string())
}
