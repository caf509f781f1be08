//! Styled terminal output for headless commands

use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

/// Status indicators
pub struct StatusIcons;

impl StatusIcons {
    pub const SUCCESS: &'static str = "✓";
    pub const ERROR: &'static str = "✗";
    pub const PARCEL: &'static str = "📦";
}

/// Spinner whose message tracks the converter's latest log line
pub fn activity_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.cyan} [{elapsed}] {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Print a styled header
pub fn print_header(title: &str) {
    println!("\n{} {}", StatusIcons::PARCEL, title.bright_white().bold());
    println!("{}", "─".repeat(40).bright_black());
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {}: {}", key.bright_black(), value.white());
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("{} {}", StatusIcons::SUCCESS.green(), msg.green());
}

/// Print an error message
pub fn print_error(msg: &str) {
    eprintln!("{} {}", StatusIcons::ERROR.red(), msg.red());
}
