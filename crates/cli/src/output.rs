//! Terminal output formatting with rich UI support.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tessera_plugin::{ExtensionManager, LoadedExtension};

use crate::runtime::LoadReport;

/// Prints a success message.
pub fn success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Prints an error message.
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

/// Prints a warning message.
pub fn warning(message: &str) {
    println!("{} {}", style("⚠").yellow().bold(), message);
}

/// Prints an info message.
pub fn info(message: &str) {
    println!("{} {}", style("ℹ").blue().bold(), message);
}

/// Prints an extension loaded message.
pub fn extension_loaded(extension: &LoadedExtension) {
    let version = extension
        .version
        .as_deref()
        .map(|v| format!(" v{}", v))
        .unwrap_or_default();
    println!(
        "{} {}{} {}",
        style("✓").green(),
        extension.id,
        style(version).dim(),
        style(format!(
            "({} registered, {} listeners)",
            extension.added.len(),
            extension.subscriptions
        ))
        .dim()
    );
}

/// Prints an extension failed message.
pub fn extension_failed(id: &str, reason: &str) {
    eprintln!("{} {} - {}", style("✗").red(), style(id).red(), reason);
}

/// Prints an extension unloaded message.
pub fn extension_unloaded(id: &str) {
    println!("{} {}", style("○").dim(), style(format!("{} unloaded", id)).dim());
}

/// Prints every line of a load report.
pub fn load_report(report: &LoadReport, manager: &ExtensionManager) {
    for id in &report.loaded {
        if let Some(extension) = manager.loaded(id) {
            extension_loaded(&extension);
        }
    }
    for (id, failure) in &report.failed {
        extension_failed(id, &failure.to_string());
    }
}

/// Prints a summary of a run.
pub fn summary(frames: u64, extensions: usize, failed: usize, duration_ms: u64) {
    println!();

    if failed > 0 {
        println!(
            "{}: {} frames, {} extensions, {} failed to load in {}ms",
            style("DEGRADED").yellow().bold(),
            frames,
            extensions,
            failed,
            duration_ms
        );
    } else {
        println!(
            "{}: {} frames, {} extensions in {}ms",
            style("SUCCESS").green().bold(),
            frames,
            extensions,
            duration_ms
        );
    }
}

// ============================================================================
// Rich UI Components
// ============================================================================

/// Creates a spinner for long-running operations.
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .expect("Invalid spinner template"),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Creates a progress bar with a specific length.
pub fn create_progress_bar(len: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("Invalid progress bar template")
            .progress_chars("█▓░"),
    );
    pb.set_message(message.to_string());
    pb
}

/// Prints a header for a section.
pub fn section_header(title: &str) {
    println!("\n{}", style(format!("── {} ──", title)).bold());
}

/// Prints a list item.
pub fn list_item(text: &str) {
    println!("  {} {}", style("•").dim(), text);
}

/// Prints a key-value pair.
pub fn key_value(key: &str, value: &str) {
    println!("  {}: {}", style(key).dim(), value);
}
