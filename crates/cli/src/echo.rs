use owo_colors::OwoColorize;
use precis_core::{DigestSource, DigestStats, QueryReport, TextToDigest};

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!("\n{} {} {}", "precis".bold().bright_blue(), "v".dimmed(), VERSION.dimmed());
    eprintln!("{}", "Extract article text and digest it once\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message.bright_red());
}

/// Print timing information with color coding
pub fn print_timing(label: &str, duration: std::time::Duration) {
    let ms = duration.as_secs_f64() * 1000.0;
    let label = format!("{}:", label);
    if ms < 50.0 {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "fast".dimmed());
    } else if ms < 100.0 {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "moderate".bright_yellow());
    } else {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "slow".bright_red());
    }
}

/// Print what is about to be digested
pub fn print_extraction_details(text: &TextToDigest) {
    let source = match text.source {
        DigestSource::Selection => "selection",
        DigestSource::Article => "article",
    };
    eprintln!("  {} {}", "Source:".dimmed(), source.bright_white());
    if let Some(title) = &text.title {
        eprintln!("  {} {}", "Title:".dimmed(), title.bright_white());
    }
    eprintln!("  {} {}\n", "Characters:".dimmed(), text.text.chars().count().to_string().bright_white());
}

/// Print the per-query report of `--explain`
pub fn print_candidates(reports: &[QueryReport]) {
    eprintln!("\n{}", "═".repeat(60).dimmed());
    eprintln!("{}", "Content Queries".bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());

    for report in reports {
        match report {
            QueryReport::Found { query, tag, raw_length, percent, exclusions, selected } => {
                let marker = if *selected { "●".green().to_string() } else { "○".dimmed().to_string() };
                println!(
                    "{} {} <{}> {} chars, {}%",
                    marker,
                    query.bright_white(),
                    tag,
                    raw_length,
                    percent
                );
                if !exclusions.self_patterns.is_empty() {
                    println!("    {} {}", "excluded by:".dimmed(), exclusions.self_patterns.join(", ").yellow());
                }
                if !exclusions.ancestors.is_empty() {
                    println!("    {} {}", "inside:".dimmed(), exclusions.ancestors.join(", ").yellow());
                }
            }
            QueryReport::NotFound { query } => println!("{} {} {}", "·".dimmed(), query.dimmed(), "no match".dimmed()),
            QueryReport::Invalid { query } => println!("{} {} {}", "✗".red(), query, "invalid selector".red()),
        }
    }
}

/// Print digest usage counters
pub fn print_stats(stats: &DigestStats) {
    eprintln!("{}", "═".repeat(60).dimmed());
    eprintln!("{}", "Digest Summary".bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());
    eprintln!("  {} {}", "Cache hits:".dimmed(), stats.cache_hits.to_string().bright_white());
    eprintln!("  {} {}", "Transform calls:".dimmed(), stats.transform_calls.to_string().bright_white());
    eprintln!(
        "  {} {} → {}\n",
        "Characters:".dimmed(),
        stats.input_chars.to_string().bright_white(),
        stats.output_chars.to_string().bright_white()
    );
}

/// Format file size for display
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
