use owo_colors::OwoColorize;

use eitaa_relay_core::{DeliveryDecision, DeliveryReport, Post};

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!(
        "\n{} {} {}",
        "eitaa-relay".bold().bright_blue(),
        "v".dimmed(),
        VERSION.dimmed()
    );
    eprintln!("{}", "Relay new Eitaa channel posts to Telegram\n".dimmed());
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

fn decision_label(decision: DeliveryDecision) -> &'static str {
    match decision {
        DeliveryDecision::AlreadySent => "already sent",
        DeliveryDecision::SendText => "send text",
        DeliveryDecision::SendMediaGroup => "send media group",
        DeliveryDecision::SkipEmpty => "skip (empty)",
    }
}

/// Print what a dry run would do with each post
pub fn print_plan(plan: &[(&Post, DeliveryDecision)]) {
    eprintln!("\n{}", "═".repeat(60).dimmed());
    eprintln!("{}", "Delivery Plan".bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());

    for (post, decision) in plan {
        let images = if post.images.is_empty() { String::new() } else { format!(" ({} images)", post.images.len()) };
        eprintln!(
            "  {} {}{}",
            format!("{}:", post.id).dimmed(),
            decision_label(*decision).bright_white(),
            images.dimmed()
        );
    }
    eprintln!();
}

/// Print delivery summary
pub fn print_summary(report: &DeliveryReport) {
    eprintln!("\n{}", "═".repeat(60).dimmed());
    eprintln!("{}", "Delivery Summary".bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());
    eprintln!("  {} {}", "Sent:".dimmed(), report.sent.to_string().bright_white());
    eprintln!("  {} {}", "Already sent:".dimmed(), report.already_sent.to_string().bright_white());
    eprintln!("  {} {}", "Empty:".dimmed(), report.skipped_empty.to_string().bright_white());
    eprintln!("  {} {}\n", "Failed:".dimmed(), report.failed.len().to_string().bright_white());

    for failed in &report.failed {
        print_error(&format!("{}: {}", failed.post_id, failed.error));
    }
    for failed in &report.ledger_errors {
        print_warning(&format!("{} was sent but not recorded: {}", failed.post_id, failed.error));
    }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
