use colored::Colorize;
use reconcile::{ApplyResult, ExecuteSummary};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// One-character marker for a cycle outcome
pub fn result_symbol(result: &ApplyResult) -> String {
    match result {
        ApplyResult::NoChange => "○".dimmed().to_string(),
        ApplyResult::Created
        | ApplyResult::Ensured
        | ApplyResult::Replaced
        | ApplyResult::Modified => "✓".green().to_string(),
        ApplyResult::Removed => "−".green().to_string(),
        ApplyResult::Failed { .. } => "✗".red().to_string(),
        ApplyResult::Skipped { .. } => "⊘".yellow().to_string(),
    }
}

/// Short description of a cycle outcome
pub fn describe_result(result: &ApplyResult) -> String {
    match result {
        ApplyResult::NoChange => "up to date".to_string(),
        ApplyResult::Created => "created".to_string(),
        ApplyResult::Ensured => "created or adopted".to_string(),
        ApplyResult::Replaced => "replaced".to_string(),
        ApplyResult::Modified => "resized".to_string(),
        ApplyResult::Removed => "removed".to_string(),
        ApplyResult::Failed { error } => error.clone(),
        ApplyResult::Skipped { reason } => format!("skipped: {reason}"),
    }
}

/// Print final summary
pub fn print_summary(summary: &ExecuteSummary) {
    println!();
    if summary.is_success() {
        println!("  {} Disks reconciled", "✓".green().bold());
    } else {
        println!("  {} Disks reconciled with errors", "⚠".yellow().bold());
    }

    let lines = [
        (summary.created, "created"),
        (summary.ensured, "created or adopted"),
        (summary.replaced, "replaced"),
        (summary.modified, "resized"),
        (summary.removed, "removed"),
        (summary.no_change, "up to date"),
        (summary.skipped, "skipped"),
    ];
    for (count, label) in lines {
        if count > 0 {
            println!("    • {count} {label}");
        }
    }
    if summary.failed > 0 {
        println!("    • {} {}", summary.failed, "failed".red());
    }
}

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;
const TB: u64 = GB * 1024;

/// Format bytes as human-readable size
pub fn format_size(bytes: u64) -> String {
    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
