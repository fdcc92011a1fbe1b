//! Terminal styling utilities

use std::path::Path;

use console::{style, Emoji};

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static SAVE: Emoji<'_, '_> = Emoji("💾 ", "");
pub static GEAR: Emoji<'_, '_> = Emoji("⚙️  ", "");

/// Print the application banner
pub fn print_banner(version: &str) {
    println!();
    println!(
        "    {} {}",
        style("stratlearn").cyan().bold(),
        style(format!("v{}", version)).dim()
    );
    println!(
        "    {}",
        style("Learning optimal strategies of parametric programs").dim()
    );
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// Print a configuration card: one `label: value` line per entry
pub fn print_config(title: &str, entries: &[(&str, String)]) {
    let width = entries.iter().map(|(k, _)| k.len()).max().unwrap_or(0);

    println!("    {}{}", GEAR, style(title).cyan().bold());
    println!("    {}", style("─".repeat(50)).dim());
    for (key, value) in entries {
        println!(
            "      {:<width$}  {}",
            style(key).dim(),
            style(truncate_string(value, 60)).yellow(),
            width = width
        );
    }
    println!();
}

/// Print a step header with styling
pub fn print_step_header(step_num: u8, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).cyan().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

/// Print a saved-file line
pub fn print_saved(path: &Path) {
    println!("    {}{}", SAVE, truncate_path(path, 60));
}

/// Print the input file line
pub fn print_input(path: &Path) {
    println!("    {}{}", FOLDER, truncate_path(path, 60));
}

/// Print the final completion message
pub fn print_completion(action: &str) {
    println!();
    println!(
        "    {} {}",
        ROCKET,
        style(format!("{} complete!", action)).green().bold()
    );
    println!();
}

/// Print a styled count message
pub fn print_count(description: &str, count: usize, detail: Option<&str>) {
    match detail {
        Some(info) => println!(
            "      Found {} {} {}",
            style(count).yellow().bold(),
            description,
            style(info).dim()
        ),
        None => println!("      Found {} {}", style(count).yellow().bold(), description),
    }
}

/// Print the elapsed time of a step
pub fn print_step_time(elapsed: std::time::Duration) {
    println!(
        "      {}",
        style(format!("⏱  {:.2}s", elapsed.as_secs_f64())).dim()
    );
}

fn truncate_path(path: &Path, max_len: usize) -> String {
    truncate_string(&path.display().to_string(), max_len)
}

fn truncate_string(s: &str, max_len: usize) -> String {
    let count = s.chars().count();
    if count <= max_len {
        s.to_string()
    } else {
        let tail: String = s.chars().skip(count - max_len + 3).collect();
        format!("...{}", tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("short", 10), "short");
        assert_eq!(truncate_string("abcdefghij", 6), "...hij");
    }
}
