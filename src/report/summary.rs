//! Performance summary card

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::pipeline::PerformanceSummary;

fn ratio_color(value: f64, good: f64, fair: f64) -> Color {
    if value >= good {
        Color::Green
    } else if value >= fair {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// Print the evaluation summary as an indented table
pub fn display_performance(summary: &PerformanceSummary) {
    println!();
    println!(
        "    {} {}",
        style("📋").cyan(),
        style("PERFORMANCE SUMMARY").white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
    println!();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Metric").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
    ]);

    table.add_row(vec![Cell::new("🧩 Problem"), Cell::new(&summary.problem)]);
    table.add_row(vec![
        Cell::new("📐 Variables / Constraints"),
        Cell::new(format!("{} / {}", summary.num_var, summary.num_constr)),
    ]);
    table.add_row(vec![Cell::new("🔢 Parameters"), Cell::new(summary.n_theta)]);
    table.add_row(vec![
        Cell::new("📚 Train / Test"),
        Cell::new(format!("{} / {}", summary.n_train, summary.n_test)),
    ]);
    table.add_row(vec![
        Cell::new("🗂️  Strategies"),
        Cell::new(summary.n_strategies),
    ]);
    table.add_row(vec![Cell::new("🎯 Candidates (n_best)"), Cell::new(summary.n_best)]);

    table.add_row(vec![
        Cell::new("✅ Accuracy"),
        Cell::new(format!(
            "{:.1}% ({}/{})",
            summary.accuracy * 100.0,
            summary.n_correct,
            summary.n_test
        ))
        .fg(ratio_color(summary.accuracy, 0.9, 0.7))
        .add_attribute(Attribute::Bold),
    ]);

    table.add_row(vec![
        Cell::new("⚠️  Infeasible"),
        Cell::new(summary.n_infeas).fg(if summary.n_infeas == 0 {
            Color::White
        } else {
            Color::Red
        }),
    ]);
    table.add_row(vec![
        Cell::new("📏 Infeasibility (avg / max)"),
        Cell::new(format!("{:.2e} / {:.2e}", summary.avg_infeas, summary.max_infeas)),
    ]);

    let subopt = match summary.avg_subopt {
        Some(avg) => format!("{:.2e} / {:.2e}", avg, summary.max_subopt),
        None => format!("n/a / {:.2e}", summary.max_subopt),
    };
    table.add_row(vec![Cell::new("📉 Suboptimality (avg / max)"), Cell::new(subopt)]);

    table.add_row(vec![
        Cell::new("⏱️  Time improvement (avg / max)"),
        Cell::new(format!(
            "{:.1}% / {:.1}%",
            summary.avg_time_improv * 100.0,
            summary.max_time_improv * 100.0
        ))
        .fg(ratio_color(summary.avg_time_improv, 0.5, 0.0)),
    ]);

    // Indent the table
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}
