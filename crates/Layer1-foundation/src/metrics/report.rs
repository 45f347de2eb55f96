//! Text performance report

use std::fmt::Write;

use super::aggregate::AggregatedMetrics;

/// Operations listed in the report's top section
const REPORT_TOP_OPERATIONS: usize = 5;

pub const EMPTY_REPORT: &str = "No performance metrics available.";

/// Render an aggregate as the plain-text report shown to operators.
pub fn render_report(metrics: &AggregatedMetrics) -> String {
    if metrics.is_empty() {
        return EMPTY_REPORT.to_string();
    }

    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = writeln!(out, "=== Performance Report ===");
    let _ = writeln!(out, "Total API Calls: {}", metrics.total_calls);
    let _ = writeln!(
        out,
        "Average Token Reduction: {:.1}%",
        metrics.avg_reduction_pct
    );
    let _ = writeln!(out, "Total Tokens Saved: {}", metrics.tokens_saved());
    let _ = writeln!(
        out,
        "Average Execution Time: {:.1}ms",
        metrics.avg_elapsed_ms
    );
    let _ = writeln!(
        out,
        "Cache Hit Rate: {:.1}%",
        metrics.cache_hit_rate * 100.0
    );

    let _ = writeln!(out);
    let _ = writeln!(out, "--- Top Operations by Reduction ---");
    for (operation, op) in metrics.top_operations(REPORT_TOP_OPERATIONS) {
        let _ = writeln!(
            out,
            "{}: {:.1}% reduction ({} calls, {:.1}ms avg)",
            operation, op.avg_reduction, op.calls, op.avg_elapsed_ms
        );
    }

    let _ = writeln!(out);
    let _ = write!(out, "--- Optimization Levels ---");
    for (level, lm) in &metrics.by_level {
        let _ = write!(
            out,
            "\n{}: {} calls, {:.1}% avg reduction, {} tokens saved",
            level, lm.calls, lm.avg_reduction, lm.tokens_saved
        );
    }

    out
}
