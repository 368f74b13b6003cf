//! Human-readable run summaries and failure reports

use cyload_core::QueryCounters;

/// Summary used when a run changed nothing
pub const NO_CHANGES_MESSAGE: &str = "No changes were made to the database.";

/// Notification title for a successful run
pub const SUCCESS_TITLE: &str = "Cypher Executed";

/// Notification title for a failed run
pub const FAILURE_TITLE: &str = "Cypher Execution Failed";

/// One line per non-zero counter, e.g. "3 node(s) created"
pub fn build_summary(counters: &QueryCounters) -> String {
    let lines: Vec<String> = counters
        .non_zero()
        .map(|(kind, count)| format!("{} {} {}", count, kind.noun(), kind.verb()))
        .collect();

    if lines.is_empty() {
        NO_CHANGES_MESSAGE.to_string()
    } else {
        lines.join("\n")
    }
}

/// Result message stored when every statement completed
pub fn success_message(total: usize, counters: &QueryCounters) -> String {
    format!(
        "Cypher executed successfully!\n{} statement(s) completed.\n\n{}",
        total,
        build_summary(counters)
    )
}

/// Short notification text for a successful run
pub fn success_notification(total: usize) -> String {
    format!("{} statement(s) completed successfully", total)
}

/// Append the partial summary block to a statement failure
pub fn statement_failure_report(
    headline: &str,
    executed: usize,
    total: usize,
    counters: &QueryCounters,
) -> String {
    format!(
        "{}\n\nPartial execution summary ({} of {} statements):\n{}",
        headline,
        executed,
        total,
        build_summary(counters)
    )
}

/// Append the partial summary block to a commit failure
pub fn commit_failure_report(headline: &str, counters: &QueryCounters) -> String {
    format!(
        "{}\n\nPartial execution summary:\n{}",
        headline,
        build_summary(counters)
    )
}
