use export_engine::DocumentReport;
use export_logging::{export_error, export_info};

/// Logs the run summary and every failed document. With `annotate` each
/// failure is also printed as a GitHub Actions error annotation.
pub fn log_report(report: &DocumentReport, annotate: bool) {
    let summary = report.summary();
    export_info!(
        "Exported {} of {} documents ({} skipped, {} failed)",
        summary.written,
        summary.listed,
        summary.skipped,
        summary.failed
    );
    for (name, error) in report.failures() {
        let message = format!("{name}: {error}");
        export_error!("{}", message);
        if annotate {
            println!("{}", github_annotation(&message));
        }
    }
}

/// A workflow command that marks `message` as an error in the Actions UI.
pub fn github_annotation(message: &str) -> String {
    let escaped = message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A");
    format!("::error::{escaped}")
}
