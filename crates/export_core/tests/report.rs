use std::path::PathBuf;

use export_core::{DocumentOutcome, ExportReport, ExportSummary};
use pretty_assertions::assert_eq;

fn sample_report() -> ExportReport<String> {
    ExportReport::new(vec![
        DocumentOutcome::Written {
            name: "2024-01-02-b".to_string(),
            path: PathBuf::from("out/2024-01-02-b/index.md"),
        },
        DocumentOutcome::Skipped {
            name: "draft-notes".to_string(),
        },
        DocumentOutcome::Failed {
            name: "2024-01-01-a".to_string(),
            error: "document body is empty".to_string(),
        },
    ])
}

#[test]
fn summary_counts_each_outcome() {
    assert_eq!(
        sample_report().summary(),
        ExportSummary {
            listed: 3,
            written: 1,
            skipped: 1,
            failed: 1,
        }
    );
}

#[test]
fn failures_and_written_paths_are_exposed() {
    let report = sample_report();
    let failures: Vec<_> = report.failures().collect();
    assert_eq!(
        failures,
        vec![("2024-01-01-a", &"document body is empty".to_string())]
    );
    let written: Vec<_> = report.written_paths().cloned().collect();
    assert_eq!(written, vec![PathBuf::from("out/2024-01-02-b/index.md")]);
    assert!(!report.is_success());
}

#[test]
fn skipped_documents_are_not_failures() {
    let report: ExportReport<String> = ExportReport::new(vec![DocumentOutcome::Skipped {
        name: "draft-notes".to_string(),
    }]);
    assert!(report.is_success());
    assert_eq!(report.outcomes()[0].name(), "draft-notes");
}

#[test]
fn empty_report_is_success() {
    let report: ExportReport<String> = ExportReport::default();
    assert!(report.is_success());
    assert_eq!(report.summary(), ExportSummary::default());
}
