use std::path::PathBuf;

/// Result of one document's pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome<E> {
    Written { name: String, path: PathBuf },
    /// Name does not start with a `YYYY-MM-DD` prefix.
    Skipped { name: String },
    Failed { name: String, error: E },
}

impl<E> DocumentOutcome<E> {
    pub fn name(&self) -> &str {
        match self {
            DocumentOutcome::Written { name, .. }
            | DocumentOutcome::Skipped { name }
            | DocumentOutcome::Failed { name, .. } => name,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, DocumentOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExportSummary {
    pub listed: usize,
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Every listed document with its outcome, in listing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport<E> {
    outcomes: Vec<DocumentOutcome<E>>,
}

impl<E> ExportReport<E> {
    pub fn new(outcomes: Vec<DocumentOutcome<E>>) -> Self {
        Self { outcomes }
    }

    pub fn outcomes(&self) -> &[DocumentOutcome<E>] {
        &self.outcomes
    }

    pub fn summary(&self) -> ExportSummary {
        self.outcomes
            .iter()
            .fold(ExportSummary::default(), |mut summary, outcome| {
                summary.listed += 1;
                match outcome {
                    DocumentOutcome::Written { .. } => summary.written += 1,
                    DocumentOutcome::Skipped { .. } => summary.skipped += 1,
                    DocumentOutcome::Failed { .. } => summary.failed += 1,
                }
                summary
            })
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &E)> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            DocumentOutcome::Failed { name, error } => Some((name.as_str(), error)),
            _ => None,
        })
    }

    pub fn written_paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            DocumentOutcome::Written { path, .. } => Some(path),
            _ => None,
        })
    }

    pub fn is_success(&self) -> bool {
        !self.outcomes.iter().any(DocumentOutcome::is_failed)
    }
}

impl<E> Default for ExportReport<E> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
