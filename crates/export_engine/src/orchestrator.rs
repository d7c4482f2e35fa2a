use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{FixedOffset, Offset, Utc};
use export_core::{
    created_timestamp, date_prefix, format_timestamp, output_dir_name, parse_date_prefix,
    DocumentOutcome, DocumentRef, ExportReport, ExportedDocument, NamingError, OutputRecord,
};
use export_logging::{export_debug, export_error, export_info};
use futures_util::stream::{self, StreamExt, TryStreamExt};

use crate::convert::DocumentConverter;
use crate::frontmatter::build_markdown_document;
use crate::persist::write_output_record;
use crate::store::DocumentStore;
use crate::types::{DocumentError, ExportError, ExportEvent, Stage};

pub const DEFAULT_CONCURRENCY: usize = 8;

pub type DocumentReport = ExportReport<DocumentError>;

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ExportEvent);
}

/// Forwards progress to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgressSink;

impl ProgressSink for LogProgressSink {
    fn emit(&self, event: ExportEvent) {
        match event {
            ExportEvent::Listing { container_id } => {
                export_debug!("Listing documents in {}", container_id)
            }
            ExportEvent::Listed { count } => export_info!("Listed {} documents", count),
            ExportEvent::Progress { name, stage } => export_debug!("{}: {:?}", name, stage),
            ExportEvent::Skipped { name } => {
                export_debug!("Skipping {:?}: name has no date prefix", name)
            }
            ExportEvent::Written { name, path } => {
                export_info!("Wrote {:?} to {}", name, path.display())
            }
            ExportEvent::Failed { name, message } => {
                export_error!("Document {:?} failed: {}", name, message)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub container_id: String,
    pub output_root: PathBuf,
    /// Upper bound on in-flight store requests and on document pipelines.
    pub concurrency: usize,
    /// Offset the front-matter timestamps are rendered in.
    pub utc_offset: FixedOffset,
}

impl ExportConfig {
    pub fn new(container_id: impl Into<String>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            container_id: container_id.into(),
            output_root: output_root.into(),
            concurrency: DEFAULT_CONCURRENCY,
            utc_offset: Utc.fix(),
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_utc_offset(mut self, utc_offset: FixedOffset) -> Self {
        self.utc_offset = utc_offset;
        self
    }

    pub fn validate(&self) -> Result<(), ExportError> {
        if self.container_id.trim().is_empty() {
            return Err(ExportError::InvalidConfig(
                "container id must not be empty".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(ExportError::InvalidConfig(
                "concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Drives one export run: list, export, convert, write.
pub struct Exporter {
    store: Arc<dyn DocumentStore>,
    converter: Arc<DocumentConverter>,
    config: ExportConfig,
}

impl Exporter {
    pub fn new(store: Arc<dyn DocumentStore>, config: ExportConfig) -> Self {
        Self {
            store,
            converter: Arc::new(DocumentConverter::default()),
            config,
        }
    }

    /// Listing or export failures abort the run. Failures inside a document's
    /// convert-and-write pipeline are recorded in the report instead.
    pub async fn run(&self, sink: Arc<dyn ProgressSink>) -> Result<DocumentReport, ExportError> {
        self.config.validate()?;

        sink.emit(ExportEvent::Listing {
            container_id: self.config.container_id.clone(),
        });
        let documents = self
            .store
            .list_documents(&self.config.container_id)
            .await
            .map_err(ExportError::List)?;
        sink.emit(ExportEvent::Listed {
            count: documents.len(),
        });

        let exported = self.export_all(documents, sink.as_ref()).await?;
        Ok(self.process_all(exported, sink).await)
    }

    async fn export_all(
        &self,
        documents: Vec<DocumentRef>,
        sink: &dyn ProgressSink,
    ) -> Result<Vec<ExportedDocument>, ExportError> {
        let store = self.store.as_ref();
        let mut exported: Vec<(usize, ExportedDocument)> =
            stream::iter(documents.into_iter().enumerate())
                .map(|(index, document)| async move {
                    sink.emit(ExportEvent::Progress {
                        name: document.name.clone(),
                        stage: Stage::Exporting,
                    });
                    match store.export_html(&document.id).await {
                        Ok(html) => Ok((index, ExportedDocument { document, html })),
                        Err(source) => Err(ExportError::Export {
                            name: document.name,
                            source,
                        }),
                    }
                })
                .buffer_unordered(self.config.concurrency)
                .try_collect()
                .await?;
        exported.sort_by_key(|(index, _)| *index);
        Ok(exported.into_iter().map(|(_, document)| document).collect())
    }

    async fn process_all(
        &self,
        exported: Vec<ExportedDocument>,
        sink: Arc<dyn ProgressSink>,
    ) -> DocumentReport {
        let duplicates = duplicate_outputs(&exported, &self.config.output_root);
        let mut outcomes: Vec<(usize, DocumentOutcome<DocumentError>)> =
            stream::iter(exported.into_iter().zip(duplicates).enumerate())
                .map(|(index, (document, duplicate))| {
                    let converter = Arc::clone(&self.converter);
                    let output_root = self.config.output_root.clone();
                    let offset = self.config.utc_offset;
                    let task_sink = Arc::clone(&sink);
                    let sink = Arc::clone(&sink);
                    let name = document.document.name.clone();
                    async move {
                        let outcome = match duplicate {
                            Some(dir) => DocumentOutcome::Failed {
                                name,
                                error: DocumentError::DuplicateOutput { dir },
                            },
                            None => {
                                let handle = tokio::task::spawn_blocking(move || {
                                    process_document(
                                        &document,
                                        &converter,
                                        &output_root,
                                        offset,
                                        task_sink.as_ref(),
                                    )
                                });
                                match handle.await {
                                    Ok(outcome) => outcome,
                                    Err(err) => DocumentOutcome::Failed {
                                        name,
                                        error: DocumentError::Task(err.to_string()),
                                    },
                                }
                            }
                        };
                        sink.emit(outcome_event(&outcome));
                        (index, outcome)
                    }
                })
                .buffer_unordered(self.config.concurrency)
                .collect()
                .await;
        outcomes.sort_by_key(|(index, _)| *index);
        ExportReport::new(outcomes.into_iter().map(|(_, outcome)| outcome).collect())
    }
}

/// For each document, the output directory it would share with an earlier
/// dated document. The first document in listing order keeps the directory.
fn duplicate_outputs(exported: &[ExportedDocument], output_root: &Path) -> Vec<Option<PathBuf>> {
    let mut claimed = HashSet::new();
    exported
        .iter()
        .map(|exported| {
            let name = &exported.document.name;
            date_prefix(name)?;
            let dir = output_root.join(output_dir_name(name));
            if claimed.insert(dir.clone()) {
                None
            } else {
                Some(dir)
            }
        })
        .collect()
}

fn outcome_event(outcome: &DocumentOutcome<DocumentError>) -> ExportEvent {
    match outcome {
        DocumentOutcome::Written { name, path } => ExportEvent::Written {
            name: name.clone(),
            path: path.clone(),
        },
        DocumentOutcome::Skipped { name } => ExportEvent::Skipped { name: name.clone() },
        DocumentOutcome::Failed { name, error } => ExportEvent::Failed {
            name: name.clone(),
            message: error.to_string(),
        },
    }
}

/// Converts and writes one exported document. Names without a date prefix
/// are skipped.
pub fn process_document(
    exported: &ExportedDocument,
    converter: &DocumentConverter,
    output_root: &Path,
    offset: FixedOffset,
    sink: &dyn ProgressSink,
) -> DocumentOutcome<DocumentError> {
    let name = exported.document.name.clone();
    let Some(prefix) = date_prefix(&exported.document.name) else {
        return DocumentOutcome::Skipped { name };
    };

    sink.emit(ExportEvent::Progress {
        name: name.clone(),
        stage: Stage::Converting,
    });
    let result = build_output_record(exported, prefix, converter, output_root, offset)
        .and_then(|record| {
            sink.emit(ExportEvent::Progress {
                name: name.clone(),
                stage: Stage::Writing,
            });
            write_output_record(&record).map_err(DocumentError::from)
        });

    match result {
        Ok(path) => {
            sink.emit(ExportEvent::Progress {
                name: name.clone(),
                stage: Stage::Done,
            });
            DocumentOutcome::Written { name, path }
        }
        Err(error) => DocumentOutcome::Failed { name, error },
    }
}

/// The directory and `index.md` text for a document whose name starts with `prefix`.
pub fn build_output_record(
    exported: &ExportedDocument,
    prefix: &str,
    converter: &DocumentConverter,
    output_root: &Path,
    offset: FixedOffset,
) -> Result<OutputRecord, DocumentError> {
    let created_date = parse_date_prefix(prefix)?;
    let created = created_timestamp(created_date, offset)
        .ok_or_else(|| NamingError::InvalidDate(prefix.to_string()))?;
    let updated = exported.document.modified_time.with_timezone(&offset);

    let converted = converter.convert(&exported.html)?;
    let content = build_markdown_document(
        &converted,
        &format_timestamp(&created),
        &format_timestamp(&updated),
    )?;

    let dir = output_root.join(output_dir_name(&exported.document.name));
    Ok(OutputRecord::new(dir, content))
}
