//! Exporter core: pure document model, naming rules and run-report helpers.
mod model;
mod naming;
mod report;

pub use model::{ConvertedDocument, DocumentId, DocumentRef, ExportedDocument, OutputRecord};
pub use naming::{
    created_timestamp, date_prefix, format_timestamp, output_dir_name, parse_date_prefix,
    parse_utc_offset, NamingError, INDEX_FILENAME, TIMESTAMP_FORMAT,
};
pub use report::{DocumentOutcome, ExportReport, ExportSummary};
