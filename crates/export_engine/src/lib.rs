//! Exporter engine: document store access, HTML normalization, Markdown
//! rendering and the batch pipeline that writes `index.md` files.
mod auth;
mod convert;
mod frontmatter;
mod normalize;
mod orchestrator;
mod persist;
mod store;
mod types;

pub use auth::{
    Credentials, ServiceAccountKey, ServiceAccountTokenSource, StaticToken, TokenSource,
    DRIVE_READONLY_SCOPE,
};
pub use convert::{DocumentConverter, Html2MdRenderer, MarkdownRenderer};
pub use frontmatter::{build_markdown_document, serialize_front_matter, FrontMatterError};
pub use normalize::{
    extract_title, redirect_target, BodyTree, DropEmptyParagraphs, NormalizedBody,
    Normalizer, RewritePass, StripAttribute, UnwrapRedirectLinks, UnwrapSpans,
};
pub use orchestrator::{
    build_output_record, process_document, DocumentReport, ExportConfig, Exporter,
    LogProgressSink, ProgressSink, DEFAULT_CONCURRENCY,
};
pub use persist::{ensure_directory, write_file, write_output_record, FilesystemError};
pub use store::{
    container_query, DocumentStore, DriveClient, StoreSettings, GOOGLE_DOCUMENT_MIME_TYPE,
};
pub use types::{
    ConversionError, DocumentError, ExportError, ExportEvent, Stage, StoreError,
    StoreFailureKind,
};
