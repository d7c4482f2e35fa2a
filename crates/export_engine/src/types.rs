use std::fmt;
use std::path::PathBuf;

use export_core::NamingError;

use crate::frontmatter::FrontMatterError;
use crate::persist::FilesystemError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Exporting,
    Converting,
    Writing,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportEvent {
    Listing { container_id: String },
    Progress { name: String, stage: Stage },
    Listed { count: usize },
    Skipped { name: String },
    Written { name: String, path: PathBuf },
    Failed { name: String, message: String },
}

/// A rejected list, export or token request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct StoreError {
    pub kind: StoreFailureKind,
    pub message: String,
}

impl StoreError {
    pub(crate) fn new(kind: StoreFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreFailureKind {
    /// Credentials could not be loaded or exchanged for an access token.
    Auth,
    Unauthorized,
    NotFound,
    RateLimited,
    HttpStatus(u16),
    Timeout,
    Network,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    InvalidRequest,
    InvalidResponse,
}

impl fmt::Display for StoreFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreFailureKind::Auth => write!(f, "authentication failed"),
            StoreFailureKind::Unauthorized => write!(f, "access denied"),
            StoreFailureKind::NotFound => write!(f, "not found"),
            StoreFailureKind::RateLimited => write!(f, "rate limited"),
            StoreFailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            StoreFailureKind::Timeout => write!(f, "timeout"),
            StoreFailureKind::Network => write!(f, "network error"),
            StoreFailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            StoreFailureKind::InvalidRequest => write!(f, "invalid request"),
            StoreFailureKind::InvalidResponse => write!(f, "invalid response"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    #[error("document body has no elements to take a title from")]
    EmptyBody,
}

/// Failure of a single document's convert-and-write pipeline.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error(transparent)]
    Naming(#[from] NamingError),
    #[error("conversion failed: {0}")]
    Conversion(#[from] ConversionError),
    #[error(transparent)]
    FrontMatter(#[from] FrontMatterError),
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
    #[error("output directory {} already belongs to an earlier document", dir.display())]
    DuplicateOutput { dir: PathBuf },
    #[error("document pipeline aborted: {0}")]
    Task(String),
}

/// Failure that aborts the whole run.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("listing documents failed: {0}")]
    List(#[source] StoreError),
    #[error("exporting document {name:?} failed: {source}")]
    Export { name: String, source: StoreError },
}
