use std::time::Duration;

use chrono::{DateTime, Utc};
use export_core::DocumentRef;
use export_logging::{export_debug, export_warn};
use futures_util::StreamExt;
use secrecy::ExposeSecret;
use serde::Deserialize;
use url::Url;

use crate::auth::{Credentials, TokenSource};
use crate::types::{StoreError, StoreFailureKind};

pub const GOOGLE_DOCUMENT_MIME_TYPE: &str = "application/vnd.google-apps.document";
const EXPORT_MIME_TYPE: &str = "text/html";
const LIST_FIELDS: &str = "nextPageToken, files(id, name, createdTime, modifiedTime)";
const LIST_ORDER: &str = "modifiedTime desc";
const LIST_PAGE_SIZE: &str = "1000";
/// Longest error body quoted in a [`StoreError`] message.
const MAX_ERROR_BODY_CHARS: usize = 200;
/// Error body bytes read before giving up; holds `MAX_ERROR_BODY_CHARS` of any UTF-8.
const MAX_ERROR_BODY_BYTES: usize = MAX_ERROR_BODY_CHARS * 4;

#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub api_base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_export_bytes: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            api_base_url: "https://www.googleapis.com".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            max_export_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Read access to a folder of documents.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Documents directly inside `container_id`, most recently modified first.
    async fn list_documents(&self, container_id: &str) -> Result<Vec<DocumentRef>, StoreError>;

    /// The HTML rendition of one document.
    async fn export_html(&self, document_id: &str) -> Result<String, StoreError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    name: String,
    created_time: Option<DateTime<Utc>>,
    modified_time: DateTime<Utc>,
}

impl From<DriveFile> for DocumentRef {
    fn from(file: DriveFile) -> Self {
        DocumentRef {
            id: file.id,
            name: file.name,
            created_time: file.created_time,
            modified_time: file.modified_time,
        }
    }
}

/// Google Drive v3 client.
pub struct DriveClient {
    settings: StoreSettings,
    http: reqwest::Client,
    token: Box<dyn TokenSource>,
}

impl DriveClient {
    pub fn new(settings: StoreSettings, credentials: Credentials) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| StoreError::new(StoreFailureKind::Network, err.to_string()))?;
        let token = credentials.into_token_source(http.clone())?;
        Ok(Self {
            settings,
            http,
            token,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let invalid = |message: String| StoreError::new(StoreFailureKind::InvalidRequest, message);
        let mut url = Url::parse(&self.settings.api_base_url)
            .map_err(|err| invalid(format!("bad api base url: {err}")))?;
        url.path_segments_mut()
            .map_err(|_| invalid("api base url cannot have a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get(&self, url: Url) -> Result<reqwest::Response, StoreError> {
        let bearer = self.token.bearer().await?;
        export_debug!("GET {}", url);
        let response = self
            .http
            .get(url)
            .bearer_auth(bearer.expose_secret())
            .send()
            .await
            .map_err(map_reqwest_error)?;
        check_status(response).await
    }

    async fn read_limited(&self, response: reqwest::Response) -> Result<Vec<u8>, StoreError> {
        let max_bytes = self.settings.max_export_bytes;
        let too_large = |actual: u64| {
            StoreError::new(
                StoreFailureKind::TooLarge {
                    max_bytes,
                    actual: Some(actual),
                },
                "export too large",
            )
        };

        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(too_large(content_len));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(too_large(next_len));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

#[async_trait::async_trait]
impl DocumentStore for DriveClient {
    async fn list_documents(&self, container_id: &str) -> Result<Vec<DocumentRef>, StoreError> {
        let mut url = self.endpoint(&["drive", "v3", "files"])?;
        url.query_pairs_mut()
            .append_pair("q", &container_query(container_id))
            .append_pair("orderBy", LIST_ORDER)
            .append_pair("pageSize", LIST_PAGE_SIZE)
            .append_pair("fields", LIST_FIELDS);

        let response = self.get(url).await?;
        let list: FileList = response
            .json()
            .await
            .map_err(|err| StoreError::new(StoreFailureKind::InvalidResponse, err.to_string()))?;

        if list.next_page_token.is_some() {
            export_warn!(
                "Container {} has more than {} documents; only the first page is exported",
                container_id,
                LIST_PAGE_SIZE
            );
        }
        Ok(list.files.into_iter().map(DocumentRef::from).collect())
    }

    async fn export_html(&self, document_id: &str) -> Result<String, StoreError> {
        let mut url = self.endpoint(&["drive", "v3", "files", document_id, "export"])?;
        url.query_pairs_mut()
            .append_pair("mimeType", EXPORT_MIME_TYPE);

        let response = self.get(url).await?;
        let bytes = self.read_limited(response).await?;
        String::from_utf8(bytes).map_err(|err| {
            StoreError::new(
                StoreFailureKind::InvalidResponse,
                format!("export of {document_id} is not utf-8: {err}"),
            )
        })
    }
}

/// Drive query selecting the documents whose parent is `container_id`.
pub fn container_query(container_id: &str) -> String {
    format!(
        "'{}' in parents and mimeType = '{}'",
        escape_query_literal(container_id),
        GOOGLE_DOCUMENT_MIME_TYPE
    )
}

fn escape_query_literal(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('\'', "\\'")
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let kind = match status.as_u16() {
        401 | 403 => StoreFailureKind::Unauthorized,
        404 => StoreFailureKind::NotFound,
        429 => StoreFailureKind::RateLimited,
        code => StoreFailureKind::HttpStatus(code),
    };
    let detail = error_detail(response).await;
    let message = if detail.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {detail}")
    };
    Err(StoreError::new(kind, message))
}

/// The start of an error body. Reading stops after `MAX_ERROR_BODY_BYTES`.
async fn error_detail(response: reqwest::Response) -> String {
    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while bytes.len() < MAX_ERROR_BODY_BYTES {
        match stream.next().await {
            Some(Ok(chunk)) => bytes.extend_from_slice(&chunk),
            Some(Err(_)) | None => break,
        }
    }
    bytes.truncate(MAX_ERROR_BODY_BYTES);
    String::from_utf8_lossy(&bytes)
        .trim()
        .chars()
        .take(MAX_ERROR_BODY_CHARS)
        .collect()
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> StoreError {
    if err.is_timeout() {
        return StoreError::new(StoreFailureKind::Timeout, err.to_string());
    }
    StoreError::new(StoreFailureKind::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_query_escapes_quotes() {
        assert_eq!(
            container_query("abc'd"),
            "'abc\\'d' in parents and mimeType = 'application/vnd.google-apps.document'"
        );
    }

    #[test]
    fn endpoint_appends_segments_to_base() {
        let client = DriveClient::new(
            StoreSettings {
                api_base_url: "http://127.0.0.1:9/".to_string(),
                ..StoreSettings::default()
            },
            Credentials::access_token("t"),
        )
        .unwrap();
        let url = client
            .endpoint(&["drive", "v3", "files", "id with space", "export"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:9/drive/v3/files/id%20with%20space/export"
        );
    }
}
