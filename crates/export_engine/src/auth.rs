//! Credentials for the document store.
//!
//! Credentials are always handed to [`crate::DriveClient::new`] explicitly;
//! nothing here reads process-wide state.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::header::CONTENT_TYPE;
use secrecy::{ExposeSecret, Secret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::store::map_reqwest_error;
use crate::types::{StoreError, StoreFailureKind};

pub const DRIVE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Tokens are refreshed this long before they expire.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone)]
pub enum Credentials {
    /// A ready OAuth2 bearer token.
    AccessToken(SecretString),
    /// Path to a service-account JSON key.
    ServiceAccountKey(PathBuf),
}

impl Credentials {
    pub fn access_token(token: impl Into<String>) -> Self {
        Credentials::AccessToken(Secret::new(token.into()))
    }

    pub(crate) fn into_token_source(
        self,
        http: reqwest::Client,
    ) -> Result<Box<dyn TokenSource>, StoreError> {
        match self {
            Credentials::AccessToken(token) => Ok(Box::new(StaticToken(token))),
            Credentials::ServiceAccountKey(path) => {
                Ok(Box::new(ServiceAccountTokenSource::from_file(&path, http)?))
            }
        }
    }
}

#[async_trait::async_trait]
pub trait TokenSource: Send + Sync {
    async fn bearer(&self) -> Result<SecretString, StoreError>;
}

pub struct StaticToken(pub SecretString);

#[async_trait::async_trait]
impl TokenSource for StaticToken {
    async fn bearer(&self) -> Result<SecretString, StoreError> {
        Ok(self.0.clone())
    }
}

/// The fields of a service-account key file this client needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: SecretString,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
}

struct CachedToken {
    value: SecretString,
    expires_at: DateTime<Utc>,
}

/// Exchanges a signed JWT assertion for an access token and caches it until
/// shortly before it expires.
pub struct ServiceAccountTokenSource {
    key: ServiceAccountKey,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokenSource {
    pub fn new(key: ServiceAccountKey, http: reqwest::Client) -> Self {
        Self {
            key,
            http,
            cached: Mutex::new(None),
        }
    }

    pub fn from_json(json: &str, http: reqwest::Client) -> Result<Self, StoreError> {
        let key: ServiceAccountKey = serde_json::from_str(json).map_err(|err| {
            StoreError::new(
                StoreFailureKind::Auth,
                format!("invalid service account key: {err}"),
            )
        })?;
        Ok(Self::new(key, http))
    }

    pub fn from_file(path: &std::path::Path, http: reqwest::Client) -> Result<Self, StoreError> {
        let json = fs::read_to_string(path).map_err(|err| {
            StoreError::new(
                StoreFailureKind::Auth,
                format!("cannot read service account key {}: {err}", path.display()),
            )
        })?;
        Self::from_json(&json, http)
    }

    fn assertion(&self, now: DateTime<Utc>) -> Result<String, StoreError> {
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: DRIVE_READONLY_SCOPE,
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.key.private_key.expose_secret().as_bytes())
            .map_err(|err| {
                StoreError::new(StoreFailureKind::Auth, format!("invalid private key: {err}"))
            })?;
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key).map_err(|err| {
            StoreError::new(StoreFailureKind::Auth, format!("cannot sign assertion: {err}"))
        })
    }

    async fn request_token(&self, now: DateTime<Utc>) -> Result<CachedToken, StoreError> {
        let assertion = self.assertion(now)?;
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", JWT_BEARER_GRANT)
            .append_pair("assertion", &assertion)
            .finish();

        let response = self
            .http
            .post(self.key.token_uri.as_str())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::new(
                StoreFailureKind::Auth,
                format!("token endpoint returned {status}"),
            ));
        }

        let token: TokenResponse = response.json().await.map_err(|err| {
            StoreError::new(StoreFailureKind::InvalidResponse, err.to_string())
        })?;
        let lifetime = token.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS);
        Ok(CachedToken {
            value: Secret::new(token.access_token),
            expires_at: now + TimeDelta::seconds(lifetime),
        })
    }
}

#[async_trait::async_trait]
impl TokenSource for ServiceAccountTokenSource {
    async fn bearer(&self) -> Result<SecretString, StoreError> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();
        if let Some(token) = cached.as_ref() {
            if token.expires_at - TimeDelta::seconds(EXPIRY_MARGIN_SECS) > now {
                return Ok(token.value.clone());
            }
        }
        let fresh = self.request_token(now).await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }
}
