use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::Deserialize;
use tracing::{debug, info};

use crate::client::{ApiError, HttpClient, OriginError};

pub const TOKEN_PATH: &str = "/api/oauth/token";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error(transparent)]
    InvalidBaseUrl(#[from] OriginError),
    #[error("client id and client secret must both be non-empty")]
    MissingCredentials,
    #[error("token endpoint returned HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("token endpoint returned malformed JSON ({source}): {body}")]
    Decode {
        body: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("token response has no access_token: {body}")]
    MissingToken { body: String },
}

impl AuthError {
    pub fn status(&self) -> Option<u16> {
        match self {
            AuthError::Rejected { status, .. } => Some(*status),
            AuthError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<ApiError> for AuthError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Request(e) => AuthError::Request(e),
            ApiError::InvalidBaseUrl(e) => AuthError::InvalidBaseUrl(e),
            ApiError::ApiResponse { status, body } => AuthError::Rejected { status, body },
            ApiError::Decode { body, source } => AuthError::Decode { body, source },
            ApiError::InvalidPath { path } => AuthError::InvalidBaseUrl(OriginError::NotOrigin {
                url: path,
            }),
        }
    }
}

/// Short-lived credential returned by the client-credentials grant.
///
/// The value is never printed by `Debug`; use [`BearerToken::preview`] when a
/// report needs to show which token was issued.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken {
    value: String,
}

impl BearerToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// First `chars` characters of the token.
    pub fn preview(&self, chars: usize) -> String {
        self.value.chars().take(chars).collect()
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerToken")
            .field("value", &"<redacted>")
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// Client for the Jamf Pro OAuth token endpoint.
///
/// Performs the client-credentials grant against `POST /api/oauth/token`.
/// One request per call; no retries and no caching.
#[derive(Debug, Clone)]
pub struct TokenClient {
    http: HttpClient,
}

impl TokenClient {
    /// `base_url` must be an origin such as `https://example.jamfcloud.com`.
    pub fn new(base_url: &str) -> Result<Self, AuthError> {
        Ok(Self {
            http: HttpClient::new(base_url)?,
        })
    }

    pub async fn acquire_token(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<BearerToken, AuthError> {
        if client_id.is_empty() || client_secret.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let url = self.http.endpoint(TOKEN_PATH)?;
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("client_id", client_id)
            .append_pair("client_secret", client_secret)
            .append_pair("grant_type", "client_credentials")
            .finish();

        debug!(%url, "requesting OAuth token");
        let resp = self
            .http
            .inner()
            .post(url)
            .header(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            )
            .body(body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::Rejected { status, body });
        }

        let body = resp.text().await?;
        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|source| AuthError::Decode {
                body: body.clone(),
                source,
            })?;

        match parsed.access_token {
            Some(token) if !token.is_empty() => {
                info!("obtained OAuth token");
                Ok(BearerToken::new(token))
            }
            _ => Err(AuthError::MissingToken { body }),
        }
    }
}

/// One-shot form of [`TokenClient::acquire_token`].
pub async fn acquire_token(
    base_url: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<BearerToken, AuthError> {
    TokenClient::new(base_url)?
        .acquire_token(client_id, client_secret)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_never_shows_token_value() {
        let token = BearerToken::new("super-secret-token");
        let debug = format!("{token:?}");
        assert!(!debug.contains("super-secret-token"), "got: {debug}");
    }

    #[test]
    fn preview_is_char_bounded() {
        let token = BearerToken::new("abcdef");
        assert_eq!(token.preview(3), "abc");
        assert_eq!(token.preview(20), "abcdef");
    }

    #[test]
    fn new_rejects_non_origin() {
        let result = TokenClient::new("https://jamf.example.com/api");
        assert!(matches!(result, Err(AuthError::InvalidBaseUrl(_))));
    }
}
