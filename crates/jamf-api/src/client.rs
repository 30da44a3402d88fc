use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

/// Rejection reasons for a base URL that is not a bare origin.
#[derive(Debug, thiserror::Error)]
pub enum OriginError {
    #[error("invalid base URL: {0}")]
    Parse(#[from] url::ParseError),
    #[error("unsupported URL scheme {scheme:?} (expected https or http)")]
    Scheme { scheme: String },
    #[error("base URL {url} must be an origin without path, query or fragment")]
    NotOrigin { url: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error(transparent)]
    InvalidBaseUrl(#[from] OriginError),
    #[error("invalid endpoint path {path:?}: must start with '/'")]
    InvalidPath { path: String },
    #[error("API returned {status}: {body}")]
    ApiResponse { status: u16, body: String },
    #[error("API returned malformed JSON ({source}): {body}")]
    Decode {
        body: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// HTTP status of a non-2xx response, if that is what failed.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::ApiResponse { status, .. } => Some(*status),
            ApiError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Parse `base_url` and check that it is an absolute `https`/`http` origin.
///
/// `https://jamf.example.com` and `https://jamf.example.com/` are accepted;
/// anything carrying a path, query or fragment is not.
pub fn parse_origin(base_url: &str) -> Result<Url, OriginError> {
    let url = Url::parse(base_url)?;

    match url.scheme() {
        "https" | "http" => {}
        other => {
            return Err(OriginError::Scheme {
                scheme: other.to_string(),
            });
        }
    }

    if url.host_str().is_none()
        || url.path() != "/"
        || url.query().is_some()
        || url.fragment().is_some()
    {
        return Err(OriginError::NotOrigin {
            url: base_url.to_string(),
        });
    }

    Ok(url)
}

/// Shared HTTP plumbing for the token exchange and the API probes.
///
/// Wraps [`reqwest::Client`] with a validated origin. Every request asks
/// for `application/json`; authentication is added per request because the
/// token endpoint itself is unauthenticated.
#[derive(Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    base_url: Url,
}

impl HttpClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = parse_origin(base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let inner = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self { inner, base_url })
    }

    /// Resolve an absolute endpoint path (`/api/...`) against the origin.
    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        if !path.starts_with('/') {
            return Err(ApiError::InvalidPath {
                path: path.to_string(),
            });
        }
        self.base_url
            .join(path)
            .map_err(|e| ApiError::InvalidBaseUrl(OriginError::Parse(e)))
    }

    /// GET `{base_url}{path}` with a bearer token and decode the JSON body.
    pub async fn get_with_bearer<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        debug!(%url, "GET");
        let resp = self.inner.get(url).bearer_auth(token).send().await?;
        Self::handle_response(resp).await
    }

    /// Return a reference to the underlying [`reqwest::Client`] for
    /// requests that need a custom body, like the form-encoded token call.
    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::ApiResponse { status, body });
        }
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|source| ApiError::Decode { body, source })
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_accepts_bare_host_with_or_without_slash() {
        assert!(parse_origin("https://jamf.example.com").is_ok());
        assert!(parse_origin("https://jamf.example.com/").is_ok());
        assert!(parse_origin("http://127.0.0.1:8080").is_ok());
    }

    #[test]
    fn origin_rejects_path_query_and_scheme() {
        assert!(matches!(
            parse_origin("https://jamf.example.com/JSSResource"),
            Err(OriginError::NotOrigin { .. })
        ));
        assert!(matches!(
            parse_origin("https://jamf.example.com/?x=1"),
            Err(OriginError::NotOrigin { .. })
        ));
        assert!(matches!(
            parse_origin("ftp://jamf.example.com"),
            Err(OriginError::Scheme { .. })
        ));
        assert!(matches!(
            parse_origin("jamf.example.com"),
            Err(OriginError::Parse(_))
        ));
    }

    #[test]
    fn endpoint_requires_leading_slash() {
        let client = HttpClient::new("https://jamf.example.com").unwrap();
        assert_eq!(
            client.endpoint("/api/v1/jamf-pro-version").unwrap().as_str(),
            "https://jamf.example.com/api/v1/jamf-pro-version"
        );
        assert!(matches!(
            client.endpoint("api/v1/jamf-pro-version"),
            Err(ApiError::InvalidPath { .. })
        ));
    }
}
