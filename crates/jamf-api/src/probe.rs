use serde::Deserialize;

use crate::client::{ApiError, HttpClient};
use crate::token::BearerToken;

pub const VERSION_PATH: &str = "/api/v1/jamf-pro-version";
pub const COMPUTER_GROUPS_PATH: &str = "/api/v1/computer-groups";

/// Authenticated read-only access to the Jamf Pro REST API.
///
/// Every request carries `Authorization: Bearer <token>` and
/// `Accept: application/json`. Responses are decoded as JSON; nothing is
/// cached between calls.
#[derive(Debug, Clone)]
pub struct ApiProbe {
    http: HttpClient,
    token: BearerToken,
}

// --- Response types ---

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JamfVersion {
    #[serde(default)]
    pub version: Option<String>,
}

impl JamfVersion {
    pub fn from_payload(payload: &serde_json::Value) -> Self {
        serde_json::from_value(payload.clone()).unwrap_or_default()
    }

    /// The reported version, or `"Unknown"` when the field is absent.
    pub fn version_or_unknown(&self) -> &str {
        self.version.as_deref().unwrap_or("Unknown")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputerGroups {
    #[serde(default)]
    pub total_count: i64,
}

impl ComputerGroups {
    pub fn from_payload(payload: &serde_json::Value) -> Self {
        serde_json::from_value(payload.clone()).unwrap_or_default()
    }
}

impl ApiProbe {
    pub fn new(base_url: &str, token: BearerToken) -> Result<Self, ApiError> {
        Ok(Self {
            http: HttpClient::new(base_url)?,
            token,
        })
    }

    /// GET `{base_url}{path}` and return the decoded JSON value.
    ///
    /// Typed views of the version and computer-group payloads are read from
    /// the returned value with [`JamfVersion::from_payload`] and
    /// [`ComputerGroups::from_payload`].
    pub async fn get(&self, path: &str) -> Result<serde_json::Value, ApiError> {
        self.http.get_with_bearer(path, self.token.value()).await
    }
}

/// One-shot form of [`ApiProbe::get`].
pub async fn get(
    base_url: &str,
    token: &BearerToken,
    path: &str,
) -> Result<serde_json::Value, ApiError> {
    ApiProbe::new(base_url, token.clone())?.get(path).await
}
