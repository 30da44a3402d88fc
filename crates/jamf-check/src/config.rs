use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::CheckError;

pub const FQDN_VAR: &str = "JAMF_INSTANCE_FQDN";
pub const CLIENT_ID_VAR: &str = "JAMF_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "JAMF_CLIENT_SECRET";

pub const DEFAULT_ENV_FILE: &str = ".env";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required configuration: {}", vars.join(", "))]
    Missing { vars: Vec<&'static str> },
    #[error("failed to load env file {}: {source}", path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
}

/// Load `KEY=VALUE` pairs from an env file into the process environment.
///
/// The process environment takes precedence: file values never override a
/// variable that is already set. `${VAR}` references in values are expanded.
/// With `path == None` the default `.env` is tried and silently skipped when
/// it does not exist; an explicitly named file must exist.
pub fn load_env_file(path: Option<&Path>) -> Result<(), ConfigError> {
    let (path, required) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_ENV_FILE), false),
    };

    match dotenvy::from_path(&path) {
        Ok(()) => {
            debug!(path = %path.display(), "loaded env file");
            Ok(())
        }
        Err(e) if e.not_found() && !required => {
            debug!(path = %path.display(), "no env file, using process environment");
            Ok(())
        }
        Err(source) => Err(ConfigError::EnvFile { path, source }),
    }
}

/// Load the env file, then resolve `source` into validated credentials.
pub fn load_credentials(
    env_file: Option<&Path>,
    source: ConfigSource,
) -> Result<Credentials, CheckError> {
    load_env_file(env_file)?;
    Ok(source.resolve()?)
}

/// Raw configuration values as gathered from flags and the environment.
///
/// Explicit values win; anything left unset falls back to the matching
/// `JAMF_*` environment variable.
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    pub instance_fqdn: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl ConfigSource {
    pub fn resolve(self) -> Result<Credentials, ConfigError> {
        let host = self.instance_fqdn.or_else(|| std::env::var(FQDN_VAR).ok());
        let client_id = self.client_id.or_else(|| std::env::var(CLIENT_ID_VAR).ok());
        let client_secret = self
            .client_secret
            .or_else(|| std::env::var(CLIENT_SECRET_VAR).ok());

        Credentials::new(
            host.unwrap_or_default(),
            client_id.unwrap_or_default(),
            client_secret.unwrap_or_default(),
        )
    }
}

/// Strip any `http://`/`https://` prefix and trailing slashes from a host.
///
/// Returns the bare host and whether a scheme had to be removed.
pub fn normalize_host(raw: &str) -> (String, bool) {
    let trimmed = raw.trim();
    let (rest, stripped) = match trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
    {
        Some(rest) => (rest, true),
        None => (trimmed, false),
    };
    (rest.trim_end_matches('/').to_string(), stripped)
}

/// The three values a connection check needs, validated once at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    host: String,
    client_id: String,
    client_secret: String,
    scheme_stripped: bool,
}

impl Credentials {
    /// Every value must be non-empty; all missing names are reported together.
    pub fn new(
        host: impl AsRef<str>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let (host, scheme_stripped) = normalize_host(host.as_ref());
        let client_id = client_id.into();
        let client_secret = client_secret.into();

        let mut missing = Vec::new();
        if host.is_empty() {
            missing.push(FQDN_VAR);
        }
        if client_id.is_empty() {
            missing.push(CLIENT_ID_VAR);
        }
        if client_secret.is_empty() {
            missing.push(CLIENT_SECRET_VAR);
        }
        if !missing.is_empty() {
            return Err(ConfigError::Missing { vars: missing });
        }

        if scheme_stripped {
            warn!(%host, "{FQDN_VAR} should not include a protocol, removed it");
        }

        Ok(Self {
            host,
            client_id,
            client_secret,
            scheme_stripped,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// `true` when the configured host carried a protocol prefix.
    pub fn scheme_stripped(&self) -> bool {
        self.scheme_stripped
    }

    pub fn base_url(&self) -> String {
        format!("https://{}", self.host)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_host_strips_scheme_and_slashes() {
        assert_eq!(
            normalize_host("https://acme.jamfcloud.com/"),
            ("acme.jamfcloud.com".to_string(), true)
        );
        assert_eq!(
            normalize_host("http://acme.jamfcloud.com"),
            ("acme.jamfcloud.com".to_string(), true)
        );
        assert_eq!(
            normalize_host("  acme.jamfcloud.com  "),
            ("acme.jamfcloud.com".to_string(), false)
        );
    }

    #[test]
    fn base_url_is_https() {
        let creds = Credentials::new("https://acme.jamfcloud.com", "id", "secret").unwrap();
        assert_eq!(creds.base_url(), "https://acme.jamfcloud.com");
        assert!(creds.scheme_stripped());
    }

    #[test]
    fn all_missing_values_are_listed() {
        let err = Credentials::new("", "", "").unwrap_err();
        match err {
            ConfigError::Missing { vars } => {
                assert_eq!(vars, vec![FQDN_VAR, CLIENT_ID_VAR, CLIENT_SECRET_VAR]);
            }
            other => panic!("expected Missing, got: {other}"),
        }
    }

    #[test]
    fn scheme_only_host_counts_as_missing() {
        let err = Credentials::new("https://", "id", "secret").unwrap_err();
        assert!(matches!(err, ConfigError::Missing { vars } if vars == vec![FQDN_VAR]));
    }

    #[test]
    fn debug_redacts_secret() {
        let creds = Credentials::new("acme.jamfcloud.com", "id", "hunter2").unwrap();
        let debug = format!("{creds:?}");
        assert!(!debug.contains("hunter2"), "got: {debug}");
        assert!(debug.contains("acme.jamfcloud.com"));
    }
}
