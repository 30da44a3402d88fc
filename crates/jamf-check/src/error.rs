use jamf_api::{ApiError, AuthError};

use crate::config::ConfigError;

/// Any failure that ends a connection check early.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),
    #[error("API access failed: {0}")]
    Api(#[from] ApiError),
}
