pub mod client;
pub mod probe;
pub mod token;

pub use client::{ApiError, HttpClient, OriginError, parse_origin};
pub use probe::{ApiProbe, COMPUTER_GROUPS_PATH, ComputerGroups, JamfVersion, VERSION_PATH};
pub use token::{AuthError, BearerToken, TOKEN_PATH, TokenClient, acquire_token};
