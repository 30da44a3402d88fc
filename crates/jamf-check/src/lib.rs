pub mod config;
pub mod error;
pub mod report;
pub mod runner;
pub mod telemetry;

pub use config::{ConfigError, ConfigSource, Credentials, load_credentials, load_env_file};
pub use error::CheckError;
pub use report::Reporter;
pub use runner::{
    Classification, FailureKind, HealthCheckRunner, ProbeOutcome, ProbeResult, RunOutcome, Stage,
    Step, TokenOutcome,
};
