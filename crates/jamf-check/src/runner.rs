use jamf_api::{ApiError, ApiProbe, BearerToken, COMPUTER_GROUPS_PATH, TokenClient, VERSION_PATH};
use tracing::{error, info, warn};

use crate::config::Credentials;
use crate::error::CheckError;

/// Characters of the issued token shown in reports.
pub const TOKEN_PREVIEW_CHARS: usize = 20;

/// The three checks, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Token,
    Version,
    Resources,
}

impl Step {
    /// Whether a failure of this step stops the run.
    ///
    /// The listing check is lenient: an API client may be legitimately scoped
    /// without read access to computer groups.
    pub fn is_fatal(self) -> bool {
        match self {
            Step::Token | Step::Version => true,
            Step::Resources => false,
        }
    }

    pub fn endpoint(self) -> &'static str {
        match self {
            Step::Token => jamf_api::TOKEN_PATH,
            Step::Version => VERSION_PATH,
            Step::Resources => COMPUTER_GROUPS_PATH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    TokenAcquired,
    VersionChecked,
    ResourceChecked,
    Done,
    Failed,
}

impl Stage {
    /// Apply the result of `step` to the current stage.
    ///
    /// A step that does not belong to the current stage leaves it unchanged.
    pub fn advance(self, step: Step, ok: bool) -> Stage {
        match (self, step, ok) {
            (Stage::Init, Step::Token, true) => Stage::TokenAcquired,
            (Stage::Init, Step::Token, false) => Stage::Failed,
            (Stage::TokenAcquired, Step::Version, true) => Stage::VersionChecked,
            (Stage::TokenAcquired, Step::Version, false) => Stage::Failed,
            (Stage::VersionChecked, Step::Resources, _) => Stage::ResourceChecked,
            (stage, _, _) => stage,
        }
    }

    pub fn finish(self) -> Stage {
        match self {
            Stage::ResourceChecked => Stage::Done,
            other => other,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done | Stage::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Success,
    FatalFailure,
    NonFatalFailure,
}

/// Coarse cause of a failed probe, so reports can tell a permission problem
/// apart from a network or payload problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Unauthorized,
    Forbidden,
    NotFound,
    Status(u16),
    Transport,
    Decode,
    Config,
}

impl From<&ApiError> for FailureKind {
    fn from(err: &ApiError) -> Self {
        match err {
            ApiError::ApiResponse { status: 401, .. } => FailureKind::Unauthorized,
            ApiError::ApiResponse { status: 403, .. } => FailureKind::Forbidden,
            ApiError::ApiResponse { status: 404, .. } => FailureKind::NotFound,
            ApiError::ApiResponse { status, .. } => FailureKind::Status(*status),
            ApiError::Request(_) => FailureKind::Transport,
            ApiError::Decode { .. } => FailureKind::Decode,
            ApiError::InvalidBaseUrl(_) | ApiError::InvalidPath { .. } => FailureKind::Config,
        }
    }
}

impl FailureKind {
    pub fn is_permission(self) -> bool {
        matches!(self, FailureKind::Unauthorized | FailureKind::Forbidden)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Success(serde_json::Value),
    Failure { kind: FailureKind, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub step: Step,
    pub endpoint: String,
    pub outcome: ProbeOutcome,
}

impl ProbeResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ProbeOutcome::Success(_))
    }

    pub fn classification(&self) -> Classification {
        match (&self.outcome, self.step.is_fatal()) {
            (ProbeOutcome::Success(_), _) => Classification::Success,
            (ProbeOutcome::Failure { .. }, true) => Classification::FatalFailure,
            (ProbeOutcome::Failure { .. }, false) => Classification::NonFatalFailure,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenOutcome {
    Acquired { preview: String },
    Failed { message: String },
}

/// Terminal record of one connection check.
#[derive(Debug)]
pub struct RunOutcome {
    pub stage: Stage,
    pub token: TokenOutcome,
    pub probes: Vec<ProbeResult>,
    /// The error that moved the run to [`Stage::Failed`], if any.
    pub fatal_error: Option<CheckError>,
}

impl RunOutcome {
    /// Classification of every attempted step, token first.
    pub fn classifications(&self) -> Vec<Classification> {
        let token = match self.token {
            TokenOutcome::Acquired { .. } => Classification::Success,
            TokenOutcome::Failed { .. } => Classification::FatalFailure,
        };
        std::iter::once(token)
            .chain(self.probes.iter().map(ProbeResult::classification))
            .collect()
    }

    pub fn probe(&self, step: Step) -> Option<&ProbeResult> {
        self.probes.iter().find(|p| p.step == step)
    }

    pub fn is_success(&self) -> bool {
        self.stage == Stage::Done
    }

    pub fn exit_code(&self) -> u8 {
        if self.is_success() { 0 } else { 1 }
    }
}

/// Runs token → version → computer-groups in sequence, each step gating the
/// next.
#[derive(Debug, Clone, Default)]
pub struct HealthCheckRunner {
    base_url: Option<String>,
}

impl HealthCheckRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Target `base_url` instead of `https://{host}` from the credentials.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
        }
    }

    pub async fn run(&self, credentials: &Credentials) -> RunOutcome {
        let base_url = self
            .base_url
            .clone()
            .unwrap_or_else(|| credentials.base_url());
        let mut stage = Stage::Init;

        info!(%base_url, "requesting OAuth token");
        let token = match Self::acquire(&base_url, credentials).await {
            Ok(token) => token,
            Err(e) => {
                error!(error = %e, "failed to obtain token");
                return RunOutcome {
                    stage: stage.advance(Step::Token, false),
                    token: TokenOutcome::Failed {
                        message: e.to_string(),
                    },
                    probes: Vec::new(),
                    fatal_error: Some(e.into()),
                };
            }
        };
        stage = stage.advance(Step::Token, true);
        let token_outcome = TokenOutcome::Acquired {
            preview: token.preview(TOKEN_PREVIEW_CHARS),
        };

        let probe = match ApiProbe::new(&base_url, token) {
            Ok(probe) => probe,
            Err(e) => {
                error!(error = %e, "failed to build API client");
                let result = failure(Step::Version, &e);
                return RunOutcome {
                    stage: stage.advance(Step::Version, false),
                    token: token_outcome,
                    probes: vec![result],
                    fatal_error: Some(e.into()),
                };
            }
        };

        let mut probes = Vec::with_capacity(2);

        info!(endpoint = VERSION_PATH, "testing API access");
        match probe.get(VERSION_PATH).await {
            Ok(payload) => {
                info!("API access successful");
                probes.push(success(Step::Version, payload));
                stage = stage.advance(Step::Version, true);
            }
            Err(e) => {
                error!(error = %e, "version check failed");
                probes.push(failure(Step::Version, &e));
                return RunOutcome {
                    stage: stage.advance(Step::Version, false),
                    token: token_outcome,
                    probes,
                    fatal_error: Some(e.into()),
                };
            }
        }

        info!(endpoint = COMPUTER_GROUPS_PATH, "testing resource access");
        match probe.get(COMPUTER_GROUPS_PATH).await {
            Ok(payload) => {
                info!("resource access successful");
                probes.push(success(Step::Resources, payload));
                stage = stage.advance(Step::Resources, true);
            }
            Err(e) => {
                warn!(error = %e, "limited resource access, continuing");
                probes.push(failure(Step::Resources, &e));
                stage = stage.advance(Step::Resources, false);
            }
        }

        RunOutcome {
            stage: stage.finish(),
            token: token_outcome,
            probes,
            fatal_error: None,
        }
    }

    async fn acquire(
        base_url: &str,
        credentials: &Credentials,
    ) -> Result<BearerToken, jamf_api::AuthError> {
        TokenClient::new(base_url)?
            .acquire_token(credentials.client_id(), credentials.client_secret())
            .await
    }
}

fn success(step: Step, payload: serde_json::Value) -> ProbeResult {
    ProbeResult {
        step,
        endpoint: step.endpoint().to_string(),
        outcome: ProbeOutcome::Success(payload),
    }
}

fn failure(step: Step, err: &ApiError) -> ProbeResult {
    ProbeResult {
        step,
        endpoint: step.endpoint().to_string(),
        outcome: ProbeOutcome::Failure {
            kind: FailureKind::from(err),
            message: err.to_string(),
        },
    }
}
