use std::io::{self, Write};

use jamf_api::{ComputerGroups, JamfVersion};

use crate::config::{CLIENT_ID_VAR, CLIENT_SECRET_VAR, ConfigError, FQDN_VAR};
use crate::error::CheckError;
use crate::runner::{ProbeOutcome, RunOutcome, Step, TokenOutcome};

/// Longest response body excerpt printed on a failure line.
pub const BODY_EXCERPT_CHARS: usize = 200;

const RULE_WIDTH: usize = 60;

/// Console rendering of a connection check.
///
/// Writes plain text to any [`Write`]; `main` hands it stdout, tests a
/// `Vec<u8>`.
pub struct Reporter<W> {
    out: W,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn banner(&mut self) -> io::Result<()> {
        writeln!(self.out, "Jamf Pro API Connection Tester")?;
        writeln!(self.out)
    }

    pub fn scheme_stripped(&mut self) -> io::Result<()> {
        writeln!(
            self.out,
            "[warn] {FQDN_VAR} should not include https://, removed the protocol"
        )
    }

    pub fn target(&mut self, base_url: &str) -> io::Result<()> {
        writeln!(self.out, "Testing connection to: {base_url}")?;
        writeln!(self.out)
    }

    /// Report an error that stopped the check before a run outcome existed.
    pub fn check_error(&mut self, err: &CheckError) -> io::Result<()> {
        match err {
            CheckError::Config(e) => self.config_error(e),
            other => writeln!(self.out, "[FAIL] {}", excerpt(&other.to_string())),
        }
    }

    pub fn config_error(&mut self, err: &ConfigError) -> io::Result<()> {
        writeln!(self.out, "[FAIL] {err}")?;
        if matches!(err, ConfigError::Missing { .. }) {
            writeln!(
                self.out,
                "Required: {FQDN_VAR}, {CLIENT_ID_VAR}, {CLIENT_SECRET_VAR}"
            )?;
            writeln!(self.out, "Set them in the environment or in a .env file")?;
        }
        Ok(())
    }

    pub fn outcome(&mut self, outcome: &RunOutcome) -> io::Result<()> {
        writeln!(self.out, "1. Requesting OAuth token...")?;
        match &outcome.token {
            TokenOutcome::Acquired { preview } => writeln!(
                self.out,
                "   [ok] Successfully obtained token (first {} chars): {preview}...",
                preview.chars().count()
            )?,
            TokenOutcome::Failed { message } => {
                writeln!(self.out, "   [FAIL] Error obtaining token: {}", excerpt(message))?
            }
        }

        for probe in &outcome.probes {
            writeln!(self.out)?;
            match (probe.step, &probe.outcome) {
                (Step::Version, ProbeOutcome::Success(payload)) => {
                    writeln!(self.out, "2. Testing API access...")?;
                    writeln!(self.out, "   [ok] API access successful")?;
                    writeln!(
                        self.out,
                        "   Jamf Pro version: {}",
                        JamfVersion::from_payload(payload).version_or_unknown()
                    )?;
                }
                (Step::Version, ProbeOutcome::Failure { message, .. }) => {
                    writeln!(self.out, "2. Testing API access...")?;
                    writeln!(self.out, "   [FAIL] Error accessing API: {}", excerpt(message))?;
                }
                (Step::Resources, ProbeOutcome::Success(payload)) => {
                    writeln!(self.out, "3. Testing resource access...")?;
                    writeln!(self.out, "   [ok] Can access computer groups")?;
                    writeln!(
                        self.out,
                        "   Found {} computer group(s)",
                        ComputerGroups::from_payload(payload).total_count
                    )?;
                }
                (Step::Resources, ProbeOutcome::Failure { kind, message }) => {
                    writeln!(self.out, "3. Testing resource access...")?;
                    writeln!(
                        self.out,
                        "   [warn] Limited resource access: {}",
                        excerpt(message)
                    )?;
                    if kind.is_permission() {
                        writeln!(
                            self.out,
                            "   This is OK - the API client may have restricted permissions"
                        )?;
                    } else {
                        writeln!(
                            self.out,
                            "   Continuing - this check is not required to pass"
                        )?;
                    }
                }
                (Step::Token, _) => {}
            }
        }

        if outcome.is_success() {
            self.footer()?;
        }
        Ok(())
    }

    pub fn interrupted(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "[warn] Test interrupted by user")
    }

    fn footer(&mut self) -> io::Result<()> {
        let rule = "=".repeat(RULE_WIDTH);
        writeln!(self.out)?;
        writeln!(self.out, "{rule}")?;
        writeln!(self.out, "All tests passed! Your Jamf Pro connection is working.")?;
        writeln!(self.out, "{rule}")?;
        writeln!(self.out)?;
        writeln!(self.out, "Next steps:")?;
        writeln!(self.out, "   1. Run: cd terraform && terraform init")?;
        writeln!(self.out, "   2. Run: terraform plan")?;
        writeln!(self.out, "   3. Review the plan output")?;
        writeln!(
            self.out,
            "   4. Run: terraform apply (if you want to create resources)"
        )
    }
}

/// Cut `message` to [`BODY_EXCERPT_CHARS`] characters.
pub fn excerpt(message: &str) -> String {
    if message.chars().count() <= BODY_EXCERPT_CHARS {
        return message.to_string();
    }
    let mut cut: String = message.chars().take(BODY_EXCERPT_CHARS).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{FailureKind, ProbeResult, Stage};

    fn render(outcome: &RunOutcome) -> String {
        let mut reporter = Reporter::new(Vec::new());
        reporter.outcome(outcome).unwrap();
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    fn probe(step: Step, outcome: ProbeOutcome) -> ProbeResult {
        ProbeResult {
            step,
            endpoint: step.endpoint().to_string(),
            outcome,
        }
    }

    #[test]
    fn full_success_prints_version_count_and_footer() {
        let outcome = RunOutcome {
            stage: Stage::Done,
            token: TokenOutcome::Acquired {
                preview: "eyJhbGciOi".into(),
            },
            probes: vec![
                probe(
                    Step::Version,
                    ProbeOutcome::Success(serde_json::json!({"version": "10.49.1"})),
                ),
                probe(
                    Step::Resources,
                    ProbeOutcome::Success(serde_json::json!({"totalCount": 42})),
                ),
            ],
            fatal_error: None,
        };

        let text = render(&outcome);
        assert!(text.contains("eyJhbGciOi..."), "got: {text}");
        assert!(text.contains("Jamf Pro version: 10.49.1"), "got: {text}");
        assert!(text.contains("Found 42 computer group(s)"), "got: {text}");
        assert!(text.contains("All tests passed!"), "got: {text}");
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let outcome = RunOutcome {
            stage: Stage::Done,
            token: TokenOutcome::Acquired {
                preview: "abc".into(),
            },
            probes: vec![
                probe(Step::Version, ProbeOutcome::Success(serde_json::json!({}))),
                probe(Step::Resources, ProbeOutcome::Success(serde_json::json!({}))),
            ],
            fatal_error: None,
        };

        let text = render(&outcome);
        assert!(text.contains("Jamf Pro version: Unknown"), "got: {text}");
        assert!(text.contains("Found 0 computer group(s)"), "got: {text}");
    }

    #[test]
    fn forbidden_listing_is_reported_as_permissions() {
        let outcome = RunOutcome {
            stage: Stage::Done,
            token: TokenOutcome::Acquired {
                preview: "abc".into(),
            },
            probes: vec![
                probe(
                    Step::Version,
                    ProbeOutcome::Success(serde_json::json!({"version": "11.0.0"})),
                ),
                probe(
                    Step::Resources,
                    ProbeOutcome::Failure {
                        kind: FailureKind::Forbidden,
                        message: "API returned 403: forbidden".into(),
                    },
                ),
            ],
            fatal_error: None,
        };

        let text = render(&outcome);
        assert!(text.contains("[warn] Limited resource access"), "got: {text}");
        assert!(text.contains("restricted permissions"), "got: {text}");
        assert!(text.contains("All tests passed!"), "got: {text}");
    }

    #[test]
    fn token_failure_has_no_footer() {
        let outcome = RunOutcome {
            stage: Stage::Failed,
            token: TokenOutcome::Failed {
                message: "token endpoint returned HTTP 401: invalid_client".into(),
            },
            probes: Vec::new(),
            fatal_error: None,
        };

        let text = render(&outcome);
        assert!(text.contains("[FAIL] Error obtaining token"), "got: {text}");
        assert!(text.contains("401"), "got: {text}");
        assert!(!text.contains("All tests passed!"), "got: {text}");
    }

    #[test]
    fn missing_config_lists_required_names() {
        let mut reporter = Reporter::new(Vec::new());
        reporter
            .check_error(&CheckError::Config(ConfigError::Missing {
                vars: vec![CLIENT_SECRET_VAR],
            }))
            .unwrap();
        let text = String::from_utf8(reporter.into_inner()).unwrap();
        assert!(text.contains("JAMF_CLIENT_SECRET"), "got: {text}");
        assert!(text.contains("Required: JAMF_INSTANCE_FQDN"), "got: {text}");
    }

    #[test]
    fn excerpt_truncates_long_bodies() {
        let long = "x".repeat(BODY_EXCERPT_CHARS + 50);
        let cut = excerpt(&long);
        assert_eq!(cut.chars().count(), BODY_EXCERPT_CHARS + 3);
        assert!(cut.ends_with("..."));
        assert_eq!(excerpt("short"), "short");
    }
}
