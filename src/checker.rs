//! Checker module for special judge problems
//!
//! A checker is an external program that decides whether a submission's output
//! is acceptable. It receives the normalized output on stdin and the path of a
//! file holding the raw test input as its last argument, and prints `1` to accept.

use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::{normalize_output, ResourceLimits};
use crate::error::{ExecError, JudgeError};
use crate::runner::{CommandSpec, ProcessLauncher, RunStatus};
use crate::submission::script_command;

/// Default timeout for checker execution
pub const DEFAULT_CHECKER_TIMEOUT: Duration = Duration::from_secs(1);

/// What a checker must print (after normalization) to accept
pub const ACCEPT_SIGNAL: &str = "1";

/// Outcome of running a checker
#[derive(Debug, Clone, PartialEq)]
pub enum CheckerOutcome {
    Accepted,
    Rejected { signal: String },
    /// The checker itself misbehaved (non-zero exit, timeout, crash)
    Failed { reason: String },
}

/// External checker program with its own timeout
#[derive(Debug, Clone)]
pub struct Checker {
    command: CommandSpec,
    limits: ResourceLimits,
}

impl Checker {
    pub fn new(command: CommandSpec) -> Self {
        Self {
            command,
            limits: ResourceLimits::wall_clock(DEFAULT_CHECKER_TIMEOUT),
        }
    }

    /// `interpreter <path>`; the checker script must exist
    pub fn script(interpreter: &str, path: impl AsRef<Path>) -> Result<Self, JudgeError> {
        Ok(Self::new(script_command("checker", interpreter, path.as_ref())?))
    }

    pub fn with_timeout(mut self, timeout_secs: f64) -> Result<Self, JudgeError> {
        self.limits = ResourceLimits::unconstrained(timeout_secs)?;
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        self.limits.time_limit()
    }

    pub fn command(&self) -> &CommandSpec {
        &self.command
    }

    /// Run the checker on one test case
    pub async fn check(
        &self,
        launcher: &ProcessLauncher,
        input: &str,
        output: &str,
    ) -> Result<CheckerOutcome, ExecError> {
        let input_file = tempfile::NamedTempFile::new()?;
        tokio::fs::write(input_file.path(), input).await?;

        let command = self
            .command
            .clone()
            .with_arg(input_file.path().to_string_lossy());
        let normalized = normalize_output(output);

        info!("Running checker: {}", self.command);
        let outcome = launcher
            .launch(&command, normalized.as_bytes(), &self.limits)
            .await?;

        debug!(
            "Checker result: status={}, stdout={}, stderr={}",
            outcome.status,
            String::from_utf8_lossy(&outcome.stdout)
                .chars()
                .take(200)
                .collect::<String>(),
            outcome.stderr_text().chars().take(200).collect::<String>()
        );

        let result = match outcome.status {
            RunStatus::Exited(0) => {
                let signal = normalize_output(&String::from_utf8_lossy(&outcome.stdout));
                if signal == ACCEPT_SIGNAL {
                    CheckerOutcome::Accepted
                } else {
                    CheckerOutcome::Rejected { signal }
                }
            }
            RunStatus::TimeLimitExceeded => CheckerOutcome::Failed {
                reason: format!("checker timed out after {:?}", self.timeout()),
            },
            status => {
                let stderr = outcome.stderr_text();
                let reason = if stderr.trim().is_empty() {
                    format!("checker failed with {}", status)
                } else {
                    format!("checker failed with {}: {}", status, stderr.trim())
                };
                CheckerOutcome::Failed { reason }
            }
        };

        if let CheckerOutcome::Failed { reason } = &result {
            warn!("{}", reason);
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh_checker(script: &str) -> Checker {
        Checker::new(CommandSpec::new("sh").with_args(["-c", script, "checker"]))
    }

    #[tokio::test]
    async fn test_checker_accepts() {
        let checker = sh_checker("cat > /dev/null; printf '1\\r\\n'");
        let outcome = checker
            .check(&ProcessLauncher::new(), "2 3\n", "5\n")
            .await
            .unwrap();
        assert_eq!(outcome, CheckerOutcome::Accepted);
    }

    #[tokio::test]
    async fn test_checker_rejects() {
        let checker = sh_checker("cat > /dev/null; echo 0");
        let outcome = checker
            .check(&ProcessLauncher::new(), "2 3\n", "6\n")
            .await
            .unwrap();
        assert_eq!(
            outcome,
            CheckerOutcome::Rejected {
                signal: "0".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_checker_receives_output_and_input_file() {
        // $1 is the input file path; accept when output == sum of the input
        let checker = sh_checker(
            r#"read out; read a b < "$1"; if [ "$out" -eq $((a + b)) ]; then echo 1; else echo 0; fi"#,
        );
        let launcher = ProcessLauncher::new();

        let accepted = checker.check(&launcher, "2 3\n", "5\r\n\r\n").await.unwrap();
        assert_eq!(accepted, CheckerOutcome::Accepted);

        let rejected = checker.check(&launcher, "2 3\n", "7\n").await.unwrap();
        assert!(matches!(rejected, CheckerOutcome::Rejected { .. }));
    }

    #[tokio::test]
    async fn test_checker_non_zero_exit_fails() {
        let checker = sh_checker("cat > /dev/null; echo 1; echo broken >&2; exit 2");
        let outcome = checker
            .check(&ProcessLauncher::new(), "", "")
            .await
            .unwrap();
        match outcome {
            CheckerOutcome::Failed { reason } => {
                assert!(reason.contains("exit code 2"), "reason: {}", reason);
                assert!(reason.contains("broken"), "reason: {}", reason);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_checker_timeout_fails() {
        let checker = sh_checker("exec sleep 10").with_timeout(0.2).unwrap();
        let outcome = checker
            .check(&ProcessLauncher::new(), "", "")
            .await
            .unwrap();
        assert!(matches!(outcome, CheckerOutcome::Failed { .. }));
    }

    #[test]
    fn test_default_timeout() {
        let checker = sh_checker("true");
        assert_eq!(checker.timeout(), DEFAULT_CHECKER_TIMEOUT);
        assert!(sh_checker("true").with_timeout(0.0).is_err());
    }
}
