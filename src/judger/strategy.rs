//! Verdict strategies
//!
//! The single-case pipeline is the same for every problem type; only the final
//! accept/reject decision differs. `DirectCompare` compares normalized outputs,
//! `CheckerInvoke` asks an external checker.

use async_trait::async_trait;

use crate::checker::{Checker, CheckerOutcome};
use crate::core::compare_output;
use crate::error::ExecError;
use crate::runner::ProcessLauncher;
use crate::testcase::{TestCase, TestcaseLayout};

/// Decision of a strategy for a submission that ran cleanly
#[derive(Debug, Clone, PartialEq)]
pub enum Judgement {
    Accepted,
    WrongAnswer,
    /// The judging step itself failed; reported as a runtime error
    Failed(String),
}

#[async_trait]
pub trait VerdictStrategy: Send + Sync {
    /// File layout of the test cases this strategy needs
    fn layout(&self) -> TestcaseLayout;

    /// Judge the raw stdout of a submission that exited cleanly
    async fn judge(
        &self,
        case: &TestCase,
        output: &str,
        launcher: &ProcessLauncher,
    ) -> Result<Judgement, ExecError>;
}

/// Exact comparison of normalized output against the expected output
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectCompare;

#[async_trait]
impl VerdictStrategy for DirectCompare {
    fn layout(&self) -> TestcaseLayout {
        TestcaseLayout::Paired
    }

    async fn judge(
        &self,
        case: &TestCase,
        output: &str,
        _launcher: &ProcessLauncher,
    ) -> Result<Judgement, ExecError> {
        let expected = case
            .expected_output
            .as_deref()
            .ok_or(ExecError::MissingExpectedOutput)?;

        if compare_output(output, expected) {
            Ok(Judgement::Accepted)
        } else {
            Ok(Judgement::WrongAnswer)
        }
    }
}

/// Delegates the decision to an external checker
#[derive(Debug, Clone)]
pub struct CheckerInvoke {
    checker: Checker,
}

impl CheckerInvoke {
    pub fn new(checker: Checker) -> Self {
        Self { checker }
    }
}

#[async_trait]
impl VerdictStrategy for CheckerInvoke {
    fn layout(&self) -> TestcaseLayout {
        TestcaseLayout::InputOnly
    }

    async fn judge(
        &self,
        case: &TestCase,
        output: &str,
        launcher: &ProcessLauncher,
    ) -> Result<Judgement, ExecError> {
        let judgement = match self.checker.check(launcher, &case.input, output).await? {
            CheckerOutcome::Accepted => Judgement::Accepted,
            CheckerOutcome::Rejected { .. } => Judgement::WrongAnswer,
            CheckerOutcome::Failed { reason } => Judgement::Failed(reason),
        };
        Ok(judgement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::CommandSpec;

    #[tokio::test]
    async fn test_direct_compare() {
        let launcher = ProcessLauncher::new();
        let case = TestCase::new("1 2\n", "3\n");

        assert_eq!(
            DirectCompare.judge(&case, "3\r\n\r\n", &launcher).await.unwrap(),
            Judgement::Accepted
        );
        assert_eq!(
            DirectCompare.judge(&case, "4\n", &launcher).await.unwrap(),
            Judgement::WrongAnswer
        );
    }

    #[tokio::test]
    async fn test_direct_compare_without_expected_output() {
        let launcher = ProcessLauncher::new();
        let case = TestCase::input_only("1 2\n");

        let err = DirectCompare.judge(&case, "3", &launcher).await.unwrap_err();
        assert!(matches!(err, ExecError::MissingExpectedOutput));
    }

    #[tokio::test]
    async fn test_checker_failure_is_reported() {
        let checker = Checker::new(CommandSpec::new("sh").with_args(["-c", "exit 5", "checker"]));
        let strategy = CheckerInvoke::new(checker);

        let judgement = strategy
            .judge(&TestCase::input_only(""), "", &ProcessLauncher::new())
            .await
            .unwrap();
        assert!(matches!(judgement, Judgement::Failed(_)));
    }

    #[test]
    fn test_layouts() {
        assert_eq!(DirectCompare.layout(), TestcaseLayout::Paired);
        let checker = Checker::new(CommandSpec::new("true"));
        assert_eq!(CheckerInvoke::new(checker).layout(), TestcaseLayout::InputOnly);
    }
}
